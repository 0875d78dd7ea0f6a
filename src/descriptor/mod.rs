use crate::error::ErrorKind;
use crate::error::Result;

mod xml;

pub const DEFAULT_ENABLED: bool = false;
pub const DEFAULT_MAX_FAILOVER_ATTEMPTS: u32 = 3;
pub const DEFAULT_FAILOVER_SLEEP: u64 = 1000;
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_SLEEP: u64 = 1000;

pub(crate) const PARAM_ENABLED: &str = "enabled";
pub(crate) const PARAM_MAX_FAILOVER_ATTEMPTS: &str = "maxFailoverAttempts";
pub(crate) const PARAM_FAILOVER_SLEEP: &str = "failoverSleep";
pub(crate) const PARAM_MAX_RETRY_ATTEMPTS: &str = "maxRetryAttempts";
pub(crate) const PARAM_RETRY_SLEEP: &str = "retrySleep";
pub(crate) const PARAM_ZOOKEEPER_ENSEMBLE: &str = "zookeeperEnsemble";
pub(crate) const PARAM_ZOOKEEPER_NAMESPACE: &str = "zookeeperNamespace";

const PAIRS_DELIMITER: char = ';';
const PAIR_DELIMITER: char = '=';

/// Immutable per-service high availability configuration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct HaServiceConfig {
    service_name: String,
    enabled: bool,
    max_failover_attempts: u32,
    failover_sleep: u64,
    max_retry_attempts: u32,
    retry_sleep: u64,
    zookeeper_ensemble: Option<String>,
    zookeeper_namespace: Option<String>,
}

impl HaServiceConfig {
    /// Create a config from a `key=value;key=value` parameter string.
    ///
    /// Unknown keys are ignored and missing keys take their defaults.
    pub fn from_params<S: Into<String>>(service_name: S, params: &str) -> Result<HaServiceConfig> {
        let mut enabled = None;
        let mut max_failover_attempts = None;
        let mut failover_sleep = None;
        let mut max_retry_attempts = None;
        let mut retry_sleep = None;
        let mut zookeeper_ensemble = None;
        let mut zookeeper_namespace = None;
        for pair in params.split(PAIRS_DELIMITER) {
            let mut tokens = pair.splitn(2, PAIR_DELIMITER);
            let key = tokens.next().unwrap_or("").trim();
            let value = match tokens.next() {
                Some(value) => value.trim(),
                None => continue,
            };
            match key {
                PARAM_ENABLED => enabled = Some(value),
                PARAM_MAX_FAILOVER_ATTEMPTS => max_failover_attempts = Some(value),
                PARAM_FAILOVER_SLEEP => failover_sleep = Some(value),
                PARAM_MAX_RETRY_ATTEMPTS => max_retry_attempts = Some(value),
                PARAM_RETRY_SLEEP => retry_sleep = Some(value),
                PARAM_ZOOKEEPER_ENSEMBLE => zookeeper_ensemble = Some(value),
                PARAM_ZOOKEEPER_NAMESPACE => zookeeper_namespace = Some(value),
                _ => (),
            }
        }
        HaServiceConfig::from_fields(
            service_name,
            enabled,
            max_failover_attempts,
            failover_sleep,
            max_retry_attempts,
            retry_sleep,
            zookeeper_ensemble,
            zookeeper_namespace,
        )
    }

    /// Create a config from positional string fields.
    ///
    /// `None` or blank fields take their defaults; malformed numeric
    /// fields are rejected so configuration mistakes surface at load time.
    #[allow(clippy::too_many_arguments)]
    pub fn from_fields<S: Into<String>>(
        service_name: S,
        enabled: Option<&str>,
        max_failover_attempts: Option<&str>,
        failover_sleep: Option<&str>,
        max_retry_attempts: Option<&str>,
        retry_sleep: Option<&str>,
        zookeeper_ensemble: Option<&str>,
        zookeeper_namespace: Option<&str>,
    ) -> Result<HaServiceConfig> {
        let enabled = parse_bool(enabled, DEFAULT_ENABLED);
        let max_failover_attempts = parse_num::<u32>(
            max_failover_attempts,
            DEFAULT_MAX_FAILOVER_ATTEMPTS,
            PARAM_MAX_FAILOVER_ATTEMPTS,
        )?;
        let failover_sleep =
            parse_num::<u64>(failover_sleep, DEFAULT_FAILOVER_SLEEP, PARAM_FAILOVER_SLEEP)?;
        let max_retry_attempts = parse_num::<u32>(
            max_retry_attempts,
            DEFAULT_MAX_RETRY_ATTEMPTS,
            PARAM_MAX_RETRY_ATTEMPTS,
        )?;
        let retry_sleep = parse_num::<u64>(retry_sleep, DEFAULT_RETRY_SLEEP, PARAM_RETRY_SLEEP)?;
        Ok(HaServiceConfig {
            service_name: service_name.into(),
            enabled,
            max_failover_attempts,
            failover_sleep,
            max_retry_attempts,
            retry_sleep,
            zookeeper_ensemble: non_blank(zookeeper_ensemble),
            zookeeper_namespace: non_blank(zookeeper_namespace).map(normalize_namespace),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn max_failover_attempts(&self) -> u32 {
        self.max_failover_attempts
    }

    pub fn failover_sleep(&self) -> u64 {
        self.failover_sleep
    }

    pub fn max_retry_attempts(&self) -> u32 {
        self.max_retry_attempts
    }

    pub fn retry_sleep(&self) -> u64 {
        self.retry_sleep
    }

    pub fn zookeeper_ensemble(&self) -> Option<&str> {
        self.zookeeper_ensemble.as_deref()
    }

    /// Configured coordination namespace, normalized without a leading slash.
    pub fn zookeeper_namespace(&self) -> Option<&str> {
        self.zookeeper_namespace.as_deref()
    }
}

/// Named collection of per-service HA configurations.
///
/// Service names are unique keys; adding a config for a name that is
/// already present replaces the previous entry in place.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct HaDescriptor {
    services: Vec<HaServiceConfig>,
}

impl HaDescriptor {
    pub fn new() -> HaDescriptor {
        HaDescriptor::default()
    }

    /// Parse a descriptor from its XML document form.
    pub fn load(document: &str) -> Result<HaDescriptor> {
        xml::load(document)
    }

    /// Serialize the descriptor to its XML document form.
    ///
    /// All fields are emitted explicitly and attributes are written in
    /// alphabetical order so the output is byte-for-byte deterministic.
    pub fn store(&self) -> Result<String> {
        xml::store(self)
    }

    pub fn add_service_config(&mut self, config: HaServiceConfig) {
        let existing = self
            .services
            .iter_mut()
            .find(|service| service.service_name == config.service_name);
        match existing {
            Some(service) => *service = config,
            None => self.services.push(config),
        }
    }

    pub fn service_config(&self, service_name: &str) -> Option<&HaServiceConfig> {
        self.services
            .iter()
            .find(|service| service.service_name == service_name)
    }

    pub fn service_configs(&self) -> &[HaServiceConfig] {
        &self.services
    }

    pub fn enabled_service_names(&self) -> Vec<String> {
        self.services
            .iter()
            .filter(|service| service.enabled)
            .map(|service| service.service_name.clone())
            .collect()
    }
}

/// Strip the leading slash so both namespace forms resolve the same path.
fn normalize_namespace(namespace: String) -> String {
    namespace.trim_start_matches('/').to_string()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

/// Java-compatible boolean parsing: anything other than "true" is false.
fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(value) if !value.trim().is_empty() => value.trim().eq_ignore_ascii_case("true"),
        _ => default,
    }
}

fn parse_num<T: std::str::FromStr>(value: Option<&str>, default: T, key: &str) -> Result<T> {
    match value {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|_| ErrorKind::InvalidParam(key.to_string(), value.to_string()).into()),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::HaDescriptor;
    use super::HaServiceConfig;
    use crate::error::ErrorKind;

    #[test]
    fn config_from_params() {
        let config = HaServiceConfig::from_params(
            "WEBHDFS",
            "enabled=true;maxFailoverAttempts=5;failoverSleep=50;maxRetryAttempts=7;retrySleep=70",
        )
        .unwrap();
        assert_eq!(config.service_name(), "WEBHDFS");
        assert!(config.enabled());
        assert_eq!(config.max_failover_attempts(), 5);
        assert_eq!(config.failover_sleep(), 50);
        assert_eq!(config.max_retry_attempts(), 7);
        assert_eq!(config.retry_sleep(), 70);
        assert_eq!(config.zookeeper_ensemble(), None);
    }

    #[test]
    fn config_from_params_defaults() {
        let config = HaServiceConfig::from_params("WEBHDFS", "").unwrap();
        assert!(!config.enabled());
        assert_eq!(config.max_failover_attempts(), 3);
        assert_eq!(config.failover_sleep(), 1000);
        assert_eq!(config.max_retry_attempts(), 3);
        assert_eq!(config.retry_sleep(), 1000);
        assert_eq!(config.zookeeper_ensemble(), None);
        assert_eq!(config.zookeeper_namespace(), None);
    }

    #[test]
    fn config_from_params_ignores_unknown_keys() {
        let config =
            HaServiceConfig::from_params("WEBHDFS", "enabled=true;fancyNewOption=yes").unwrap();
        assert!(config.enabled());
    }

    #[test]
    fn config_rejects_bad_numbers() {
        let error = HaServiceConfig::from_params("WEBHDFS", "maxFailoverAttempts=many")
            .err()
            .expect("parse should have failed");
        assert_eq!(
            error.kind(),
            ErrorKind::InvalidParam("maxFailoverAttempts".into(), "many".into())
        );
    }

    #[test]
    fn namespace_leading_slash_is_normalized() {
        let with_slash = HaServiceConfig::from_fields(
            "HIVE",
            None,
            None,
            None,
            None,
            None,
            Some("zk1:2181"),
            Some("/hiveserver2"),
        )
        .unwrap();
        let without_slash = HaServiceConfig::from_fields(
            "HIVE",
            None,
            None,
            None,
            None,
            None,
            Some("zk1:2181"),
            Some("hiveserver2"),
        )
        .unwrap();
        assert_eq!(with_slash.zookeeper_namespace(), Some("hiveserver2"));
        assert_eq!(
            with_slash.zookeeper_namespace(),
            without_slash.zookeeper_namespace()
        );
    }

    #[test]
    fn descriptor_lookup_by_name() {
        let mut descriptor = HaDescriptor::new();
        descriptor
            .add_service_config(HaServiceConfig::from_params("foo", "enabled=true").unwrap());
        descriptor.add_service_config(HaServiceConfig::from_params("bar", "").unwrap());
        assert!(descriptor.service_config("foo").unwrap().enabled());
        assert!(!descriptor.service_config("bar").unwrap().enabled());
        assert!(descriptor.service_config("baz").is_none());
        assert_eq!(descriptor.enabled_service_names(), vec!["foo".to_string()]);
    }

    #[test]
    fn descriptor_duplicate_name_replaces() {
        let mut descriptor = HaDescriptor::new();
        descriptor
            .add_service_config(HaServiceConfig::from_params("foo", "enabled=true").unwrap());
        descriptor
            .add_service_config(HaServiceConfig::from_params("foo", "enabled=false").unwrap());
        assert_eq!(descriptor.service_configs().len(), 1);
        assert!(!descriptor.service_config("foo").unwrap().enabled());
    }

    #[test]
    fn service_names_are_case_sensitive() {
        let mut descriptor = HaDescriptor::new();
        descriptor.add_service_config(HaServiceConfig::from_params("foo", "").unwrap());
        assert!(descriptor.service_config("FOO").is_none());
    }
}
