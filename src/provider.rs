use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use slog::info;
use slog::Logger;

use crate::descriptor::HaDescriptor;
use crate::loader::load_url_manager;
use crate::manager::DefaultUrlManager;
use crate::manager::UrlManager;

/// Facade the request dispatch layer calls into.
///
/// Owns one lazily created `UrlManager` per referenced service and keys
/// every operation by service name. Supplies data, not control flow:
/// looping over failover attempts and sleeping between them belong to
/// the dispatch layer.
///
/// Construction consumes the descriptor, so a provider can never exist
/// without configuration.
pub struct HaProvider {
    descriptor: HaDescriptor,
    logger: Logger,
    managers: Mutex<HashMap<String, Arc<dyn UrlManager>>>,
}

impl HaProvider {
    pub fn new(descriptor: HaDescriptor, logger: Logger) -> HaProvider {
        HaProvider {
            descriptor,
            logger,
            managers: Mutex::new(HashMap::new()),
        }
    }

    pub fn descriptor(&self) -> &HaDescriptor {
        &self.descriptor
    }

    /// Check if HA is enabled for the given service in the descriptor.
    pub fn is_ha_enabled(&self, service_name: &str) -> bool {
        self.descriptor
            .service_config(service_name)
            .map(|config| config.enabled())
            .unwrap_or(false)
    }

    /// Register a statically seeded manager for a service.
    ///
    /// Used by topologies that list explicit backend URLs instead of
    /// relying on discovery. Replaces any manager already registered
    /// under the name.
    pub fn add_ha_service<S: Into<String>>(&self, service_name: S, urls: Vec<String>) {
        let service_name = service_name.into();
        info!(
            self.logger, "Registering statically seeded HA service";
            "service" => &service_name,
            "urls" => urls.len()
        );
        let manager = DefaultUrlManager::new(service_name.clone(), urls, self.logger.clone());
        let mut managers = self.lock();
        managers.insert(service_name, Arc::new(manager));
    }

    /// The URL the dispatch layer should send the next request to.
    ///
    /// `None` for service names the provider knows nothing about.
    pub fn active_url(&self, service_name: &str) -> Option<String> {
        self.manager(service_name)?.active_url()
    }

    /// Candidate URLs currently known for a service.
    pub fn urls(&self, service_name: &str) -> Option<Vec<String>> {
        Some(self.manager(service_name)?.urls())
    }

    /// Report a transport-level failure against a service URL.
    pub fn mark_failed_url(&self, service_name: &str, url: &str) {
        if let Some(manager) = self.manager(service_name) {
            manager.mark_failed(url);
        }
    }

    /// Administrative failback: force the active URL for a service.
    pub fn set_active_url(&self, service_name: &str, url: &str) {
        if let Some(manager) = self.manager(service_name) {
            manager.set_active_url(url);
        }
    }

    fn manager(&self, service_name: &str) -> Option<Arc<dyn UrlManager>> {
        let mut managers = self.lock();
        if let Some(manager) = managers.get(service_name) {
            return Some(Arc::clone(manager));
        }
        let config = self.descriptor.service_config(service_name)?;
        info!(self.logger, "Creating URL manager"; "service" => service_name);
        let manager: Arc<dyn UrlManager> = Arc::from(load_url_manager(Some(config), &self.logger));
        managers.insert(service_name.to_string(), Arc::clone(&manager));
        Some(manager)
    }

    fn lock(&self) -> std::sync::MutexGuard<HashMap<String, Arc<dyn UrlManager>>> {
        self.managers.lock().expect("HA manager map lock was poisoned")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use crate::descriptor::HaDescriptor;
    use crate::descriptor::HaServiceConfig;
    use crate::manager::tests::logger;

    use super::HaProvider;

    fn provider() -> HaProvider {
        let mut descriptor = HaDescriptor::new();
        descriptor
            .add_service_config(HaServiceConfig::from_params("WEBHDFS", "enabled=true").unwrap());
        descriptor
            .add_service_config(HaServiceConfig::from_params("OOZIE", "enabled=false").unwrap());
        HaProvider::new(descriptor, logger())
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|url| url.to_string()).collect()
    }

    #[test]
    fn ha_enabled_follows_the_descriptor() {
        let provider = provider();
        assert!(provider.is_ha_enabled("WEBHDFS"));
        assert!(!provider.is_ha_enabled("OOZIE"));
        assert!(!provider.is_ha_enabled("UNKNOWN"));
    }

    #[test]
    fn unknown_service_has_no_active_url() {
        let provider = provider();
        assert_eq!(provider.active_url("UNKNOWN"), None);
        provider.mark_failed_url("UNKNOWN", "http://u1");
        provider.set_active_url("UNKNOWN", "http://u1");
    }

    #[test]
    fn statically_seeded_service_fails_over() {
        let provider = provider();
        provider.add_ha_service("WEBHDFS", urls(&["http://u1", "http://u2", "http://u3"]));
        assert_eq!(provider.active_url("WEBHDFS").unwrap(), "http://u1");
        provider.mark_failed_url("WEBHDFS", "http://u1");
        assert_eq!(provider.active_url("WEBHDFS").unwrap(), "http://u2");
        provider.mark_failed_url("WEBHDFS", "http://u1");
        assert_eq!(provider.active_url("WEBHDFS").unwrap(), "http://u2");
        provider.set_active_url("WEBHDFS", "http://u3");
        assert_eq!(provider.active_url("WEBHDFS").unwrap(), "http://u3");
    }

    #[test]
    fn managers_are_created_lazily_and_cached() {
        let provider = provider();
        // A configured service without discovery resolves to an empty ring.
        assert_eq!(provider.active_url("WEBHDFS"), None);
        assert!(provider.urls("WEBHDFS").unwrap().is_empty());
        // Static seeding replaces the cached empty manager.
        provider.add_ha_service("WEBHDFS", urls(&["http://u1"]));
        assert_eq!(provider.active_url("WEBHDFS").unwrap(), "http://u1");
    }

    #[test]
    fn concurrent_failure_reports_advance_once() {
        let provider = Arc::new(provider());
        provider.add_ha_service(
            "WEBHDFS",
            urls(&["http://u1", "http://u2", "http://u3", "http://u4"]),
        );
        let mut handles = Vec::new();
        for _ in 0..8 {
            let provider = Arc::clone(&provider);
            handles.push(thread::spawn(move || {
                provider.mark_failed_url("WEBHDFS", "http://u1");
            }));
        }
        for handle in handles {
            handle.join().expect("failure reporter thread panicked");
        }
        // Only the report that observed u1 as active may advance the ring.
        assert_eq!(provider.active_url("WEBHDFS").unwrap(), "http://u2");
    }
}
