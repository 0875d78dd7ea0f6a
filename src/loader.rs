use std::sync::Arc;
use std::sync::Mutex;

use lazy_static::lazy_static;
use slog::debug;
use slog::Logger;

use crate::descriptor::HaServiceConfig;
use crate::discovery::zookeeper::LeaderPointerSource;
use crate::discovery::zookeeper::LiveNodesSource;
use crate::discovery::zookeeper::PropertyNodesSource;
use crate::discovery::zookeeper::ZookeeperClient;
use crate::discovery::CoordinationReader;
use crate::discovery::ZookeeperOptions;
use crate::manager::DefaultUrlManager;
use crate::manager::DiscoveredUrlManager;
use crate::manager::UrlManager;

/// Factory for a service's URL manager, registered under a service name.
pub type ManagerFactory =
    Arc<dyn Fn(&HaServiceConfig, &Logger) -> Box<dyn UrlManager> + Send + Sync>;

struct RegistryEntry {
    factory: ManagerFactory,
    service: String,
}

lazy_static! {
    static ref REGISTRY: Mutex<Vec<RegistryEntry>> = Mutex::new(built_in_managers());
}

/// Register a URL manager factory for a service name.
///
/// Later registrations are consulted first, so plugins and test doubles
/// take precedence over the built-in managers for the same name.
pub fn register_manager<S: Into<String>>(service: S, factory: ManagerFactory) {
    let entry = RegistryEntry {
        factory,
        service: service.into().to_uppercase(),
    };
    let mut registry = REGISTRY.lock().expect("manager registry lock was poisoned");
    registry.insert(0, entry);
}

/// Resolve the URL manager implementation for a service.
///
/// Discovery managers are keyed by service name (case-insensitive) and
/// require a configured zookeeper ensemble; anything else gets the
/// generic ring manager, seeded later by the provider.
pub fn load_url_manager(config: Option<&HaServiceConfig>, logger: &Logger) -> Box<dyn UrlManager> {
    let config = match config {
        Some(config) => config,
        None => return fallback("", logger),
    };
    let has_ensemble = config
        .zookeeper_ensemble()
        .map(|ensemble| !ensemble.trim().is_empty())
        .unwrap_or(false);
    if has_ensemble {
        let service = config.service_name().to_uppercase();
        let registry = REGISTRY.lock().expect("manager registry lock was poisoned");
        if let Some(entry) = registry.iter().find(|entry| entry.service == service) {
            debug!(
                logger, "Loading discovery URL manager";
                "service" => config.service_name()
            );
            return (entry.factory)(config, logger);
        }
    }
    fallback(config.service_name(), logger)
}

fn fallback(service: &str, logger: &Logger) -> Box<dyn UrlManager> {
    Box::new(DefaultUrlManager::new(service, Vec::new(), logger.clone()))
}

fn built_in_managers() -> Vec<RegistryEntry> {
    let leader: ManagerFactory = Arc::new(leader_manager);
    let entry = |service: &str, factory: &ManagerFactory| RegistryEntry {
        factory: Arc::clone(factory),
        service: service.to_string(),
    };
    vec![
        entry("ATLAS", &leader),
        entry("ATLAS-API", &leader),
        RegistryEntry {
            factory: Arc::new(live_nodes_manager),
            service: "SOLR".to_string(),
        },
        RegistryEntry {
            factory: Arc::new(property_nodes_manager),
            service: "HIVE".to_string(),
        },
    ]
}

fn zookeeper_reader(config: &HaServiceConfig, logger: &Logger) -> Arc<dyn CoordinationReader> {
    let ensemble = config.zookeeper_ensemble().unwrap_or_default().to_string();
    Arc::new(ZookeeperClient::new(
        ensemble,
        ZookeeperOptions::default(),
        logger.clone(),
    ))
}

fn leader_manager(config: &HaServiceConfig, logger: &Logger) -> Box<dyn UrlManager> {
    let reader = zookeeper_reader(config, logger);
    let source = LeaderPointerSource::new(reader, config.zookeeper_namespace());
    Box::new(DiscoveredUrlManager::new(
        config.service_name(),
        Box::new(source),
        logger.clone(),
    ))
}

fn live_nodes_manager(config: &HaServiceConfig, logger: &Logger) -> Box<dyn UrlManager> {
    let reader = zookeeper_reader(config, logger);
    let source = LiveNodesSource::new(reader, config.zookeeper_namespace());
    Box::new(DiscoveredUrlManager::new(
        config.service_name(),
        Box::new(source),
        logger.clone(),
    ))
}

fn property_nodes_manager(config: &HaServiceConfig, logger: &Logger) -> Box<dyn UrlManager> {
    let reader = zookeeper_reader(config, logger);
    let source = PropertyNodesSource::new(reader, config.zookeeper_namespace(), logger.clone());
    Box::new(DiscoveredUrlManager::new(
        config.service_name(),
        Box::new(source),
        logger.clone(),
    ))
}

#[cfg(test)]
fn registered_services() -> Vec<String> {
    let registry = REGISTRY.lock().expect("manager registry lock was poisoned");
    registry.iter().map(|entry| entry.service.clone()).collect()
}
