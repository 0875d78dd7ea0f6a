mod descriptor;
mod discovery;
mod error;
mod loader;
mod manager;
mod metrics;
mod provider;

#[cfg(any(test, debug_assertions))]
pub mod mock;

pub use self::descriptor::DEFAULT_ENABLED;
pub use self::descriptor::DEFAULT_FAILOVER_SLEEP;
pub use self::descriptor::DEFAULT_MAX_FAILOVER_ATTEMPTS;
pub use self::descriptor::DEFAULT_MAX_RETRY_ATTEMPTS;
pub use self::descriptor::DEFAULT_RETRY_SLEEP;
pub use self::descriptor::HaDescriptor;
pub use self::descriptor::HaServiceConfig;
pub use self::discovery::zookeeper::LeaderPointerSource;
pub use self::discovery::zookeeper::LiveNodesSource;
pub use self::discovery::zookeeper::PropertyNodesSource;
pub use self::discovery::zookeeper::ZookeeperClient;
pub use self::discovery::CandidateSource;
pub use self::discovery::CoordinationReader;
pub use self::discovery::ZookeeperOptions;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::error::Result;
pub use self::loader::load_url_manager;
pub use self::loader::register_manager;
pub use self::loader::ManagerFactory;
pub use self::manager::DefaultUrlManager;
pub use self::manager::DiscoveredUrlManager;
pub use self::manager::UrlManager;
pub use self::metrics::register_metrics;
pub use self::provider::HaProvider;
