use crate::error::Result;

pub mod zookeeper;

pub use self::zookeeper::ZookeeperOptions;

/// A discovery strategy producing the current candidate URL list.
///
/// One implementation exists per backend product family; the shared
/// ring logic in `DiscoveredUrlManager` wraps any of them.
pub trait CandidateSource: Send + Sync {
    /// List the candidate URLs currently registered with the
    /// coordination service, in a stable, repeatable order.
    ///
    /// A coordination path that does not exist yet yields an empty list,
    /// not an error. Errors are reserved for an unreachable or failing
    /// coordination service.
    fn candidates(&self) -> Result<Vec<String>>;
}

/// Narrow read-only surface of the coordination service.
///
/// This subsystem never writes to the coordination service; keeping the
/// seam this small lets tests swap in an in-memory tree.
pub trait CoordinationReader: Send + Sync {
    /// Names of the children of the given path.
    ///
    /// An absent path yields an empty list.
    fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Payload of the node at the given path, `None` if the node is absent.
    fn data(&self, path: &str) -> Result<Option<Vec<u8>>>;
}
