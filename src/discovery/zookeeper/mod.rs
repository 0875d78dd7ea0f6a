use serde::Deserialize;
use serde::Serialize;

mod client;
mod leader;
mod live_nodes;
mod properties;

pub use self::client::ZookeeperClient;
pub use self::leader::LeaderPointerSource;
pub use self::live_nodes::LiveNodesSource;
pub use self::properties::PropertyNodesSource;

/// Zookeeper client options not carried by the HA descriptor.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct ZookeeperOptions {
    /// Zookeeper session timeout (in seconds).
    #[serde(default = "ZookeeperOptions::default_timeout")]
    pub timeout: u64,
}

impl Default for ZookeeperOptions {
    fn default() -> ZookeeperOptions {
        ZookeeperOptions {
            timeout: ZookeeperOptions::default_timeout(),
        }
    }
}

impl ZookeeperOptions {
    fn default_timeout() -> u64 {
        5
    }
}

/// Absolute coordination path for a configured or default namespace.
///
/// Namespaces are accepted with or without a leading slash; both forms
/// resolve to the same path.
pub(crate) fn namespace_path(namespace: Option<&str>, default: &str) -> String {
    let namespace = namespace.unwrap_or(default).trim_start_matches('/');
    format!("/{}", namespace)
}

#[cfg(test)]
mod tests {
    use super::namespace_path;

    #[test]
    fn namespace_path_accepts_both_slash_forms() {
        assert_eq!(namespace_path(Some("/hiveserver2"), "x"), "/hiveserver2");
        assert_eq!(namespace_path(Some("hiveserver2"), "x"), "/hiveserver2");
        assert_eq!(namespace_path(None, "live_nodes"), "/live_nodes");
    }
}
