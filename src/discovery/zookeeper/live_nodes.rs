use std::sync::Arc;

use crate::discovery::CandidateSource;
use crate::discovery::CoordinationReader;
use crate::error::Result;

use super::namespace_path;

const DEFAULT_NAMESPACE: &str = "live_nodes";

/// Directory-listing discovery: each ephemeral child of the namespace is
/// named `host:port_context` by a live worker and is turned into
/// `http://host:port/context`.
pub struct LiveNodesSource {
    path: String,
    reader: Arc<dyn CoordinationReader>,
}

impl LiveNodesSource {
    pub fn new(reader: Arc<dyn CoordinationReader>, namespace: Option<&str>) -> LiveNodesSource {
        LiveNodesSource {
            path: namespace_path(namespace, DEFAULT_NAMESPACE),
            reader,
        }
    }
}

impl CandidateSource for LiveNodesSource {
    fn candidates(&self) -> Result<Vec<String>> {
        let mut children = self.reader.children(&self.path)?;
        // Child names are the only ordering signal; sort so repeated
        // listings cycle through candidates predictably.
        children.sort();
        let urls = children
            .iter()
            .map(|child| format!("http://{}", child.replacen('_', "/", 1)))
            .collect();
        Ok(urls)
    }
}
