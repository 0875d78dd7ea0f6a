use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use crate::discovery::CoordinationReader;
use crate::error::ErrorKind;
use crate::error::Result;

/// Helper to mock the coordination service with an in-memory node tree.
///
/// Nodes are full absolute paths mapped to their payloads; children are
/// derived from the stored paths. Flip `set_failing` to make every read
/// fail the way an unreachable ensemble would.
#[derive(Default)]
pub struct MockCoordinationReader {
    failing: AtomicBool,
    nodes: Mutex<BTreeMap<String, Vec<u8>>>,
    reads: AtomicUsize,
}

impl MockCoordinationReader {
    pub fn new() -> MockCoordinationReader {
        MockCoordinationReader::default()
    }

    /// Create or replace a node at the given absolute path.
    pub fn set_node<P, D>(&self, path: P, data: D)
    where
        P: Into<String>,
        D: Into<Vec<u8>>,
    {
        let mut nodes = self.lock();
        nodes.insert(path.into(), data.into());
    }

    pub fn remove_node(&self, path: &str) {
        let mut nodes = self.lock();
        nodes.remove(path);
    }

    /// Make every subsequent read fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of read operations issued against this mock.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<BTreeMap<String, Vec<u8>>> {
        self.nodes.lock().expect("mock coordination tree poisoned")
    }
}

impl CoordinationReader for MockCoordinationReader {
    fn children(&self, path: &str) -> Result<Vec<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ErrorKind::Backend("children listing").into());
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let nodes = self.lock();
        let children = nodes
            .keys()
            .filter_map(|node| node.strip_prefix(&prefix))
            .filter(|child| !child.is_empty() && !child.contains('/'))
            .map(String::from)
            .collect();
        Ok(children)
    }

    fn data(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ErrorKind::Backend("node data fetch").into());
        }
        let nodes = self.lock();
        Ok(nodes.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use crate::discovery::CoordinationReader;

    use super::MockCoordinationReader;

    #[test]
    fn children_are_direct_descendants_only() {
        let mock = MockCoordinationReader::new();
        mock.set_node("/a/b", "");
        mock.set_node("/a/c", "");
        mock.set_node("/a/c/d", "");
        mock.set_node("/ab/e", "");
        assert_eq!(mock.children("/a").unwrap(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn data_distinguishes_absent_nodes() {
        let mock = MockCoordinationReader::new();
        mock.set_node("/a/b", "payload");
        assert_eq!(mock.data("/a/b").unwrap(), Some(b"payload".to_vec()));
        assert_eq!(mock.data("/a/missing").unwrap(), None);
        mock.remove_node("/a/b");
        assert_eq!(mock.data("/a/b").unwrap(), None);
    }

    #[test]
    fn failing_mode_errors_all_reads() {
        let mock = MockCoordinationReader::new();
        mock.set_failing(true);
        assert!(mock.children("/a").is_err());
        assert!(mock.data("/a").is_err());
        assert_eq!(mock.reads(), 2);
    }
}
