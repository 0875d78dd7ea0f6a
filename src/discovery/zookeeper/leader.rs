use std::sync::Arc;

use failure::ResultExt;

use crate::discovery::CandidateSource;
use crate::discovery::CoordinationReader;
use crate::error::ErrorKind;
use crate::error::Result;

use super::namespace_path;

const DEFAULT_NAMESPACE: &str = "apache_atlas";
const ACTIVE_SERVER_NODE: &str = "active_server_info";

/// Leader-pointer discovery: a single fixed znode's data is the one
/// active endpoint, elected outside this subsystem.
///
/// "Discovery" degenerates to re-reading the pointer, so the candidate
/// list always has zero or one entries and a failure report results in
/// an immediate re-read rather than a ring advance.
pub struct LeaderPointerSource {
    path: String,
    reader: Arc<dyn CoordinationReader>,
}

impl LeaderPointerSource {
    pub fn new(reader: Arc<dyn CoordinationReader>, namespace: Option<&str>) -> LeaderPointerSource {
        let path = format!(
            "{}/{}",
            namespace_path(namespace, DEFAULT_NAMESPACE),
            ACTIVE_SERVER_NODE
        );
        LeaderPointerSource { path, reader }
    }
}

impl CandidateSource for LeaderPointerSource {
    fn candidates(&self) -> Result<Vec<String>> {
        let data = match self.reader.data(&self.path)? {
            Some(data) => data,
            None => return Ok(Vec::new()),
        };
        let url = String::from_utf8(data)
            .with_context(|_| ErrorKind::Decode("active server endpoint"))?;
        let url = url.trim();
        if url.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![url.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::discovery::CandidateSource;
    use crate::error::ErrorKind;
    use crate::mock::MockCoordinationReader;

    use super::LeaderPointerSource;

    #[test]
    fn reads_the_pointer_node_data() {
        let reader = Arc::new(MockCoordinationReader::new());
        reader.set_node("/apache_atlas/active_server_info", "http://atlas1:21000");
        let source = LeaderPointerSource::new(reader, None);
        assert_eq!(
            source.candidates().unwrap(),
            vec!["http://atlas1:21000".to_string()]
        );
    }

    #[test]
    fn pointer_updates_are_observed_on_reread() {
        let reader = Arc::new(MockCoordinationReader::new());
        reader.set_node("/apache_atlas/active_server_info", "http://atlas1:21000");
        let source = LeaderPointerSource::new(Arc::clone(&reader) as _, None);
        source.candidates().unwrap();
        reader.set_node("/apache_atlas/active_server_info", "http://atlas2:21000");
        assert_eq!(
            source.candidates().unwrap(),
            vec!["http://atlas2:21000".to_string()]
        );
    }

    #[test]
    fn absent_pointer_is_an_empty_list() {
        let reader = Arc::new(MockCoordinationReader::new());
        let source = LeaderPointerSource::new(reader, None);
        assert!(source.candidates().unwrap().is_empty());
    }

    #[test]
    fn custom_namespace_with_or_without_slash() {
        let reader = Arc::new(MockCoordinationReader::new());
        reader.set_node("/custom_atlas/active_server_info", "http://atlas1:21000");
        let plain = LeaderPointerSource::new(Arc::clone(&reader) as _, Some("custom_atlas"));
        let slashed = LeaderPointerSource::new(Arc::clone(&reader) as _, Some("/custom_atlas"));
        assert_eq!(plain.candidates().unwrap(), slashed.candidates().unwrap());
        assert_eq!(plain.candidates().unwrap().len(), 1);
    }

    #[test]
    fn unreachable_reader_is_an_error() {
        let reader = Arc::new(MockCoordinationReader::new());
        reader.set_failing(true);
        let source = LeaderPointerSource::new(reader, None);
        let error = source.candidates().err().expect("read should fail");
        assert_eq!(error.kind(), ErrorKind::Backend("node data fetch"));
    }
}
