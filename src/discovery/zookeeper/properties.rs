use std::collections::HashMap;
use std::sync::Arc;

use failure::ResultExt;
use slog::warn;
use slog::Logger;

use crate::discovery::CandidateSource;
use crate::discovery::CoordinationReader;
use crate::error::ErrorKind;
use crate::error::Result;

use super::namespace_path;

const DEFAULT_NAMESPACE: &str = "hiveserver2";

const PROP_TRANSPORT_MODE: &str = "hive.server2.transport.mode";
const PROP_USE_SSL: &str = "hive.server2.use.SSL";
const PROP_BIND_HOST: &str = "hive.server2.thrift.bind.host";
const PROP_HTTP_PORT: &str = "hive.server2.thrift.http.port";
const PROP_HTTP_PATH: &str = "hive.server2.thrift.http.path";

const TRANSPORT_MODE_HTTP: &str = "http";

/// Property-node discovery: each child under the namespace carries a
/// serialized `key=value;key=value` set of connection properties and a
/// URL is synthesized per child.
///
/// Children are walked in descending znode name order: server
/// registrations carry a monotonic sequence suffix, so descending order
/// prefers the newest registration and the order is deterministic
/// across repeated listings.
pub struct PropertyNodesSource {
    logger: Logger,
    path: String,
    reader: Arc<dyn CoordinationReader>,
}

impl PropertyNodesSource {
    pub fn new(
        reader: Arc<dyn CoordinationReader>,
        namespace: Option<&str>,
        logger: Logger,
    ) -> PropertyNodesSource {
        PropertyNodesSource {
            logger,
            path: namespace_path(namespace, DEFAULT_NAMESPACE),
            reader,
        }
    }
}

impl CandidateSource for PropertyNodesSource {
    fn candidates(&self) -> Result<Vec<String>> {
        let mut children = self.reader.children(&self.path)?;
        children.sort_by(|a, b| b.cmp(a));
        let mut urls = Vec::new();
        for child in children {
            let node = format!("{}/{}", self.path, child);
            // A child may deregister between the listing and the read.
            let data = match self.reader.data(&node)? {
                Some(data) => data,
                None => continue,
            };
            let properties = String::from_utf8(data)
                .with_context(|_| ErrorKind::Decode("server registration properties"))?;
            match server_url(&properties) {
                Some(url) => urls.push(url),
                None => {
                    warn!(
                        self.logger,
                        "Skipping server registration not routable over http";
                        "node" => node
                    );
                }
            }
        }
        Ok(urls)
    }
}

/// Synthesize a URL from serialized connection properties.
///
/// Only http transport is routable through the gateway; binary transport
/// registrations and incomplete property sets yield `None`.
fn server_url(properties: &str) -> Option<String> {
    let properties: HashMap<&str, &str> = properties
        .split(';')
        .filter_map(|pair| {
            let mut tokens = pair.splitn(2, '=');
            Some((tokens.next()?.trim(), tokens.next()?.trim()))
        })
        .collect();
    let mode = properties.get(PROP_TRANSPORT_MODE)?;
    if !mode.eq_ignore_ascii_case(TRANSPORT_MODE_HTTP) {
        return None;
    }
    let host = properties.get(PROP_BIND_HOST)?;
    let port = properties.get(PROP_HTTP_PORT)?;
    let path = properties.get(PROP_HTTP_PATH)?;
    let ssl = properties
        .get(PROP_USE_SSL)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let scheme = if ssl { "https" } else { "http" };
    Some(format!(
        "{}://{}:{}/{}",
        scheme,
        host,
        port,
        path.trim_start_matches('/')
    ))
}
