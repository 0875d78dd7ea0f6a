use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use failure::ResultExt;
use slog::debug;
use slog::error;
use slog::info;
use slog::warn;
use slog::Logger;

use zookeeper::ZkError;
use zookeeper::ZkState;
use zookeeper::ZooKeeper;

use crate::discovery::CoordinationReader;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::metrics::ZOO_CONNECTION_COUNT;

use super::ZookeeperOptions;

/// Reconnecting, read-only wrapper around a `ZooKeeper` session.
///
/// Sessions are opened lazily on first use and replaced when closed, so
/// constructing the client never blocks on the network and a coordination
/// outage only surfaces when a read is attempted.
pub struct ZookeeperClient {
    ensemble: String,
    keeper: Mutex<Option<CurrentClient>>,
    logger: Logger,
    options: ZookeeperOptions,
}

impl ZookeeperClient {
    pub fn new(ensemble: String, options: ZookeeperOptions, logger: Logger) -> ZookeeperClient {
        ZookeeperClient {
            ensemble,
            keeper: Mutex::new(None),
            logger,
            options,
        }
    }

    /// Return the current or a new zookeeper session.
    fn get(&self) -> Result<Arc<ZooKeeper>> {
        let mut current = self
            .keeper
            .lock()
            .expect("zookeeper client lock was poisoned");
        let active = current.as_ref().map(CurrentClient::active).unwrap_or(false);
        if !active {
            *current = Some(self.new_client()?);
        }
        Ok(current
            .as_ref()
            .expect("current client must be set after creation")
            .client())
    }

    /// Return a new Zookeeper session that will clear itself when disconnected.
    fn new_client(&self) -> Result<CurrentClient> {
        info!(
            self.logger,
            "Initiating new zookeeper session";
            "ensemble" => &self.ensemble
        );
        let timeout = Duration::from_secs(self.options.timeout);
        let keeper = ZooKeeper::connect(&self.ensemble, timeout, |_| {})
            .with_context(|_| ErrorKind::BackendConnect(self.ensemble.clone()))?;
        ZOO_CONNECTION_COUNT.inc();

        // Listen for connection events to close self.
        let logger = self.logger.clone();
        let active = Arc::new(AtomicBool::new(true));
        let notify_close = Arc::clone(&active);
        keeper.add_listener(move |state| {
            let reset = match state {
                ZkState::AuthFailed => {
                    error!(logger, "Zookeeper authentication error");
                    false
                }
                ZkState::Closed => {
                    warn!(logger, "Zookeeper session closed");
                    true
                }
                ZkState::Connected => {
                    info!(logger, "Zookeeper connection successful");
                    false
                }
                ZkState::ConnectedReadOnly => {
                    debug!(logger, "Zookeeper connection is read-only");
                    false
                }
                ZkState::Connecting => {
                    debug!(logger, "Zookeeper session connecting");
                    false
                }
                event => {
                    debug!(logger, "Ignoring deprecated zookeeper event"; "event" => ?event);
                    false
                }
            };
            if reset {
                notify_close.store(false, Ordering::Relaxed);
                debug!(logger, "Zookeeper session marked as not active");
            }
        });

        Ok(CurrentClient {
            active,
            keeper: Arc::new(keeper),
        })
    }
}

impl CoordinationReader for ZookeeperClient {
    fn children(&self, path: &str) -> Result<Vec<String>> {
        let keeper = self.get()?;
        match keeper.get_children(path, false) {
            Ok(children) => Ok(children),
            Err(ZkError::NoNode) => Ok(Vec::new()),
            Err(error) => Err(error)
                .with_context(|_| ErrorKind::Backend("children listing"))
                .map_err(Into::into),
        }
    }

    fn data(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let keeper = self.get()?;
        match keeper.get_data(path, false) {
            Ok((data, _)) => Ok(Some(data)),
            Err(ZkError::NoNode) => Ok(None),
            Err(error) => Err(error)
                .with_context(|_| ErrorKind::Backend("node data fetch"))
                .map_err(Into::into),
        }
    }
}

/// Holder of the current zookeeper session with its `active` flag.
struct CurrentClient {
    active: Arc<AtomicBool>,
    keeper: Arc<ZooKeeper>,
}

impl CurrentClient {
    fn active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn client(&self) -> Arc<ZooKeeper> {
        Arc::clone(&self.keeper)
    }
}
