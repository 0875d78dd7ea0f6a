use std::sync::Mutex;

use slog::info;
use slog::warn;
use slog::Logger;

use crate::metrics::FAILOVER_TOTAL;

mod discovered;

pub use self::discovered::DiscoveredUrlManager;

/// Failover primitive consumed by the request dispatch layer.
///
/// Implementations hold an ordered list of candidate backend URLs and a
/// pointer to the one currently preferred for new requests.
/// All operations are total: an empty candidate list is legal and never
/// causes a panic, and every method is safe under concurrent callers.
pub trait UrlManager: Send + Sync {
    /// A defensive copy of the current ordered candidate list.
    fn urls(&self) -> Vec<String>;

    /// The URL new requests should be sent to, if any candidate is known.
    fn active_url(&self) -> Option<String>;

    /// Force the active pointer to the given URL.
    ///
    /// URLs not present in the current candidate list are rejected and
    /// the pointer is left untouched.
    fn set_active_url(&self, url: &str);

    /// Report that a request to `url` failed.
    ///
    /// The pointer only advances when `url` is the URL currently in play;
    /// stale reports for other URLs must not perturb the ring.
    fn mark_failed(&self, url: &str);
}

/// Candidate list and active pointer shared by all manager implementations.
///
/// The mutex is scoped to the list/index pair alone and is never held
/// across coordination service I/O.
pub(crate) struct Ring {
    state: Mutex<RingState>,
}

struct RingState {
    active: usize,
    urls: Vec<String>,
}

impl Ring {
    pub(crate) fn new(urls: Vec<String>) -> Ring {
        Ring {
            state: Mutex::new(RingState { active: 0, urls }),
        }
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.lock().urls.clone()
    }

    pub(crate) fn active_url(&self) -> Option<String> {
        let state = self.lock();
        state.urls.get(state.active).cloned()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().urls.is_empty()
    }

    /// Point at the given URL if it is a known candidate.
    pub(crate) fn set_active(&self, url: &str) -> bool {
        let mut state = self.lock();
        match state.urls.iter().position(|candidate| candidate == url) {
            Some(index) => {
                state.active = index;
                true
            }
            None => false,
        }
    }

    /// Advance the pointer if `url` is the current active URL.
    ///
    /// Returns the new active URL when the ring advanced, `None` for
    /// stale reports and empty rings.
    pub(crate) fn advance_if_active(&self, url: &str) -> Option<String> {
        let mut state = self.lock();
        let active = state.urls.get(state.active)?;
        if active != url {
            return None;
        }
        state.active = (state.active + 1) % state.urls.len();
        state.urls.get(state.active).cloned()
    }

    /// Swap in a freshly discovered candidate list.
    ///
    /// The pointer is re-anchored to the head of the new list: membership
    /// order from the coordination service is the only signal of which
    /// endpoint should be preferred.
    pub(crate) fn replace(&self, urls: Vec<String>) {
        let mut state = self.lock();
        state.urls = urls;
        state.active = 0;
    }

    fn lock(&self) -> std::sync::MutexGuard<RingState> {
        self.state.lock().expect("URL ring lock was poisoned")
    }
}

/// Generic ring manager over a statically supplied URL list.
pub struct DefaultUrlManager {
    logger: Logger,
    ring: Ring,
    service: String,
}

impl DefaultUrlManager {
    pub fn new<S: Into<String>>(service: S, urls: Vec<String>, logger: Logger) -> DefaultUrlManager {
        DefaultUrlManager {
            logger,
            ring: Ring::new(urls),
            service: service.into(),
        }
    }
}

impl UrlManager for DefaultUrlManager {
    fn urls(&self) -> Vec<String> {
        self.ring.urls()
    }

    fn active_url(&self) -> Option<String> {
        self.ring.active_url()
    }

    fn set_active_url(&self, url: &str) {
        if !self.ring.set_active(url) {
            warn!(
                self.logger,
                "Refusing to activate URL not in the candidate list";
                "service" => &self.service,
                "url" => url
            );
        }
    }

    fn mark_failed(&self, url: &str) {
        if let Some(next) = self.ring.advance_if_active(url) {
            FAILOVER_TOTAL.with_label_values(&[self.service.as_str()]).inc();
            info!(
                self.logger,
                "Failing over to next candidate URL";
                "service" => &self.service,
                "failed" => url,
                "active" => next
            );
        }
    }
}
