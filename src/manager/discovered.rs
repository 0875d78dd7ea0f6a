use slog::info;
use slog::warn;
use slog::Logger;

use crate::discovery::CandidateSource;
use crate::metrics::DISCOVERY_ERRORS;
use crate::metrics::DISCOVERY_TOTAL;
use crate::metrics::FAILOVER_TOTAL;

use super::Ring;
use super::UrlManager;

/// Ring manager whose candidate list is discovered from a coordination service.
///
/// The same component serves every discovery family: the source decides how
/// a coordination service layout is turned into URLs, this manager owns the
/// ring semantics around the returned list.
pub struct DiscoveredUrlManager {
    logger: Logger,
    ring: Ring,
    service: String,
    source: Box<dyn CandidateSource>,
}

impl DiscoveredUrlManager {
    pub fn new<S: Into<String>>(
        service: S,
        source: Box<dyn CandidateSource>,
        logger: Logger,
    ) -> DiscoveredUrlManager {
        DiscoveredUrlManager {
            logger,
            ring: Ring::new(Vec::new()),
            service: service.into(),
            source,
        }
    }

    /// Re-query the source and swap the fresh list into the ring.
    ///
    /// Returns `false` when the refresh failed or found no candidates,
    /// in which case the last known list is left in place so a reachable
    /// backend is not spuriously disabled by a coordination outage.
    fn refresh(&self) -> bool {
        DISCOVERY_TOTAL.with_label_values(&[self.service.as_str()]).inc();
        match self.source.candidates() {
            Ok(urls) if !urls.is_empty() => {
                self.ring.replace(urls);
                true
            }
            Ok(_) => false,
            Err(error) => {
                DISCOVERY_ERRORS.with_label_values(&[self.service.as_str()]).inc();
                warn!(
                    self.logger,
                    "Candidate URL refresh failed, keeping last known list";
                    "service" => &self.service,
                    "error" => %error
                );
                false
            }
        }
    }
}

impl UrlManager for DiscoveredUrlManager {
    fn urls(&self) -> Vec<String> {
        if self.ring.is_empty() {
            self.refresh();
        }
        self.ring.urls()
    }

    fn active_url(&self) -> Option<String> {
        if self.ring.is_empty() {
            self.refresh();
        }
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
        let active = self.ring.active_url();
        if active.as_deref() != Some(url) {
            return;
        }
        // The coordination service is the authority on membership: prefer a
        // fresh list over blind rotation, fall back to the ring when the
        // refresh fails or comes back empty.
        if self.refresh() {
            let active = self.ring.active_url();
            if active.as_deref() != Some(url) {
                FAILOVER_TOTAL.with_label_values(&[self.service.as_str()]).inc();
            }
            info!(
                self.logger,
                "Re-discovered candidate URLs after reported failure";
                "service" => &self.service,
                "failed" => url,
                "active" => active
            );
        } else if let Some(next) = self.ring.advance_if_active(url) {
            FAILOVER_TOTAL.with_label_values(&[self.service.as_str()]).inc();
            info!(
                self.logger,
                "Failing over within last known candidate URLs";
                "service" => &self.service,
                "failed" => url,
                "active" => next
            );
        }
    }
}
