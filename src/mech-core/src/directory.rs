// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-capability provider directory.
//!
//! The directory caches the most recently discovered provider URLs for
//! one capability name ("control", "history", "almanac"). On refresh
//! the previous list is discarded in full before repopulating, so a
//! provider that vanished can never be contacted through a stale
//! handle. In-flight responses keyed by provider identity tolerate the
//! snapshot changing while they are outstanding.

/// Discovery collaborator contract. The mechanism that produces these
/// lists lives outside the coordination core.
pub trait Discovery {
    /// Current provider base URLs for a capability, in discovery order.
    fn list(&self, capability: &str) -> Vec<String>;

    /// Whether the provider set for a capability changed since `since`
    /// (unix seconds).
    fn changed_since(&self, capability: &str, since: i64) -> bool;
}

/// Seconds between routine refreshes even when discovery reports no
/// change, to pick up provider-side configuration changes.
const REFRESH_INTERVAL: i64 = 2;

/// Most recently discovered providers for one capability.
#[derive(Debug)]
pub struct ProviderDirectory {
    capability: String,
    providers: Vec<String>,
    last_refresh: i64,
}

impl ProviderDirectory {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            providers: Vec::new(),
            last_refresh: 0,
        }
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Current snapshot. Full replacement on refresh keeps iteration
    /// over this slice consistent within one tick.
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// Force the next `refresh` call to rebuild regardless of cadence.
    pub fn force(&mut self) {
        self.last_refresh = 0;
    }

    /// Rebuild the provider list when discovery reports a change since
    /// the last refresh, or when the routine interval elapsed. Returns
    /// `true` when a rebuild happened so the caller can launch a scan.
    pub fn refresh(&mut self, discovery: &dyn Discovery, now: i64) -> bool {
        let mut due = self.last_refresh;
        if due > 0 && discovery.changed_since(&self.capability, due) {
            due = 0;
        }
        if now <= due + REFRESH_INTERVAL {
            return false;
        }
        self.last_refresh = now;

        self.providers = discovery.list(&self.capability);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeDiscovery {
        providers: Vec<String>,
        changed: Cell<bool>,
    }

    impl FakeDiscovery {
        fn new(providers: &[&str]) -> Self {
            Self {
                providers: providers.iter().map(|s| s.to_string()).collect(),
                changed: Cell::new(false),
            }
        }
    }

    impl Discovery for FakeDiscovery {
        fn list(&self, _capability: &str) -> Vec<String> {
            self.providers.clone()
        }

        fn changed_since(&self, _capability: &str, _since: i64) -> bool {
            self.changed.get()
        }
    }

    #[test]
    fn test_first_refresh_populates() {
        let discovery = FakeDiscovery::new(&["http://a", "http://b"]);
        let mut dir = ProviderDirectory::new("control");
        assert!(dir.refresh(&discovery, 100));
        assert_eq!(dir.providers(), ["http://a", "http://b"]);
    }

    #[test]
    fn test_refresh_respects_interval() {
        let discovery = FakeDiscovery::new(&["http://a"]);
        let mut dir = ProviderDirectory::new("control");
        assert!(dir.refresh(&discovery, 100));
        assert!(!dir.refresh(&discovery, 101));
        assert!(!dir.refresh(&discovery, 102));
        assert!(dir.refresh(&discovery, 103));
    }

    #[test]
    fn test_discovery_change_forces_refresh() {
        let discovery = FakeDiscovery::new(&["http://a"]);
        let mut dir = ProviderDirectory::new("control");
        assert!(dir.refresh(&discovery, 100));
        discovery.changed.set(true);
        assert!(dir.refresh(&discovery, 101));
    }

    #[test]
    fn test_vanished_provider_dropped_in_full() {
        let mut discovery = FakeDiscovery::new(&["http://a", "http://b"]);
        let mut dir = ProviderDirectory::new("control");
        dir.refresh(&discovery, 100);
        discovery.providers = vec!["http://b".to_string()];
        assert!(dir.refresh(&discovery, 103));
        assert_eq!(dir.providers(), ["http://b"]);
    }

    #[test]
    fn test_force_overrides_cadence() {
        let discovery = FakeDiscovery::new(&["http://a"]);
        let mut dir = ProviderDirectory::new("history");
        assert!(dir.refresh(&discovery, 100));
        dir.force();
        assert!(dir.refresh(&discovery, 101));
    }
}
