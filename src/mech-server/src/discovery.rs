// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration-seeded discovery.
//!
//! The discovery mechanism proper is an external collaborator; this
//! implementation serves the provider lists from the config file
//! unchanged. The [`Discovery`] trait is the seam where a live
//! discovery client would plug in.

use std::collections::HashMap;

use mech_core::Discovery;

use crate::config::DiscoveryConfig;

pub struct StaticDiscovery {
    seeds: HashMap<String, Vec<String>>,
}

impl StaticDiscovery {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        let mut seeds = HashMap::new();
        seeds.insert("control".to_string(), config.control.clone());
        seeds.insert("history".to_string(), config.history.clone());
        seeds.insert("almanac".to_string(), config.almanac.clone());
        Self { seeds }
    }
}

impl Discovery for StaticDiscovery {
    fn list(&self, capability: &str) -> Vec<String> {
        self.seeds.get(capability).cloned().unwrap_or_default()
    }

    fn changed_since(&self, _capability: &str, _since: i64) -> bool {
        false // Static seeds never change.
    }
}
