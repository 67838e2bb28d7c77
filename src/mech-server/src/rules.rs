// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Table-driven rule engine.
//!
//! A minimal backend for the rule-evaluation contract: a TOML table
//! maps candidate keys to control directives. The dispatcher does not
//! know or care that this backend has no scripting language; a real
//! one slots in behind the same trait.
//!
//! Rule table format:
//!
//! ```toml
//! [[rule]]
//! key = "EVENT.SENSOR.door.open"
//! [rule.start]
//! point = "porch-light"
//! pulse = 300
//! reason = "door opened"
//!
//! [[rule]]
//! key = "POINT.water-valve"
//! [rule.cancel]
//! reason = "valve changed state"
//! ```
//!
//! A rule with neither `start` nor `cancel` still counts as a match
//! and stops the dispatcher's fallback chain.

use std::collections::HashMap;
use std::mem;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use mech_core::rule::{ControlDirective, RuleEngine};
use mech_core::DynResult;

fn default_reason() -> String {
    "MECH RULE".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct StartSpec {
    point: String,
    #[serde(default)]
    pulse: u32,
    #[serde(default = "default_reason")]
    reason: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CancelSpec {
    /// Omitted point means all-stop.
    #[serde(default)]
    point: Option<String>,
    #[serde(default = "default_reason")]
    reason: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RuleSpec {
    key: String,
    #[serde(default)]
    start: Option<StartSpec>,
    #[serde(default)]
    cancel: Option<CancelSpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rule: Vec<RuleSpec>,
}

/// Rule engine backed by a static key table.
#[derive(Debug, Default)]
pub struct TableRuleEngine {
    rules: HashMap<String, Vec<RuleSpec>>,
    loaded: bool,
    last_actions: HashMap<(String, String), String>,
    directives: Vec<ControlDirective>,
}

impl TableRuleEngine {
    /// Engine with no rules at all. Every fact falls through the
    /// dispatcher unanswered, but feeds still advance.
    pub fn empty() -> Self {
        Self {
            loaded: true,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> DynResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut engine = Self::from_toml_str(&text)?;
        engine.loaded = true;
        info!(
            "Loaded {} automation rules from {}",
            engine.rules.values().map(Vec::len).sum::<usize>(),
            path.display()
        );
        Ok(engine)
    }

    fn from_toml_str(text: &str) -> DynResult<Self> {
        let file: RulesFile = toml::from_str(text)?;
        let mut rules: HashMap<String, Vec<RuleSpec>> = HashMap::new();
        for spec in file.rule {
            rules.entry(spec.key.clone()).or_default().push(spec);
        }
        Ok(Self {
            rules,
            ..Self::default()
        })
    }

    /// Last recorded action for an event, from the side channel.
    pub fn last_action(&self, category: &str, name: &str) -> Option<&str> {
        self.last_actions
            .get(&(category.to_string(), name.to_string()))
            .map(String::as_str)
    }
}

impl RuleEngine for TableRuleEngine {
    fn loaded(&self) -> bool {
        self.loaded
    }

    fn record_event_state(&mut self, category: &str, name: &str, action: &str) {
        self.last_actions.insert(
            (category.to_string(), name.to_string()),
            action.to_string(),
        );
    }

    fn evaluate(&mut self, key: &str, _params: &[&str]) -> bool {
        let Some(specs) = self.rules.get(key) else {
            return false;
        };
        for spec in specs {
            if let Some(start) = &spec.start {
                debug!("Rule {} starts {}", key, start.point);
                self.directives.push(ControlDirective::Start {
                    point: start.point.clone(),
                    pulse: start.pulse,
                    reason: start.reason.clone(),
                });
            }
            if let Some(cancel) = &spec.cancel {
                self.directives.push(ControlDirective::Cancel {
                    point: cancel.point.clone(),
                    reason: cancel.reason.clone(),
                });
            }
        }
        true
    }

    fn take_directives(&mut self) -> Vec<ControlDirective> {
        mem::take(&mut self.directives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
[[rule]]
key = "EVENT.SENSOR.door.open"
[rule.start]
point = "porch-light"
pulse = 300
reason = "door opened"

[[rule]]
key = "SENSOR.attic.temp"
[rule.cancel]
point = "attic-fan"

[[rule]]
key = "EVENT.ALERT"
[rule.cancel]
reason = "alert received"
"#;

    #[test]
    fn test_matching_key_yields_directives() {
        let mut engine = TableRuleEngine::from_toml_str(TABLE).unwrap();
        assert!(engine.evaluate("EVENT.SENSOR.door.open", &[]));
        assert_eq!(
            engine.take_directives(),
            vec![ControlDirective::Start {
                point: "porch-light".to_string(),
                pulse: 300,
                reason: "door opened".to_string(),
            }]
        );
        // Drained.
        assert!(engine.take_directives().is_empty());
    }

    #[test]
    fn test_unmatched_key_fails() {
        let mut engine = TableRuleEngine::from_toml_str(TABLE).unwrap();
        assert!(!engine.evaluate("EVENT.SENSOR.door", &["open"]));
        assert!(engine.take_directives().is_empty());
    }

    #[test]
    fn test_cancel_without_point_is_all_stop() {
        let mut engine = TableRuleEngine::from_toml_str(TABLE).unwrap();
        assert!(engine.evaluate("EVENT.ALERT", &["siren", "on"]));
        assert_eq!(
            engine.take_directives(),
            vec![ControlDirective::Cancel {
                point: None,
                reason: "alert received".to_string(),
            }]
        );
    }

    #[test]
    fn test_record_event_state_side_channel() {
        let mut engine = TableRuleEngine::empty();
        engine.record_event_state("SENSOR", "door", "open");
        assert_eq!(engine.last_action("SENSOR", "door"), Some("open"));
        engine.record_event_state("SENSOR", "door", "closed");
        assert_eq!(engine.last_action("SENSOR", "door"), Some("closed"));
    }

    #[test]
    fn test_empty_engine_reports_loaded() {
        let engine = TableRuleEngine::empty();
        assert!(engine.loaded());
        let parsed = TableRuleEngine::from_toml_str(TABLE).unwrap();
        assert!(!parsed.loaded()); // load() flips it after a real read
    }

    #[test]
    fn test_default_reason_applied() {
        let mut engine = TableRuleEngine::from_toml_str(TABLE).unwrap();
        engine.evaluate("SENSOR.attic.temp", &["30"]);
        assert_eq!(
            engine.take_directives(),
            vec![ControlDirective::Cancel {
                point: Some("attic-fan".to_string()),
                reason: "MECH RULE".to_string(),
            }]
        );
    }
}
