// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Rule dispatch ordering.
//!
//! The dispatcher turns each fact into an ordered list of candidate
//! rule keys and asks the injected rule engine to evaluate them until
//! one succeeds. Exhausting the chain is not an error, it only means
//! no rule cared about this fact.

use tracing::debug;

use crate::almanac::AlmanacLedger;
use crate::fact::Fact;

/// A control action the rule engine decided on while evaluating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlDirective {
    Start {
        point: String,
        pulse: u32,
        reason: String,
    },
    /// `point: None` stops every control with a pending deadline.
    Cancel {
        point: Option<String>,
        reason: String,
    },
}

/// The external rule-evaluation collaborator. Its internal language is
/// irrelevant here; it is consumed strictly as an injected capability.
pub trait RuleEngine {
    /// True once the rule set has been loaded at least once.
    fn loaded(&self) -> bool;

    /// Side-channel state record, so rules can query the last action
    /// of an event even when no specific rule key matches it.
    fn record_event_state(&mut self, category: &str, name: &str, action: &str);

    /// Evaluate one candidate key with its parameters. Returns whether
    /// a rule matched successfully.
    fn evaluate(&mut self, key: &str, params: &[&str]) -> bool;

    /// Drain the control directives accumulated by successful
    /// evaluations since the last call.
    fn take_directives(&mut self) -> Vec<ControlDirective>;
}

/// Builds candidate keys per fact and drives the engine.
#[derive(Debug)]
pub struct RuleDispatcher<E> {
    engine: E,
}

impl<E: RuleEngine> RuleDispatcher<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Automation must not fire before the rule set is loaded and the
    /// almanac produced usable day/night boundaries.
    pub fn ready(&self, almanac: &AlmanacLedger) -> bool {
        self.engine.loaded() && almanac.ready()
    }

    pub fn take_directives(&mut self) -> Vec<ControlDirective> {
        self.engine.take_directives()
    }

    /// Dispatch one fact. Returns whether any candidate key matched.
    pub fn dispatch(&mut self, fact: &Fact) -> bool {
        match fact {
            Fact::Event {
                category,
                name,
                action,
            } => {
                if !action.is_empty() {
                    self.engine.record_event_state(category, name, action);
                }
                self.try_keys(&[
                    (format!("EVENT.{}.{}.{}", category, name, action), vec![]),
                    (format!("EVENT.{}.{}", category, name), vec![action.as_str()]),
                    (
                        format!("EVENT.{}", category),
                        vec![name.as_str(), action.as_str()],
                    ),
                ])
            }
            Fact::Sensor {
                location,
                name,
                value,
            } => self.try_keys(&[
                (format!("SENSOR.{}.{}", location, name), vec![value.as_str()]),
                (
                    format!("SENSOR.{}", location),
                    vec![name.as_str(), value.as_str()],
                ),
            ]),
            Fact::ControlChange { name, state } => {
                self.try_keys(&[(format!("POINT.{}", name), vec![state.as_str()])])
            }
        }
    }

    fn try_keys(&mut self, candidates: &[(String, Vec<&str>)]) -> bool {
        for (key, params) in candidates {
            debug!("Applying rule {}", key);
            if self.engine.evaluate(key, params) {
                return true;
            }
            debug!("Rule {} did not match", key);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine double recording every call, succeeding on one key.
    #[derive(Default)]
    struct ScriptedEngine {
        loaded: bool,
        succeed_on: Option<String>,
        evaluated: Vec<(String, Vec<String>)>,
        recorded: Vec<(String, String, String)>,
    }

    impl RuleEngine for ScriptedEngine {
        fn loaded(&self) -> bool {
            self.loaded
        }

        fn record_event_state(&mut self, category: &str, name: &str, action: &str) {
            self.recorded
                .push((category.to_string(), name.to_string(), action.to_string()));
        }

        fn evaluate(&mut self, key: &str, params: &[&str]) -> bool {
            self.evaluated.push((
                key.to_string(),
                params.iter().map(|p| p.to_string()).collect(),
            ));
            self.succeed_on.as_deref() == Some(key)
        }

        fn take_directives(&mut self) -> Vec<ControlDirective> {
            Vec::new()
        }
    }

    fn event(category: &str, name: &str, action: &str) -> Fact {
        Fact::Event {
            category: category.to_string(),
            name: name.to_string(),
            action: action.to_string(),
        }
    }

    #[test]
    fn test_event_chain_tries_all_keys_in_order() {
        let mut dispatcher = RuleDispatcher::new(ScriptedEngine::default());
        assert!(!dispatcher.dispatch(&event("SENSOR", "door", "open")));

        let engine = &dispatcher.engine;
        assert_eq!(
            engine.evaluated,
            vec![
                ("EVENT.SENSOR.door.open".to_string(), vec![]),
                ("EVENT.SENSOR.door".to_string(), vec!["open".to_string()]),
                (
                    "EVENT.SENSOR".to_string(),
                    vec!["door".to_string(), "open".to_string()]
                ),
            ]
        );
        // The bare fact was recorded regardless of rule outcomes.
        assert_eq!(
            engine.recorded,
            vec![(
                "SENSOR".to_string(),
                "door".to_string(),
                "open".to_string()
            )]
        );
    }

    #[test]
    fn test_event_chain_stops_at_first_success() {
        let mut engine = ScriptedEngine::default();
        engine.succeed_on = Some("EVENT.SENSOR.door".to_string());
        let mut dispatcher = RuleDispatcher::new(engine);
        assert!(dispatcher.dispatch(&event("SENSOR", "door", "open")));
        assert_eq!(dispatcher.engine.evaluated.len(), 2);
    }

    #[test]
    fn test_event_without_action_skips_state_record() {
        let mut dispatcher = RuleDispatcher::new(ScriptedEngine::default());
        dispatcher.dispatch(&event("SENSOR", "door", ""));
        assert!(dispatcher.engine.recorded.is_empty());
    }

    #[test]
    fn test_sensor_chain() {
        let mut dispatcher = RuleDispatcher::new(ScriptedEngine::default());
        assert!(!dispatcher.dispatch(&Fact::Sensor {
            location: "attic".to_string(),
            name: "temp".to_string(),
            value: "21".to_string(),
        }));
        assert_eq!(
            dispatcher.engine.evaluated,
            vec![
                ("SENSOR.attic.temp".to_string(), vec!["21".to_string()]),
                (
                    "SENSOR.attic".to_string(),
                    vec!["temp".to_string(), "21".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn test_control_change_single_attempt() {
        let mut dispatcher = RuleDispatcher::new(ScriptedEngine::default());
        assert!(!dispatcher.dispatch(&Fact::ControlChange {
            name: "porch".to_string(),
            state: "on".to_string(),
        }));
        assert_eq!(
            dispatcher.engine.evaluated,
            vec![("POINT.porch".to_string(), vec!["on".to_string()])]
        );
    }

    #[test]
    fn test_ready_requires_rules_and_almanac() {
        let mut almanac = AlmanacLedger::new();
        let mut engine = ScriptedEngine::default();
        engine.loaded = true;
        let dispatcher = RuleDispatcher::new(engine);
        assert!(!dispatcher.ready(&almanac));

        almanac.on_night(
            "http://almanac",
            Ok(crate::almanac::AlmanacNight {
                priority: 1,
                sunrise: 2_000,
                sunset: 1_000,
                timezone: None,
                latitude: None,
                longitude: None,
            }),
            100,
        );
        assert!(dispatcher.ready(&almanac));
    }
}
