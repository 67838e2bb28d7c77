// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::duration;
use crate::fact::Fact;
use crate::transport::{OutboundRequest, PeerError, Transport};

use super::point::{Activation, Control};

/// One control point entry of an actuator status document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointStatus {
    pub name: String,
    pub state: Option<String>,
}

/// Status-document row for one control point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSnapshot {
    pub name: String,
    pub activation: char,
    pub url: String,
    pub remaining: i64,
}

/// Owns every known control point and drives actuation against the
/// control servers.
#[derive(Debug, Default)]
pub struct ControlRegistry {
    controls: BTreeMap<String, Control>,
    any_active: bool,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, name: &str) -> &mut Control {
        self.controls
            .entry(name.to_string())
            .or_insert_with(Control::default)
    }

    /// The existing entry for `name`, creating an unknown one when this
    /// point was never seen before.
    pub fn lookup_or_create(&mut self, name: &str) -> &Control {
        self.ensure(name)
    }

    pub fn get(&self, name: &str) -> Option<&Control> {
        self.controls.get(name)
    }

    /// True once at least one control point is known. Rule execution is
    /// delayed until the actuation layer is usable.
    pub fn ready(&self) -> bool {
        !self.controls.is_empty()
    }

    /// Cached remote state of a point, or an empty string if it was
    /// never observed.
    pub fn state(&self, name: &str) -> &str {
        self.controls
            .get(name)
            .and_then(|control| control.state.as_deref())
            .unwrap_or("")
    }

    /// Record which actuator server answered for this point. A changed
    /// routing URL invalidates the activation state until fresh state
    /// arrives.
    pub fn update_routing(&mut self, name: &str, provider: &str) {
        let control = self.ensure(name);
        if control.routing_url != provider {
            control.routing_url = provider.to_string();
            control.activation = Activation::Unknown;
            info!("Control {} routed to {}", name, provider);
        }
    }

    /// Reconcile the state reported by the actuator server. Returns the
    /// change fact to dispatch when a previously observed state
    /// differs; the first sighting is recorded silently.
    pub fn update_remote_state(&mut self, name: &str, state: &str) -> Option<Fact> {
        let control = self.ensure(name);
        match control.state.as_deref() {
            Some(previous) if previous != state => {
                debug!(
                    "Control {} reported state {} (previous {})",
                    name, state, previous
                );
                let fact = Fact::ControlChange {
                    name: name.to_string(),
                    state: state.to_string(),
                };
                control.state = Some(state.to_string());
                Some(fact)
            }
            Some(_) => None,
            None => {
                control.state = Some(state.to_string());
                None
            }
        }
    }

    /// Apply one actuator status document: every listed point is routed
    /// to the server that answered, then its state is reconciled.
    /// Returns the change facts to dispatch.
    pub fn ingest_status(&mut self, provider: &str, points: &[PointStatus]) -> Vec<Fact> {
        let mut facts = Vec::new();
        for point in points {
            self.update_routing(&point.name, provider);
            if let Some(state) = &point.state {
                if let Some(fact) = self.update_remote_state(&point.name, state) {
                    facts.push(fact);
                }
            }
        }
        facts
    }

    /// Activate one control, for `pulse` seconds when positive or
    /// steady-on when zero. Returns `false` without touching activation
    /// state when the point has no known routing URL or the request
    /// cannot be issued.
    pub fn start(
        &mut self,
        name: &str,
        pulse: u32,
        reason: &str,
        now: i64,
        transport: &dyn Transport,
    ) -> bool {
        self.ensure(name);
        let url = match self.controls.get(name) {
            Some(control) if !control.routing_url.is_empty() => control.routing_url.clone(),
            _ => {
                info!("Control {} unknown", name);
                return false;
            }
        };

        if pulse > 0 {
            info!(
                "Control {} activated for {} using {} ({})",
                name,
                duration::printable(pulse as i64),
                url,
                reason
            );
        } else {
            info!("Control {} activated using {} ({})", name, url, reason);
        }

        let request = OutboundRequest::Actuate {
            url: url.clone(),
            point: name.to_string(),
            on: true,
            pulse,
            cause: reason.to_string(),
        };
        if let Err(error) = transport.submit(request) {
            warn!("Control {}: cannot issue activation via {}: {}", name, url, error);
            return false;
        }

        if let Some(control) = self.controls.get_mut(name) {
            if pulse > 0 {
                control.deadline = Some(now + pulse as i64);
            }
            control.activation = Activation::Active;
        }
        self.any_active = true;
        true
    }

    fn stop(name: &str, control: &mut Control, reason: &str, transport: &dyn Transport) {
        if control.routing_url.is_empty() {
            return;
        }
        let request = OutboundRequest::Actuate {
            url: control.routing_url.clone(),
            point: name.to_string(),
            on: false,
            pulse: 0,
            cause: reason.to_string(),
        };
        if let Err(error) = transport.submit(request) {
            warn!(
                "Control {}: cannot issue deactivation via {}: {}",
                name, control.routing_url, error
            );
            return;
        }
        control.activation = Activation::Inactive;
    }

    /// Stop one control, or every control with a pending deadline when
    /// `name` is `None` (the bulk all-stop for shutdown or reset).
    pub fn cancel(&mut self, name: Option<&str>, reason: &str, transport: &dyn Transport) {
        match name {
            Some(name) => {
                self.ensure(name);
                let Some(control) = self.controls.get_mut(name) else {
                    return;
                };
                if control.routing_url.is_empty() {
                    return;
                }
                info!(
                    "Control {} canceled using {} ({})",
                    name, control.routing_url, reason
                );
                Self::stop(name, control, reason, transport);
                control.deadline = None;
            }
            None => {
                for (name, control) in self.controls.iter_mut() {
                    if control.deadline.is_some() {
                        Self::stop(name, control, reason, transport);
                        control.deadline = None;
                    }
                }
                self.any_active = false;
            }
        }
    }

    /// Expire pulsed activations whose deadline passed. No deactivate
    /// request is sent: a timed pulse clears itself on the actuator
    /// side. Idles once no deadline remains, until the next `start`.
    pub fn sweep(&mut self, now: i64) {
        if !self.any_active {
            return;
        }
        self.any_active = false;
        for control in self.controls.values_mut() {
            if let Some(deadline) = control.deadline {
                if deadline < now {
                    control.deadline = None;
                    control.activation = Activation::Inactive;
                } else {
                    self.any_active = true;
                }
            }
        }
    }

    /// Issue a status scan to every discovered control server.
    pub fn scan(&self, providers: &[String], transport: &dyn Transport) {
        for provider in providers {
            let request = OutboundRequest::ControlScan {
                provider: provider.clone(),
            };
            if let Err(error) = transport.submit(request) {
                warn!("Control scan of {}: {}", provider, error);
            }
        }
    }

    /// Record a failed actuation exchange. Logged only on the
    /// transition into the error state to avoid log storms.
    pub fn actuation_failed(&mut self, point: &str, error: &PeerError) {
        let control = self.ensure(point);
        if control.activation != Activation::Error {
            warn!("Control {}: {}", point, error);
        }
        control.activation = Activation::Error;
        control.deadline = None;
    }

    /// Per-control rows for the status document.
    pub fn snapshot(&self, now: i64) -> Vec<ControlSnapshot> {
        self.controls
            .iter()
            .map(|(name, control)| ControlSnapshot {
                name: name.clone(),
                activation: control.activation.code(),
                url: control.routing_url.clone(),
                remaining: match (control.activation, control.deadline) {
                    (Activation::Active, Some(deadline)) => (deadline - now).max(0),
                    _ => 0,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::tests::RecordingTransport;

    fn routed(registry: &mut ControlRegistry, name: &str, url: &str) {
        registry.update_routing(name, url);
    }

    #[test]
    fn test_start_without_routing_fails() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        assert!(!registry.start("porch", 30, "test", 100, &transport));
        assert!(transport.take().is_empty());
        assert_eq!(
            registry.get("porch").map(|c| c.activation()),
            Some(Activation::Unknown)
        );
    }

    #[test]
    fn test_start_with_pulse_sets_deadline() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        assert!(registry.start("porch", 30, "door opened", 100, &transport));

        let control = registry.get("porch").unwrap();
        assert_eq!(control.activation(), Activation::Active);
        assert_eq!(control.deadline(), Some(130));

        let submitted = transport.take();
        assert_eq!(
            submitted,
            vec![OutboundRequest::Actuate {
                url: "http://relay".to_string(),
                point: "porch".to_string(),
                on: true,
                pulse: 30,
                cause: "door opened".to_string(),
            }]
        );
    }

    #[test]
    fn test_start_steady_on_leaves_deadline_unset() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        assert!(registry.start("porch", 0, "manual", 100, &transport));
        assert_eq!(registry.get("porch").unwrap().deadline(), None);
        assert_eq!(
            registry.get("porch").unwrap().activation(),
            Activation::Active
        );
    }

    #[test]
    fn test_start_submit_failure_does_not_mutate() {
        let transport = RecordingTransport::refusing();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        assert!(!registry.start("porch", 30, "test", 100, &transport));
        let control = registry.get("porch").unwrap();
        assert_eq!(control.activation(), Activation::Unknown);
        assert_eq!(control.deadline(), None);
    }

    #[test]
    fn test_sweep_expires_deadline() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        registry.start("porch", 30, "test", 100, &transport);

        registry.sweep(120); // not yet expired
        assert_eq!(registry.get("porch").unwrap().activation(), Activation::Active);

        registry.sweep(131);
        let control = registry.get("porch").unwrap();
        assert_eq!(control.activation(), Activation::Inactive);
        assert_eq!(control.deadline(), None);

        // No deactivation was sent: the pulse expires remotely.
        assert_eq!(transport.take().len(), 1);
    }

    #[test]
    fn test_sweep_idles_until_next_start() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        registry.start("porch", 10, "test", 100, &transport);
        registry.sweep(111);
        // Registry is idle now; further sweeps are no-ops.
        registry.sweep(200);
        assert_eq!(registry.get("porch").unwrap().activation(), Activation::Inactive);
    }

    #[test]
    fn test_cancel_named_clears_deadline() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        registry.start("porch", 30, "test", 100, &transport);
        transport.take();

        registry.cancel(Some("porch"), "reset", &transport);
        let control = registry.get("porch").unwrap();
        assert_eq!(control.deadline(), None);
        assert_eq!(control.activation(), Activation::Inactive);
        assert_eq!(
            transport.take(),
            vec![OutboundRequest::Actuate {
                url: "http://relay".to_string(),
                point: "porch".to_string(),
                on: false,
                pulse: 0,
                cause: "reset".to_string(),
            }]
        );
    }

    #[test]
    fn test_cancel_all_stops_only_pending_deadlines() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        routed(&mut registry, "garage", "http://relay");
        routed(&mut registry, "shed", "http://relay");
        registry.start("porch", 30, "test", 100, &transport);
        registry.start("garage", 60, "test", 100, &transport);
        transport.take();

        registry.cancel(None, "all stop", &transport);
        let stopped: Vec<_> = transport
            .take()
            .into_iter()
            .map(|request| match request {
                OutboundRequest::Actuate { point, on, .. } => (point, on),
                other => panic!("unexpected request {:?}", other),
            })
            .collect();
        assert_eq!(
            stopped,
            vec![("garage".to_string(), false), ("porch".to_string(), false)]
        );
        assert_eq!(registry.get("porch").unwrap().deadline(), None);
        assert_eq!(registry.get("garage").unwrap().deadline(), None);
    }

    #[test]
    fn test_remote_state_change_yields_fact_once() {
        let mut registry = ControlRegistry::new();
        // Initial discovery records silently.
        assert_eq!(registry.update_remote_state("porch", "off"), None);
        // A transition forwards one fact.
        assert_eq!(
            registry.update_remote_state("porch", "on"),
            Some(Fact::ControlChange {
                name: "porch".to_string(),
                state: "on".to_string(),
            })
        );
        // Unchanged state stays silent.
        assert_eq!(registry.update_remote_state("porch", "on"), None);
        assert_eq!(registry.state("porch"), "on");
    }

    #[test]
    fn test_ingest_status_routes_and_reconciles() {
        let mut registry = ControlRegistry::new();
        assert!(!registry.ready());

        let points = vec![
            PointStatus {
                name: "porch".to_string(),
                state: Some("off".to_string()),
            },
            PointStatus {
                name: "garage".to_string(),
                state: None,
            },
        ];
        let facts = registry.ingest_status("http://relay", &points);
        assert!(facts.is_empty());
        assert!(registry.ready());
        assert_eq!(registry.get("porch").unwrap().routing_url(), "http://relay");

        // Second document from another server takes over routing and
        // reports a changed state.
        let points = vec![PointStatus {
            name: "porch".to_string(),
            state: Some("on".to_string()),
        }];
        let facts = registry.ingest_status("http://relay2", &points);
        assert_eq!(facts.len(), 1);
        assert_eq!(registry.get("porch").unwrap().routing_url(), "http://relay2");
    }

    #[test]
    fn test_actuation_failure_marks_error() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        registry.start("porch", 30, "test", 100, &transport);

        registry.actuation_failed("porch", &PeerError::Status(503));
        let control = registry.get("porch").unwrap();
        assert_eq!(control.activation(), Activation::Error);
        assert_eq!(control.deadline(), None);
    }

    #[test]
    fn test_snapshot_reports_remaining_seconds() {
        let transport = RecordingTransport::default();
        let mut registry = ControlRegistry::new();
        routed(&mut registry, "porch", "http://relay");
        registry.start("porch", 30, "test", 100, &transport);

        let rows = registry.snapshot(110);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "porch");
        assert_eq!(rows[0].activation, 'a');
        assert_eq!(rows[0].url, "http://relay");
        assert_eq!(rows[0].remaining, 20);
    }

    #[test]
    fn test_state_of_unknown_point_is_empty() {
        let registry = ControlRegistry::new();
        assert_eq!(registry.state("nope"), "");
    }
}
