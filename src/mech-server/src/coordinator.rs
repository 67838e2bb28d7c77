// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The coordination loop.
//!
//! One task owns every piece of mutable state (registry, tailers,
//! dispatcher, directories, almanac) so nothing needs a lock. The loop
//! alternates between a once-per-second tick and completions from the
//! transport; within one tick the components run in a fixed order so
//! a deadline expiry is visible to the same tick's rule evaluation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{info, warn};

use mech_core::feed::StreamId;
use mech_core::rule::{ControlDirective, RuleEngine};
use mech_core::transport::Origin;
use mech_core::{
    AlmanacLedger, ControlRegistry, Discovery, Fact, FeedTailer, ProviderDirectory, RuleDispatcher,
};
use mech_protocol::{parse_control_status, parse_latest, parse_night, parse_records};
use mech_protocol::StatusSnapshot;

use crate::transport::{Completion, ReqwestTransport};

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub struct Coordinator<E> {
    host: String,
    registry: ControlRegistry,
    events: FeedTailer,
    sensors: FeedTailer,
    dispatcher: RuleDispatcher<E>,
    almanac: AlmanacLedger,
    control_dir: ProviderDirectory,
    history_dir: ProviderDirectory,
    almanac_dir: ProviderDirectory,
    discovery: Box<dyn Discovery + Send>,
    transport: ReqwestTransport,
    status_tx: watch::Sender<StatusSnapshot>,
}

impl<E: RuleEngine> Coordinator<E> {
    pub fn new(
        host: String,
        engine: E,
        discovery: Box<dyn Discovery + Send>,
        transport: ReqwestTransport,
        status_tx: watch::Sender<StatusSnapshot>,
    ) -> Self {
        // Ignore pre-existing history: a restart only looks forward.
        let start_ms = unix_now() * 1000;
        Self {
            host,
            registry: ControlRegistry::new(),
            events: FeedTailer::new(StreamId::Events, start_ms),
            sensors: FeedTailer::new(StreamId::Sensors, start_ms),
            dispatcher: RuleDispatcher::new(engine),
            almanac: AlmanacLedger::new(),
            control_dir: ProviderDirectory::new("control"),
            history_dir: ProviderDirectory::new("history"),
            almanac_dir: ProviderDirectory::new("almanac"),
            discovery,
            transport,
            status_tx,
        }
    }

    pub async fn run(
        mut self,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(unix_now());
                }
                completion = completions.recv() => {
                    let Some(completion) = completion else {
                        return;
                    };
                    self.on_completion(completion, unix_now());
                }
                changed = shutdown_rx.changed() => {
                    match changed {
                        Ok(()) if *shutdown_rx.borrow() => break,
                        Ok(()) => {}
                        Err(_) => break,
                    }
                }
            }
        }

        info!("Coordinator shutting down, stopping active controls");
        self.registry.cancel(None, "service shutdown", &self.transport);
        // Give the deactivation requests a moment to leave.
        time::sleep(Duration::from_millis(250)).await;
    }

    fn tick(&mut self, now: i64) {
        self.registry.sweep(now);

        self.history_dir.refresh(self.discovery.as_ref(), now);
        self.events
            .tick(now, self.history_dir.providers(), &self.transport);
        self.sensors
            .tick(now, self.history_dir.providers(), &self.transport);

        if self.control_dir.refresh(self.discovery.as_ref(), now) {
            self.registry
                .scan(self.control_dir.providers(), &self.transport);
        }

        self.almanac_dir.refresh(self.discovery.as_ref(), now);
        self.almanac.tick(
            now,
            self.discovery.as_ref(),
            self.almanac_dir.providers(),
            &self.transport,
        );

        self.publish_status(now);
    }

    /// Whether the feeds may advance: rules never fire against an
    /// unusable actuation layer or an unloaded rule set.
    fn ready(&self) -> bool {
        self.registry.ready() && self.dispatcher.ready(&self.almanac)
    }

    fn on_completion(&mut self, completion: Completion, now: i64) {
        match completion.origin {
            Origin::ControlScan { provider } => {
                match completion
                    .result
                    .and_then(|body| parse_control_status(&body))
                {
                    Ok(points) => {
                        let facts = self.registry.ingest_status(&provider, &points);
                        self.dispatch_facts(facts, now);
                    }
                    Err(error) => warn!("Control server {}: {}", provider, error),
                }
            }
            Origin::Actuation { point, url } => {
                match completion
                    .result
                    .and_then(|body| parse_control_status(&body))
                {
                    Ok(points) => {
                        let facts = self.registry.ingest_status(&url, &points);
                        self.dispatch_facts(facts, now);
                    }
                    Err(error) => self.registry.actuation_failed(&point, &error),
                }
            }
            Origin::FeedProbe { stream, provider } => {
                let ready = self.ready();
                let parsed = completion.result.and_then(|body| parse_latest(&body));
                let tailer = match stream {
                    StreamId::Events => &mut self.events,
                    StreamId::Sensors => &mut self.sensors,
                };
                tailer.on_latest(&provider, parsed, ready, &self.transport);
            }
            Origin::FeedFetch { stream, provider } => {
                let parsed = completion
                    .result
                    .and_then(|body| parse_records(&body, stream));
                let tailer = match stream {
                    StreamId::Events => &mut self.events,
                    StreamId::Sensors => &mut self.sensors,
                };
                let facts = tailer.on_records(&provider, parsed);
                self.dispatch_facts(facts, now);
            }
            Origin::AlmanacNight { provider } => {
                let parsed = completion.result.and_then(|body| parse_night(&body));
                self.almanac.on_night(&provider, parsed, now);
            }
        }
    }

    fn dispatch_facts(&mut self, facts: Vec<Fact>, now: i64) {
        for fact in facts {
            self.dispatcher.dispatch(&fact);
            for directive in self.dispatcher.take_directives() {
                self.apply(directive, now);
            }
        }
    }

    fn apply(&mut self, directive: ControlDirective, now: i64) {
        match directive {
            ControlDirective::Start {
                point,
                pulse,
                reason,
            } => {
                self.registry
                    .start(&point, pulse, &reason, now, &self.transport);
            }
            ControlDirective::Cancel { point, reason } => {
                self.registry
                    .cancel(point.as_deref(), &reason, &self.transport);
            }
        }
    }

    fn publish_status(&self, now: i64) {
        let snapshot = StatusSnapshot {
            host: self.host.clone(),
            timestamp: now,
            servers: self.control_dir.providers().to_vec(),
            controls: self.registry.snapshot(now),
            almanac: self.almanac.snapshot(),
        };
        let _ = self.status_tx.send(snapshot);
    }
}
