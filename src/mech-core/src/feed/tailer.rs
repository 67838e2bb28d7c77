// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::{debug, warn};

use crate::fact::Fact;
use crate::transport::{OutboundRequest, PeerError, Transport};

use super::{FeedLatest, FeedRecord, StreamId};

/// Seconds between probe cycles.
const FEED_CYCLE: i64 = 2;

/// Leniency subtracted from the newest batch timestamp before moving
/// the watermark, so records listed slightly out of order are not
/// skipped forever.
const WATERMARK_MARGIN_MS: i64 = 5;

/// Incremental consumer of one history stream.
///
/// The tailer locks onto a single replica at a time and advances a
/// cursor of (low watermark, last consumed id). Any failure while
/// locked releases the lock but keeps the cursor, so relocking onto
/// the same or a different replica resumes from the same logical
/// position; ids at or below the cursor are never forwarded again.
#[derive(Debug)]
pub struct FeedTailer {
    stream: StreamId,
    low_watermark_ms: i64,
    last_consumed_id: i64,
    locked: Option<String>,
    next_cycle: i64,
}

impl FeedTailer {
    /// `start_ms` is the initial low watermark: older records are
    /// ignored so a restart does not reprocess pre-existing history.
    pub fn new(stream: StreamId, start_ms: i64) -> Self {
        Self {
            stream,
            low_watermark_ms: start_ms,
            last_consumed_id: 0,
            locked: None,
            next_cycle: 0,
        }
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    pub fn locked_source(&self) -> Option<&str> {
        self.locked.as_deref()
    }

    pub fn low_watermark_ms(&self) -> i64 {
        self.low_watermark_ms
    }

    pub fn last_consumed_id(&self) -> i64 {
        self.last_consumed_id
    }

    fn release(&mut self) {
        if let Some(source) = self.locked.take() {
            debug!("Released {} feed source {}", self.stream.name(), source);
        }
    }

    /// Periodic probe cycle. While unlocked every listed history
    /// provider is probed; while locked only the locked source is.
    /// When no probe at all could be issued the lock is released: the
    /// sole replica this tailer was reading has vanished.
    pub fn tick(&mut self, now: i64, providers: &[String], transport: &dyn Transport) {
        if now < self.next_cycle {
            return;
        }
        self.next_cycle = now + FEED_CYCLE;

        let mut submitted = 0;
        for provider in providers {
            if let Some(locked) = &self.locked {
                if locked != provider {
                    continue;
                }
            }
            let request = OutboundRequest::FeedLatest {
                stream: self.stream,
                provider: provider.clone(),
            };
            match transport.submit(request) {
                Ok(()) => submitted += 1,
                Err(error) => {
                    warn!("{} feed probe of {}: {}", self.stream.name(), provider, error);
                    if self.locked.as_deref() == Some(provider.as_str()) {
                        self.release();
                    }
                }
            }
        }

        if submitted == 0 && self.locked.is_some() {
            self.release();
        }
    }

    /// Completion of a latest-id probe. `ready` tells whether the
    /// downstream consumers (control registry, rule dispatcher) can
    /// react safely; when they cannot, consumption is not advanced.
    pub fn on_latest(
        &mut self,
        provider: &str,
        result: Result<FeedLatest, PeerError>,
        ready: bool,
        transport: &dyn Transport,
    ) {
        if let Some(locked) = &self.locked {
            if locked != provider {
                return; // Not the source this tailer is locked on.
            }
        }

        let latest = match result {
            Ok(probe) => probe.latest,
            Err(error) => {
                warn!("{} feed probe of {}: {}", self.stream.name(), provider, error);
                self.release();
                return;
            }
        };

        if self.locked.is_none() {
            if latest == self.last_consumed_id {
                return; // Nothing new there, keep looking.
            }
            debug!("Trying new {} source {}", self.stream.name(), provider);
            self.locked = Some(provider.to_string());
        } else {
            if latest == self.last_consumed_id {
                return; // No change.
            }
            if latest < self.last_consumed_id {
                // The server restarted: everything it has is new.
                self.last_consumed_id = 0;
            }
            debug!(
                "Detected new {} records from {}",
                self.stream.name(),
                provider
            );
        }

        if !ready {
            debug!(
                "Not ready to process new {} records yet",
                self.stream.name()
            );
            return;
        }

        let request = OutboundRequest::FeedRecords {
            stream: self.stream,
            provider: provider.to_string(),
            since_ms: self.low_watermark_ms,
        };
        if let Err(error) = transport.submit(request) {
            debug!("{} feed fetch from {}: {}", self.stream.name(), provider, error);
        }
    }

    /// Completion of a record fetch. Records are listed newest first
    /// and iterated in reverse so the consumed id only grows; each new
    /// record yields exactly one fact.
    pub fn on_records(
        &mut self,
        provider: &str,
        result: Result<Vec<FeedRecord>, PeerError>,
    ) -> Vec<Fact> {
        if let Some(locked) = &self.locked {
            if locked != provider {
                return Vec::new(); // Not the source this tailer is locked on.
            }
        }

        let records = match result {
            Ok(records) => records,
            Err(error) => {
                warn!("{} feed fetch from {}: {}", self.stream.name(), provider, error);
                self.release();
                return Vec::new();
            }
        };

        if self.locked.is_none() {
            // Lock on this provider that seems to be working OK.
            self.locked = Some(provider.to_string());
        }

        let mut facts = Vec::new();
        let mut latest_time = 0;
        for record in records.iter().rev() {
            if record.id <= self.last_consumed_id {
                continue; // Already processed.
            }
            self.last_consumed_id = record.id;
            if record.timestamp_ms > latest_time {
                latest_time = record.timestamp_ms;
            }
            facts.push(self.stream.fact(record));
        }

        if latest_time - WATERMARK_MARGIN_MS > self.low_watermark_ms {
            self.low_watermark_ms = latest_time - WATERMARK_MARGIN_MS;
        }

        debug!(
            "New latest processed {} id {} from {}",
            self.stream.name(),
            self.last_consumed_id,
            provider
        );
        facts
    }
}
