// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Cached night data from the almanac services.
//!
//! Almanac data is queried asynchronously and cached here so rules can
//! read the night boundaries at any time. Several services may offer
//! the data; the highest-priority source wins until its data expires.

use tracing::{debug, warn};

use crate::directory::Discovery;
use crate::transport::{OutboundRequest, PeerError, Transport};

/// Scan cadence while the night data is absent or expired.
const SCAN_FAST: i64 = 10;
/// Scan cadence while the cached data is still current.
const SCAN_SLOW: i64 = 300;

/// Parsed night-data answer from one almanac service.
#[derive(Debug, Clone, PartialEq)]
pub struct AlmanacNight {
    pub priority: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Night data for the status document, present once a source was
/// accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct AlmanacSnapshot {
    pub priority: i64,
    pub sunset: i64,
    pub sunrise: i64,
    pub timezone: Option<String>,
    pub position: Option<(f64, f64)>,
}

/// Cache of tonight's sunrise and sunset.
#[derive(Debug, Default)]
pub struct AlmanacLedger {
    priority: i64,
    sunset: i64,
    sunrise: i64,
    timezone: Option<String>,
    position: Option<(f64, f64)>,
    last_scan: i64,
}

impl AlmanacLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once night data was fetched from at least one service,
    /// even if it has expired since.
    pub fn ready(&self) -> bool {
        self.sunset > 0
    }

    /// Sunset for the recent or upcoming night (unix seconds).
    pub fn tonight_sunset(&self) -> i64 {
        self.sunset
    }

    /// Sunrise for the recent or upcoming night (unix seconds).
    pub fn tonight_sunrise(&self) -> i64 {
        self.sunrise
    }

    /// Force a scan on the next tick.
    pub fn force(&mut self) {
        self.last_scan = 0;
    }

    /// Periodic scan of the almanac services. Scans every few seconds
    /// while the data is unknown or expired, every few minutes
    /// otherwise, and immediately when discovery reports new services.
    pub fn tick(
        &mut self,
        now: i64,
        discovery: &dyn Discovery,
        providers: &[String],
        transport: &dyn Transport,
    ) {
        if self.last_scan > 0 && discovery.changed_since("almanac", self.last_scan) {
            self.last_scan = 0;
        }

        let interval = if self.sunrise <= now { SCAN_FAST } else { SCAN_SLOW };
        if now <= self.last_scan + interval {
            return;
        }
        self.last_scan = now;

        debug!("Proceeding with almanac scan");
        for provider in providers {
            let request = OutboundRequest::AlmanacNight {
                provider: provider.clone(),
            };
            if let Err(error) = transport.submit(request) {
                warn!("Almanac query of {}: {}", provider, error);
            }
        }
    }

    /// Completion of one night-data query. The answer is accepted only
    /// when its priority is not below the current source's (expired
    /// data forfeits its priority) and its sunrise is not older than
    /// the cached one.
    pub fn on_night(&mut self, provider: &str, result: Result<AlmanacNight, PeerError>, now: i64) {
        let night = match result {
            Ok(night) => night,
            Err(error) => {
                warn!("Almanac {}: {}", provider, error);
                return;
            }
        };

        if now > self.sunrise {
            self.priority = 0; // Data is past its prime.
        }
        if night.priority < self.priority {
            return; // Lower quality source.
        }
        if night.sunrise < self.sunrise {
            return; // Older than the existing data.
        }

        self.sunrise = night.sunrise;
        self.sunset = night.sunset;
        self.priority = night.priority;

        if let Some(timezone) = night.timezone {
            self.timezone = Some(timezone);
        }
        if let (Some(latitude), Some(longitude)) = (night.latitude, night.longitude) {
            self.position = Some((latitude, longitude));
        }
    }

    pub fn snapshot(&self) -> Option<AlmanacSnapshot> {
        if self.priority <= 0 {
            return None;
        }
        Some(AlmanacSnapshot {
            priority: self.priority,
            sunset: self.sunset,
            sunrise: self.sunrise,
            timezone: self.timezone.clone(),
            position: self.position,
        })
    }
}
