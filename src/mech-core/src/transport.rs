// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Outbound request seam between the coordination core and the HTTP
//! transport.
//!
//! Requests are fire-and-continue: `Transport::submit` returns as soon
//! as the request has been issued, and the eventual outcome arrives
//! later, tagged with the [`Origin`] it was issued for. Handlers that
//! only matter while their originating peer is still the authoritative
//! one re-check that identity when the completion arrives; a stale
//! completion is a silent no-op. That re-check is the sole
//! cancellation mechanism, there is no cancel-token plumbing.

use thiserror::Error;

use crate::feed::StreamId;

/// Why an exchange with a peer failed.
#[derive(Debug, Clone, Error)]
pub enum PeerError {
    #[error("HTTP code {0}")]
    Status(u16),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("no data")]
    Empty,
}

/// Failure to even issue a request (bad URL, transport shut down).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL {0}: {1}")]
    BadUrl(String, String),
    #[error("transport closed")]
    Closed,
}

/// Identity token carried by every in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Actuator status scan of one discovered control server.
    ControlScan { provider: String },
    /// Activate/deactivate request for one control point; `url` is the
    /// routing URL the request was sent to.
    Actuation { point: String, url: String },
    /// Latest-id probe of one history replica.
    FeedProbe { stream: StreamId, provider: String },
    /// Record fetch from the locked history replica.
    FeedFetch { stream: StreamId, provider: String },
    /// Night-data query of one almanac service.
    AlmanacNight { provider: String },
}

/// An outbound HTTP exchange, expressed as data so that URL assembly
/// and escaping stay with the transport implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    /// `GET {provider}/status`
    ControlScan { provider: String },
    /// `GET {url}/set?point=..&state=on|off[&pulse=..][&cause=..]`
    Actuate {
        url: String,
        point: String,
        on: bool,
        pulse: u32,
        cause: String,
    },
    /// `GET {provider}{probe_path}`
    FeedLatest { stream: StreamId, provider: String },
    /// `GET {provider}{records_path}?since={since_ms}`
    FeedRecords {
        stream: StreamId,
        provider: String,
        since_ms: i64,
    },
    /// `GET {provider}/nextnight`
    AlmanacNight { provider: String },
}

impl OutboundRequest {
    /// The origin token completions for this request will carry.
    pub fn origin(&self) -> Origin {
        match self {
            Self::ControlScan { provider } => Origin::ControlScan {
                provider: provider.clone(),
            },
            Self::Actuate { url, point, .. } => Origin::Actuation {
                point: point.clone(),
                url: url.clone(),
            },
            Self::FeedLatest { stream, provider } => Origin::FeedProbe {
                stream: *stream,
                provider: provider.clone(),
            },
            Self::FeedRecords {
                stream, provider, ..
            } => Origin::FeedFetch {
                stream: *stream,
                provider: provider.clone(),
            },
            Self::AlmanacNight { provider } => Origin::AlmanacNight {
                provider: provider.clone(),
            },
        }
    }
}

/// Issues outbound requests without blocking the coordinator.
///
/// `submit` fails synchronously only when the request cannot be issued
/// at all; everything later (connect errors, bad status, timeouts)
/// comes back as a completion carrying a [`PeerError`].
pub trait Transport {
    fn submit(&self, request: OutboundRequest) -> Result<(), TransportError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Transport double that records submissions and can be told to
    /// refuse them, for exercising the issue-failure paths.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub submitted: RefCell<Vec<OutboundRequest>>,
        pub refuse: bool,
    }

    impl RecordingTransport {
        pub fn refusing() -> Self {
            Self {
                submitted: RefCell::new(Vec::new()),
                refuse: true,
            }
        }

        pub fn take(&self) -> Vec<OutboundRequest> {
            self.submitted.borrow_mut().drain(..).collect()
        }
    }

    impl Transport for RecordingTransport {
        fn submit(&self, request: OutboundRequest) -> Result<(), TransportError> {
            if self.refuse {
                return Err(TransportError::Closed);
            }
            self.submitted.borrow_mut().push(request);
            Ok(())
        }
    }

    #[test]
    fn test_origin_matches_request() {
        let req = OutboundRequest::FeedLatest {
            stream: StreamId::Events,
            provider: "http://h1".to_string(),
        };
        assert_eq!(
            req.origin(),
            Origin::FeedProbe {
                stream: StreamId::Events,
                provider: "http://h1".to_string(),
            }
        );
    }
}
