// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fire-and-continue HTTP transport backed by reqwest.
//!
//! Each submitted request is spawned as its own task; its outcome
//! comes back to the coordinator as a [`Completion`] on an unbounded
//! channel, tagged with the origin token of the request. Redirects are
//! followed inside reqwest; they are the transport completing, not a
//! new logical attempt.

use std::time::Duration;

use tokio::sync::mpsc;

use mech_core::transport::{Origin, OutboundRequest, PeerError, Transport, TransportError};
use mech_core::DynResult;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one outbound exchange.
#[derive(Debug)]
pub struct Completion {
    pub origin: Origin,
    pub result: Result<String, PeerError>,
}

/// The production transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    completions: mpsc::UnboundedSender<Completion>,
}

impl ReqwestTransport {
    pub fn new(completions: mpsc::UnboundedSender<Completion>) -> DynResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(IO_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            completions,
        })
    }
}

fn build_url(request: &OutboundRequest) -> Result<reqwest::Url, TransportError> {
    fn bad(text: &str, error: impl std::fmt::Display) -> TransportError {
        TransportError::BadUrl(text.to_string(), error.to_string())
    }
    match request {
        OutboundRequest::ControlScan { provider } => {
            let text = format!("{}/status", provider);
            reqwest::Url::parse(&text).map_err(|e| bad(&text, e))
        }
        OutboundRequest::Actuate {
            url,
            point,
            on,
            pulse,
            cause,
        } => {
            let text = format!("{}/set", url);
            let mut target = reqwest::Url::parse(&text).map_err(|e| bad(&text, e))?;
            {
                let mut pairs = target.query_pairs_mut();
                pairs.append_pair("point", point);
                pairs.append_pair("state", if *on { "on" } else { "off" });
                if *on {
                    pairs.append_pair("pulse", &pulse.to_string());
                }
                if !cause.is_empty() {
                    pairs.append_pair("cause", cause);
                }
            }
            Ok(target)
        }
        OutboundRequest::FeedLatest { stream, provider } => {
            let text = format!("{}{}", provider, stream.probe_path());
            reqwest::Url::parse(&text).map_err(|e| bad(&text, e))
        }
        OutboundRequest::FeedRecords {
            stream,
            provider,
            since_ms,
        } => {
            let text = format!("{}{}?since={}", provider, stream.records_path(), since_ms);
            reqwest::Url::parse(&text).map_err(|e| bad(&text, e))
        }
        OutboundRequest::AlmanacNight { provider } => {
            let text = format!("{}/nextnight", provider);
            reqwest::Url::parse(&text).map_err(|e| bad(&text, e))
        }
    }
}

async fn fetch(client: &reqwest::Client, url: reqwest::Url) -> Result<String, PeerError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| PeerError::Transport(error.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(PeerError::Status(status.as_u16()));
    }
    response
        .text()
        .await
        .map_err(|error| PeerError::Transport(error.to_string()))
}

impl Transport for ReqwestTransport {
    fn submit(&self, request: OutboundRequest) -> Result<(), TransportError> {
        if self.completions.is_closed() {
            return Err(TransportError::Closed);
        }
        let url = build_url(&request)?;
        let origin = request.origin();
        let client = self.client.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = fetch(&client, url).await;
            let _ = completions.send(Completion { origin, result });
        });
        Ok(())
    }
}
