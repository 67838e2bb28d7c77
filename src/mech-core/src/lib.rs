// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod almanac;
pub mod control;
pub mod directory;
pub mod duration;
pub mod fact;
pub mod feed;
pub mod rule;
pub mod transport;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use almanac::{AlmanacLedger, AlmanacNight};
pub use control::{Activation, Control, ControlRegistry, ControlSnapshot};
pub use directory::{Discovery, ProviderDirectory};
pub use fact::Fact;
pub use feed::{FeedLatest, FeedRecord, FeedTailer, StreamId};
pub use rule::{ControlDirective, RuleDispatcher, RuleEngine};
pub use transport::{Origin, OutboundRequest, PeerError, Transport, TransportError};
