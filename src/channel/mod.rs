// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sandboxed channel endpoint.
//!
//! The endpoint owns the isolated execution context that hosts the remote
//! authority and the message transport to it. The relay only talks to it
//! through [`ChannelEndpoint`], so hosts can swap the frame for any other
//! message channel.

pub mod frame;

pub use frame::{FrameEndpoint, FrameHost};

use crate::models::Envelope;

/// Outbound side of the message channel to the remote authority.
///
/// All methods are non-blocking; the relay calls them while holding its
/// state lock.
pub trait ChannelEndpoint: Send + Sync {
    /// Deliver a typed message to the remote context. Messages sent before
    /// the context attached may be dropped.
    fn send(&self, envelope: Envelope);

    /// Make the authority's surface visible.
    fn show(&self);

    /// Hide the authority's surface.
    fn hide(&self);

    /// The only origin inbound messages are accepted from.
    fn authority_origin(&self) -> &str;

    /// Exact origin match; the sole trust boundary of the protocol.
    fn accepts_origin(&self, origin: &str) -> bool {
        origin == self.authority_origin()
    }
}

/// Readiness of the remote context. Flips to ready once and never reverts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    ready: bool,
}

impl ChannelState {
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Record the readiness signal. Returns `true` only on the first call.
    pub fn mark_ready(&mut self) -> bool {
        let first = !self.ready;
        self.ready = true;
        first
    }
}
