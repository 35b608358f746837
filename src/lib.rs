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

//! portis-relay: a request relay for sandboxed signing authorities.
//!
//! This library accepts JSON-RPC requests from a host application, forwards
//! them across an isolated frame boundary to a remote authority, and
//! correlates the asynchronous responses back to the original caller.

pub mod channel;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod ids;
pub mod models;
pub mod relay;
pub mod stdio;

pub use channel::{ChannelEndpoint, ChannelState, FrameEndpoint, FrameHost};
pub use config::{Network, RelayConfig};
pub use errors::{ConfigError, RelayError};
pub use models::{Envelope, InboundEvent, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use relay::{PendingResponse, Relay};
