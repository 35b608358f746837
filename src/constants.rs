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

//! Relay constants - single source of truth for wire names and defaults.

/// JSON-RPC 2.0 error codes
pub mod jsonrpc {
    /// Protocol version carried on every request and response
    pub const VERSION: &str = "2.0";
    /// User rejected the request (EIP-1193)
    pub const ERROR_USER_REJECTED: i32 = 4001;
    /// Method not found (standard JSON-RPC)
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid request (standard JSON-RPC)
    pub const ERROR_INVALID_REQUEST: i32 = -32600;
    /// Internal error (standard JSON-RPC)
    pub const ERROR_INTERNAL: i32 = -32603;
    /// Parse error (standard JSON-RPC)
    pub const ERROR_PARSE: i32 = -32700;
}

/// Envelope message types exchanged with the remote authority
pub mod msg {
    /// Outbound: a JSON-RPC request for the authority
    pub const REQUEST: &str = "request";
    /// Inbound: the authority is ready to receive requests
    pub const READY: &str = "ready";
    /// Inbound: a response to a relayed request
    pub const RESPONSE: &str = "response";
    /// Inbound: the authority wants its surface visible
    pub const SHOW: &str = "show";
    /// Inbound: the authority wants its surface hidden
    pub const HIDE: &str = "hide";
    /// Inbound: the user declined one or all outstanding requests
    pub const USER_DENIED: &str = "user-denied";
    /// Inbound: a user signed in
    pub const LOGIN: &str = "login";
    /// Inbound: a purchase flow started
    pub const PURCHASE_INITIATED: &str = "purchase-initiated";
}

/// Subscriber event names
pub mod events {
    pub const LOGIN: &str = "login";
    pub const PURCHASE_INITIATED: &str = "purchase-initiated";
}

/// JSON-RPC methods the relay inspects or originates
pub mod methods {
    pub const ETH_ACCOUNTS: &str = "eth_accounts";
    pub const ETH_COINBASE: &str = "eth_coinbase";
    pub const NET_VERSION: &str = "net_version";
    pub const ETH_UNINSTALL_FILTER: &str = "eth_uninstallFilter";
    pub const SET_DEFAULT_EMAIL: &str = "setDefaultEmail";
    pub const SHOW_PORTIS: &str = "showPortis";
}

/// Relay identity and remote authority defaults
pub mod relay {
    /// Provider name reported to event subscribers
    pub const PROVIDER: &str = "portis";
    /// Version embedded in the entry address configuration
    pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// Default remote authority base address
    pub const DEFAULT_AUTHORITY_BASE: &str = "https://app.portis.io";
    /// Path segment of the frame entry address
    pub const ENTRY_PATH: &str = "/send/";
    /// Host names that may run without an API key
    pub const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]", "0.0.0.0"];
}

/// Configuration Environment Variables
pub mod config {
    pub const ENV_API_KEY: &str = "PORTIS_API_KEY";
    pub const ENV_NETWORK: &str = "PORTIS_NETWORK";
    pub const ENV_INFURA_API_KEY: &str = "PORTIS_INFURA_API_KEY";
    pub const ENV_PROVIDER_NODE_URL: &str = "PORTIS_PROVIDER_NODE_URL";
    pub const ENV_AUTHORITY_URL: &str = "PORTIS_AUTHORITY_URL";
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
    pub const ENV_PAGE_HOST: &str = "PORTIS_PAGE_HOST";
}

/// Transport Limits (DoS Protection)
pub mod limits {
    /// Maximum allowed framed message size (10 MB)
    pub const MAX_MESSAGE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    /// Maximum header block size before a body length is known
    pub const MAX_HEADER_BYTES: usize = 4096;
    /// Capacity of the inbound event channel
    pub const INBOUND_CHANNEL_CAPACITY: usize = 64;
}
