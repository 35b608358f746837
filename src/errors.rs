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

// Relay error types

use thiserror::Error;

use crate::constants::jsonrpc;
use crate::models::RequestId;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// Construction-time configuration failure
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Synchronous call for a method that must go through the authority
    #[error("Unsupported synchronous method: {0}")]
    UnsupportedSyncMethod(String),

    /// The user declined the request in the remote authority
    #[error("User denied the request")]
    UserDenied,

    /// A request reused an id that is still awaiting its response
    #[error("Request id {0} is already pending")]
    DuplicateRequestId(RequestId),

    /// The relay went away before the request was resolved
    #[error("Relay session closed before a response arrived")]
    SessionClosed,

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sandboxed frame could not be created or reached
    #[error("Frame error: {0}")]
    Frame(String),

    /// Malformed or oversized wire frame
    #[error("Framing error: {0}")]
    Framing(String),

    /// I/O Error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration validation errors, raised before any frame exists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No API key on a non-loopback host
    #[error("An API key is required when not running on a local development host")]
    MissingApiKey,

    /// Both node provider options were given
    #[error("infuraApiKey and providerNodeUrl cannot be used together")]
    ConflictingNodeOptions,

    /// Unrecognized network selector
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// Authority base address without a scheme and host
    #[error("Invalid authority base address: {0}")]
    InvalidAuthorityBase(String),

    /// Entry configuration could not be encoded
    #[error("Failed to encode entry configuration: {0}")]
    Encoding(String),
}

impl RelayError {
    /// JSON-RPC error code reported to the host for this error.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            RelayError::UserDenied => jsonrpc::ERROR_USER_REJECTED,
            RelayError::UnsupportedSyncMethod(_) => jsonrpc::ERROR_METHOD_NOT_FOUND,
            RelayError::DuplicateRequestId(_) => jsonrpc::ERROR_INVALID_REQUEST,
            RelayError::Serialization(_) | RelayError::Framing(_) => jsonrpc::ERROR_PARSE,
            RelayError::Config(_)
            | RelayError::SessionClosed
            | RelayError::Frame(_)
            | RelayError::Io(_) => jsonrpc::ERROR_INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_maps_to_user_rejected_code() {
        assert_eq!(RelayError::UserDenied.json_rpc_code(), 4001);
        assert_eq!(
            RelayError::UnsupportedSyncMethod("eth_sign".into()).json_rpc_code(),
            -32601
        );
        assert_eq!(RelayError::SessionClosed.json_rpc_code(), -32603);
    }

    #[test]
    fn test_config_error_converts() {
        let err: RelayError = ConfigError::ConflictingNodeOptions.into();
        assert!(matches!(
            err,
            RelayError::Config(ConfigError::ConflictingNodeOptions)
        ));
        assert!(err.to_string().contains("cannot be used together"));
    }
}
