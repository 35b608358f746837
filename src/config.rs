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

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use url::Url;

use crate::constants::{config as env_keys, relay};
use crate::errors::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Network {
    #[default]
    Mainnet,
    Ropsten,
    Kovan,
    Rinkeby,
    Sokol,
    Core,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Ropsten => "ropsten",
            Network::Kovan => "kovan",
            Network::Rinkeby => "rinkeby",
            Network::Sokol => "sokol",
            Network::Core => "core",
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "ropsten" => Ok(Network::Ropsten),
            "kovan" => Ok(Network::Kovan),
            "rinkeby" => Ok(Network::Rinkeby),
            "sokol" => Ok(Network::Sokol),
            "core" => Ok(Network::Core),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_authority_base() -> String {
    relay::DEFAULT_AUTHORITY_BASE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub infura_api_key: Option<String>,
    #[serde(default)]
    pub provider_node_url: Option<String>,
    #[serde(default = "default_authority_base")]
    pub authority_base: String,
}

/// Configuration blob embedded in the frame entry address
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryConfig<'a> {
    pub sdk_version: &'a str,
    pub network: Network,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infura_api_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_node_url: Option<&'a str>,
}

impl RelayConfig {
    pub fn new(api_key: impl Into<String>, network: Network) -> Self {
        Self {
            api_key: Some(api_key.into()),
            network,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_key: non_empty(env_keys::ENV_API_KEY),
            network: match non_empty(env_keys::ENV_NETWORK) {
                Some(name) => name.parse()?,
                None => Network::default(),
            },
            infura_api_key: non_empty(env_keys::ENV_INFURA_API_KEY),
            provider_node_url: non_empty(env_keys::ENV_PROVIDER_NODE_URL),
            authority_base: non_empty(env_keys::ENV_AUTHORITY_URL)
                .unwrap_or_else(default_authority_base),
        })
    }

    /// Check the options against the page the relay is embedded in.
    ///
    /// `hostname` is the host name of the embedding page; loopback hosts may
    /// omit the API key.
    pub fn validate(&self, hostname: &str) -> Result<(), ConfigError> {
        if self.infura_api_key.is_some() && self.provider_node_url.is_some() {
            return Err(ConfigError::ConflictingNodeOptions);
        }

        let has_key = self
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_key && !is_loopback_host(hostname) {
            return Err(ConfigError::MissingApiKey);
        }

        self.authority_origin().map(|_| ())
    }

    /// Origin (`scheme://host[:port]`) the remote authority's messages must carry.
    pub fn authority_origin(&self) -> Result<String, ConfigError> {
        origin_of(&self.authority_base)
    }

    pub fn entry_config(&self) -> EntryConfig<'_> {
        EntryConfig {
            sdk_version: relay::SDK_VERSION,
            network: self.network,
            api_key: self.api_key.as_deref(),
            infura_api_key: self.infura_api_key.as_deref(),
            provider_node_url: self.provider_node_url.as_deref(),
        }
    }

    /// Address the sandboxed frame is loaded from.
    pub fn entry_address(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(&self.entry_config())
            .map_err(|e| ConfigError::Encoding(e.to_string()))?;
        Ok(format!(
            "{}{}?p={}",
            self.authority_base.trim_end_matches('/'),
            relay::ENTRY_PATH,
            STANDARD.encode(json)
        ))
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            network: Network::default(),
            infura_api_key: None,
            provider_node_url: None,
            authority_base: default_authority_base(),
        }
    }
}

pub fn is_loopback_host(hostname: &str) -> bool {
    let host = hostname.trim().to_lowercase();
    relay::LOOPBACK_HOSTS.contains(&host.as_str())
}

/// Serialized origin (`scheme://host[:port]`) of an absolute address.
///
/// Hosts are lowercased, default ports and userinfo dropped. Addresses with
/// an opaque origin are rejected.
pub fn origin_of(address: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidAuthorityBase(address.to_string());

    let url = Url::parse(address).map_err(|_| invalid())?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(invalid());
    }
    Ok(origin.ascii_serialization())
}
