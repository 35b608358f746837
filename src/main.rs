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

// Main entry point for portis-relay
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use portis_relay::config::RelayConfig;
use portis_relay::constants::config::{ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_PAGE_HOST};
use portis_relay::stdio::{run_bridge, AuthorityCommand};

#[derive(Parser, Debug)]
#[command(name = "portis-relay", version, about, long_about = None)]
struct Cli {
    /// API key issued for the embedding application
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Network selector (mainnet, ropsten, kovan, rinkeby, sokol, core)
    #[arg(long, global = true)]
    network: Option<String>,

    /// Upstream node provider credential
    #[arg(long, global = true)]
    infura_api_key: Option<String>,

    /// Custom node endpoint
    #[arg(long, global = true)]
    provider_node_url: Option<String>,

    /// Base address of the remote authority
    #[arg(long, global = true)]
    authority_url: Option<String>,

    /// Host name of the embedding page, used for API key validation.
    /// Without it the API key is always required.
    #[arg(long, global = true, env = ENV_PAGE_HOST)]
    page_host: Option<String>,

    /// Log filter directive
    #[arg(long, global = true, env = ENV_LOG_LEVEL, default_value = "info")]
    log_level: String,

    /// Log format: "text" or "json"
    #[arg(long, global = true, env = ENV_LOG_FORMAT, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the frame entry address for the configured options
    EntryUrl,

    /// Relay framed JSON-RPC on stdio through an authority process
    Bridge {
        /// Authority command and arguments
        #[arg(last = true, required = true)]
        authority: Vec<String>,
    },
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, &cli.log_format);

    // Load config from env, then apply CLI overrides
    let mut config =
        RelayConfig::from_env().context("Invalid relay configuration in environment")?;
    if let Some(key) = cli.api_key {
        config.api_key = Some(key);
    }
    if let Some(network) = &cli.network {
        config.network = network.parse().context("Invalid --network")?;
    }
    if let Some(key) = cli.infura_api_key {
        config.infura_api_key = Some(key);
    }
    if let Some(url) = cli.provider_node_url {
        config.provider_node_url = Some(url);
    }
    if let Some(url) = cli.authority_url {
        config.authority_base = url;
    }

    let page_host = cli.page_host.unwrap_or_default();
    match cli.command {
        Commands::EntryUrl => {
            config
                .validate(&page_host)
                .context("Invalid relay configuration")?;
            let address = config.entry_address()?;
            println!("{}", address);
        }
        Commands::Bridge { authority } => {
            let (program, args) = authority
                .split_first()
                .context("Missing authority command")?;
            info!("portis-relay v{} bridging to {}", env!("CARGO_PKG_VERSION"), program);
            run_bridge(
                config,
                AuthorityCommand {
                    program: program.clone(),
                    args: args.to_vec(),
                    page_host,
                },
            )
            .await?;
        }
    }

    Ok(())
}
