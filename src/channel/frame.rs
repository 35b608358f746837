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

//! Frame-backed channel endpoint.
//!
//! A single background task owns the frame: it waits for the host document,
//! mounts the frame exactly once, then applies commands in the order the
//! relay issued them. Commands issued before the frame exists simply wait in
//! the task's channel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

use crate::channel::ChannelEndpoint;
use crate::config::RelayConfig;
use crate::errors::{ConfigError, RelayError};
use crate::models::Envelope;

/// The embedding environment that can host the sandboxed frame.
#[async_trait]
pub trait FrameHost: Send + Sync + 'static {
    /// Resolves once the host document can take a new frame.
    async fn document_loaded(&self);

    /// Create the isolated context and load `entry_address` into it.
    async fn mount(&self, entry_address: &str) -> Result<(), RelayError>;

    /// Post a message into the context. Returns `false` when the context is
    /// not attached, in which case the message is lost.
    fn post_message(&self, envelope: &Envelope, target_origin: &str) -> bool;

    fn set_visible(&self, visible: bool);

    /// Enable or suspend scrolling of the host page.
    fn set_page_scroll(&self, enabled: bool);

    fn is_mobile(&self) -> bool;

    /// Host name of the embedding page.
    fn hostname(&self) -> String;
}

#[derive(Debug)]
enum FrameCommand {
    Post(Envelope),
    Show,
    Hide,
}

pub struct FrameEndpoint {
    commands: mpsc::UnboundedSender<FrameCommand>,
    origin: String,
    entry_address: String,
}

impl FrameEndpoint {
    /// Start the frame task. Must be called from within a tokio runtime.
    pub fn spawn<H: FrameHost>(host: Arc<H>, config: &RelayConfig) -> Result<Self, ConfigError> {
        let entry_address = config.entry_address()?;
        let origin = config.authority_origin()?;
        let (commands, rx) = mpsc::unbounded_channel();

        tokio::spawn(run_frame(host, entry_address.clone(), origin.clone(), rx));

        Ok(Self {
            commands,
            origin,
            entry_address,
        })
    }

    pub fn entry_address(&self) -> &str {
        &self.entry_address
    }

    fn push(&self, command: FrameCommand) {
        if let Err(e) = self.commands.send(command) {
            debug!("Frame task gone, dropping {:?}", e.0);
        }
    }
}

impl ChannelEndpoint for FrameEndpoint {
    fn send(&self, envelope: Envelope) {
        self.push(FrameCommand::Post(envelope));
    }

    fn show(&self) {
        self.push(FrameCommand::Show);
    }

    fn hide(&self) {
        self.push(FrameCommand::Hide);
    }

    fn authority_origin(&self) -> &str {
        &self.origin
    }
}

async fn run_frame<H: FrameHost>(
    host: Arc<H>,
    entry_address: String,
    origin: String,
    mut rx: mpsc::UnboundedReceiver<FrameCommand>,
) {
    host.document_loaded().await;

    let attached = match host.mount(&entry_address).await {
        Ok(()) => {
            info!("Frame mounted for {}", origin);
            true
        }
        Err(e) => {
            error!("Failed to mount frame: {}", e);
            false
        }
    };

    while let Some(command) = rx.recv().await {
        match command {
            FrameCommand::Post(envelope) => {
                if attached && host.post_message(&envelope, &origin) {
                    trace!("Posted '{}' to frame", envelope.msg_type);
                } else {
                    debug!("Frame not attached, dropping '{}'", envelope.msg_type);
                }
            }
            FrameCommand::Show => {
                host.set_visible(true);
                if host.is_mobile() {
                    host.set_page_scroll(false);
                }
            }
            FrameCommand::Hide => {
                host.set_visible(false);
                if host.is_mobile() {
                    host.set_page_scroll(true);
                }
            }
        }
    }
    debug!("Frame command channel closed");
}
