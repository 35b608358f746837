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

//! Stdio driver.
//!
//! Runs the relay outside a browser: the remote authority is a child
//! process, and both sides speak `Content-Length` framed JSON.
//!
//! ```text
//! host app --JsonRpcRequest--> stdin  [relay]  child stdin  --{origin,data}--> authority
//! host app <--JsonRpcResponse- stdout [relay]  child stdout <--{origin,data}-- authority
//! ```
//!
//! Frames in both directions on the authority pipes have the shape of an
//! [`InboundEvent`]: outbound frames carry the target origin, inbound frames
//! the origin the authority declares.

use std::future::Future;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

use crate::channel::FrameHost;
use crate::codec::JsonFrameCodec;
use crate::config::RelayConfig;
use crate::constants::{events, limits};
use crate::errors::RelayError;
use crate::models::{Envelope, InboundEvent, JsonRpcRequest, JsonRpcResponse};
use crate::relay::Relay;

/// How to launch the remote authority.
#[derive(Debug, Clone)]
pub struct AuthorityCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Host name reported for API key validation
    pub page_host: String,
}

/// Environment variable carrying the entry address to the child
pub const ENV_ENTRY_ADDRESS: &str = "PORTIS_ENTRY_ADDRESS";

/// Keeps the authority process alive; killing it on drop.
struct AuthoritySupervisor {
    kill_tx: Option<oneshot::Sender<()>>,
}

impl AuthoritySupervisor {
    fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for AuthoritySupervisor {
    fn drop(&mut self) {
        self.kill();
    }
}

/// [`FrameHost`] backed by a child process.
pub struct ProcessFrameHost {
    command: AuthorityCommand,
    outbound: mpsc::UnboundedSender<InboundEvent>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<InboundEvent>>>,
    inbound: mpsc::Sender<InboundEvent>,
    attached: Arc<AtomicBool>,
    supervisor: Mutex<Option<AuthoritySupervisor>>,
}

impl ProcessFrameHost {
    /// Frames read from the child are forwarded to `inbound`.
    pub fn new(command: AuthorityCommand, inbound: mpsc::Sender<InboundEvent>) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        Self {
            command,
            outbound,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            inbound,
            attached: Arc::new(AtomicBool::new(false)),
            supervisor: Mutex::new(None),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameHost for ProcessFrameHost {
    async fn document_loaded(&self) {}

    async fn mount(&self, entry_address: &str) -> Result<(), RelayError> {
        let outbound_rx = {
            let mut slot = self
                .outbound_rx
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };
        let Some(outbound_rx) = outbound_rx else {
            return Err(RelayError::Frame("authority already mounted".into()));
        };

        info!(
            "Spawning authority: {} {:?}",
            self.command.program, self.command.args
        );
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .env(ENV_ENTRY_ADDRESS, entry_address)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RelayError::Frame(format!("Failed to spawn authority: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RelayError::Frame("authority stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelayError::Frame("authority stdout unavailable".into()))?;
        if let Some(stderr) = child.stderr.take() {
            spawn_stderr_drain(stderr);
        }

        spawn_frame_writer(stdin, outbound_rx);
        spawn_frame_reader(stdout, self.inbound.clone());

        self.attached.store(true, Ordering::SeqCst);
        let (kill_tx, kill_rx) = oneshot::channel();
        let attached = Arc::clone(&self.attached);
        tokio::spawn(async move {
            tokio::select! {
                _ = kill_rx => {
                    let _ = child.kill().await;
                }
                status = child.wait() => {
                    warn!("Authority process exited: {:?}", status.ok().and_then(|s| s.code()));
                }
            }
            attached.store(false, Ordering::SeqCst);
        });

        {
            let mut supervisor = self
                .supervisor
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *supervisor = Some(AuthoritySupervisor {
                kill_tx: Some(kill_tx),
            });
        }
        Ok(())
    }

    fn post_message(&self, envelope: &Envelope, target_origin: &str) -> bool {
        if !self.is_attached() {
            return false;
        }
        let data = match serde_json::to_value(envelope) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode envelope: {}", e);
                return false;
            }
        };
        self.outbound
            .send(InboundEvent::new(target_origin, data))
            .is_ok()
    }

    fn set_visible(&self, visible: bool) {
        info!(
            "Authority surface {}",
            if visible { "shown" } else { "hidden" }
        );
    }

    fn set_page_scroll(&self, _enabled: bool) {}

    fn is_mobile(&self) -> bool {
        false
    }

    fn hostname(&self) -> String {
        self.command.page_host.clone()
    }
}

fn spawn_frame_writer<W>(writer: W, mut rx: mpsc::UnboundedReceiver<InboundEvent>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedWrite::new(writer, JsonFrameCodec::new());
        while let Some(frame) = rx.recv().await {
            if let Err(e) = framed.send(frame).await {
                error!("Failed to write to authority: {}", e);
                break;
            }
        }
    });
}

fn spawn_frame_reader<R>(reader: R, tx: mpsc::Sender<InboundEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedRead::new(reader, JsonFrameCodec::new());
        while let Some(result) = framed.next().await {
            match result {
                Ok(value) => match serde_json::from_value::<InboundEvent>(value) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!("Authority frame is not an event: {}", e),
                },
                Err(e) => {
                    error!("Authority framing error: {}", e);
                    break;
                }
            }
        }
        debug!("Authority output closed");
    });
}

fn spawn_stderr_drain<R>(stream: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if !line.is_empty() {
                debug!("[authority] {}", line);
            }
        }
    });
}

/// Relay framed JSON-RPC requests from stdin through the authority process,
/// writing responses and event notifications to stdout.
///
/// Once stdin closes, every request already read is awaited to its response
/// or denial and stdout is flushed before returning.
pub async fn run_bridge(config: RelayConfig, authority: AuthorityCommand) -> anyhow::Result<()> {
    let (inbound_tx, inbound_rx) = mpsc::channel(limits::INBOUND_CHANNEL_CAPACITY);
    let host = Arc::new(ProcessFrameHost::new(authority, inbound_tx));
    let relay = Relay::new(config, host).context("Invalid relay configuration")?;

    let (out_tx, out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = spawn_host_writer(tokio::io::stdout(), out_rx);

    for event_name in [events::LOGIN, events::PURCHASE_INITIATED] {
        let out = out_tx.clone();
        relay.on(event_name, move |payload: &Value| {
            let _ = out.send(json!({
                "jsonrpc": "2.0",
                "method": "portis_event",
                "params": {"event": event_name, "data": payload}
            }));
        });
    }

    let dispatcher = relay.clone();
    let dispatch_loop = tokio::spawn(async move { dispatcher.run(inbound_rx).await });

    let mut in_flight = JoinSet::new();
    let mut framed = FramedRead::new(tokio::io::stdin(), JsonFrameCodec::new());
    loop {
        tokio::select! {
            frame = framed.next() => match frame {
                Some(Ok(value)) => match serde_json::from_value::<JsonRpcRequest>(value) {
                    Ok(request) => {
                        in_flight.spawn(forward_request(&relay, request, out_tx.clone()));
                    }
                    Err(e) => warn!("Host frame is not a JSON-RPC request: {}", e),
                },
                Some(Err(e)) => {
                    error!("Host framing error: {}", e);
                    break;
                }
                None => break,
            },
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    info!(
        "Host input closed, waiting on {} in-flight request(s)",
        in_flight.len()
    );
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!("Request task failed: {}", e);
        }
    }

    // Subscribers hold writer handles; the relay state must go before the
    // writer sees the end of its channel.
    dispatch_loop.abort();
    let _ = dispatch_loop.await;
    drop(relay);
    drop(out_tx);
    writer.await.context("Host writer task failed")?;

    info!("Shutting down.");
    Ok(())
}

/// Resolves once the response for `request` has been queued for stdout.
fn forward_request(
    relay: &Relay,
    request: JsonRpcRequest,
    out: mpsc::UnboundedSender<Value>,
) -> impl Future<Output = ()> + Send + 'static {
    let handle = relay.send_async(request);
    let id = handle.id().clone();
    async move {
        let response = handle.await.unwrap_or_else(|e| {
            JsonRpcResponse::failure(id, e.json_rpc_code(), &e.to_string())
        });
        match serde_json::to_value(&response) {
            Ok(value) => {
                let _ = out.send(value);
            }
            Err(e) => error!("Failed to encode response: {}", e),
        }
    }
}

fn spawn_host_writer<W>(writer: W, mut rx: mpsc::UnboundedReceiver<Value>) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedWrite::new(writer, JsonFrameCodec::new());
        while let Some(frame) = rx.recv().await {
            if let Err(e) = framed.send(frame).await {
                error!("Failed to write to host: {}", e);
                break;
            }
        }
        if let Err(e) = SinkExt::<Value>::flush(&mut framed).await {
            error!("Failed to flush host output: {}", e);
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cat_authority_echoes_frames() {
        let (inbound_tx, mut inbound_rx) = mpsc::channel(8);
        let host = ProcessFrameHost::new(
            AuthorityCommand {
                program: "cat".into(),
                args: vec![],
                page_host: "localhost".into(),
            },
            inbound_tx,
        );

        assert!(!host.post_message(&Envelope::new("early", None), "https://app.portis.io"));

        host.mount("https://app.portis.io/send/?p=e30=").await.unwrap();
        assert!(host.is_attached());
        assert!(host.post_message(&Envelope::new("ready", None), "https://app.portis.io"));

        let event = inbound_rx.recv().await.unwrap();
        assert_eq!(event.origin, "https://app.portis.io");
        assert_eq!(event.data, json!({"msgType": "ready"}));
    }

    #[tokio::test]
    async fn test_second_mount_is_rejected() {
        let (inbound_tx, _inbound_rx) = mpsc::channel(8);
        let host = ProcessFrameHost::new(
            AuthorityCommand {
                program: "cat".into(),
                args: vec![],
                page_host: "localhost".into(),
            },
            inbound_tx,
        );
        host.mount("https://app.portis.io/send/?p=e30=").await.unwrap();
        assert!(matches!(
            host.mount("https://app.portis.io/send/?p=e30=").await,
            Err(RelayError::Frame(_))
        ));
    }
}
