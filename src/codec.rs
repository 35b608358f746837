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

//! Stream framing for JSON messages.
//!
//! Each message is a JSON body preceded by an LSP-style `Content-Length`
//! header block. Used by the stdio driver on both its host-facing and
//! authority-facing pipes.

use bytes::BytesMut;
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::constants::limits;
use crate::errors::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Head,
    Body(usize),
}

#[derive(Debug)]
pub struct JsonFrameCodec {
    state: DecodeState,
}

impl JsonFrameCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DecodeState::Head,
        }
    }
}

impl Default for JsonFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn framing(message: &str) -> RelayError {
    RelayError::Framing(message.to_string())
}

/// Offset just past the blank line (`\r\n\r\n` or `\n\n`) ending the headers.
fn header_end(src: &[u8]) -> Option<usize> {
    (0..src.len()).find_map(|i| {
        if src[i] != b'\n' {
            return None;
        }
        let lf_lf = i >= 1 && src[i - 1] == b'\n';
        let crlf_crlf = i >= 3 && src[i - 3..=i] == *b"\r\n\r\n";
        (lf_lf || crlf_crlf).then_some(i + 1)
    })
}

fn content_length(header: &[u8]) -> Result<usize, RelayError> {
    let text = std::str::from_utf8(header).map_err(|_| framing("Invalid UTF-8 in headers"))?;
    let value = text
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim())
        })
        .ok_or_else(|| framing("Missing Content-Length header"))?;

    match value.parse::<usize>() {
        Ok(0) | Err(_) => Err(framing("Invalid Content-Length value")),
        Ok(len) => Ok(len),
    }
}

impl Decoder for JsonFrameCodec {
    type Item = Value;
    type Error = RelayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::Head => {
                    let Some(end) = header_end(src) else {
                        if src.len() > limits::MAX_HEADER_BYTES {
                            return Err(framing("Header too large"));
                        }
                        return Ok(None);
                    };
                    let header = src.split_to(end);
                    let len = content_length(&header)?;
                    if len as u64 > limits::MAX_MESSAGE_SIZE_BYTES {
                        return Err(RelayError::Framing(format!(
                            "Message length {} exceeds max limit",
                            len
                        )));
                    }
                    self.state = DecodeState::Body(len);
                }
                DecodeState::Body(len) => {
                    if src.len() < len {
                        src.reserve(len - src.len());
                        return Ok(None);
                    }
                    let body = src.split_to(len);
                    self.state = DecodeState::Head;
                    let value: Value = serde_json::from_slice(&body)?;
                    trace!("Decoded frame of {} bytes", len);
                    return Ok(Some(value));
                }
            }
        }
    }
}

impl<T: Serialize> Encoder<T> for JsonFrameCodec {
    type Error = RelayError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = serde_json::to_vec(&item)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        dst.reserve(header.len() + body.len());
        dst.extend_from_slice(header.as_bytes());
        dst.extend_from_slice(&body);
        Ok(())
    }
}
