// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON framing for [`boe_core::protocol::ProtocolMessage`].

use boe_core::protocol::ProtocolMessage;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// A line longer than this is rejected rather than buffered indefinitely.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("connection closed")]
    Closed,
    #[error("message exceeds {0} bytes")]
    TooLarge(usize),
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads one newline-terminated JSON envelope from `reader`.
pub async fn read_message<R>(reader: &mut BufReader<R>) -> Result<ProtocolMessage, WireError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(WireError::Closed);
    }
    if line.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::TooLarge(MAX_MESSAGE_SIZE));
    }
    let message: ProtocolMessage = serde_json::from_str(line.trim_end())?;
    Ok(message)
}

/// Writes `message` to `writer` as one JSON line, flushing afterwards.
pub async fn write_message<W>(writer: &mut W, message: &ProtocolMessage) -> Result<(), WireError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(message)?;
    if line.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::TooLarge(MAX_MESSAGE_SIZE));
    }
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "protocol_wire_tests.rs"]
mod tests;
