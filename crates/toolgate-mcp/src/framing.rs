// crates/toolgate-mcp/src/framing.rs
// ============================================================================
// Module: Stdio Framing
// Description: Content-Length framing for JSON-RPC over byte streams.
// Purpose: Read and write one JSON-RPC message per frame.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! A frame is a header block terminated by an empty line followed by exactly
//! `Content-Length` payload bytes. Unknown headers are ignored. The body of
//! a frame larger than the configured limit is drained unread and reported
//! as [`Frame::Oversized`], leaving the stream positioned at the next frame.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::sink;

use crate::server::McpServerError;

// ============================================================================
// SECTION: Frames
// ============================================================================

/// One inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Payload within the size limit.
    Payload(Vec<u8>),
    /// Payload over the limit; carries the declared length. Its bytes were
    /// consumed and discarded.
    Oversized(usize),
}

// ============================================================================
// SECTION: Framing
// ============================================================================

/// Reads one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new frame.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] for malformed headers or a stream
/// that ends mid-frame.
pub async fn read_framed<R>(reader: &mut R, max_body_bytes: usize) -> Result<Option<Frame>, McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .await
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if bytes == 0 {
            if saw_header {
                return Err(McpServerError::Transport("stdio closed mid-frame".to_string()));
            }
            return Ok(None);
        }
        if line.trim().is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| McpServerError::Transport("invalid content length".to_string()))?;
            content_length = Some(parsed);
        }
    }
    let len = content_length
        .ok_or_else(|| McpServerError::Transport("missing content length".to_string()))?;
    if len > max_body_bytes {
        let limit = u64::try_from(len).unwrap_or(u64::MAX);
        let drained = tokio::io::copy(&mut (&mut *reader).take(limit), &mut sink())
            .await
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if drained != limit {
            return Err(McpServerError::Transport("stdio closed mid-frame".to_string()));
        }
        return Ok(Some(Frame::Oversized(len)));
    }
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
    Ok(Some(Frame::Payload(buf)))
}

/// Writes one framed payload and flushes.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] when the write fails.
pub async fn write_framed<W>(writer: &mut W, payload: &[u8]) -> Result<(), McpServerError>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer
        .write_all(header.as_bytes())
        .await
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer
        .write_all(payload)
        .await
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer.flush().await.map_err(|_| McpServerError::Transport("stdio write failed".to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only framing assertions.")]

    use super::Frame;
    use super::read_framed;
    use super::write_framed;

    const PAYLOAD: &[u8] = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut framed = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
        framed.extend_from_slice(payload);
        framed
    }

    #[tokio::test]
    async fn oversized_frame_is_drained_and_reported() {
        let mut stream = frame(PAYLOAD);
        stream.extend_from_slice(&frame(b"{}"));
        let mut reader = stream.as_slice();
        assert_eq!(
            read_framed(&mut reader, PAYLOAD.len() - 1).await.unwrap(),
            Some(Frame::Oversized(PAYLOAD.len()))
        );
        assert_eq!(read_framed(&mut reader, PAYLOAD.len() - 1).await.unwrap(), Some(Frame::Payload(b"{}".to_vec())));
    }

    #[tokio::test]
    async fn truncated_oversized_frame_is_an_error() {
        let mut reader = &b"Content-Length: 100\r\n\r\n{}"[..];
        assert!(read_framed(&mut reader, 10).await.is_err());
    }

    #[tokio::test]
    async fn read_framed_accepts_payload_at_limit() {
        let framed = frame(PAYLOAD);
        let read = read_framed(&mut framed.as_slice(), PAYLOAD.len()).await.unwrap();
        assert_eq!(read, Some(Frame::Payload(PAYLOAD.to_vec())));
    }

    #[tokio::test]
    async fn read_framed_reads_consecutive_frames_then_eof() {
        let mut stream = frame(b"{}");
        stream.extend_from_slice(&frame(b"[]"));
        let mut reader = stream.as_slice();
        assert_eq!(read_framed(&mut reader, 64).await.unwrap(), Some(Frame::Payload(b"{}".to_vec())));
        assert_eq!(read_framed(&mut reader, 64).await.unwrap(), Some(Frame::Payload(b"[]".to_vec())));
        assert_eq!(read_framed(&mut reader, 64).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_framed_requires_content_length() {
        let mut reader = &b"Content-Type: application/json\r\n\r\n{}"[..];
        assert!(read_framed(&mut reader, 64).await.is_err());
    }

    #[tokio::test]
    async fn write_framed_emits_header_and_body() {
        let mut out = Vec::new();
        write_framed(&mut out, b"{}").await.unwrap();
        assert_eq!(out, b"Content-Length: 2\r\n\r\n{}");
    }
}
