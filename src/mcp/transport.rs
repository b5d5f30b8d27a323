//! Newline-delimited JSON-RPC transport.
//!
//! MCP's stdio transport sends one UTF-8 JSON message per line: requests
//! arrive on stdin and responses leave on stdout. stderr is left to the
//! logger. The transport works over any async reader/writer pair so the
//! server can also be driven from in-memory pipes.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Line-oriented JSON message transport.
pub struct StdioTransport {
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
}

impl StdioTransport {
    /// Transport over the process's stdin and stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::from_io(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }

    /// Transport over an arbitrary reader and writer.
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }

    /// Reads the next line without its terminator.
    ///
    /// Returns `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Serialises `message` as one line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        // Compact serde_json output never contains raw newlines.
        debug_assert!(!json.contains('\n'));

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{JsonRpcResponse, RequestId};

    #[tokio::test]
    async fn lines_read_without_terminators() {
        let input: &[u8] = b"first\r\nsecond\n\nlast";
        let mut transport = StdioTransport::from_io(input, tokio::io::sink());

        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(transport.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn messages_written_one_per_line() {
        let (client, server) = tokio::io::duplex(4096);
        let mut transport = StdioTransport::from_io(tokio::io::empty(), server);

        let response = JsonRpcResponse::success(
            RequestId::Number(7),
            serde_json::json!({ "text": "multi\nline", "nested": { "k": 1 } }),
        );
        transport.send(&response).await.unwrap();
        drop(transport);

        let mut lines = BufReader::new(client).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["result"]["text"], "multi\nline");
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}
