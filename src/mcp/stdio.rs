//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! One process serves one MCP client, so every request shares a single session.

// crates.io
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
// self
use crate::{
	_prelude::*,
	auth::SessionId,
	mcp::{JsonRpcRequest, JsonRpcResponse, McpHandler},
};

/// Session identifier used by the stdio transport.
pub const STDIO_SESSION: &str = "stdio";

/// Serves MCP on the process's stdin/stdout until stdin closes.
pub async fn serve_stdio(handler: &McpHandler) -> Result<(), io::Error> {
	serve_lines(handler, BufReader::new(io::stdin()), io::stdout()).await
}

/// Serves MCP over any line-oriented reader/writer pair.
pub async fn serve_lines<R, W>(
	handler: &McpHandler,
	reader: R,
	mut writer: W,
) -> Result<(), io::Error>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let session = SessionId::new(STDIO_SESSION)
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
	let mut lines = reader.lines();

	tracing::info!("Serving MCP over stdio.");

	while let Some(line) = lines.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}

		let response = match JsonRpcRequest::parse(&line) {
			Ok(request) => handler.handle(&session, request).await,
			Err(response) => Some(response),
		};

		if let Some(response) = response {
			write_response(&mut writer, &response).await?;
		}
	}

	tracing::info!("Stdin closed; stopping stdio transport.");

	Ok(())
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), io::Error>
where
	W: AsyncWrite + Unpin,
{
	let mut line = serde_json::to_vec(response)?;

	line.push(b'\n');
	writer.write_all(&line).await?;
	writer.flush().await
}
