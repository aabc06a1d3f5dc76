// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Line-delimited JSON-RPC over stdin/stdout.
//!
//! stdout carries protocol frames only; logging goes to stderr.

use super::processor::McpProcessor;
use crate::error::AppError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Serve MCP on the process's stdin/stdout until EOF.
pub async fn run_stdio(processor: McpProcessor) -> Result<(), AppError> {
    tracing::info!("MCP stdio transport ready");
    serve(
        processor,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Serve MCP over any line-oriented reader/writer pair.
pub async fn serve<R, W>(processor: McpProcessor, reader: R, mut writer: W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Transport read error: {}", e)))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(response) = processor.handle_message(line).await else {
            continue;
        };

        let mut frame = serde_json::to_string(&response)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON serialization failed: {}", e)))?;
        frame.push('\n');

        writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Transport write error: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Transport write error: {}", e)))?;
    }

    tracing::info!("stdin closed, MCP stdio transport stopping");
    Ok(())
}
