// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Model Context Protocol (JSON-RPC 2.0) surface.

pub mod jsonrpc;
pub mod processor;
pub mod schema;
pub mod transport;

pub use jsonrpc::{JsonRpcRequest, JsonRpcResponse};
pub use processor::McpProcessor;
