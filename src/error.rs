// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The small set of error kinds the retry policy and interceptor chain need to match on
//! precisely. Everything else that can go wrong propagates as `anyhow::Error`.

use thiserror::Error;

/// Transport-level error classification.
///
/// One intentional wart, preserved rather than cleaned up: the broken-pipe / closed-conn
/// check below is a substring match against the underlying `io::Error`'s `Display`, the
/// same way the original client classifies it, instead of matching on `io::ErrorKind`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("dup msg id")]
    DupMsgId,

    #[error("io write error: {0}")]
    IoWrite(#[source] std::io::Error),

    #[error("io read error: {0}")]
    IoRead(#[source] std::io::Error),

    #[error("request timeout")]
    RequestTimeout,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("call error [{code}:{msg}]")]
    BusinessError { code: u32, msg: String },

    #[error("forbidden")]
    Forbidden,

    #[error("invalid timestamp")]
    InvalidTimestamp,

    #[error("token not found")]
    TokenNotFound,

    #[error("handler closed")]
    HandlerClosed,

    #[error("dup init")]
    DupInit,

    #[error("client not initialized")]
    NotInitialized,
}

impl GatewayError {
    /// Whether `Client::call` should retry this attempt.
    ///
    /// Mirrors the original's string-based matching on the underlying transport error,
    /// deliberately not cleaned up to a pure `ErrorKind` match: `write: broken pipe` and
    /// `use of closed network connection` are substrings that only ever show up inside an
    /// `io::Error`'s rendered message, not a distinct error variant.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RequestTimeout | GatewayError::ConnectionClosed => true,
            GatewayError::IoWrite(e) => is_broken_pipe_like(e),
            _ => false,
        }
    }
}

fn is_broken_pipe_like(e: &std::io::Error) -> bool {
    let rendered = e.to_string();
    rendered.contains("write: broken pipe") || rendered.contains("use of closed network connection")
}
