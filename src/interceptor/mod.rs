// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The outbound/inbound interceptor chain and the JSON envelope it operates over.
//!
//! Modelled as a flat ordered list of a tagged enum dispatched through one trait, not the
//! inheritance-style back-reference chain the original wires up (§9): each entry is
//! independent, and the chain runner short-circuits on the first failure.

pub mod auth;
pub mod timestamp;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::creds::CredentialsStore;

pub const FROM_HEADER: &str = "FR";
pub const CLIENT_TAG: &str = "C";

/// The JSON envelope business collaborators build and the interceptor chain inspects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    pub headers: HashMap<String, String>,
    pub params: HashMap<String, String>,
}

impl Request {
    pub fn new() -> Self {
        let mut req = Self::default();
        req.add_header(FROM_HEADER, CLIENT_TAG);
        req
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        if !key.is_empty() {
            self.headers.insert(key, value.into());
        }
        self
    }

    pub fn add_param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        if !key.is_empty() {
            self.params.insert(key, value.into());
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub code: i32,
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub result: Option<Value>,
}

impl Response {
    pub fn ok(result: Option<Value>) -> Self {
        Self {
            code: CodeType::Ok.code(),
            success: true,
            error: String::new(),
            result,
        }
    }

    pub fn fail(code_type: CodeType, err: impl Into<String>) -> Self {
        Self {
            code: code_type.code(),
            success: false,
            error: err.into(),
            result: None,
        }
    }
}

/// The status table mirroring the original's `Code` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    Ok,
    InvalidTimestamp,
    Forbidden,
    HandlerNotFound,
    TokenNotFound,
    ServiceNotOpened,
    ServiceNotAuthorized,
    ServerError,
    HandlerClosed,
    Timeout,
    Uninitialized,
    EncodeError,
    DecodeError,
}

impl CodeType {
    pub fn code(self) -> i32 {
        match self {
            CodeType::Ok => 200,
            CodeType::InvalidTimestamp => 401,
            CodeType::Forbidden => 403,
            CodeType::HandlerNotFound => 404,
            CodeType::TokenNotFound => 405,
            CodeType::ServiceNotOpened => 410,
            CodeType::ServiceNotAuthorized => 411,
            CodeType::ServerError => 500,
            CodeType::HandlerClosed => 501,
            CodeType::Timeout => 510,
            CodeType::Uninitialized => 511,
            CodeType::EncodeError => 512,
            CodeType::DecodeError => 513,
        }
    }

    pub fn msg(self) -> &'static str {
        match self {
            CodeType::Ok => "success",
            CodeType::InvalidTimestamp => "invalid timestamp",
            CodeType::Forbidden => "forbidden",
            CodeType::HandlerNotFound => "request handler not found",
            CodeType::TokenNotFound => "access token not found",
            CodeType::ServiceNotOpened => "ahas service not opened",
            CodeType::ServiceNotAuthorized => "ahas service not authorized",
            CodeType::ServerError => "server error",
            CodeType::HandlerClosed => "handler closed",
            CodeType::Timeout => "timeout",
            CodeType::Uninitialized => "uninitialized",
            CodeType::EncodeError => "encode error",
            CodeType::DecodeError => "decode error",
        }
    }
}

/// Shared context every built-in interceptor needs to do its job.
pub struct InterceptorContext<'a> {
    pub credentials: &'a CredentialsStore,
}

/// One entry in the chain. Returning `Some(response)` short-circuits the chain with that
/// response as the final result; `None` means "passed, continue".
pub trait Interceptor {
    fn invoke(&self, ctx: &InterceptorContext<'_>, request: &mut Request) -> Option<Response>;
    fn handle(&self, ctx: &InterceptorContext<'_>, request: &Request) -> Option<Response>;
}

/// The two built-in interceptors, as a tagged enum rather than an inheritance chain.
#[derive(Debug, Clone, Copy)]
pub enum BuiltinInterceptor {
    Timestamp,
    Auth,
}

impl Interceptor for BuiltinInterceptor {
    fn invoke(&self, ctx: &InterceptorContext<'_>, request: &mut Request) -> Option<Response> {
        match self {
            BuiltinInterceptor::Timestamp => timestamp::invoke(request),
            BuiltinInterceptor::Auth => auth::invoke(ctx, request),
        }
    }

    fn handle(&self, ctx: &InterceptorContext<'_>, request: &Request) -> Option<Response> {
        match self {
            BuiltinInterceptor::Timestamp => timestamp::handle(request),
            BuiltinInterceptor::Auth => auth::handle(ctx, request),
        }
    }
}

/// An ordered chain, applied `timestamp → auth` as built by [`InterceptorChain::default_chain`].
#[derive(Debug, Clone)]
pub struct InterceptorChain {
    interceptors: Vec<BuiltinInterceptor>,
}

impl InterceptorChain {
    pub fn default_chain() -> Self {
        Self {
            interceptors: vec![BuiltinInterceptor::Timestamp, BuiltinInterceptor::Auth],
        }
    }

    /// Runs the outbound path; `Err` carries the short-circuiting response.
    pub fn invoke(&self, ctx: &InterceptorContext<'_>, request: &mut Request) -> Result<(), Response> {
        for interceptor in &self.interceptors {
            if let Some(resp) = interceptor.invoke(ctx, request) {
                return Err(resp);
            }
        }
        Ok(())
    }

    /// Runs the inbound path; `Err` carries the short-circuiting response.
    pub fn handle(&self, ctx: &InterceptorContext<'_>, request: &Request) -> Result<(), Response> {
        for interceptor in &self.interceptors {
            if let Some(resp) = interceptor.handle(ctx, request) {
                return Err(resp);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_seeds_from_header() {
        let req = Request::new();
        assert_eq!(req.headers.get(FROM_HEADER), Some(&CLIENT_TAG.to_string()));
    }

    #[test]
    fn add_header_ignores_empty_key() {
        let mut req = Request::new();
        req.add_header("", "value");
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn response_ok_carries_200() {
        let resp = Response::ok(None);
        assert!(resp.success);
        assert_eq!(resp.code, 200);
    }

    #[test]
    fn response_fail_carries_code_and_error() {
        let resp = Response::fail(CodeType::Forbidden, "nope");
        assert!(!resp.success);
        assert_eq!(resp.code, 403);
        assert_eq!(resp.error, "nope");
    }
}
