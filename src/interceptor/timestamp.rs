// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Stamps every outbound request with a timestamp and checks inbound requests carry one.
//!
//! The freshness window described alongside this in the original is commented out there;
//! this reimplementation preserves that and only checks that `ts` is present and parses
//! as an integer (§9 — intentionally not "fixed").

use std::time::{SystemTime, UNIX_EPOCH};

use super::{CodeType, Request, Response};

pub const TIMESTAMP_KEY: &str = "ts";

pub fn invoke(request: &mut Request) -> Option<Response> {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0);
    request.add_param(TIMESTAMP_KEY, micros.to_string());
    None
}

pub fn handle(request: &Request) -> Option<Response> {
    let Some(ts) = request.params.get(TIMESTAMP_KEY) else {
        return Some(Response::fail(CodeType::InvalidTimestamp, CodeType::InvalidTimestamp.msg()));
    };
    match ts.parse::<i64>() {
        Ok(_) => None,
        Err(e) => Some(Response::fail(CodeType::InvalidTimestamp, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_sets_parseable_timestamp() {
        let mut req = Request::new();
        assert!(invoke(&mut req).is_none());
        let ts = req.params.get(TIMESTAMP_KEY).expect("ts set");
        assert!(ts.parse::<i64>().is_ok());
    }

    #[test]
    fn handle_passes_with_valid_timestamp() {
        let mut req = Request::new();
        req.add_param(TIMESTAMP_KEY, "1234567890");
        assert!(handle(&req).is_none());
    }

    #[test]
    fn handle_rejects_missing_timestamp() {
        let req = Request::new();
        let resp = handle(&req).expect("rejected");
        assert_eq!(resp.code, CodeType::InvalidTimestamp.code());
    }

    #[test]
    fn handle_rejects_unparseable_timestamp() {
        let mut req = Request::new();
        req.add_param(TIMESTAMP_KEY, "not-a-number");
        let resp = handle(&req).expect("rejected");
        assert_eq!(resp.code, CodeType::InvalidTimestamp.code());
    }

    #[test]
    fn handle_accepts_any_timestamp_value_no_freshness_check() {
        // Matches the original's commented-out freshness window: even a timestamp from
        // the distant past is accepted as long as it parses.
        let mut req = Request::new();
        req.add_param(TIMESTAMP_KEY, "0");
        assert!(handle(&req).is_none());
    }
}
