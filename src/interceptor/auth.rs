// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Request signing and verification.
//!
//! `sign = base64(hex(sha256(signData + luneKey)))` — note the double encoding: the hex
//! *string*'s ASCII bytes are what gets base64-encoded, not the raw digest bytes. This
//! matches the original byte-for-byte and is preserved deliberately.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};

use super::{CodeType, InterceptorContext, Request, Response};

pub const SIGN_DATA_KEY: &str = "sd";
pub const SOLEIL_KEY: &str = "ak";
pub const SIGN_KEY: &str = "sn";

fn sign(sign_data: &str, lune_key: &str) -> String {
    let digest = Sha256::digest(format!("{sign_data}{lune_key}").as_bytes());
    let hex_digest = hex::encode(digest);
    BASE64.encode(hex_digest.as_bytes())
}

fn sign_data_for(request: &Request) -> Result<String, serde_json::Error> {
    if let Some(sd) = request.headers.get(SIGN_DATA_KEY) {
        return Ok(sd.clone());
    }
    serde_json::to_string(&request.params)
}

pub fn invoke(ctx: &InterceptorContext<'_>, request: &mut Request) -> Option<Response> {
    let (soleil_key, lune_key) = ctx.credentials.get();
    let (soleil_key, lune_key) = match (soleil_key, lune_key) {
        (Some(s), Some(l)) if !s.is_empty() && !l.is_empty() => (s, l),
        _ => return Some(Response::fail(CodeType::TokenNotFound, CodeType::TokenNotFound.msg())),
    };

    request.add_header(SOLEIL_KEY, soleil_key);

    let sign_data = match sign_data_for(request) {
        Ok(s) => s,
        Err(e) => return Some(Response::fail(CodeType::EncodeError, e.to_string())),
    };
    let computed = sign(&sign_data, &lune_key);
    request.add_header(SIGN_KEY, computed);
    None
}

pub fn handle(ctx: &InterceptorContext<'_>, request: &Request) -> Option<Response> {
    let Some(received_sign) = request.headers.get(SIGN_KEY) else {
        return Some(Response::fail(CodeType::Forbidden, "missing sign"));
    };

    let (local_soleil, local_lune) = ctx.credentials.get();
    if let Some(soleil) = request.headers.get(SOLEIL_KEY) {
        if !soleil.is_empty() && Some(soleil) != local_soleil.as_ref() {
            return Some(Response::fail(CodeType::Forbidden, "soleilKey not matched"));
        }
    }

    let sign_data = match sign_data_for(request) {
        Ok(s) => s,
        Err(_) => return Some(Response::fail(CodeType::Forbidden, "invalid request parameters")),
    };

    let Some(local_lune) = local_lune else {
        return Some(Response::fail(CodeType::Forbidden, "illegal request"));
    };

    let expected = sign(&sign_data, &local_lune);
    if &expected != received_sign {
        return Some(Response::fail(CodeType::Forbidden, "illegal request"));
    }
    None
}
