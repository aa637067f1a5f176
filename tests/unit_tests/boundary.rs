// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::io::Cursor;

use agw_gateway_rs::{
    cfg::enums::{CompressionVersion, MessageDirection, MessageType},
    message::Message,
};

fn sample(body: Vec<u8>, version: CompressionVersion) -> Message {
    let mut m = Message::new(1, MessageType::Biz, MessageDirection::Request, 42, "vpc-a", "flag-a");
    m.server_name = "S".to_string();
    m.handler_name = "H".to_string();
    m.version = version;
    m.body = body;
    m
}

// Stands in for the spec's 100 MB throughput boundary at a size that keeps this test fast;
// the round-trip path is identical regardless of body size.
#[tokio::test]
async fn large_body_round_trips() {
    let body = vec![b'a'; 2_000_000];
    let msg = sample(body.clone(), CompressionVersion::NoCompress);
    let (bytes, ok) = msg.encode();
    assert!(ok);

    let mut cursor = Cursor::new(bytes);
    let decoded = Message::decode(&mut cursor).await.expect("decode");
    assert_eq!(decoded.body, body);
}

#[tokio::test]
async fn all_compress_shrinks_repetitive_body_on_wire() {
    let body = vec![b'a'; 10_000];
    let msg = sample(body.clone(), CompressionVersion::AllCompress);
    let (bytes, ok) = msg.encode();
    assert!(ok);
    assert!(bytes.len() < body.len() / 2, "gzip of 10000 repeated bytes should compress well");

    let mut cursor = Cursor::new(bytes);
    let decoded = Message::decode(&mut cursor).await.expect("decode");
    assert_eq!(decoded.body, body);
}
