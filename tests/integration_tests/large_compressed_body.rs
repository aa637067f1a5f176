// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use agw_gateway_rs::{
    cfg::enums::{CompressionVersion, MessageDirection, MessageType},
    client::{Client, RpcMetadata},
    message::Message,
};
use tokio::io::AsyncWriteExt;

use crate::integration_tests::common::{bind_loopback, test_config};

/// `AllCompress` shrinks a highly repetitive 10 KB body enough that the wire frame is
/// well under half the uncompressed size, and the body still round-trips through a
/// `Call`.
#[tokio::test]
async fn all_compress_round_trips_large_repetitive_body() {
    let body = "x".repeat(10_000);

    let (bytes, ok) = {
        let mut msg = Message::new(1, MessageType::Biz, MessageDirection::Request, 1, "vpc-abc", "flag");
        msg.version = CompressionVersion::AllCompress;
        msg.body = body.clone().into_bytes();
        msg.encode()
    };
    assert!(ok);
    assert!(bytes.len() < body.len() / 2, "expected compressed frame well under half the body size, got {}", bytes.len());

    let (listener, addr) = bind_loopback().await;
    let cfg = test_config(addr, 1, Duration::from_secs(2), 2);

    let client = Client::new();
    client.init(cfg, None).await.expect("init");

    let (mut server_stream, _) = listener.accept().await.expect("accept");
    tokio::spawn(async move {
        loop {
            let req = match Message::decode(&mut server_stream).await {
                Ok(m) => m,
                Err(_) => return,
            };
            if req.message_type == MessageType::Biz && req.message_direction == MessageDirection::Request {
                let mut resp = req.clone();
                resp.message_direction = MessageDirection::Response;
                resp.inner_code = 0;
                resp.inner_msg = "ok".to_string();
                resp.body = req.body.clone();
                let (bytes, ok) = resp.encode();
                assert!(ok);
                server_stream.write_all(&bytes).await.expect("write response");
                return;
            }
        }
    });

    let rpc = RpcMetadata {
        server_name: "S".to_string(),
        handler_name: "H".to_string(),
        timeout_ms: 3000,
        version: CompressionVersion::AllCompress,
    };
    let echoed = client.call("trace-4", &rpc, body.clone()).await.expect("call succeeds");
    assert_eq!(echoed, body);
}
