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

/// A `Call` against a fake gateway that replies with `{innerCode:0, body:"world"}`
/// returns `"world"`.
#[tokio::test]
async fn call_returns_decoded_body_on_success() {
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
                resp.body = b"world".to_vec();
                let (bytes, ok) = resp.encode();
                assert!(ok);
                server_stream.write_all(&bytes).await.expect("write response");
                return;
            }
            // ignore heartbeat traffic from the driver and keep scanning.
        }
    });

    let rpc = RpcMetadata {
        server_name: "S".to_string(),
        handler_name: "H".to_string(),
        timeout_ms: 3000,
        version: CompressionVersion::NoCompress,
    };
    let body = client.call("trace-1", &rpc, "hello").await.expect("call succeeds");
    assert_eq!(body, "world");
}
