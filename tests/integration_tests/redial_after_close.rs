// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use agw_gateway_rs::{
    cfg::enums::CompressionVersion,
    client::{Client, RpcMetadata},
};

use crate::integration_tests::common::{bind_loopback, test_config};

/// After the pooled connection's peer half-closes, the next `Call` sees a failed write,
/// and the one after that redials a fresh connection and succeeds.
#[tokio::test]
async fn pool_redials_after_peer_closes_connection() {
    let (listener, addr) = bind_loopback().await;
    // retry_count=1 so the first call fails outright instead of masking the redial
    // behaviour by retrying within the same call; a short timeout bounds the case where
    // the stale write succeeds locally before the kernel notices the peer is gone.
    let cfg = test_config(addr, 1, Duration::from_millis(500), 1);

    let client = Client::new();
    client.init(cfg, None).await.expect("init");

    let (first_stream, _) = listener.accept().await.expect("accept first");
    drop(first_stream);

    let rpc = RpcMetadata {
        server_name: "S".to_string(),
        handler_name: "H".to_string(),
        timeout_ms: 3000,
        version: CompressionVersion::NoCompress,
    };

    let first_err = client.call("trace-3", &rpc, "hello").await.expect_err("first call fails");
    let _ = first_err;

    let (mut second_stream, _) = listener.accept().await.expect("accept second (redial)");
    tokio::spawn(async move {
        use agw_gateway_rs::{cfg::enums::{MessageDirection, MessageType}, message::Message};
        use tokio::io::AsyncWriteExt;
        loop {
            let req = match Message::decode(&mut second_stream).await {
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
                second_stream.write_all(&bytes).await.expect("write response");
                return;
            }
        }
    });

    let body = client.call("trace-3", &rpc, "hello").await.expect("second call redials and succeeds");
    assert_eq!(body, "world");
}
