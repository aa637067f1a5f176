// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use agw_gateway_rs::{
    cfg::enums::CompressionVersion,
    client::{Client, RpcMetadata},
    error::GatewayError,
};

use crate::integration_tests::common::{bind_loopback, test_config};

/// A fake gateway that never replies makes `Call` surface `request timeout` once
/// retries are exhausted.
#[tokio::test]
async fn call_times_out_when_server_never_replies() {
    let (listener, addr) = bind_loopback().await;
    let cfg = test_config(addr, 1, Duration::from_millis(150), 2);

    let client = Client::new();
    client.init(cfg, None).await.expect("init");

    // Accept and hold the connection open without ever writing a reply.
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.expect("accept");
        std::future::pending::<()>().await;
    });

    let rpc = RpcMetadata {
        server_name: "S".to_string(),
        handler_name: "H".to_string(),
        timeout_ms: 3000,
        version: CompressionVersion::NoCompress,
    };
    let err = client.call("trace-2", &rpc, "hello").await.expect_err("should time out");
    assert!(matches!(err, GatewayError::RequestTimeout));
}
