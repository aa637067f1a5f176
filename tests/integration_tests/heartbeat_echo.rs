// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{sync::Arc, time::Duration};

use agw_gateway_rs::{
    cfg::enums::{CompressionVersion, MessageDirection, MessageType},
    client::Client,
    message::Message,
};
use tokio::io::AsyncWriteExt;

use crate::integration_tests::common::{bind_loopback, test_config};

/// `Init`, `AddHandler("HB", echo)`, then an inbound heartbeat must come back echoed
/// with `direction=Response` and the original `reqId`.
#[tokio::test]
async fn inbound_heartbeat_is_echoed_with_original_req_id() {
    let (listener, addr) = bind_loopback().await;
    let cfg = test_config(addr, 1, Duration::from_secs(2), 1);

    let client = Client::new();
    client.init(cfg, None).await.expect("init");
    client
        .add_handler("HB", Arc::new(|b: &str| Ok(format!("echo:{b}"))))
        .expect("register handler");

    // The heartbeat driver dials slot 0 immediately on init.
    let (mut server_stream, _) = listener.accept().await.expect("accept");

    let mut hb = Message::new(4242, MessageType::Heartbeat, MessageDirection::Request, 0x0A00_0001, "vpc-abc", "flag");
    hb.server_name = "HBGATEWAY".to_string();
    hb.handler_name = "HB".to_string();
    hb.body = b"HBMSGBODY".to_vec();
    hb.version = CompressionVersion::NoCompress;
    let (bytes, ok) = hb.encode();
    assert!(ok);
    server_stream.write_all(&bytes).await.expect("write heartbeat");

    // The socket also carries the driver's own periodic heartbeat traffic; scan until
    // the echo of our injected frame shows up.
    let mut found = None;
    for _ in 0..8 {
        let decoded = tokio::time::timeout(Duration::from_secs(3), Message::decode(&mut server_stream))
            .await
            .expect("no frame arrived in time")
            .expect("decode");
        if decoded.req_id == 4242 {
            found = Some(decoded);
            break;
        }
    }

    let reply = found.expect("never saw the echoed heartbeat");
    assert_eq!(reply.message_direction, MessageDirection::Response);
    assert_eq!(reply.message_type, MessageType::Heartbeat);
}
