// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{path::PathBuf, sync::Arc, time::Duration};

use agw_gateway_rs::{
    cfg::enums::{MessageDirection, MessageType},
    client::{handler::HandlerTable, pool::Pool},
    creds::CredentialsStore,
    error::GatewayError,
    interceptor::InterceptorChain,
    message::Message,
};
use tokio_util::sync::CancellationToken;

use crate::integration_tests::common::bind_loopback;

/// Two calls racing on the same `reqId` over one pooled connection: the entry-based
/// check in `write_sync` is atomic, so exactly one of two genuinely concurrent calls
/// installs the waiter and the other always observes `DupMsgId`.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_write_sync_with_same_req_id_detects_duplicate() {
    let (listener, addr) = bind_loopback().await;
    tokio::spawn(async move {
        loop {
            if listener.accept().await.is_err() {
                return;
            }
        }
    });

    let pool = Pool::new(
        1,
        addr.to_string(),
        false,
        None,
        PathBuf::from("/tmp/does-not-matter"),
        Arc::new(HandlerTable::new()),
        InterceptorChain::default_chain(),
        Arc::new(CredentialsStore::new()),
        Duration::from_millis(300),
        CancellationToken::new(),
    );
    let conn = pool.get(0).await.expect("dial");

    let msg = Message::new(99, MessageType::Biz, MessageDirection::Request, 1, "vpc-abc", "flag");

    let conn2 = Arc::clone(&conn);
    let msg2 = msg.clone();
    let first = tokio::spawn(async move { conn2.write_sync(msg2).await });
    let second = tokio::spawn(async move { conn.write_sync(msg).await });

    let (first, second) = (first.await.expect("task did not panic"), second.await.expect("task did not panic"));
    let dup_count = [&first, &second].iter().filter(|r| matches!(r, Err(GatewayError::DupMsgId))).count();
    assert_eq!(dup_count, 1, "exactly one racing write_sync call should see DupMsgId");
}
