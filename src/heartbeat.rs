// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The per-client keep-alive driver: one task that walks every pool slot and sends a
//! heartbeat, sleeping longer after a failure.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    cfg::enums::{CompressionVersion, MessageDirection, MessageType},
    client::pool::Pool,
    message::Message,
};

const EACH_LOOP_SLEEP: Duration = Duration::from_millis(20_000);
const ERROR_SLEEP: Duration = Duration::from_millis(5_000);
const HB_SERVER_NAME: &str = "HBGATEWAY";
const HB_HANDLER_NAME: &str = "HB";
const HB_BODY: &str = "HBMSGBODY";
const HB_TIMEOUT_MS: u32 = 3000;

pub fn heartbeat_message(req_id: u64, client_ip: u64, client_vpc_id: &str, client_process_flag: &str) -> Message {
    let mut msg = Message::new(
        req_id,
        MessageType::Heartbeat,
        MessageDirection::Request,
        client_ip,
        client_vpc_id,
        client_process_flag,
    );
    msg.server_name = HB_SERVER_NAME.to_string();
    msg.handler_name = HB_HANDLER_NAME.to_string();
    msg.body = HB_BODY.as_bytes().to_vec();
    msg.timeout_ms = HB_TIMEOUT_MS;
    msg.version = CompressionVersion::NoCompress;
    msg
}

/// Spawns the heartbeat loop for `pool`. The loop runs until `cancel` fires.
pub fn spawn(
    pool: Arc<Pool>,
    client_ip: u64,
    client_vpc_id: String,
    client_process_flag: String,
    id_seed: Arc<crate::client::idgen::IdGenerator>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            for slot in 0..pool.size() {
                if cancel.is_cancelled() {
                    return;
                }
                let req_id = id_seed.generate();
                let msg = heartbeat_message(req_id, client_ip, &client_vpc_id, &client_process_flag);
                match pool.get(slot as u32).await {
                    Ok(conn) => {
                        if let Err(e) = conn.write(&msg).await {
                            warn!("heartbeat on slot {slot} failed: {e}");
                            tokio::select! {
                                _ = cancel.cancelled() => return,
                                _ = tokio::time::sleep(ERROR_SLEEP) => {},
                            }
                        }
                    },
                    Err(e) => {
                        warn!("heartbeat could not acquire connection for slot {slot}: {e}");
                        tokio::select! {
                            _ = cancel.cancelled() => return,
                            _ = tokio::time::sleep(ERROR_SLEEP) => {},
                        }
                    },
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(EACH_LOOP_SLEEP) => {},
            }
        }
    });
}
