// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::cfg::enums::{CompressionVersion, MessageDirection, MessageType};

/// One framed unit of the gateway RPC protocol.
///
/// Field order here matches construction order, not wire order; see
/// [`super::frame`] for the wire layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub req_id: u64,
    pub message_type: MessageType,
    pub message_direction: MessageDirection,
    pub caller: u8,
    pub client_ip: u64,
    pub client_vpc_id: String,
    pub server_name: String,
    pub timeout_ms: u32,
    pub client_process_flag: String,
    pub inner_code: u32,
    pub inner_msg: String,
    pub connection_id: u32,
    pub handler_name: String,
    pub outer_req_id: String,
    pub version: CompressionVersion,
    pub body: Vec<u8>,
}

impl Message {
    /// A new message with the spec's defaults: `innerCode = 0`, `innerMsg = "ok"`,
    /// `version = NoCompress`.
    pub fn new(
        req_id: u64,
        message_type: MessageType,
        message_direction: MessageDirection,
        client_ip: u64,
        client_vpc_id: impl Into<String>,
        client_process_flag: impl Into<String>,
    ) -> Self {
        Self {
            req_id,
            message_type,
            message_direction,
            caller: 0,
            client_ip,
            client_vpc_id: client_vpc_id.into(),
            server_name: String::new(),
            timeout_ms: 0,
            client_process_flag: client_process_flag.into(),
            inner_code: 0,
            inner_msg: "ok".to_string(),
            connection_id: 0,
            handler_name: String::new(),
            outer_req_id: String::new(),
            version: CompressionVersion::NoCompress,
            body: Vec::new(),
        }
    }

    /// The correlation key used to match a request with its response inside one
    /// connection's waiter map.
    ///
    /// Identical on request and response because the server echoes `clientVpcId`,
    /// `clientIp`, `clientProcessFlag` and `reqId` verbatim.
    pub fn sync_id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.client_vpc_id, self.client_ip, self.client_process_flag, self.req_id
        )
    }

    /// Builds the synthetic response delivered to every waiter when a connection closes.
    ///
    /// Only `innerMsg` is meaningful here: waiters are matched by map key before this
    /// value is ever inspected, so the identity fields are left blank.
    pub fn connection_closed_response() -> Self {
        let mut m = Self::new(0, MessageType::Biz, MessageDirection::Response, 0, "", "");
        m.inner_msg = "connection closed".to_string();
        m
    }

    pub fn is_connection_closed(&self) -> bool {
        self.inner_msg == "connection closed"
    }
}
