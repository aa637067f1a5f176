// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

#![allow(clippy::all)]

mod integration_tests {
    pub mod common;

    pub mod call_success;
    pub mod call_timeout;
    pub mod dup_msg_id;
    pub mod heartbeat_echo;
    pub mod large_compressed_body;
    pub mod redial_after_close;
}
