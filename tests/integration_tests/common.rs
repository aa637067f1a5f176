// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{net::SocketAddr, time::Duration};

use agw_gateway_rs::cfg::config::{Config, Gateway, Identity, RuntimeConfig};
use tokio::net::TcpListener;

pub async fn bind_loopback() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    (listener, addr)
}

pub fn test_config(addr: SocketAddr, pool_size: usize, req_timeout: Duration, retry_count: u32) -> Config {
    Config {
        identity: Identity {
            client_ip: "10.0.0.1".to_string(),
            client_vpc_id: "vpc-abc".to_string(),
            client_process_flag: "RUST_SDK:10.0.0.1:42".to_string(),
        },
        gateway: Gateway {
            ip: addr.ip().to_string(),
            port: addr.port(),
            tls: false,
            cert_region: String::new(),
            cert_base_url: String::new(),
        },
        runtime: RuntimeConfig {
            pool_size,
            req_timeout,
            retry_count,
        },
    }
}
