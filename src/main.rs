// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use agw_gateway_rs::{
    cfg::{cli::resolve_config_path, config::Config, logger::init_logger},
    client::{Client, RequestInvoker},
    interceptor::Request,
};
use anyhow::{Context, Result};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _init_logger = init_logger("config/logger.yaml")?;

    let cfg = resolve_config_path("config/agw.yaml")
        .and_then(Config::load_from_file)
        .context("failed to resolve or load config")?;

    let client = Client::instance();
    client.init(cfg, None).await.context("client init failed")?;
    client
        .add_handler("HB", std::sync::Arc::new(|body: &str| Ok(format!("echo:{body}"))))
        .context("failed to register handler")?;

    let invoker = RequestInvoker::new(client);
    let mut req = Request::new();
    req.add_param("message", "hello");
    let resp = invoker.invoke("MyService/MyHandler", req).await;
    info!(?resp, "call completed");

    Ok(())
}
