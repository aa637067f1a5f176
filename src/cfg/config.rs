// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Caller identity carried on every message.
    pub identity: Identity,
    /// Gateway endpoint and transport knobs.
    pub gateway: Gateway,
    /// Pool/retry/timeout tuning.
    pub runtime: RuntimeConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Identity {
    #[serde(rename = "ClientIp")]
    pub client_ip: String,
    #[serde(rename = "ClientVpcId")]
    pub client_vpc_id: String,
    #[serde(rename = "ClientProcessFlag")]
    pub client_process_flag: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Gateway {
    #[serde(rename = "GatewayIp")]
    pub ip: String,
    #[serde(rename = "GatewayPort")]
    pub port: u16,
    #[serde(default, rename = "Tls")]
    pub tls: bool,
    #[serde(default, rename = "CertRegion")]
    pub cert_region: String,
    #[serde(default, rename = "CertBaseUrl")]
    pub cert_base_url: String,
}

impl Gateway {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RuntimeConfig {
    #[serde(default = "default_pool_size", rename = "PoolSize")]
    pub pool_size: usize,
    #[serde(default = "default_req_timeout", rename = "ReqTimeoutSec", with = "serde_secs")]
    pub req_timeout: Duration,
    #[serde(default = "default_retry_count", rename = "RetryCount")]
    pub retry_count: u32,
}

fn default_pool_size() -> usize {
    2
}

fn default_req_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_retry_count() -> u32 {
    3
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config = serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(!self.identity.client_ip.is_empty(), "ClientIp must not be empty");
        ensure!(!self.identity.client_vpc_id.is_empty(), "ClientVpcId must not be empty");
        ensure!(
            !self.identity.client_process_flag.is_empty(),
            "ClientProcessFlag must not be empty"
        );
        ensure!(!self.gateway.ip.is_empty(), "GatewayIp must not be empty");
        ensure!(self.gateway.port != 0, "GatewayPort must not be zero");
        if self.gateway.tls {
            ensure!(!self.gateway.cert_base_url.is_empty(), "CertBaseUrl is required when Tls is enabled");
        }
        if self.runtime.pool_size == 0 {
            self.runtime.pool_size = default_pool_size();
        }
        ensure!(self.runtime.retry_count >= 1, "RetryCount must be >= 1");
        Ok(())
    }
}

mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
