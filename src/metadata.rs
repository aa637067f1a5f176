// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Caller-identity facts the client config is seeded from.
//!
//! This module defines the collaborator shape only; it deliberately does not reimplement
//! cloud-metadata-service probing or container detection (§4.I — out of scope for the
//! core, and the original's container detector is flagged as possibly buggy and is not
//! reproduced here).

use std::process;

/// Supplies the caller-identity facts a `Config` is built from.
pub trait MetadataProvider: Send + Sync {
    fn vpc_id(&self) -> String;
    fn private_ip(&self) -> String;
    fn pid(&self) -> u32;
    fn region_id(&self) -> String;
    fn deploy_env(&self) -> String;
    fn host_ip(&self) -> String;
    fn host_name(&self) -> String;
    fn instance_id(&self) -> String;
    fn license(&self) -> String;
    fn version(&self) -> String;
}

/// An environment-backed `MetadataProvider` with no cloud-metadata-service probing: every
/// field is read from `std::env` or `std::process`, falling back to an empty string when
/// unset.
#[derive(Debug, Default, Clone)]
pub struct LocalMetadataProvider;

impl LocalMetadataProvider {
    fn env(key: &str) -> String {
        std::env::var(key).unwrap_or_default()
    }
}

impl MetadataProvider for LocalMetadataProvider {
    fn vpc_id(&self) -> String {
        Self::env("AHAS_VPC_ID")
    }

    fn private_ip(&self) -> String {
        Self::env("AHAS_PRIVATE_IP")
    }

    fn pid(&self) -> u32 {
        process::id()
    }

    fn region_id(&self) -> String {
        Self::env("AHAS_REGION_ID")
    }

    fn deploy_env(&self) -> String {
        Self::env("AHAS_DEPLOY_ENV")
    }

    fn host_ip(&self) -> String {
        Self::env("AHAS_HOST_IP")
    }

    fn host_name(&self) -> String {
        std::env::var("HOSTNAME").unwrap_or_else(|_| Self::env("HOST"))
    }

    fn instance_id(&self) -> String {
        Self::env("AHAS_INSTANCE_ID")
    }

    fn license(&self) -> String {
        Self::env("AHAS_LICENSE")
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_is_nonzero() {
        let provider = LocalMetadataProvider;
        assert!(provider.pid() > 0);
    }

    #[test]
    fn version_matches_crate_version() {
        let provider = LocalMetadataProvider;
        assert_eq!(provider.version(), env!("CARGO_PKG_VERSION"));
    }
}
