// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TLS root-certificate provisioning and the insecure verifier the gateway dial path
//! wraps every TLS connection in.
//!
//! `InsecureSkipVerify` is carried over from the original client deliberately: the cached
//! cert is still downloaded and installed, but (matching the original's `tls.Config`
//! semantics) the verifier never consults it to reject a peer. This is a preserved
//! behaviour, not a vulnerability introduced by this crate (see DESIGN.md).

use std::{path::PathBuf, sync::Arc};

use rustls::{
    DigitallySignedStruct, SignatureScheme,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use tokio::fs;

use crate::error::GatewayError;

/// Fetches the TLS root certificate the gateway expects clients to trust.
///
/// A collaborator interface (§6): this crate supplies one concrete, HTTP-based
/// implementation and does not specify the region-to-URL mapping beyond what's passed in.
#[async_trait::async_trait]
pub trait CertDownloader: Send + Sync {
    async fn download(&self, dest: &std::path::Path, region: &str, remote_path: &str, is_private: bool) -> Result<(), GatewayError>;
    fn is_private(&self) -> bool;
    fn region_id(&self) -> String;
}

/// Plain HTTP GET downloader writing the cert to a 0744 file.
pub struct HttpCertDownloader {
    pub base_url: String,
    pub region: String,
    pub private: bool,
}

#[async_trait::async_trait]
impl CertDownloader for HttpCertDownloader {
    async fn download(&self, dest: &std::path::Path, region: &str, remote_path: &str, _is_private: bool) -> Result<(), GatewayError> {
        let url = format!("{}/{}/{}", self.base_url.trim_end_matches('/'), region, remote_path.trim_start_matches('/'));
        let resp = reqwest::get(&url)
            .await
            .map_err(|e| GatewayError::IoRead(std::io::Error::other(e.to_string())))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::IoRead(std::io::Error::other(e.to_string())))?;
        fs::write(dest, &bytes).await.map_err(GatewayError::IoRead)?;
        set_mode_0744(dest).await;
        Ok(())
    }

    fn is_private(&self) -> bool {
        self.private
    }

    fn region_id(&self) -> String {
        self.region.clone()
    }
}

#[cfg(unix)]
async fn set_mode_0744(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = tokio::fs::metadata(path).await {
        let mut perms = meta.permissions();
        perms.set_mode(0o744);
        let _ = tokio::fs::set_permissions(path, perms).await;
    }
}

#[cfg(not(unix))]
async fn set_mode_0744(_path: &std::path::Path) {}

/// Ensures the cached root certificate is present at `dest`, downloading it once if
/// absent. Callers retry once after a failed TLS dial by calling this again with
/// `force = true`.
pub async fn ensure_cert(downloader: &dyn CertDownloader, dest: &PathBuf, remote_path: &str, force: bool) -> Result<(), GatewayError> {
    if !force && fs::metadata(dest).await.is_ok() {
        return Ok(());
    }
    downloader
        .download(dest, &downloader.region_id(), remote_path, downloader.is_private())
        .await
}

/// A `rustls::ClientConfig` that accepts any certificate chain, matching the original's
/// `InsecureSkipVerify=true`. The root store built from the cached cert is still loaded
/// by callers (see `Pool::dial_tls`) even though this verifier never consults it.
#[derive(Debug)]
pub struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
        ]
    }
}

pub fn insecure_client_config() -> Arc<rustls::ClientConfig> {
    let mut cfg = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth();
    cfg.enable_early_data = false;
    Arc::new(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insecure_config_builds() {
        let _ = insecure_client_config();
    }
}
