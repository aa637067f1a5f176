// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The fixed-size round-robin connection pool.
//!
//! Connections are boxed behind `dyn AsyncRead`/`dyn AsyncWrite` so the same map holds
//! either plain-TCP or TLS-wrapped connections uniformly, picked once at construction time
//! from `Config::tls`.

use std::{
    path::PathBuf,
    sync::{Arc, Weak},
    time::Duration,
};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use rustls_pki_types::ServerName;
use tokio::{
    io::{AsyncRead, AsyncWrite, split},
    net::TcpStream,
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{common::io_with_timeout, connection::Connection, handler::HandlerTable, ring::Ring};
use crate::{
    cert::{self, CertDownloader, insecure_client_config},
    creds::CredentialsStore,
    error::GatewayError,
    interceptor::InterceptorChain,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;
pub type PoolConnection = Connection<BoxedReader, BoxedWriter>;

pub struct Pool {
    ring: Ring,
    conns: DashMap<u32, Arc<PoolConnection>>,
    dial_lock: Mutex<()>,
    self_weak: OnceCell<Weak<Pool>>,
    addr: String,
    tls: bool,
    cert_downloader: Option<Arc<dyn CertDownloader>>,
    cert_path: PathBuf,
    handlers: Arc<HandlerTable>,
    interceptors: InterceptorChain,
    credentials: Arc<CredentialsStore>,
    cancel: CancellationToken,
    req_timeout: Duration,
}

impl Pool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        size: usize,
        addr: impl Into<String>,
        tls: bool,
        cert_downloader: Option<Arc<dyn CertDownloader>>,
        cert_path: PathBuf,
        handlers: Arc<HandlerTable>,
        interceptors: InterceptorChain,
        credentials: Arc<CredentialsStore>,
        req_timeout: Duration,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let pool = Arc::new(Self {
            ring: Ring::new(size),
            conns: DashMap::new(),
            dial_lock: Mutex::new(()),
            self_weak: OnceCell::new(),
            addr: addr.into(),
            tls,
            cert_downloader,
            cert_path,
            handlers,
            interceptors,
            credentials,
            cancel,
            req_timeout,
        });
        let _ = pool.self_weak.set(Arc::downgrade(&pool));
        pool
    }

    pub fn size(&self) -> usize {
        self.ring.len()
    }

    /// Picks the next connId in round-robin order and returns its (possibly freshly
    /// dialed) connection.
    pub async fn get_next(&self) -> Result<Arc<PoolConnection>, GatewayError> {
        let id = self.ring.next();
        self.get(id).await
    }

    /// Returns the connection bound to `id`, dialing a fresh one if the slot is empty.
    ///
    /// Double-checked locking: the fast path only touches the concurrent map; dialing a
    /// new connection is serialised by one pool-wide mutex so two callers racing for the
    /// same empty slot don't both dial.
    pub async fn get(&self, id: u32) -> Result<Arc<PoolConnection>, GatewayError> {
        if let Some(c) = self.conns.get(&id) {
            return Ok(Arc::clone(c.value()));
        }

        let _guard = self.dial_lock.lock().await;
        if let Some(c) = self.conns.get(&id) {
            return Ok(Arc::clone(c.value()));
        }

        let conn = self.dial(id).await?;
        if let Some(w) = self.self_weak.get() {
            conn.bind_pool(w.clone());
        }
        self.conns.insert(id, Arc::clone(&conn));
        Ok(conn)
    }

    pub fn remove(&self, id: u32) {
        self.conns.remove(&id);
    }

    async fn dial(&self, id: u32) -> Result<Arc<PoolConnection>, GatewayError> {
        if !self.tls {
            let stream = io_with_timeout("pool dial", TcpStream::connect(&self.addr), CONNECT_TIMEOUT, &self.cancel)
                .await
                .map_err(|e| GatewayError::IoWrite(std::io::Error::other(e.to_string())))?;
            stream.set_nodelay(true).map_err(GatewayError::IoWrite)?;
            let (r, w) = stream.into_split();
            let reader: BoxedReader = Box::new(r);
            let writer: BoxedWriter = Box::new(w);
            return Ok(Connection::from_parts(
                reader,
                writer,
                id,
                Arc::clone(&self.handlers),
                self.interceptors.clone(),
                Arc::clone(&self.credentials),
                self.req_timeout,
                self.cancel.clone(),
            ));
        }

        match self.dial_tls(id, false).await {
            Ok(c) => Ok(c),
            Err(_) => self.dial_tls(id, true).await,
        }
    }

    async fn dial_tls(&self, id: u32, force_redownload: bool) -> Result<Arc<PoolConnection>, GatewayError> {
        if let Some(downloader) = &self.cert_downloader {
            cert::ensure_cert(downloader.as_ref(), &self.cert_path, "ca.crt", force_redownload).await?;
        }

        let stream = io_with_timeout("pool dial tls", TcpStream::connect(&self.addr), CONNECT_TIMEOUT, &self.cancel)
            .await
            .map_err(|e| GatewayError::IoWrite(std::io::Error::other(e.to_string())))?;
        stream.set_nodelay(true).map_err(GatewayError::IoWrite)?;

        let host = self.addr.rsplit_once(':').map(|(h, _)| h).unwrap_or(&self.addr);
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| GatewayError::IoWrite(std::io::Error::other(e.to_string())))?;

        let connector = tokio_rustls::TlsConnector::from(insecure_client_config());
        let tls_stream = connector
            .connect(server_name, stream)
            .await
            .map_err(GatewayError::IoWrite)?;

        let (r, w) = split(tls_stream);
        let reader: BoxedReader = Box::new(r);
        let writer: BoxedWriter = Box::new(w);
        debug!("pool slot {id} dialed TLS connection to {}", self.addr);
        Ok(Connection::from_parts(
            reader,
            writer,
            id,
            Arc::clone(&self.handlers),
            self.interceptors.clone(),
            Arc::clone(&self.credentials),
            self.req_timeout,
            self.cancel.clone(),
        ))
    }
}
