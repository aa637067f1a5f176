// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The public client surface: `init`, `add_handler`, `call`, plus the `RequestInvoker`
//! shim business collaborators call through.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use super::{handler::Handler, idgen::IdGenerator, pool::Pool};
use crate::{
    cert::{self, CertDownloader},
    cfg::{config::Config, enums::{CompressionVersion, MessageDirection, MessageType}},
    client::handler::HandlerTable,
    creds::CredentialsStore,
    error::GatewayError,
    heartbeat,
    interceptor::{CodeType, InterceptorChain, InterceptorContext, Request, Response},
    message::Message,
};

/// Target-RPC coordinates and per-call knobs, supplied alongside `jsonParam` by the
/// caller of [`Client::call`].
#[derive(Debug, Clone)]
pub struct RpcMetadata {
    pub server_name: String,
    pub handler_name: String,
    pub timeout_ms: u32,
    pub version: CompressionVersion,
}

struct ClientState {
    config: Config,
    client_ip: u64,
    pool: Arc<Pool>,
}

/// The client instance. Holds the process-wide collaborators (handler table,
/// credentials store, interceptor chain, id generator) unconditionally; the pool and
/// identity fields only exist after [`Client::init`] succeeds.
pub struct Client {
    handlers: Arc<HandlerTable>,
    credentials: Arc<CredentialsStore>,
    interceptors: InterceptorChain,
    ids: Arc<IdGenerator>,
    cancel: CancellationToken,
    state: OnceCell<ClientState>,
}

static INSTANCE: OnceCell<Arc<Client>> = OnceCell::new();

impl Client {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handlers: Arc::new(HandlerTable::new()),
            credentials: Arc::new(CredentialsStore::new()),
            interceptors: InterceptorChain::default_chain(),
            ids: Arc::new(IdGenerator::new()),
            cancel: CancellationToken::new(),
            state: OnceCell::new(),
        })
    }

    /// The process-wide instance, created lazily on first access.
    pub fn instance() -> Arc<Self> {
        INSTANCE.get_or_init(Client::new).clone()
    }

    pub fn credentials(&self) -> &CredentialsStore {
        &self.credentials
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Idempotent single-shot setup: validates identity, provisions the TLS cert when
    /// enabled, builds the pool and starts the heartbeat driver. A second call returns
    /// `dup init`.
    pub async fn init(&self, config: Config, cert_downloader: Option<Arc<dyn CertDownloader>>) -> Result<(), GatewayError> {
        if self.state.get().is_some() {
            return Err(GatewayError::DupInit);
        }

        if config.identity.client_ip.is_empty()
            || config.identity.client_vpc_id.is_empty()
            || config.identity.client_process_flag.is_empty()
        {
            return Err(GatewayError::Encode("clientIp/clientVpcId/clientProcessFlag must not be empty".to_string()));
        }

        let client_ip = crate::utils::ipv4_to_u64(&config.identity.client_ip)
            .ok_or_else(|| GatewayError::Encode(format!("invalid ClientIp: {}", config.identity.client_ip)))?;

        let cert_path = std::env::temp_dir().join("agw-gateway-ca.crt");
        if config.gateway.tls && let Some(downloader) = &cert_downloader {
            cert::ensure_cert(downloader.as_ref(), &cert_path, "ca.crt", false).await?;
        }

        let pool = Pool::new(
            config.runtime.pool_size,
            config.gateway.addr(),
            config.gateway.tls,
            cert_downloader,
            cert_path,
            Arc::clone(&self.handlers),
            self.interceptors.clone(),
            Arc::clone(&self.credentials),
            config.runtime.req_timeout,
            self.cancel.clone(),
        );

        heartbeat::spawn(
            Arc::clone(&pool),
            client_ip,
            config.identity.client_vpc_id.clone(),
            config.identity.client_process_flag.clone(),
            Arc::clone(&self.ids),
            self.cancel.clone(),
        );

        self.state
            .set(ClientState { config, client_ip, pool })
            .map_err(|_| GatewayError::DupInit)
    }

    /// Registers `handler` under `name` in the process-wide handler table.
    pub fn add_handler(&self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Result<(), GatewayError> {
        self.handlers.add(name, handler)
    }

    /// The main RPC. Retries up to `runtime.retry_count` attempts, generating a fresh
    /// `reqId` each time, but only when the previous attempt's error is retryable; any
    /// other error (including a business error) breaks out immediately.
    pub async fn call(
        &self,
        outer_req_id: impl Into<String>,
        rpc: &RpcMetadata,
        json_param: impl Into<String>,
    ) -> Result<String, GatewayError> {
        let state = self.state.get().ok_or(GatewayError::NotInitialized)?;
        let outer_req_id = outer_req_id.into();
        let json_param = json_param.into();

        let mut last_err = GatewayError::NotInitialized;
        for _ in 0..state.config.runtime.retry_count {
            let req_id = self.ids.generate();
            let mut msg = Message::new(
                req_id,
                MessageType::Biz,
                MessageDirection::Request,
                state.client_ip,
                state.config.identity.client_vpc_id.clone(),
                state.config.identity.client_process_flag.clone(),
            );
            msg.server_name = rpc.server_name.clone();
            msg.handler_name = rpc.handler_name.clone();
            msg.timeout_ms = rpc.timeout_ms;
            msg.version = rpc.version;
            msg.outer_req_id = outer_req_id.clone();
            msg.body = json_param.clone().into_bytes();

            let conn = match state.pool.get_next().await {
                Ok(c) => c,
                Err(e) => {
                    last_err = e;
                    if last_err.is_retryable() {
                        continue;
                    }
                    return Err(last_err);
                },
            };
            msg.connection_id = conn.conn_id();

            match conn.write_sync(msg).await {
                Ok(resp) if resp.inner_code != 0 => {
                    return Err(GatewayError::BusinessError {
                        code: resp.inner_code,
                        msg: resp.inner_msg,
                    });
                },
                Ok(resp) => return Ok(String::from_utf8_lossy(&resp.body).into_owned()),
                Err(e) => {
                    last_err = e;
                    if !last_err.is_retryable() {
                        return Err(last_err);
                    }
                },
            }
        }
        Err(last_err)
    }
}

fn split_uri(uri: &str) -> (String, String) {
    match uri.split_once('/') {
        Some((server, handler)) => (server.to_string(), handler.to_string()),
        None => (uri.to_string(), String::new()),
    }
}

/// The higher-level shim business collaborators call through: JSON-encodes `Request`,
/// runs the outbound interceptor chain, calls [`Client::call`], and JSON-decodes the
/// reply back into a `Response`.
pub struct RequestInvoker {
    client: Arc<Client>,
}

impl RequestInvoker {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn invoke(&self, uri: &str, mut request: Request) -> Response {
        let ctx = InterceptorContext {
            credentials: self.client.credentials(),
        };
        if let Err(resp) = self.client.interceptors.invoke(&ctx, &mut request) {
            return resp;
        }

        let json_param = match serde_json::to_string(&request) {
            Ok(s) => s,
            Err(e) => return Response::fail(CodeType::EncodeError, e.to_string()),
        };

        let (server_name, handler_name) = split_uri(uri);
        let rpc = RpcMetadata {
            server_name,
            handler_name,
            timeout_ms: 3000,
            version: CompressionVersion::NoCompress,
        };
        let outer_req_id = request.headers.get("traceId").cloned().unwrap_or_default();

        match self.client.call(outer_req_id, &rpc, json_param).await {
            Ok(body) => serde_json::from_str::<Response>(&body)
                .unwrap_or_else(|e| Response::fail(CodeType::DecodeError, e.to_string())),
            Err(GatewayError::BusinessError { code, msg }) => Response::fail(CodeType::ServerError, format!("[{code}] {msg}")),
            Err(e) => Response::fail(CodeType::ServerError, e.to_string()),
        }
    }
}
