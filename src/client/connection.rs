// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use once_cell::sync::OnceCell;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::{Mutex, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{handler::HandlerTable, pool::Pool};
use crate::{
    cfg::enums::{MessageDirection, MessageType},
    creds::CredentialsStore,
    error::GatewayError,
    interceptor::{InterceptorChain, InterceptorContext, Request as InboundRequest},
    message::Message,
};

/// One connection to the gateway: a reader task, a write-serialising mutex and a map of
/// in-flight requests waiting on a response.
///
/// Generic over the split socket halves so the exact same implementation drives both a
/// plain `TcpStream` and a TLS-wrapped one (`Pool::dial` picks which to construct).
///
/// The reader task is the only thing that ever reads from the socket; `write_sync`/`write`
/// only ever touch the writer half, guarded by its own mutex (§9: the source this was
/// ported from has no such mutex — added here because this reimplementation runs many
/// concurrent callers against one connection and the stricter runtime warrants it).
#[derive(Debug)]
pub struct Connection<R, W> {
    conn_id: u32,
    reader: Mutex<R>,
    writer: Mutex<W>,
    waiters: DashMap<String, oneshot::Sender<Message>>,
    pool: OnceCell<Weak<Pool>>,
    handlers: Arc<HandlerTable>,
    interceptors: InterceptorChain,
    credentials: Arc<CredentialsStore>,
    cancel: CancellationToken,
    req_timeout: Duration,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps already-split socket halves and spawns the reader task. The returned
    /// connection is not yet bound to a pool slot; call [`Connection::bind_pool`] before
    /// use so `close()` can evict itself.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        reader: R,
        writer: W,
        conn_id: u32,
        handlers: Arc<HandlerTable>,
        interceptors: InterceptorChain,
        credentials: Arc<CredentialsStore>,
        req_timeout: Duration,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let conn = Arc::new(Self {
            conn_id,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            waiters: DashMap::new(),
            pool: OnceCell::new(),
            handlers,
            interceptors,
            credentials,
            cancel,
            req_timeout,
        });

        let reader = Arc::clone(&conn);
        tokio::spawn(async move {
            reader.read_loop().await;
        });

        conn
    }

    pub fn conn_id(&self) -> u32 {
        self.conn_id
    }

    pub fn bind_pool(&self, pool: Weak<Pool>) {
        let _ = self.pool.set(pool);
    }

    /// Sends `msg` and waits for its correlated response, or a timeout / close.
    pub async fn write_sync(&self, msg: Message) -> Result<Message, GatewayError> {
        let sync_id = msg.sync_id();
        let (tx, rx) = oneshot::channel();
        match self.waiters.entry(sync_id.clone()) {
            Entry::Occupied(_) => return Err(GatewayError::DupMsgId),
            Entry::Vacant(v) => {
                v.insert(tx);
            },
        }

        if let Err(e) = self.write(&msg).await {
            self.waiters.remove(&sync_id);
            return Err(e);
        }

        match timeout(self.req_timeout, rx).await {
            Ok(Ok(resp)) => {
                if resp.is_connection_closed() {
                    Err(GatewayError::ConnectionClosed)
                } else {
                    Ok(resp)
                }
            },
            Ok(Err(_)) => {
                self.waiters.remove(&sync_id);
                Err(GatewayError::ConnectionClosed)
            },
            Err(_) => {
                self.waiters.remove(&sync_id);
                Err(GatewayError::RequestTimeout)
            },
        }
    }

    /// One-way send: used for heartbeats and for replies to inbound requests.
    pub async fn write(&self, msg: &Message) -> Result<(), GatewayError> {
        if self.cancel.is_cancelled() {
            return Err(GatewayError::ConnectionClosed);
        }
        let (bytes, ok) = msg.encode();
        if !ok {
            return Err(GatewayError::Encode("gzip compression failed".to_string()));
        }
        let mut w = self.writer.lock().await;
        w.write_all(&bytes).await.map_err(GatewayError::IoWrite)
    }

    /// Evicts this connection from its pool slot, shuts the socket down and wakes every
    /// pending waiter with a synthetic "connection closed" response.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get().and_then(Weak::upgrade) {
            pool.remove(self.conn_id);
        }
        {
            let mut w = self.writer.lock().await;
            let _ = w.shutdown().await;
        }
        let pending: Vec<String> = self.waiters.iter().map(|e| e.key().clone()).collect();
        for key in pending {
            if let Some((_, tx)) = self.waiters.remove(&key) {
                let _ = tx.send(Message::connection_closed_response());
            }
        }
    }

    async fn read_loop(self: Arc<Self>) {
        loop {
            if self.cancel.is_cancelled() {
                self.close().await;
                return;
            }

            let msg = {
                let mut r = self.reader.lock().await;
                Message::decode(&mut *r).await
            };

            let msg = match msg {
                Ok(m) => m,
                Err(e) => {
                    warn!("connection {} read failed, closing: {e}", self.conn_id);
                    self.close().await;
                    return;
                },
            };

            match (msg.message_type, msg.message_direction) {
                (MessageType::Biz, MessageDirection::Response) => {
                    let sync_id = msg.sync_id();
                    if let Some((_, tx)) = self.waiters.remove(&sync_id) {
                        let _ = tx.send(msg);
                    } else {
                        debug!("no waiter for syncId {sync_id}, dropping response");
                    }
                },
                (MessageType::Biz, MessageDirection::Request) => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move { this.dispatch_request(msg).await });
                },
                (MessageType::Heartbeat, MessageDirection::Request) => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move { this.echo_heartbeat(msg).await });
                },
                (MessageType::Heartbeat, MessageDirection::Response) => {
                    debug!("dropping heartbeat response on connection {}", self.conn_id);
                },
            }
        }
    }

    async fn dispatch_request(self: Arc<Self>, mut msg: Message) {
        let body = String::from_utf8_lossy(&msg.body).into_owned();

        let (inner_code, inner_msg, out_body) = match serde_json::from_slice::<InboundRequest>(&msg.body) {
            Err(e) => (512u32, format!("decode error: {e}"), String::new()),
            Ok(request) => {
                let ctx = InterceptorContext {
                    credentials: &self.credentials,
                };
                match self.interceptors.handle(&ctx, &request) {
                    Err(resp) => (resp.code as u32, resp.error, String::new()),
                    Ok(()) => match self.handlers.get(&msg.handler_name) {
                        Some(h) => match h.handle(&body) {
                            Ok(reply) => (0u32, "ok".to_string(), reply),
                            Err(e) => (1u32, e.to_string(), String::new()),
                        },
                        None => (501u32, "handler closed".to_string(), String::new()),
                    },
                }
            },
        };

        msg.message_direction = MessageDirection::Response;
        msg.inner_code = inner_code;
        msg.inner_msg = inner_msg;
        msg.body = out_body.into_bytes();

        if let Err(e) = self.write(&msg).await {
            warn!("failed to write response on connection {}: {e}", self.conn_id);
        }
    }

    async fn echo_heartbeat(self: Arc<Self>, mut msg: Message) {
        msg.message_direction = MessageDirection::Response;
        if let Err(e) = self.write(&msg).await {
            warn!("failed to echo heartbeat on connection {}: {e}", self.conn_id);
        }
    }
}
