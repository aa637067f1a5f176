// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Wire encode/decode for [`Message`].
//!
//! Field order is fixed (see the module doc on the crate's README-equivalent, the spec's
//! §6 wire table): `bodyLength`, `reqId`, `messageType`, `messageDirection`, `caller`,
//! `clientIp`, then the variable-length string fields interleaved with a few more fixed
//! fields, `version`, and finally the body bytes. Everything is big-endian.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{compression, types::Message};
use crate::{
    cfg::enums::{CompressionVersion, MessageDirection, MessageType},
    error::GatewayError,
};

impl Message {
    /// Encodes this message to its wire form.
    ///
    /// On a gzip failure the second element is `false` and the returned bytes only cover
    /// the header portion (`bodyLength` is written as `0`); callers should treat that as
    /// an encode failure rather than send a truncated frame.
    pub fn encode(&self) -> (Vec<u8>, bool) {
        let wants_compression = self.version.compresses(self.message_direction);
        let body_bytes = if wants_compression {
            match compression::compress(&self.body) {
                Ok(b) => b,
                Err(_) => return (self.encode_header(0), false),
            }
        } else {
            self.body.clone()
        };

        let mut buf = self.encode_header(body_bytes.len() as u32);
        buf.extend_from_slice(&body_bytes);
        (buf, true)
    }

    fn encode_header(&self, body_length: u32) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u32(body_length);
        buf.put_u64(self.req_id);
        buf.put_u8(self.message_type as u8);
        buf.put_u8(self.message_direction as u8);
        buf.put_u8(self.caller);
        buf.put_u64(self.client_ip);
        put_string(&mut buf, &self.client_vpc_id);
        put_string(&mut buf, &self.server_name);
        buf.put_u32(self.timeout_ms);
        put_string(&mut buf, &self.client_process_flag);
        buf.put_u32(self.inner_code);
        put_string(&mut buf, &self.inner_msg);
        buf.put_u32(self.connection_id);
        put_string(&mut buf, &self.handler_name);
        put_string(&mut buf, &self.outer_req_id);
        buf.put_u32(self.version as u32);
        buf.to_vec()
    }

    /// Decodes one message from a stream, reading exactly as many bytes as it needs.
    ///
    /// A short read or EOF anywhere in the header or body fails the whole decode; callers
    /// (the connection's reader task) treat that as fatal and close the connection.
    pub async fn decode<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message, GatewayError> {
        let body_length = reader.read_u32().await.map_err(GatewayError::IoRead)? as usize;
        let req_id = reader.read_u64().await.map_err(GatewayError::IoRead)?;
        let message_type_raw = reader.read_u8().await.map_err(GatewayError::IoRead)?;
        let message_direction_raw = reader.read_u8().await.map_err(GatewayError::IoRead)?;
        let caller = reader.read_u8().await.map_err(GatewayError::IoRead)?;
        let client_ip = reader.read_u64().await.map_err(GatewayError::IoRead)?;
        let client_vpc_id = read_string(reader).await?;
        let server_name = read_string(reader).await?;
        let timeout_ms = reader.read_u32().await.map_err(GatewayError::IoRead)?;
        let client_process_flag = read_string(reader).await?;
        let inner_code = reader.read_u32().await.map_err(GatewayError::IoRead)?;
        let inner_msg = read_string(reader).await?;
        let connection_id = reader.read_u32().await.map_err(GatewayError::IoRead)?;
        let handler_name = read_string(reader).await?;
        let outer_req_id = read_string(reader).await?;
        let version_raw = reader.read_u32().await.map_err(GatewayError::IoRead)?;

        let mut body = vec![0u8; body_length];
        reader
            .read_exact(&mut body)
            .await
            .map_err(GatewayError::IoRead)?;

        let message_type = MessageType::from_u8(message_type_raw)
            .ok_or_else(|| GatewayError::IoRead(invalid_data(format!("unknown message type {message_type_raw}"))))?;
        let message_direction = MessageDirection::from_u8(message_direction_raw).ok_or_else(|| {
            GatewayError::IoRead(invalid_data(format!(
                "unknown message direction {message_direction_raw}"
            )))
        })?;
        let version = CompressionVersion::from_u32(version_raw)
            .ok_or_else(|| GatewayError::IoRead(invalid_data(format!("unknown version {version_raw}"))))?;

        let body = if version.compresses(message_direction) {
            compression::decompress(&body).map_err(GatewayError::IoRead)?
        } else {
            body
        };

        Ok(Message {
            req_id,
            message_type,
            message_direction,
            caller,
            client_ip,
            client_vpc_id,
            server_name,
            timeout_ms,
            client_process_flag,
            inner_code,
            inner_msg,
            connection_id,
            handler_name,
            outer_req_id,
            version,
            body,
        })
    }
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

async fn read_string<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, GatewayError> {
    let len = reader.read_u32().await.map_err(GatewayError::IoRead)? as usize;
    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .await
        .map_err(GatewayError::IoRead)?;
    String::from_utf8(bytes).map_err(|e| GatewayError::IoRead(invalid_data(e.to_string())))
}

fn invalid_data(msg: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg)
}
