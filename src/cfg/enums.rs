// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use serde::{Deserialize, Serialize};

/// Which queue a `Message` belongs to on the wire.
///
/// `Biz` carries application RPC traffic; `Heartbeat` is the keep-alive
/// exchanged by the per-connection heartbeat driver.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Heartbeat = 1,
    Biz = 2,
}

impl MessageType {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Biz),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageType::Heartbeat => "Heartbeat",
            MessageType::Biz => "Biz",
        })
    }
}

/// Which side of a request/response pair a `Message` represents.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageDirection {
    Request = 1,
    Response = 2,
}

impl MessageDirection {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Request),
            2 => Some(Self::Response),
            _ => None,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            MessageDirection::Request => MessageDirection::Response,
            MessageDirection::Response => MessageDirection::Request,
        }
    }
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageDirection::Request => "Request",
            MessageDirection::Response => "Response",
        })
    }
}

/// Compression selector carried in the `version` wire field.
///
/// Despite the name this has nothing to do with protocol versioning; it
/// picks whether (and which side of) a message body is gzip-compressed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CompressionVersion {
    NoCompress = 1,
    AllCompress = 2,
    RequestCompress = 3,
    ResponseCompress = 4,
}

impl CompressionVersion {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::NoCompress),
            2 => Some(Self::AllCompress),
            3 => Some(Self::RequestCompress),
            4 => Some(Self::ResponseCompress),
            _ => None,
        }
    }

    /// Whether a message body should be gzipped given its direction.
    #[inline]
    pub fn compresses(self, direction: MessageDirection) -> bool {
        match self {
            CompressionVersion::NoCompress => false,
            CompressionVersion::AllCompress => true,
            CompressionVersion::RequestCompress => direction == MessageDirection::Request,
            CompressionVersion::ResponseCompress => direction == MessageDirection::Response,
        }
    }
}

impl Default for CompressionVersion {
    fn default() -> Self {
        Self::NoCompress
    }
}

impl fmt::Display for CompressionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = *self as u32;
        write!(f, "{v}")
    }
}
