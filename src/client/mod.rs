// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

pub mod client;
pub mod common;
pub mod connection;
pub mod handler;
pub mod idgen;
pub mod pool;
pub mod ring;

pub use client::{Client, RequestInvoker, RpcMetadata};
