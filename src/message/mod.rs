// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The gateway wire frame: field layout, compression rule and the correlation key used to
//! match requests with responses.

pub mod compression;
pub mod frame;
pub mod types;

pub use types::Message;
