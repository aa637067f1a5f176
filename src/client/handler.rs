// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The process-wide handler table inbound requests are dispatched against.
//!
//! Registration is expected to happen before traffic starts; the table itself is
//! concurrent-safe, but there is no lock protecting "register after dispatch already
//! started" races beyond what that gives for free.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::GatewayError;

/// A user-supplied RPC handler: takes the inbound body and returns the outbound body or
/// an error.
pub trait Handler: Send + Sync {
    fn handle(&self, body: &str) -> Result<String, GatewayError>;
}

impl<F> Handler for F
where
    F: Fn(&str) -> Result<String, GatewayError> + Send + Sync,
{
    fn handle(&self, body: &str) -> Result<String, GatewayError> {
        self(body)
    }
}

#[derive(Debug, Default)]
pub struct HandlerTable {
    handlers: DashMap<String, Arc<dyn Handler>>,
}

impl std::fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<handler>")
    }
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`. Rejects an empty name.
    pub fn add(&self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Result<(), GatewayError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GatewayError::Encode("handler name must not be empty".to_string()));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).map(|e| Arc::clone(e.value()))
    }
}
