// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The soleil/lune credential pair issued by the gateway at connect time and consumed by
//! the auth interceptor.

use std::{path::PathBuf, sync::RwLock};

use anyhow::{Context, Result};

const META_FILE_NAME: &str = ".ahas-go.meta";

#[derive(Debug, Default)]
struct Inner {
    soleil_key: Option<String>,
    lune_key: Option<String>,
}

/// Read-write-locked in-memory store for the credential pair, persisted to a dotfile in
/// the user's home directory on every successful update.
#[derive(Debug, Default)]
pub struct CredentialsStore {
    inner: RwLock<Inner>,
}

impl CredentialsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> (Option<String>, Option<String>) {
        let guard = self.inner.read().expect("credentials lock poisoned");
        (guard.soleil_key.clone(), guard.lune_key.clone())
    }

    /// Updates both keys in memory and persists them to `~/.ahas-go.meta`.
    pub fn set(&self, soleil_key: impl Into<String>, lune_key: impl Into<String>) -> Result<()> {
        let soleil_key = soleil_key.into();
        let lune_key = lune_key.into();
        {
            let mut guard = self.inner.write().expect("credentials lock poisoned");
            guard.soleil_key = Some(soleil_key.clone());
            guard.lune_key = Some(lune_key.clone());
        }
        persist(&soleil_key, &lune_key)
    }
}

fn meta_path() -> Result<PathBuf> {
    let home = dirs_home()?;
    Ok(home.join(META_FILE_NAME))
}

/// Minimal home-dir lookup; avoids an extra dependency for one environment variable read.
fn dirs_home() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")
}

fn persist(soleil_key: &str, lune_key: &str) -> Result<()> {
    let path = meta_path()?;
    let contents = format!("S={soleil_key}\nL={lune_key}");
    std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Loads a previously persisted credential pair, if any.
pub fn load_persisted() -> Result<Option<(String, String)>> {
    let path = meta_path()?;
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    let mut soleil = None;
    let mut lune = None;
    for line in contents.lines() {
        if let Some(v) = line.strip_prefix("S=") {
            soleil = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix("L=") {
            lune = Some(v.to_string());
        }
    }
    Ok(soleil.zip(lune))
}
