// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Round-robin selector over the pool's fixed `connId` slots.
//!
//! The `> 10000` reset is a holdover from the source this was ported from: a defence
//! against unbounded counter growth that modern atomic widths don't need, kept anyway per
//! the "preserve unless asked to change" rule (see DESIGN.md).
use std::sync::atomic::{AtomicU32, Ordering};

const RESET_THRESHOLD: u32 = 10_000;

#[derive(Debug)]
pub struct Ring {
    slots: Vec<u32>,
    index: AtomicU32,
}

impl Ring {
    /// Builds a ring pre-populated with `{0, 1, ..., size - 1}`.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "ring size must be non-zero");
        Self {
            slots: (0..size as u32).collect(),
            index: AtomicU32::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the next connId in round-robin order.
    pub fn next(&self) -> u32 {
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        if i > RESET_THRESHOLD {
            self.index.store(0, Ordering::Relaxed);
        }
        self.slots[(i as usize) % self.slots.len()]
    }
}
