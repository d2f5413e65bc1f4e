// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Hot-path detection.
//!
//! Every instruction the VM dispatches is counted per code unit and offset.
//! An offset that reaches the threshold is promoted to a [`HotPath`]: a
//! straight-line run of instructions ending at the next jump, call or
//! print. The VM executes hot paths through a tighter loop that skips
//! the general dispatch for constants and integer arithmetic.

use rustc_hash::FxHashMap;

use crate::opcode::Opcode;

/// Executions before an offset is promoted.
pub const DEFAULT_THRESHOLD: usize = 100;

/// Longest run of instructions a hot path may cover.
pub const MAX_PATH_INSTRUCTIONS: usize = 50;

/// A promoted instruction range `[start, end)` within one code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotPath {
    pub start: usize,
    pub end: usize,
    /// Times the path was entered since promotion
    pub hits: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HotPathStats {
    pub enabled: bool,
    pub hot_paths: usize,
    pub threshold: usize,
    /// Instructions executed by the fast loop
    pub fast_instructions: u64,
}

/// (code unit, offset)
type Key = (usize, usize);

#[derive(Debug)]
pub struct HotPathTracker {
    enabled: bool,
    threshold: usize,
    counters: FxHashMap<Key, usize>,
    paths: FxHashMap<Key, HotPath>,
    fast_instructions: u64,
}

impl HotPathTracker {
    pub fn new(threshold: usize) -> Self {
        Self {
            enabled: true,
            threshold: threshold.max(1),
            counters: FxHashMap::default(),
            paths: FxHashMap::default(),
            fast_instructions: 0,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Count one execution of the instruction at `offset` in `code`.
    ///
    /// Returns the hot path starting there once the offset is hot.
    pub fn record(&mut self, unit: usize, offset: usize, code: &[u8]) -> Option<HotPath> {
        if !self.enabled {
            return None;
        }
        let key = (unit, offset);
        if let Some(path) = self.paths.get_mut(&key) {
            path.hits += 1;
            return Some(*path);
        }

        let count = self.counters.entry(key).or_insert(0);
        *count += 1;
        if *count < self.threshold {
            return None;
        }

        self.counters.remove(&key);
        let path = HotPath {
            start: offset,
            end: scan_end(code, offset),
            hits: 1,
        };
        tracing::debug!(
            start = path.start,
            end = path.end,
            threshold = self.threshold,
            "hot path promoted"
        );
        self.paths.insert(key, path);
        Some(path)
    }

    pub fn add_fast_instructions(&mut self, n: u64) {
        self.fast_instructions += n;
    }

    pub fn stats(&self) -> HotPathStats {
        HotPathStats {
            enabled: self.enabled,
            hot_paths: self.paths.len(),
            threshold: self.threshold,
            fast_instructions: self.fast_instructions,
        }
    }

    /// Forget all counters and promoted paths.
    pub fn reset(&mut self) {
        self.counters.clear();
        self.paths.clear();
        self.fast_instructions = 0;
    }
}

impl Default for HotPathTracker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// End of the hot path starting at `start`: just past the first jump,
/// call or print, or after `MAX_PATH_INSTRUCTIONS` instructions.
pub fn scan_end(code: &[u8], start: usize) -> usize {
    let mut ip = start;
    let mut count = 0;
    while ip < code.len() && count < MAX_PATH_INSTRUCTIONS {
        let Some(op) = Opcode::from_byte(code[ip]) else {
            break;
        };
        ip += op.width();
        count += 1;
        if matches!(
            op,
            Opcode::Jump | Opcode::JumpNotTruthy | Opcode::Call | Opcode::Print
        ) {
            break;
        }
    }
    ip.min(code.len())
}
