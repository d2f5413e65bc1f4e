// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Symbol table: name resolution to global and local slots.
//!
//! The table is a stack of frames, one for the program and one per
//! function being compiled. Each frame holds a stack of block scopes.
//! Every declaration in a new block takes a fresh slot, so a shadowing
//! declaration never clobbers the outer variable's storage.
//!
//! A block opened inside a loop body is re-entered on every iteration, and
//! the interpreter gives each pass its own environment. A single slot cannot
//! model that for closures, so a function that reads such a name from the
//! program frame is reported as unsupported.

use rustc_hash::FxHashMap;

use super::{CompileError, Result};

/// Highest global slot addressable by `SetGlobal`/`GetGlobal`.
pub const MAX_GLOBALS: usize = u16::MAX as usize + 1;

/// Highest local slot addressable by `SetLocal`/`GetLocal`.
pub const MAX_LOCALS: usize = u8::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
}

/// A resolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub scope: SymbolScope,
    pub index: usize,
}

#[derive(Debug, Default)]
struct BlockScope {
    names: FxHashMap<String, usize>,
    /// Opened inside a loop body, so it runs once per iteration.
    per_iteration: bool,
}

#[derive(Debug, Default)]
struct FrameScope {
    blocks: Vec<BlockScope>,
    next_slot: usize,
    loop_depth: usize,
}

impl FrameScope {
    fn new() -> Self {
        Self {
            blocks: vec![BlockScope::default()],
            next_slot: 0,
            loop_depth: 0,
        }
    }

    /// The slot for `name` and whether its block is per-iteration.
    fn find(&self, name: &str) -> Option<(usize, bool)> {
        self.blocks.iter().rev().find_map(|block| {
            block
                .names
                .get(name)
                .map(|&index| (index, block.per_iteration))
        })
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    /// `frames[0]` is the program; the rest are functions, innermost last.
    frames: Vec<FrameScope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            frames: vec![FrameScope::new()],
        }
    }

    /// True while compiling top-level code.
    pub fn is_global(&self) -> bool {
        self.frames.len() == 1
    }

    pub fn enter_block(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            let per_iteration = frame.loop_depth > 0;
            frame.blocks.push(BlockScope {
                names: FxHashMap::default(),
                per_iteration,
            });
        }
    }

    /// Mark the start of a loop body in the current frame.
    pub fn enter_loop(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.loop_depth += 1;
        }
    }

    pub fn leave_loop(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.loop_depth = frame.loop_depth.saturating_sub(1);
        }
    }

    pub fn leave_block(&mut self) {
        if let Some(frame) = self.frames.last_mut()
            && frame.blocks.len() > 1
        {
            frame.blocks.pop();
        }
    }

    pub fn enter_function(&mut self) {
        self.frames.push(FrameScope::new());
    }

    /// Leave the current function, returning the number of local slots it
    /// used.
    pub fn leave_function(&mut self) -> usize {
        if self.frames.len() > 1 {
            self.frames.pop().map_or(0, |frame| frame.next_slot)
        } else {
            0
        }
    }

    /// Declare `name` in the innermost block. Redeclaring a name in the
    /// same block reuses its slot.
    pub fn define(&mut self, name: &str) -> Result<Symbol> {
        let global = self.is_global();
        let scope = if global {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| CompileError::Internal("symbol table has no frame".into()))?;
        let next_slot = frame.next_slot;
        let block = frame
            .blocks
            .last_mut()
            .ok_or_else(|| CompileError::Internal("symbol table has no block".into()))?;
        if let Some(&index) = block.names.get(name) {
            return Ok(Symbol { scope, index });
        }

        let limit = if global { MAX_GLOBALS } else { MAX_LOCALS };
        if next_slot >= limit {
            return Err(if global {
                CompileError::TooManyGlobals
            } else {
                CompileError::TooManyLocals
            });
        }
        block.names.insert(name.to_string(), next_slot);
        frame.next_slot += 1;
        Ok(Symbol {
            scope,
            index: next_slot,
        })
    }

    /// Resolve `name` through the current function's blocks, then the
    /// program's. `Ok(None)` means the name is not declared anywhere.
    pub fn resolve(&self, name: &str) -> Result<Option<Symbol>> {
        let Some((current, enclosing)) = self.frames.split_last() else {
            return Ok(None);
        };
        if let Some((index, _)) = current.find(name) {
            let scope = if enclosing.is_empty() {
                SymbolScope::Global
            } else {
                SymbolScope::Local
            };
            return Ok(Some(Symbol { scope, index }));
        }

        let Some((program, functions)) = enclosing.split_first() else {
            return Ok(None);
        };
        if functions.iter().any(|frame| frame.find(name).is_some()) {
            return Err(CompileError::Unsupported(format!(
                "closure over enclosing local '{}'",
                name
            )));
        }
        match program.find(name) {
            Some((_, true)) => Err(CompileError::Unsupported(format!(
                "closure over per-iteration variable '{}'",
                name
            ))),
            Some((index, false)) => Ok(Some(Symbol {
                scope: SymbolScope::Global,
                index,
            })),
            None => Ok(None),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
