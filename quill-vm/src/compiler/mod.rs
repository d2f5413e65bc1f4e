// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Compiler from the syntax tree to bytecode.
//!
//! The compiler covers the procedural core of the language: variables,
//! control flow, functions without captured locals, collections and the
//! builtins. Anything else is reported as [`CompileError::Unsupported`] so
//! callers can run the program on the interpreter instead.

pub mod codegen;
pub mod peephole;
pub mod symbols;

use quill_object::ast::{Position, Program};
use quill_object::{BuiltinTable, DebugEntry, Value, debug};

use crate::bytecode::Bytecode;
use crate::opcode::{Opcode, make};

pub use symbols::{Symbol, SymbolScope, SymbolTable};

/// File name used when the program does not carry one.
pub const DEFAULT_FILE: &str = "<main>";

/// Operand written into forward jumps until they are patched.
pub(crate) const PLACEHOLDER: usize = 9999;

/// Error during compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A construct the VM cannot run.
    #[error("unsupported by the compiler: {0}")]
    Unsupported(String),
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("too many constants")]
    TooManyConstants,
    #[error("too many global variables")]
    TooManyGlobals,
    #[error("too many local variables")]
    TooManyLocals,
    #[error("too many arguments in call")]
    TooManyArguments,
    #[error("builtin index out of range: {0}")]
    TooManyBuiltins(String),
    #[error("code unit too large: jump target {0}")]
    CodeTooLarge(usize),
    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    /// True for errors that mean "run this on the interpreter instead".
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            CompileError::Unsupported(_) | CompileError::UndefinedVariable(_)
        )
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Pending jumps out of, and back into, the innermost loop.
#[derive(Debug, Default)]
struct LoopContext {
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

/// One code unit under construction.
#[derive(Debug)]
struct CodeUnit {
    instructions: Vec<u8>,
    debug: Vec<DebugEntry>,
    /// Function name recorded in debug entries.
    function: String,
    loops: Vec<LoopContext>,
}

impl CodeUnit {
    fn new(function: impl Into<String>) -> Self {
        Self {
            instructions: Vec::new(),
            debug: Vec::new(),
            function: function.into(),
            loops: Vec::new(),
        }
    }
}

/// Bytecode compiler.
pub struct Compiler {
    /// Constant pool shared by every code unit.
    constants: Vec<Value>,

    symbols: SymbolTable,

    /// Code units being built, innermost last.
    units: Vec<CodeUnit>,

    builtins: BuiltinTable,

    file: String,

    peephole: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            constants: Vec::new(),
            symbols: SymbolTable::new(),
            units: vec![CodeUnit::new(debug::MODULE_FUNCTION)],
            builtins: BuiltinTable::standard(),
            file: DEFAULT_FILE.to_string(),
            peephole: false,
        }
    }

    /// File name for debug entries when the program has none.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Resolve builtins against `builtins`. The VM must run with the same
    /// table.
    #[must_use]
    pub fn with_builtins(mut self, builtins: BuiltinTable) -> Self {
        self.builtins = builtins;
        self
    }

    /// Enable the peephole pass. Off by default: removing `Constant; Pop`
    /// changes which value a program ends with.
    #[must_use]
    pub fn with_peephole(mut self, enabled: bool) -> Self {
        self.peephole = enabled;
        self
    }

    /// Compile a whole program.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile(mut self, program: &Program) -> Result<Bytecode> {
        if !program.file.is_empty() {
            self.file = program.file.clone();
        }
        self.hoist_functions(&program.statements)?;
        if let Some((last, rest)) = program.statements.split_last() {
            self.compile_statements(rest)?;
            self.compile_tail(last)?;
        }

        let unit = self.finish_unit()?;
        tracing::debug!(
            instructions = unit.instructions.len(),
            constants = self.constants.len(),
            "compiled program"
        );
        Ok(Bytecode::new(unit.instructions, self.constants, unit.debug))
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn unit(&mut self) -> Result<&mut CodeUnit> {
        self.units
            .last_mut()
            .ok_or_else(|| CompileError::Internal("no code unit".into()))
    }

    /// Offset the next instruction will be written at.
    fn here(&self) -> usize {
        self.units.last().map_or(0, |unit| unit.instructions.len())
    }

    /// Append an instruction, returning its offset.
    fn emit(&mut self, op: Opcode, operands: &[usize]) -> Result<usize> {
        let ins = make(op, operands);
        let unit = self.unit()?;
        let offset = unit.instructions.len();
        unit.instructions.extend_from_slice(&ins);
        Ok(offset)
    }

    /// Append an instruction and record its source position.
    fn emit_at(&mut self, op: Opcode, operands: &[usize], pos: Position) -> Result<usize> {
        let offset = self.emit(op, operands)?;
        if pos.line > 0 {
            let file = self.file.clone();
            let unit = self.unit()?;
            let function = unit.function.clone();
            unit.debug.push(DebugEntry {
                offset,
                file,
                line: pos.line,
                column: pos.column,
                function,
            });
        }
        Ok(offset)
    }

    fn add_constant(&mut self, value: Value) -> Result<usize> {
        if self.constants.len() > u16::MAX as usize {
            return Err(CompileError::TooManyConstants);
        }
        self.constants.push(value);
        Ok(self.constants.len() - 1)
    }

    /// Push `value`, using the dedicated opcodes for booleans and null.
    fn emit_value(&mut self, value: Value, pos: Position) -> Result<()> {
        match value {
            Value::Bool(true) => self.emit_at(Opcode::True, &[], pos)?,
            Value::Bool(false) => self.emit_at(Opcode::False, &[], pos)?,
            Value::Null => self.emit_at(Opcode::Null, &[], pos)?,
            other => {
                let idx = self.add_constant(other)?;
                self.emit_at(Opcode::Constant, &[idx], pos)?
            }
        };
        Ok(())
    }

    /// Point the jump at `offset` to `target`.
    fn patch_jump(&mut self, offset: usize, target: usize) -> Result<()> {
        let target16 =
            u16::try_from(target).map_err(|_| CompileError::CodeTooLarge(target))?;
        let unit = self.unit()?;
        let bytes = target16.to_be_bytes();
        match unit.instructions.get_mut(offset + 1..offset + 3) {
            Some(operand) => {
                operand.copy_from_slice(&bytes);
                Ok(())
            }
            None => Err(CompileError::Internal(format!(
                "no jump to patch at {}",
                offset
            ))),
        }
    }

    /// Patch the jump at `offset` to the next instruction offset.
    fn patch_here(&mut self, offset: usize) -> Result<()> {
        let target = self.here();
        self.patch_jump(offset, target)
    }

    /// Close the innermost code unit.
    fn finish_unit(&mut self) -> Result<CodeUnit> {
        let mut unit = self
            .units
            .pop()
            .ok_or_else(|| CompileError::Internal("no code unit".into()))?;
        if self.peephole {
            let rewrites = peephole::optimize(&mut unit.instructions);
            tracing::trace!(function = %unit.function, rewrites, "peephole pass");
        }
        Ok(unit)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile `program` with the default settings.
pub fn compile(program: &Program) -> Result<Bytecode> {
    Compiler::new().compile(program)
}
