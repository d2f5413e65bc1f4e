// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Stack-based virtual machine for executing Quill bytecode.

pub mod error;
pub mod frame;
pub mod handlers;
pub mod stack;

use std::rc::Rc;

use quill_object::{
    BuiltinTable, CompiledFunction, Exception, Failure, FatalError, Output, StackFrame, Value,
    debug,
};

use crate::bytecode::{BYTECODE_MAGIC, Bytecode};
use crate::hotpath::{DEFAULT_THRESHOLD, HotPath, HotPathStats, HotPathTracker};
use crate::opcode::{Opcode, read_u8, read_u16};

pub use error::{Result, Trap, VmError};
pub use frame::Frame;
pub use handlers::control::ControlFlow;
pub use stack::{STACK_SIZE, ValueStack};

/// Initial number of global slots.
pub const GLOBALS_SIZE: usize = 1024;

/// Default call depth limit.
pub const DEFAULT_MAX_FRAMES: usize = 1024;

/// Execution limits and tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmOptions {
    /// Instructions allowed per run; `0` means unlimited
    pub instruction_budget: u64,
    pub hot_path_enabled: bool,
    pub hot_path_threshold: usize,
    pub max_frames: usize,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            instruction_budget: 0,
            hot_path_enabled: true,
            hot_path_threshold: DEFAULT_THRESHOLD,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

/// The Quill virtual machine.
pub struct Vm {
    magic: String,

    /// The main program, wrapped as a nameless function.
    main: Rc<CompiledFunction>,

    constants: Vec<Value>,

    /// Global slots; unset slots read as null.
    globals: Vec<Value>,

    stack: ValueStack,

    frames: Vec<Frame>,

    builtins: BuiltinTable,

    output: Output,

    options: VmOptions,

    /// Instructions left before the budget trips.
    remaining: u64,

    /// Instructions executed by the last run.
    executed: u64,

    hot_paths: HotPathTracker,

    /// Value discarded by the most recent `Pop` in the main program.
    last_popped: Value,

    /// Offset of the instruction being executed, for error locations.
    op_start: usize,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_options(bytecode, VmOptions::default())
    }

    pub fn with_options(bytecode: Bytecode, options: VmOptions) -> Self {
        let Bytecode {
            magic,
            instructions,
            constants,
            debug,
            ..
        } = bytecode;
        let main = Rc::new(CompiledFunction {
            name: None,
            instructions: Rc::from(instructions),
            num_locals: 0,
            num_params: 0,
            debug: Rc::from(debug),
        });
        let mut hot_paths = HotPathTracker::new(options.hot_path_threshold);
        if !options.hot_path_enabled {
            hot_paths.disable();
        }
        Self {
            magic,
            main,
            constants,
            globals: vec![Value::Null; GLOBALS_SIZE],
            stack: ValueStack::new(),
            frames: Vec::new(),
            builtins: BuiltinTable::standard(),
            output: Output::default(),
            remaining: options.instruction_budget,
            options,
            executed: 0,
            hot_paths,
            last_popped: Value::Null,
            op_start: 0,
        }
    }

    /// Use `builtins` for `GetBuiltin`. Must be the table the program was
    /// compiled against.
    #[must_use]
    pub fn with_builtins(mut self, builtins: BuiltinTable) -> Self {
        self.builtins = builtins;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Limit the number of instructions a run may execute; `0` disables
    /// the limit.
    pub fn set_instruction_budget(&mut self, budget: u64) {
        self.options.instruction_budget = budget;
        self.remaining = budget;
    }

    /// Instructions executed by the last run, fast-path ones included.
    pub fn instructions_executed(&self) -> u64 {
        self.executed
    }

    pub fn set_hot_paths_enabled(&mut self, enabled: bool) {
        self.options.hot_path_enabled = enabled;
        if enabled {
            self.hot_paths.enable();
        } else {
            self.hot_paths.disable();
        }
    }

    pub fn hot_path_stats(&self) -> HotPathStats {
        self.hot_paths.stats()
    }

    pub fn reset_hot_paths(&mut self) {
        self.hot_paths.reset();
    }

    /// Value of global slot `idx`.
    pub fn global(&self, idx: usize) -> Value {
        self.globals.get(idx).cloned().unwrap_or(Value::Null)
    }

    /// Execute the program.
    ///
    /// Returns the value of the last expression statement, or of a
    /// top-level `return`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self) -> std::result::Result<Value, Failure> {
        if self.magic != BYTECODE_MAGIC {
            return Err(Failure::Error(FatalError::new(
                VmError::MagicMismatch.to_string(),
            )));
        }

        self.stack.clear();
        self.frames.clear();
        self.frames
            .push(Frame::new(Rc::clone(&self.main), Vec::new(), 0));
        self.remaining = self.options.instruction_budget;
        self.executed = 0;
        self.last_popped = Value::Null;
        self.op_start = 0;

        tracing::debug!(
            instructions = self.main.instructions.len(),
            constants = self.constants.len(),
            "vm run start"
        );
        let result = self.run_loop().map_err(|trap| self.failure(trap));
        tracing::debug!(
            executed = self.executed,
            ok = result.is_ok(),
            "vm run finished"
        );
        result
    }

    fn run_loop(&mut self) -> Result<Value> {
        loop {
            let Some(frame) = self.frames.last() else {
                return Err(VmError::Internal("no active frame".into()).into());
            };
            let ip = frame.ip;
            if ip >= frame.instructions().len() {
                // Function bodies always end in a return, so this is the
                // end of the main program.
                if self.frames.len() == 1 {
                    return Ok(self.last_popped.clone());
                }
                match self.return_from_frame(Value::Null)? {
                    ControlFlow::Continue => continue,
                    ControlFlow::Return(result) => return Ok(result),
                }
            }

            if self.hot_paths.is_enabled() {
                let unit = frame.unit_id();
                if let Some(path) = self.hot_paths.record(unit, ip, &frame.func.instructions)
                    && self.run_hot_path(path)? > 0
                {
                    continue;
                }
            }

            self.op_start = ip;
            self.tick()?;
            let op = self.read_op()?;

            match op {
                // Constants & Stack
                Opcode::Constant => {
                    let idx = self.read_u16_operand()?;
                    let val = self.constant(idx)?;
                    self.stack.push(val)?;
                }
                Opcode::True => self.stack.push(Value::Bool(true))?,
                Opcode::False => self.stack.push(Value::Bool(false))?,
                Opcode::Null => self.stack.push(Value::Null)?,
                Opcode::Pop => {
                    let value = self.stack.pop()?;
                    if self.frames.len() == 1 {
                        self.last_popped = value;
                    }
                }
                Opcode::Nop => {}

                // Arithmetic & Comparison - delegated to handler
                Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
                | Opcode::Equal
                | Opcode::NotEqual
                | Opcode::GreaterThan
                | Opcode::LessThan
                | Opcode::GreaterEqual
                | Opcode::LessEqual
                | Opcode::Minus
                | Opcode::Bang => self.execute_arithmetic(op)?,

                // Variables - delegated to handler
                Opcode::SetGlobal
                | Opcode::GetGlobal
                | Opcode::SetLocal
                | Opcode::GetLocal
                | Opcode::GetBuiltin => self.execute_variables(op)?,

                // Collections & builtin operations - delegated to handler
                Opcode::Array
                | Opcode::Map
                | Opcode::Hash
                | Opcode::Index
                | Opcode::SetIndex
                | Opcode::Len
                | Opcode::Type
                | Opcode::Print => self.execute_collections(op)?,

                // Control flow - delegated to handler
                Opcode::Jump
                | Opcode::JumpNotTruthy
                | Opcode::Call
                | Opcode::ReturnValue
                | Opcode::Return
                | Opcode::Throw => match self.execute_control(op)? {
                    ControlFlow::Continue => {}
                    ControlFlow::Return(result) => return Ok(result),
                },
            }
        }
    }

    /// Run `path` from the current ip through the fast loop. Returns the
    /// number of instructions it executed; zero means the first one was
    /// not a fast-path instruction.
    fn run_hot_path(&mut self, path: HotPath) -> Result<usize> {
        let mut ran = 0;
        loop {
            let frame = self.frame()?;
            let ip = frame.ip;
            if ip >= path.end {
                break;
            }
            let code = frame.instructions();
            let (op, operand) = match code.get(ip).copied().and_then(Opcode::from_byte) {
                // a truncated operand is left for the slow path to report
                Some(Opcode::Constant) => match read_u16(code, ip + 1) {
                    Some(idx) => (Opcode::Constant, usize::from(idx)),
                    None => break,
                },
                Some(op @ (Opcode::Add | Opcode::Sub | Opcode::Mul)) => (op, 0),
                _ => break,
            };

            self.op_start = ip;
            self.tick()?;
            if op == Opcode::Constant {
                let val = self.constant(operand)?;
                self.stack.push(val)?;
                self.frame_mut()?.ip = ip + 3;
            } else {
                let right = self.stack.pop()?;
                let left = self.stack.pop()?;
                let result = match (&left, &right) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(match op {
                        Opcode::Add => a.wrapping_add(*b),
                        Opcode::Sub => a.wrapping_sub(*b),
                        _ => a.wrapping_mul(*b),
                    }),
                    _ => {
                        let bin = handlers::arithmetic::binary_op(op).ok_or_else(|| {
                            VmError::Internal(format!("no binary operator for {:?}", op))
                        })?;
                        quill_object::ops::binary(bin, &left, &right)?
                    }
                };
                self.stack.push(result)?;
                self.frame_mut()?.ip = ip + 1;
            }
            ran += 1;
        }
        self.hot_paths.add_fast_instructions(ran as u64);
        Ok(ran)
    }

    /// Charge one instruction against the budget.
    #[inline]
    fn tick(&mut self) -> Result<()> {
        if self.options.instruction_budget > 0 {
            if self.remaining == 0 {
                tracing::debug!(
                    budget = self.options.instruction_budget,
                    "instruction budget exhausted"
                );
                return Err(Exception::runtime_error("instruction budget exceeded").into());
            }
            self.remaining -= 1;
        }
        self.executed += 1;
        Ok(())
    }

    /// Turn a trap into the failure reported to the caller, located at the
    /// instruction that raised it.
    fn failure(&self, trap: Trap) -> Failure {
        let entry = self
            .frames
            .last()
            .and_then(|frame| debug::lookup(&frame.func.debug, self.op_start));
        match trap {
            Trap::Exception(mut ex) => {
                if ex.stack_trace.is_empty()
                    && let Some(entry) = entry
                {
                    ex.push_frame(StackFrame::new(
                        entry.function,
                        entry.file,
                        entry.line,
                        entry.column,
                    ));
                }
                Failure::Exception(ex)
            }
            Trap::Fatal(err) => {
                let fatal = FatalError::new(err.to_string());
                Failure::Error(match entry {
                    Some(entry) => fatal.at(entry.location()),
                    None => fatal,
                })
            }
        }
    }

    fn read_op(&mut self) -> Result<Opcode> {
        let frame = self.frame_mut()?;
        let byte = frame
            .instructions()
            .get(frame.ip)
            .copied()
            .ok_or_else(|| VmError::Internal("ip out of bounds".into()))?;
        frame.ip += 1;
        Opcode::from_byte(byte).ok_or(Trap::Fatal(VmError::UnknownOpcode(byte)))
    }

    pub(crate) fn read_u16_operand(&mut self) -> Result<usize> {
        let frame = self.frame_mut()?;
        let value = read_u16(frame.instructions(), frame.ip).ok_or(VmError::TruncatedOperand {
            offset: frame.ip,
        })?;
        frame.ip += 2;
        Ok(usize::from(value))
    }

    pub(crate) fn read_u8_operand(&mut self) -> Result<usize> {
        let frame = self.frame_mut()?;
        let value = read_u8(frame.instructions(), frame.ip).ok_or(VmError::TruncatedOperand {
            offset: frame.ip,
        })?;
        frame.ip += 1;
        Ok(usize::from(value))
    }

    fn frame(&self) -> Result<&Frame> {
        self.frames
            .last()
            .ok_or_else(|| VmError::Internal("no active frame".into()).into())
    }

    pub(crate) fn frame_mut(&mut self) -> Result<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| VmError::Internal("no active frame".into()).into())
    }

    fn constant(&self, idx: usize) -> Result<Value> {
        self.constants
            .get(idx)
            .cloned()
            .ok_or(Trap::Fatal(VmError::BadConstant(idx)))
    }

    pub(crate) fn jump(&mut self, target: usize) -> Result<()> {
        let frame = self.frame_mut()?;
        if target > frame.instructions().len() {
            return Err(VmError::Internal(format!("jump target out of range: {}", target)).into());
        }
        frame.ip = target;
        Ok(())
    }
}
