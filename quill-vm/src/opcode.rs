// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode instruction definitions.
//!
//! An instruction is one opcode byte followed by its operands, each a
//! big-endian `u16` or a single `u8`. Jump operands are absolute offsets
//! into the same code unit.

use std::fmt::Write;

use smallvec::SmallVec;

/// Bytecode instructions for the Quill VM.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // =========================================================================
    // Constants & Stack
    // =========================================================================
    /// Push constants[u16].
    Constant,
    True,
    False,
    Null,
    /// Pop and discard; the popped value becomes the program result.
    Pop,
    Nop,

    // =========================================================================
    // Arithmetic & Comparison
    // =========================================================================
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    /// Unary `-`.
    Minus,
    /// Unary `!`.
    Bang,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Jump to the u16 offset.
    Jump,
    /// Pop; jump to the u16 offset if the value is falsy.
    JumpNotTruthy,

    // =========================================================================
    // Variables
    // =========================================================================
    SetGlobal,
    GetGlobal,
    /// Locals are addressed by a u8 slot.
    SetLocal,
    GetLocal,
    /// Push builtins[u8].
    GetBuiltin,

    // =========================================================================
    // Collections
    // =========================================================================
    /// Pop u16 elements into an array.
    Array,
    /// Pop u16 key/value pairs into a map.
    Map,
    /// Pop u16 key/value pairs into a hash.
    Hash,
    Index,
    /// Pop value, index and container; store; push the value.
    SetIndex,

    // =========================================================================
    // Builtin Operations
    // =========================================================================
    Len,
    Type,
    /// Print u16 popped values, then push null.
    Print,

    // =========================================================================
    // Functions & Exceptions
    // =========================================================================
    /// Call with u8 arguments. The callee sits below them.
    Call,
    ReturnValue,
    Return,
    Throw,
}

/// Name and operand layout of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub name: &'static str,
    pub operand_widths: &'static [usize],
}

impl Definition {
    /// Encoded size of the instruction, opcode included.
    pub fn width(&self) -> usize {
        1 + self.operand_widths.iter().sum::<usize>()
    }
}

const NONE: &[usize] = &[];
const U16: &[usize] = &[2];
const U8: &[usize] = &[1];

const ALL: [Opcode; 38] = [
    Opcode::Constant,
    Opcode::True,
    Opcode::False,
    Opcode::Null,
    Opcode::Pop,
    Opcode::Nop,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Equal,
    Opcode::NotEqual,
    Opcode::GreaterThan,
    Opcode::LessThan,
    Opcode::GreaterEqual,
    Opcode::LessEqual,
    Opcode::Minus,
    Opcode::Bang,
    Opcode::Jump,
    Opcode::JumpNotTruthy,
    Opcode::SetGlobal,
    Opcode::GetGlobal,
    Opcode::SetLocal,
    Opcode::GetLocal,
    Opcode::GetBuiltin,
    Opcode::Array,
    Opcode::Map,
    Opcode::Hash,
    Opcode::Index,
    Opcode::SetIndex,
    Opcode::Len,
    Opcode::Type,
    Opcode::Print,
    Opcode::Call,
    Opcode::ReturnValue,
    Opcode::Return,
    Opcode::Throw,
];

impl Opcode {
    /// Decode an opcode byte.
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        ALL.get(byte as usize).copied()
    }

    pub fn definition(self) -> Definition {
        let (name, operand_widths) = match self {
            Opcode::Constant => ("OpConstant", U16),
            Opcode::True => ("OpTrue", NONE),
            Opcode::False => ("OpFalse", NONE),
            Opcode::Null => ("OpNull", NONE),
            Opcode::Pop => ("OpPop", NONE),
            Opcode::Nop => ("OpNop", NONE),
            Opcode::Add => ("OpAdd", NONE),
            Opcode::Sub => ("OpSub", NONE),
            Opcode::Mul => ("OpMul", NONE),
            Opcode::Div => ("OpDiv", NONE),
            Opcode::Mod => ("OpMod", NONE),
            Opcode::Equal => ("OpEqual", NONE),
            Opcode::NotEqual => ("OpNotEqual", NONE),
            Opcode::GreaterThan => ("OpGreaterThan", NONE),
            Opcode::LessThan => ("OpLessThan", NONE),
            Opcode::GreaterEqual => ("OpGreaterEqual", NONE),
            Opcode::LessEqual => ("OpLessEqual", NONE),
            Opcode::Minus => ("OpMinus", NONE),
            Opcode::Bang => ("OpBang", NONE),
            Opcode::Jump => ("OpJump", U16),
            Opcode::JumpNotTruthy => ("OpJumpNotTruthy", U16),
            Opcode::SetGlobal => ("OpSetGlobal", U16),
            Opcode::GetGlobal => ("OpGetGlobal", U16),
            Opcode::SetLocal => ("OpSetLocal", U8),
            Opcode::GetLocal => ("OpGetLocal", U8),
            Opcode::GetBuiltin => ("OpGetBuiltin", U8),
            Opcode::Array => ("OpArray", U16),
            Opcode::Map => ("OpMap", U16),
            Opcode::Hash => ("OpHash", U16),
            Opcode::Index => ("OpIndex", NONE),
            Opcode::SetIndex => ("OpSetIndex", NONE),
            Opcode::Len => ("OpLen", NONE),
            Opcode::Type => ("OpType", NONE),
            Opcode::Print => ("OpPrint", U16),
            Opcode::Call => ("OpCall", U8),
            Opcode::ReturnValue => ("OpReturnValue", NONE),
            Opcode::Return => ("OpReturn", NONE),
            Opcode::Throw => ("OpThrow", NONE),
        };
        Definition {
            name,
            operand_widths,
        }
    }

    /// Encoded size of this instruction, opcode included.
    #[inline]
    pub fn width(self) -> usize {
        self.definition().width()
    }

    /// Returns true if this instruction can transfer control.
    #[inline]
    pub fn is_control_flow(self) -> bool {
        matches!(
            self,
            Opcode::Jump
                | Opcode::JumpNotTruthy
                | Opcode::Call
                | Opcode::ReturnValue
                | Opcode::Return
                | Opcode::Throw
        )
    }
}

/// Look up the definition of an opcode byte.
pub fn lookup(byte: u8) -> Option<Definition> {
    Opcode::from_byte(byte).map(Opcode::definition)
}

/// Encoded instruction bytes.
pub type Instruction = SmallVec<[u8; 4]>;

/// Encode an instruction. Missing operands encode as zero; extra ones are
/// ignored.
pub fn make(op: Opcode, operands: &[usize]) -> Instruction {
    let def = op.definition();
    let mut ins = Instruction::new();
    ins.push(op as u8);
    for (i, width) in def.operand_widths.iter().enumerate() {
        let operand = operands.get(i).copied().unwrap_or(0);
        match width {
            2 => ins.extend_from_slice(&(operand as u16).to_be_bytes()),
            _ => ins.push(operand as u8),
        }
    }
    ins
}

/// Decode the operands that follow an opcode. Returns the operands and the
/// number of bytes read, or `None` when `ins` ends mid-operand.
pub fn read_operands(def: &Definition, ins: &[u8]) -> Option<(SmallVec<[usize; 2]>, usize)> {
    let mut operands = SmallVec::new();
    let mut offset = 0;
    for width in def.operand_widths {
        let operand = match width {
            2 => usize::from(read_u16(ins, offset)?),
            _ => usize::from(read_u8(ins, offset)?),
        };
        operands.push(operand);
        offset += width;
    }
    Some((operands, offset))
}

/// Big-endian u16 at `offset`.
#[inline]
pub fn read_u16(ins: &[u8], offset: usize) -> Option<u16> {
    let hi = *ins.get(offset)?;
    let lo = *ins.get(offset + 1)?;
    Some(u16::from_be_bytes([hi, lo]))
}

#[inline]
pub fn read_u8(ins: &[u8], offset: usize) -> Option<u8> {
    ins.get(offset).copied()
}

/// Render instructions one per line as `%04d OpName operands`.
pub fn disassemble(ins: &[u8]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < ins.len() {
        let Some(def) = lookup(ins[i]) else {
            let _ = writeln!(out, "ERROR: unknown opcode {}", ins[i]);
            i += 1;
            continue;
        };
        let Some((operands, read)) = read_operands(&def, &ins[i + 1..]) else {
            let _ = writeln!(out, "{:04} {} ERROR: truncated operand", i, def.name);
            break;
        };
        let _ = write!(out, "{:04} {}", i, def.name);
        for operand in &operands {
            let _ = write!(out, " {}", operand);
        }
        out.push('\n');
        i += 1 + read;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_byte_round_trip() {
        for op in ALL {
            assert_eq!(Opcode::from_byte(op as u8), Some(op));
        }
        assert_eq!(Opcode::from_byte(ALL.len() as u8), None);
    }

    #[test]
    fn test_make() {
        assert_eq!(
            make(Opcode::Constant, &[65534]).as_slice(),
            &[Opcode::Constant as u8, 255, 254]
        );
        assert_eq!(
            make(Opcode::GetLocal, &[255]).as_slice(),
            &[Opcode::GetLocal as u8, 255]
        );
        assert_eq!(make(Opcode::Add, &[]).as_slice(), &[Opcode::Add as u8]);
    }

    #[test]
    fn test_read_operands() {
        let ins = make(Opcode::Jump, &[513]);
        let def = Opcode::Jump.definition();
        let (operands, read) = read_operands(&def, &ins[1..]).unwrap();
        assert_eq!(operands.as_slice(), &[513]);
        assert_eq!(read, 2);
    }

    #[test]
    fn test_truncated_operands() {
        let def = Opcode::Constant.definition();
        assert_eq!(read_operands(&def, &[1]), None);
        assert_eq!(read_u16(&[0, 1], 1), None);
        assert_eq!(read_u8(&[], 0), None);
        assert_eq!(
            disassemble(&[Opcode::Pop as u8, Opcode::Constant as u8, 0]),
            "0000 OpPop\n0001 OpConstant ERROR: truncated operand\n"
        );
    }

    #[test]
    fn test_disassemble() {
        let mut ins = Vec::new();
        ins.extend(make(Opcode::Constant, &[1]));
        ins.extend(make(Opcode::Constant, &[2]));
        ins.extend(make(Opcode::Add, &[]));
        ins.extend(make(Opcode::GetLocal, &[3]));
        ins.extend(make(Opcode::Pop, &[]));
        assert_eq!(
            disassemble(&ins),
            "0000 OpConstant 1\n0003 OpConstant 2\n0006 OpAdd\n0007 OpGetLocal 3\n0009 OpPop\n"
        );
    }

    #[test]
    fn test_disassemble_unknown_byte() {
        assert_eq!(disassemble(&[250]), "ERROR: unknown opcode 250\n");
    }
}
