// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Peephole rewrites.
//!
//! Rewrites happen in place and never change the length of the code, so
//! jump targets and debug offsets stay valid.

use rustc_hash::FxHashSet;

use crate::opcode::{Opcode, read_u16};

/// Offsets of each instruction paired with its opcode. Stops at the first
/// byte that is not an opcode.
fn instructions(code: &[u8]) -> Vec<(usize, Opcode)> {
    let mut out = Vec::new();
    let mut ip = 0;
    while ip < code.len() {
        let Some(op) = Opcode::from_byte(code[ip]) else {
            break;
        };
        out.push((ip, op));
        ip += op.width();
    }
    out
}

fn nop_out(code: &mut [u8], range: std::ops::Range<usize>) {
    for byte in &mut code[range] {
        *byte = Opcode::Nop as u8;
    }
}

/// Apply the peephole rewrites, returning how many were made.
///
/// - a jump to the next instruction becomes Nops;
/// - a conditional jump to the next instruction becomes `Pop` and Nops;
/// - `Constant; Pop` becomes Nops unless something jumps to the `Pop`.
pub fn optimize(code: &mut [u8]) -> usize {
    let listing = instructions(code);
    let targets: FxHashSet<usize> = listing
        .iter()
        .filter(|(_, op)| matches!(op, Opcode::Jump | Opcode::JumpNotTruthy))
        .filter_map(|&(ip, _)| read_u16(code, ip + 1).map(usize::from))
        .collect();

    let mut rewrites = 0;
    for (i, &(ip, op)) in listing.iter().enumerate() {
        let next = ip + op.width();
        match op {
            Opcode::Jump if read_u16(code, ip + 1).map(usize::from) == Some(next) => {
                nop_out(code, ip..next);
                rewrites += 1;
            }
            Opcode::JumpNotTruthy if read_u16(code, ip + 1).map(usize::from) == Some(next) => {
                code[ip] = Opcode::Pop as u8;
                nop_out(code, ip + 1..next);
                rewrites += 1;
            }
            Opcode::Constant
                if matches!(listing.get(i + 1), Some(&(pop, Opcode::Pop)) if pop == next)
                    && !targets.contains(&next) =>
            {
                nop_out(code, ip..next + 1);
                rewrites += 1;
            }
            _ => {}
        }
    }
    rewrites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::make;
    use pretty_assertions::assert_eq;

    fn assemble(ops: &[(Opcode, &[usize])]) -> Vec<u8> {
        ops.iter()
            .flat_map(|(op, operands)| make(*op, operands))
            .collect()
    }

    #[test]
    fn test_jump_to_next_becomes_nops() {
        let mut code = assemble(&[(Opcode::Jump, &[3]), (Opcode::Null, &[])]);
        assert_eq!(optimize(&mut code), 1);
        assert_eq!(
            code,
            assemble(&[
                (Opcode::Nop, &[]),
                (Opcode::Nop, &[]),
                (Opcode::Nop, &[]),
                (Opcode::Null, &[]),
            ])
        );
    }

    #[test]
    fn test_conditional_jump_to_next_pops() {
        let mut code = assemble(&[
            (Opcode::True, &[]),
            (Opcode::JumpNotTruthy, &[4]),
            (Opcode::Null, &[]),
        ]);
        optimize(&mut code);
        assert_eq!(
            code,
            assemble(&[
                (Opcode::True, &[]),
                (Opcode::Pop, &[]),
                (Opcode::Nop, &[]),
                (Opcode::Nop, &[]),
                (Opcode::Null, &[]),
            ])
        );
    }

    #[test]
    fn test_constant_pop_removed() {
        let mut code = assemble(&[(Opcode::Constant, &[0]), (Opcode::Pop, &[])]);
        assert_eq!(optimize(&mut code), 1);
        assert_eq!(code, vec![Opcode::Nop as u8; 4]);
    }

    #[test]
    fn test_constant_pop_kept_when_pop_is_a_target() {
        let original = assemble(&[
            (Opcode::True, &[]),
            (Opcode::JumpNotTruthy, &[7]),
            (Opcode::Constant, &[0]),
            (Opcode::Pop, &[]),
        ]);
        let mut code = original.clone();
        assert_eq!(optimize(&mut code), 0);
        assert_eq!(code, original);
    }

    #[test]
    fn test_length_preserved() {
        let mut code = assemble(&[
            (Opcode::Constant, &[0]),
            (Opcode::Pop, &[]),
            (Opcode::Jump, &[7]),
            (Opcode::Null, &[]),
        ]);
        let len = code.len();
        optimize(&mut code);
        assert_eq!(code.len(), len);
    }
}
