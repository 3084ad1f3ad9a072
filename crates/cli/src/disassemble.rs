//! Chunk disassembly: 4-digit zero-padded offset, a 4-char line number
//! or `   |` when it repeats the previous instruction's line, the
//! mnemonic left-justified in 16 columns, and -- for constant-bearing
//! instructions -- the constant's printed value in single quotes.
//!
//! Driven by the `-d`/`--dump` CLI flag; not exposed by the `vm`/
//! `compiler` crates themselves, since it is purely a formatting concern
//! over an already-compiled `Chunk`.

use cinder_core::chunk::{Chunk, OpCode};
use cinder_core::object::Heap;

/// Disassemble every instruction in `chunk` into one multi-line string.
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut out = format!("== {name} ==\n");
    let mut offset = 0;
    while offset < chunk.len() {
        let (line, next) = disassemble_instruction(chunk, heap, offset);
        out.push_str(&line);
        out.push('\n');
        offset = next;
    }
    out
}

/// Disassemble one instruction starting at `offset`, returning its
/// rendered line and the offset of the next instruction.
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> (String, usize) {
    let mut out = format!("{offset:04} ");

    if offset > 0 && chunk.lines[offset] == chunk.lines[offset - 1] {
        out.push_str("   | ");
    } else {
        out.push_str(&format!("{:4} ", chunk.lines[offset]));
    }

    let byte = chunk.code[offset];
    let Some(op) = OpCode::from_byte(byte) else {
        out.push_str(&format!("Unknown opcode {byte}\n"));
        return (out, offset + 1);
    };

    let next = match op {
        OpCode::Constant => constant_instruction("OP_CONSTANT", chunk, heap, offset, &mut out),
        OpCode::GetLocal => byte_instruction("OP_GET_LOCAL", chunk, offset, &mut out),
        OpCode::SetLocal => byte_instruction("OP_SET_LOCAL", chunk, offset, &mut out),
        OpCode::GetGlobal => constant_instruction("OP_GET_GLOBAL", chunk, heap, offset, &mut out),
        OpCode::DefineGlobal => {
            constant_instruction("OP_DEFINE_GLOBAL", chunk, heap, offset, &mut out)
        }
        OpCode::SetGlobal => constant_instruction("OP_SET_GLOBAL", chunk, heap, offset, &mut out),
        OpCode::Jump => jump_instruction("OP_JUMP", 1, chunk, offset, &mut out),
        OpCode::JumpIfFalse => jump_instruction("OP_JUMP_IF_FALSE", 1, chunk, offset, &mut out),
        OpCode::Loop => jump_instruction("OP_LOOP", -1, chunk, offset, &mut out),
        OpCode::Nil => simple_instruction("OP_NIL", offset, &mut out),
        OpCode::Pop => simple_instruction("OP_POP", offset, &mut out),
        OpCode::Equal => simple_instruction("OP_EQUAL", offset, &mut out),
        OpCode::Greater => simple_instruction("OP_GREATER", offset, &mut out),
        OpCode::Less => simple_instruction("OP_LESS", offset, &mut out),
        OpCode::Add => simple_instruction("OP_ADD", offset, &mut out),
        OpCode::Subtract => simple_instruction("OP_SUBTRACT", offset, &mut out),
        OpCode::Multiply => simple_instruction("OP_MULTIPLY", offset, &mut out),
        OpCode::Divide => simple_instruction("OP_DIVIDE", offset, &mut out),
        OpCode::Modulo => simple_instruction("OP_MODULUS", offset, &mut out),
        OpCode::Power => simple_instruction("OP_POWER", offset, &mut out),
        OpCode::Not => simple_instruction("OP_NOT", offset, &mut out),
        OpCode::Negate => simple_instruction("OP_NEGATE", offset, &mut out),
        OpCode::Print => simple_instruction("OP_PRINT", offset, &mut out),
        OpCode::Return => simple_instruction("OP_RETURN", offset, &mut out),
    };
    (out, next)
}

fn simple_instruction(name: &str, offset: usize, out: &mut String) -> usize {
    out.push_str(name);
    offset + 1
}

fn byte_instruction(name: &str, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let slot = chunk.code[offset + 1];
    out.push_str(&format!("{name:<16} {slot:4}"));
    offset + 2
}

fn constant_instruction(
    name: &str,
    chunk: &Chunk,
    heap: &Heap,
    offset: usize,
    out: &mut String,
) -> usize {
    let constant = chunk.code[offset + 1];
    let value = chunk.constants[constant as usize].display(heap);
    out.push_str(&format!("{name:<16} {constant:4} '{value}'"));
    offset + 2
}

fn jump_instruction(
    name: &str,
    sign: i32,
    chunk: &Chunk,
    offset: usize,
    out: &mut String,
) -> usize {
    let hi = chunk.code[offset + 1] as u16;
    let lo = chunk.code[offset + 2] as u16;
    let jump = ((hi << 8) | lo) as i32;
    let target = offset as i32 + 3 + sign * jump;
    out.push_str(&format!("{name:<16} {offset:4} -> {target}"));
    offset + 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::object::Heap;

    #[test]
    fn disassembles_a_constant_and_return() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        cinder_compiler::compile("print 1;", &mut chunk, &mut heap).unwrap();
        let text = disassemble_chunk(&chunk, &heap, "script");
        assert!(text.contains("OP_CONSTANT"));
        assert!(text.contains("'1'"));
        assert!(text.contains("OP_PRINT"));
        assert!(text.contains("OP_RETURN"));
    }

    #[test]
    fn repeated_line_is_rendered_as_a_pipe() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        cinder_compiler::compile("print 1 + 2;", &mut chunk, &mut heap).unwrap();
        let text = disassemble_chunk(&chunk, &heap, "script");
        assert!(text.contains("   |"));
    }
}
