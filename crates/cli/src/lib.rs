//! Library half of the `cinder` CLI: disassembly and the compile-dump-run
//! sequence shared by the file runner and the REPL. Kept separate from
//! `main.rs` so it's unit-testable without spawning a process.

pub mod disassemble;

use std::path::Path;

use cinder_core::chunk::Chunk;
use cinder_core::error::InterpretResult;
use cinder_vm::Vm;

pub use disassemble::{disassemble_chunk, disassemble_instruction};

/// Compile `source` into a fresh chunk using `vm`'s heap, optionally
/// disassembling it, then run it on `vm`. Returns the three-way result
/// so both the file runner and the REPL can map it to an exit code /
/// continue-looping decision without duplicating the compile-dump-run
/// sequence.
pub fn compile_and_run(vm: &mut Vm, source: &str, dump: bool, dump_name: &str) -> InterpretResult {
    let mut chunk = Chunk::new();
    match cinder_compiler::compile(source, &mut chunk, vm.heap_mut()) {
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            InterpretResult::CompileError
        }
        Ok(()) => {
            if dump {
                print!("{}", disassemble_chunk(&chunk, vm.heap(), dump_name));
            }
            vm.run(&chunk)
        }
    }
}

/// Read `path` into a source buffer and run it, the file-runner half of
/// the CLI split out of `main.rs` so it can be exercised without spawning
/// the binary. `Err` means the file itself couldn't be read; a read
/// source that fails to compile or run still yields `Ok` of the matching
/// `InterpretResult`.
pub fn run_path(vm: &mut Vm, path: &Path, dump: bool) -> std::io::Result<InterpretResult> {
    let source = std::fs::read_to_string(path)?;
    let name = path.display().to_string();
    Ok(compile_and_run(vm, &source, dump, &name))
}
