//! File-runner tests exercising `cinder_cli::run_path` against real files
//! on disk, using `tempfile::tempdir` to avoid littering the working
//! directory.

use std::fs;

use cinder_core::error::InterpretResult;
use cinder_vm::Vm;
use tempfile::tempdir;

#[test]
fn runs_a_script_file_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("script.cnd");
    fs::write(&path, "var a = 1; print a + 1;").unwrap();

    let mut vm = Vm::new();
    assert_eq!(cinder_cli::run_path(&mut vm, &path, false).unwrap(), InterpretResult::Ok);
}

#[test]
fn missing_file_surfaces_as_an_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("does-not-exist.cnd");

    let mut vm = Vm::new();
    assert!(cinder_cli::run_path(&mut vm, &path, false).is_err());
}

#[test]
fn a_runtime_error_in_the_file_is_reported_as_such() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.cnd");
    fs::write(&path, "print 1 / 0;").unwrap();

    let mut vm = Vm::new();
    assert_eq!(
        cinder_cli::run_path(&mut vm, &path, false).unwrap(),
        InterpretResult::RuntimeError
    );
}
