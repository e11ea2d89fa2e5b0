//! Common test utilities for CLI tests.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// Write program text to a temporary `.trellis` file.
#[allow(dead_code)]
pub fn program_file(text: &str) -> NamedTempFile {
    let mut temp_file =
        NamedTempFile::with_suffix(".trellis").expect("Failed to create temp file");
    temp_file
        .write_all(text.as_bytes())
        .expect("Failed to write program");
    temp_file
}

/// Run the `trellis` binary with the given arguments.
#[allow(dead_code)]
pub fn run_trellis<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute trellis")
}

#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
