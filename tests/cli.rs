mod common;

use common::{program_file, run_trellis, stderr, stdout};
use insta::assert_snapshot;
use std::path::Path;

const DEMO: &str = include_str!("../demos/branches.trellis");

#[test]
fn opt_prints_optimized_program() {
    let input = program_file(DEMO);
    let output = run_trellis([Path::new("opt"), input.path()]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_snapshot!(stdout(&output).trim_end(), @r"
    func @main(%x, %p) {
      %c2 = const {val = [1.0, 2.0]}
      %c3 = const {val = 0.5}
      %k = relu(x = %x)
      %l = linear(x = %x, weight = %c2, bias = %c3)
      %r = cond(pred = %p) {
        %a = add(x = %k, y = %l)
      } -> (%a) {
        %b = identity(x = %l)
      } -> (%b)
    } -> (%r)

    func @count(%n) {
      %zero = const {val = 0}
      %step = const {val = 1}
      %i = while_loop(init = (%zero)) (%i0) {
        %lt = less(x = %i0, y = %n)
      } -> (%lt) (%i1) {
        %next = add(x = %i1, y = %step)
      } -> (%next)
    } -> (%i)
    ");
    assert!(
        stderr(&output).contains("common::dead_code_elimination: removed 5 op(s)"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn verbose_logs_each_removal() {
    let input = program_file(DEMO);
    let output = run_trellis([
        Path::new("opt"),
        input.path(),
        Path::new("--verbose"),
        Path::new("--pass"),
        Path::new("dead_code_elimination"),
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
    let log = stderr(&output);
    for (name, op_type) in [
        ("junk", "neg"),
        ("m", "matmul"),
        ("ty", "const"),
        ("tx", "const"),
        ("spare", "mul"),
    ] {
        let line = format!("removing op \"{name}\" (type: {op_type})");
        assert!(log.contains(&line), "missing {line:?} in:\n{log}");
    }
}

#[test]
fn opt_writes_output_file_and_reruns_cleanly() {
    let input = program_file(DEMO);
    let out_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out_path = out_dir.path().join("optimized.trellis");

    let output = run_trellis([
        Path::new("opt"),
        input.path(),
        Path::new("--verify"),
        Path::new("-o"),
        out_path.as_path(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());

    // Optimizing the optimized program changes nothing.
    let again = run_trellis([Path::new("opt"), out_path.as_path()]);
    assert!(again.status.success(), "{}", stderr(&again));
    assert!(stderr(&again).contains("removed 0 op(s)"));
    let written = std::fs::read_to_string(&out_path).expect("output written");
    assert_eq!(stdout(&again), written);
}

#[test]
fn verify_accepts_well_formed_program() {
    let input = program_file(DEMO);
    let output = run_trellis([Path::new("verify"), input.path()]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).trim_end().ends_with(": ok"));
}

#[test]
fn parse_errors_exit_with_failure() {
    let input = program_file(include_str!("../demos/broken.trellis"));
    let output = run_trellis([Path::new("opt"), input.path()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.starts_with("error: parse error at offset 0:"), "{err}");
    assert!(err.contains("undefined variable '%undefined'"), "{err}");
}

#[test]
fn unknown_pass_is_rejected() {
    let input = program_file(DEMO);
    let output = run_trellis([
        Path::new("opt"),
        input.path(),
        Path::new("-p"),
        Path::new("constant_folding"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: unknown pass 'constant_folding'"));
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = run_trellis([Path::new("verify"), dir.path().join("absent.trellis").as_path()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: I/O error:"));
}

#[test]
fn passes_lists_registered_passes() {
    let output = run_trellis(["passes"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "common::dead_code_elimination\n");
}
