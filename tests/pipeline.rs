mod common;

use common::program_file;
use trellis::{PassManager, PassRegistry, TrellisError, load_program, verify};
use trellis_ir::{RemovedOp, print_program};

#[test]
fn loaded_program_survives_full_pipeline() {
    let input = program_file(include_str!("../demos/branches.trellis"));
    let mut prog = load_program(input.path()).expect("demo parses");
    verify(&prog, "on input").expect("demo is well-formed");

    let manager = PassManager::from_names(&PassRegistry::new(), ["common::dead_code_elimination"])
        .expect("known pass")
        .verify_each(true);
    let mut sink: Vec<RemovedOp> = Vec::new();
    let report = manager.run(&mut prog, &mut sink).expect("pipeline succeeds");

    assert_eq!(report.total_removed(), 5);
    let names: Vec<String> = sink.iter().map(|r| r.name.to_string()).collect();
    assert_eq!(names, vec!["junk", "m", "ty", "tx", "spare"]);

    // Printed output parses back into an equivalent program.
    let printed = print_program(&prog);
    let reloaded = load_program(program_file(&printed).path()).expect("printed output parses");
    verify(&reloaded, "after reload").expect("still well-formed");
    assert_eq!(print_program(&reloaded), printed);
}

#[test]
fn load_reports_parse_errors() {
    let input = program_file(include_str!("../demos/broken.trellis"));
    let err = load_program(input.path()).err().expect("undefined variable");
    assert!(matches!(err, TrellisError::Parse(ref e) if e.message.contains("%undefined")));
}
