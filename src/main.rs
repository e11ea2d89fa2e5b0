//! Trellis CLI entry point.

mod cli;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use trellis::{PassManager, PassRegistry, TrellisResult, load_program, verify};
use trellis_ir::{TracingSink, print_program};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Opt {
            file,
            passes,
            verify,
            output,
        } => optimize(&file, &passes, verify, output.as_deref()),
        Command::Verify { file } => verify_file(&file),
        Command::Passes => {
            for name in PassRegistry::new().names() {
                println!("{name}");
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use std::io::IsTerminal;
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn optimize(
    file: &Path,
    passes: &[String],
    verify_each: bool,
    output: Option<&Path>,
) -> TrellisResult<()> {
    let mut prog = load_program(file)?;
    let manager = PassManager::from_names(&PassRegistry::new(), passes)?.verify_each(verify_each);
    let report = manager.run(&mut prog, &mut TracingSink)?;

    for run in &report.runs {
        eprintln!("{}: removed {} op(s)", run.name, run.stats.removed_ops);
    }

    let text = print_program(&prog);
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

fn verify_file(file: &Path) -> TrellisResult<()> {
    let prog = load_program(file)?;
    verify(&prog, "on input")?;
    println!("{}: ok", file.display());
    Ok(())
}
