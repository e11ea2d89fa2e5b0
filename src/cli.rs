//! Command-line interface for the trellis optimizer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Optimizer for hierarchical SSA programs", long_about = None)]
pub struct Cli {
    /// Log every removed operation (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run passes over a program and print the result
    Opt {
        /// Input program in text format
        file: PathBuf,

        /// Pass to run, by full or bare name (repeatable)
        #[arg(
            short,
            long = "pass",
            value_name = "NAME",
            default_value = "common::dead_code_elimination"
        )]
        passes: Vec<String>,

        /// Validate the program before the first pass and after each pass
        #[arg(long)]
        verify: bool,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Check that a program is well-formed
    Verify {
        /// Input program in text format
        file: PathBuf,
    },
    /// List registered passes
    Passes,
}
