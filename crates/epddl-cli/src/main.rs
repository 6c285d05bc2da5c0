// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! E-PDDL command line compiler.
//!
//! `epddl <DOMAIN> <PROBLEM>` compiles the pair and writes the mAp artifact
//! to `out/<domain>_<problem>.txt`, named after the parsed domain and
//! problem names rather than the input paths. Exit codes: 0 success,
//! 1 usage, 2 compile error, 3 I/O failure.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use epddl_core::Compiler;

const OUT_DIR: &str = "out";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compiles an E-PDDL domain/problem pair into a mAp artifact"
)]
struct Args {
    /// E-PDDL domain file
    domain: PathBuf,
    /// E-PDDL problem file
    problem: PathBuf,
}

/// Failure classes with distinct exit codes.
enum Failure {
    Compile(epddl_core::Error),
    Io(anyhow::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version exit clean; real usage errors exit 1
            let code = u8::from(err.use_stderr());
            let _ = err.print();
            return ExitCode::from(code);
        }
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Compile(err)) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(Failure::Io(err)) => {
            eprintln!("{err:#}");
            ExitCode::from(3)
        }
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let domain = read_source(&args.domain)?;
    let problem = read_source(&args.problem)?;

    let mut compiler = Compiler::new();
    compiler.parse_domain(&domain).map_err(Failure::Compile)?;
    compiler.parse_problem(&problem).map_err(Failure::Compile)?;
    let artifact = compiler.render().map_err(Failure::Compile)?;

    let out_dir = Path::new(OUT_DIR);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create the `{OUT_DIR}` folder"))
        .map_err(Failure::Io)?;
    let path = out_dir.join(compiler.artifact_name());
    fs::write(&path, artifact)
        .with_context(|| format!("cannot write `{}`", path.display()))
        .map_err(Failure::Io)?;

    println!();
    println!("The file has been correctly converted.");
    println!("The resulting file is in the 'out' folder.");
    println!();
    Ok(())
}

fn read_source(path: &Path) -> Result<String, Failure> {
    fs::read_to_string(path)
        .with_context(|| format!("cannot read `{}`", path.display()))
        .map_err(Failure::Io)
}
