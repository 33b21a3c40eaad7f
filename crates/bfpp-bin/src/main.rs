//! bfpp entrypoint: argument handling, logging bootstrap, and the exit-code
//! policy. All the actual work happens in `core_parse::Preprocessor`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use core_parse::Preprocessor;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "bfpp", version, about = "Brainfuck preprocessor")]
struct Args {
    /// Input file (stdin if omitted).
    pub input: Option<PathBuf>,
    /// Output file (stdout if omitted).
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Predefine an object-like macro: NAME or NAME=VALUE (VALUE defaults
    /// to 1 and must be a decimal integer).
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,
}

/// Split and validate a `-D` argument.
fn parse_define(arg: &str) -> Result<(String, i32)> {
    let (name, value_str) = match arg.split_once('=') {
        Some((name, value)) => (name, value),
        None => (arg, "1"),
    };
    if !core_lexer::is_identifier(name) {
        bail!("invalid macro name: {name}");
    }
    let value: i32 = value_str
        .parse()
        .with_context(|| format!("invalid integer value: {value_str}"))?;
    Ok((name.to_string(), value))
}

fn configure_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<bool> {
    let mut pp = Preprocessor::new();

    for define in &args.defines {
        let (name, value) = parse_define(define)?;
        pp.define_macro(&name, value);
    }

    match &args.input {
        Some(path) => {
            let path = path
                .to_str()
                .with_context(|| format!("input path is not valid UTF-8: {}", path.display()))?;
            pp.push_file(path);
        }
        None => pp.push_reader("<stdin>", std::io::stdin()),
    }

    let result = pp.run();
    info!(
        target: "bfpp",
        errors = pp.error_count(),
        heap_size = pp.heap_size(),
        max_stack_depth = pp.max_stack_depth(),
        "run_complete"
    );

    // Write nothing unless the run was clean.
    if let Some(text) = result {
        match &args.output {
            Some(path) => std::fs::write(path, text)
                .with_context(|| format!("cannot open output file: {}", path.display()))?,
            None => std::io::stdout()
                .write_all(text.as_bytes())
                .context("cannot write to stdout")?,
        }
    }

    Ok(!pp.has_errors())
}

fn main() -> ExitCode {
    configure_logging();
    let args = Args::parse();
    info!(target: "bfpp", ?args, "startup");

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("bfpp: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_defaults_to_one() {
        let (name, value) = parse_define("FLAG").unwrap();
        assert_eq!((name.as_str(), value), ("FLAG", 1));
    }

    #[test]
    fn define_with_value() {
        let (name, value) = parse_define("N=42").unwrap();
        assert_eq!((name.as_str(), value), ("N", 42));
        let (_, value) = parse_define("N=-3").unwrap();
        assert_eq!(value, -3);
    }

    #[test]
    fn define_rejects_bad_names_and_values() {
        assert!(parse_define("9x").is_err());
        assert!(parse_define("a-b=1").is_err());
        assert!(parse_define("N=abc").is_err());
        assert!(parse_define("=1").is_err());
    }

    #[test]
    fn cli_rejects_unknown_flags() {
        assert!(Args::try_parse_from(["bfpp", "--bogus"]).is_err());
        assert!(Args::try_parse_from(["bfpp", "-q"]).is_err());
    }

    #[test]
    fn cli_accepts_attached_and_detached_defines() {
        let args = Args::try_parse_from(["bfpp", "-DFLAG", "-D", "N=2", "in.bfpp"]).unwrap();
        assert_eq!(args.defines, vec!["FLAG", "N=2"]);
        assert_eq!(args.input.unwrap().to_str().unwrap(), "in.bfpp");
    }

    #[test]
    fn cli_rejects_two_inputs() {
        assert!(Args::try_parse_from(["bfpp", "a.bfpp", "b.bfpp"]).is_err());
    }
}
