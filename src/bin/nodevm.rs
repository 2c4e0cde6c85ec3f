use std::{fs, io, path::PathBuf, process};

use clap::Parser;

use nodevm::{DriverOptions, Flow, Interpreter, Repl, VmError};

#[derive(Parser)]
#[command(author, version, about = "Node machine interpreter")]
struct Args {
    /// Source files to evaluate, in order
    files: Vec<PathBuf>,

    /// Evaluate a snippet after the files
    #[arg(short, long)]
    eval: Option<String>,

    /// Start an interactive session after the files and snippet
    #[arg(long)]
    repl: bool,

    /// Print the machine after every evaluation
    #[arg(long)]
    trace_machine: bool,

    /// Do not print the initial machine state
    #[arg(short, long)]
    quiet: bool,
}

/// Enable with `RUST_LOG=nodevm=debug` or `RUST_LOG=nodevm=trace`.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), VmError> {
    let mut interpreter = Interpreter::with_options(DriverOptions {
        trace_machine: args.trace_machine,
    });
    if !args.quiet {
        println!("{}", interpreter.machine().dump());
    }

    let mut stdout = io::stdout();
    for path in &args.files {
        println!("{}", path.display());
        let source = fs::read_to_string(path)?;
        if let Flow::Halt = interpreter.run_source(&source, &mut stdout)? {
            return Ok(());
        }
    }
    if let Some(source) = &args.eval {
        if let Flow::Halt = interpreter.run_source(source, &mut stdout)? {
            return Ok(());
        }
    }
    if args.repl {
        Repl::with_interpreter(interpreter).run()?;
    }
    Ok(())
}
