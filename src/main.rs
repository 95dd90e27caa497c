use std::{
    fs::read_to_string,
    io::{self, Write},
    path::PathBuf,
    process,
    time::Instant,
};

use clap::{Parser, Subcommand};
use huskyc::{
    build_program,
    compiler::compiler::{build, compile, CompileOptions},
    display_error,
    errors::errors::Error,
    interpreter::interpreter::Interpreter,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "huskyc", version, about = "Compiler and interpreter for husky programs")]
struct Cli {
    /// Log filter, e.g. `debug` or `huskyc::interpreter=trace`.
    #[arg(long, global = true, env = "HUSKY_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Type check and interpret a program.
    Run { file: PathBuf },
    /// Translate a program to C and build it with the system C compiler.
    Compile {
        file: PathBuf,
        /// Path of the produced executable.
        #[arg(short, long, default_value = "a.out")]
        output: PathBuf,
        /// C compiler to invoke.
        #[arg(long, env = "CC", default_value = "cc")]
        cc: String,
        /// Only write `<output>.c`.
        #[arg(long)]
        emit_c: bool,
    },
    /// Print the type checked IR.
    Dump { file: PathBuf },
}

impl Command {
    fn file(&self) -> &PathBuf {
        match self {
            Command::Run { file } | Command::Compile { file, .. } | Command::Dump { file } => file,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .with_writer(io::stderr)
        .init();

    let path = cli.command.file();
    let source = match read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            error!(path = %path.display(), "failed to read source file");
            eprintln!("Failed to read {}: {}", path.display(), err);
            process::exit(1);
        }
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let start = Instant::now();
    let program = match build_program(&source, &file_name) {
        Ok(program) => program,
        Err(err) => fail(&err, &source),
    };
    debug!(elapsed = ?start.elapsed(), "built and type checked");

    match cli.command {
        Command::Run { .. } => {
            let stdout = io::stdout();
            let mut interpreter = Interpreter::new(&program, stdout.lock());
            if let Err(err) = interpreter.run() {
                fail(&err, &source);
            }
            debug!(elapsed = ?start.elapsed(), "finished running");
        }
        Command::Compile {
            output, cc, emit_c, ..
        } => {
            let c_source = match compile(&program) {
                Ok(c_source) => c_source,
                Err(err) => fail(&err, &source),
            };

            let options = CompileOptions {
                cc,
                output,
                emit_c_only: emit_c,
            };
            if let Err(err) = build(&c_source, &options) {
                eprintln!("Error: {}", err);
                process::exit(1);
            }
            info!(elapsed = ?start.elapsed(), "compiled");
        }
        Command::Dump { .. } => {
            let mut stdout = io::stdout();
            if let Err(err) = write!(stdout, "{}", program) {
                eprintln!("Error: {}", err);
                process::exit(1);
            }
        }
    }
}

fn fail(err: &Error, source: &str) -> ! {
    display_error(err, source);
    process::exit(1);
}
