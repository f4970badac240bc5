use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

use dotmark_cli::pipeline::print_err;
use dotmark_cli::{error_exit_code, CompilerConfig, ErrorHandling, Pipeline};
use dotmark_parser::lexer::patterns::block_patterns;
use dotmark_parser::lexer::Lexer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log expansion rounds and calls. RUST_LOG takes priority.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compiles a document.
    Compile {
        file: PathBuf,
        /// Configuration file. Defaults to dotmark.yml next to the document.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop at the first failing call.
        #[arg(short, long)]
        strict: bool,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write the output to a file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Prints the block tokens of a document.
    Tokens {
        file: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let res = match cli.command {
        Commands::Compile {
            file,
            config,
            strict,
            format,
            out,
        } => compile(&file, config, strict, format, out),
        Commands::Tokens { file, config } => tokens(&file, config),
    };

    if let Err(e) = res {
        let code = error_exit_code(&e);
        print_err::<()>(Err(e));
        process::exit(code);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(file: &Path, config: Option<PathBuf>) -> anyhow::Result<CompilerConfig> {
    match config {
        Some(path) => CompilerConfig::load(path),
        None => CompilerConfig::discover(file),
    }
}

fn compile(
    file: &Path,
    config: Option<PathBuf>,
    strict: bool,
    format: OutputFormat,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = load_config(file, config)?;
    if strict {
        config.error_handling = ErrorHandling::Strict;
    }
    let source = fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;

    eprintln!("{} {}", style("Compiling").bold(), file.display());
    let compiled = Pipeline::new(config)
        .compile(&source)
        .with_context(|| format!("Could not compile {}", file.display()))?;

    let output = match format {
        OutputFormat::Text => compiled.output.clone(),
        OutputFormat::Json => compiled.to_json().context("Could not serialize document")?,
    };
    match out {
        Some(path) => {
            fs::write(&path, output)
                .with_context(|| format!("Could not write {}", path.display()))?;
            eprintln!("{} {}", style("Wrote").green(), path.display());
        }
        None => print!("{}", output),
    }

    if compiled.errors > 0 {
        eprintln!(
            "{}",
            style(format!("{} call(s) failed, see the log above", compiled.errors)).yellow()
        );
    } else {
        eprintln!("{}", style("Success").green().bold());
    }
    Ok(())
}

fn tokens(file: &Path, config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(file, config)?;
    let source = fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;

    let tokens = Lexer::new(&source, block_patterns(config.flavor))
        .tokenize()
        .with_context(|| format!("Could not tokenize {}", file.display()))?;
    for token in tokens {
        println!(
            "{:>6}..{:<6} {} {:?}",
            token.span.start(),
            token.span.end(),
            style(format!("{:<20}", token.kind.to_string())).cyan(),
            token.text
        );
    }
    Ok(())
}
