//! `squill` — lint, dump and scan SQL files.
//!
//! Exit codes: 0 on success, 1 when any file fails to parse or produces
//! lint findings, 2 on bad invocation (clap's default).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use thiserror::Error;
use tracing_subscriber::FmtSubscriber;

use squill_lint::Linter;
use squill_parser::dialect;
use squill_parser::TokenKind;
use squill_rewrite::{Rewriter, RewriteRules};

#[derive(ClapParser)]
#[command(name = "squill")]
#[command(version, about = "Multi-dialect SQL linter and parser", long_about = None)]
struct Cli {
    /// SQL dialect (ansi, db2, postgres, sqlite, mssql, mysql).
    #[arg(short, long, global = true, default_value = "ansi")]
    dialect: String,

    /// Log verbosely to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse files and report lint diagnostics.
    Lint {
        /// Configuration file preloading rule toggles.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// List the supported rules and exit.
        #[arg(short, long)]
        list: bool,

        files: Vec<PathBuf>,
    },
    /// Parse files and dump the canonical rendering of each statement.
    Ast {
        /// Configuration file; its rewrite list is applied before dumping.
        #[arg(short, long)]
        config: Option<PathBuf>,

        files: Vec<PathBuf>,
    },
    /// Dump the token stream of each file.
    Scan { files: Vec<PathBuf> },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Dialect(#[from] dialect::UnknownDialect),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    let result = match &cli.command {
        Commands::Lint {
            config,
            list,
            files,
        } => run_lint(&cli.dialect, config.as_deref(), *list, files),
        Commands::Ast { config, files } => run_ast(&cli.dialect, config.as_deref(), files),
        Commands::Scan { files } => run_scan(&cli.dialect, files),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path: Option<&Path>) -> Result<squill_config::Config, CliError> {
    let Some(path) = path else {
        return Ok(squill_config::Config::new());
    };
    let content = read_source(path)?;
    let (config, unknown) = squill_config::parse_file(&content);
    for key in unknown {
        eprintln!("{}: unknown option {key}", path.display());
    }
    Ok(config)
}

/// Build a parser for one file, with include paths anchored at the file.
fn parser_for_file(
    dialect_name: &str,
    path: &Path,
) -> Result<squill_parser::Parser, CliError> {
    let source = read_source(path)?;
    let mut parser = dialect::parser_for(dialect_name, source)?;
    if let Some(base) = path.parent() {
        parser.set_base_dir(base);
    }
    Ok(parser)
}

fn run_lint(
    dialect_name: &str,
    config: Option<&Path>,
    list: bool,
    files: &[PathBuf],
) -> Result<bool, CliError> {
    let config = load_config(config)?;

    if list {
        let mut linter = Linter::new();
        linter.apply_config(&config);
        for info in linter.rules() {
            let mark = if info.enabled { '\u{2713}' } else { '\u{2717}' };
            println!("{mark} {}", info.rule);
        }
        return Ok(true);
    }

    let mut clean = true;
    for file in files {
        let mut parser = parser_for_file(dialect_name, file)?;
        let (stmts, errors) = parser.parse_all();
        for err in &errors {
            clean = false;
            eprintln!("{}: {err}", file.display());
        }

        // Macros in the source may have toggled rules for this file.
        let mut file_linter = Linter::new();
        file_linter.apply_config(&config);
        file_linter.apply_config(&parser.config);

        for message in file_linter.lint(&stmts) {
            clean = false;
            println!("{message}");
        }
    }
    Ok(clean)
}

fn run_ast(
    dialect_name: &str,
    config: Option<&Path>,
    files: &[PathBuf],
) -> Result<bool, CliError> {
    let config = load_config(config)?;
    let mut clean = true;
    for file in files {
        let mut parser = parser_for_file(dialect_name, file)?;
        let (stmts, errors) = parser.parse_all();
        for err in &errors {
            clean = false;
            eprintln!("{}: {err}", file.display());
        }

        let (mut rules, unknown) = RewriteRules::from_config(&config);
        let (macro_rules, macro_unknown) = RewriteRules::from_config(&parser.config);
        rules |= macro_rules;
        for name in unknown.into_iter().chain(macro_unknown) {
            eprintln!("{}: unknown rewrite rule {name}", file.display());
        }
        let rewriter = Rewriter::new(rules);

        for stmt in stmts {
            println!("{};", rewriter.rewrite(stmt));
        }
    }
    Ok(clean)
}

fn run_scan(dialect_name: &str, files: &[PathBuf]) -> Result<bool, CliError> {
    let mut clean = true;
    for file in files {
        let source = read_source(file)?;
        let mut scanner = dialect::scanner_for(dialect_name, source)?;
        loop {
            let token = scanner.scan();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Invalid => {
                    clean = false;
                    eprintln!(
                        "{}: invalid token found at {}: {}",
                        file.display(),
                        token.pos,
                        token.literal
                    );
                }
                _ => println!("{} {:?} {}", token.pos, token.kind, token.literal),
            }
        }
    }
    Ok(clean)
}
