use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use oxirestrict_core::FsResolver;
use oxirestrict_loader::{
    LoaderError, LoaderHost, LoaderOptions, OptionsConfig, collect_files, find_git_root, run,
};

#[derive(Debug, Parser)]
#[command(name = "oxirestrict")]
#[command(about = "Flag restricted imports in JavaScript/TypeScript projects", long_about = None)]
struct Cli {
    /// Rule file (JSON)
    #[arg(long, default_value = "oxirestrict.json")]
    config: PathBuf,

    /// Root directory to scan (defaults to the enclosing git root)
    #[arg(long)]
    root: Option<PathBuf>,
}

#[derive(Default)]
struct Diagnostics {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl LoaderHost for Diagnostics {
    fn emit_error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn emit_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli);

    let start = Instant::now();

    let config_text = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read rule file {}", cli.config.display()))?;
    let config: OptionsConfig = serde_json::from_str(&config_text)
        .with_context(|| format!("Malformed rule file {}", cli.config.display()))?;
    let options = Arc::new(LoaderOptions::from_config(config)?);
    info!("Loaded {} rules from {}", options.rules.len(), cli.config.display());

    let root = match cli.root {
        Some(r) => r.canonicalize().unwrap_or(r),
        None => find_git_root()?,
    };
    info!("Scanning {}", root.display());

    let files = collect_files(&root)?;
    info!("Found {} files to scan", files.len());
    let file_count = files.len();

    let resolver = Arc::new(FsResolver::new());
    let mut set = JoinSet::new();
    for file in files {
        let options = Arc::clone(&options);
        let resolver = Arc::clone(&resolver);
        set.spawn(async move {
            let outcome = scan_file(&file, &options, resolver.as_ref()).await;
            (file, outcome)
        });
    }

    let mut results = Vec::new();
    while let Some(res) = set.join_next().await {
        results.push(res?);
    }
    // Completion order is arbitrary; report in path order.
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut errors = 0usize;
    let mut warnings = 0usize;
    let mut fatal = false;

    for (file, outcome) in results {
        let display = file.strip_prefix(&root).unwrap_or(&file).display().to_string();
        match outcome {
            Ok(diagnostics) => {
                warnings += diagnostics.warnings.len();
                errors += diagnostics.errors.len();
                for message in &diagnostics.warnings {
                    writeln!(stdout, "{} {}", "⚠".yellow().bold(), display.bright_white().bold())?;
                    writeln!(stdout, "{message}")?;
                }
                for message in &diagnostics.errors {
                    writeln!(stdout, "{} {}", "✗".red().bold(), display.bright_white().bold())?;
                    writeln!(stdout, "{message}")?;
                }
            }
            Err(LoaderError::Restricted { message }) => {
                writeln!(stdout, "{} {}", "✗ fatal".red().bold(), display.bright_white().bold())?;
                writeln!(stdout, "{message}")?;
                fatal = true;
                // A fatal match aborts the run; nothing after it is reported.
                break;
            }
            Err(err) => {
                writeln!(stdout, "{} {}: {:#}", "✗".red().bold(), display.bright_white().bold(), err)?;
                errors += 1;
            }
        }
    }

    let elapsed_ms = start.elapsed().as_millis();
    writeln!(
        stdout,
        "{} Finished in {}ms on {} files: {} errors, {} warnings.",
        "●".bright_blue(),
        elapsed_ms.to_string().cyan(),
        file_count.to_string().cyan(),
        errors.to_string().cyan(),
        warnings.to_string().cyan()
    )?;
    stdout.flush()?;

    if fatal || errors > 0 {
        // Non-zero exit to fail CI
        std::process::exit(1);
    }

    Ok(())
}

async fn scan_file(
    file: &Path,
    options: &LoaderOptions,
    resolver: &FsResolver,
) -> Result<Diagnostics, LoaderError> {
    let source = tokio::fs::read_to_string(file).await.map_err(|e| {
        LoaderError::Check(
            anyhow::Error::new(e).context(format!("Failed to read {}", file.display())),
        )
    })?;
    let mut diagnostics = Diagnostics::default();
    run(&mut diagnostics, resolver, file, &source, options).await?;
    Ok(diagnostics)
}
