use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use lessico_core::config::{self, Settings};
use lessico_core::error::{CoreError, Result};
use lessico_core::model::batch::DatasetKind;
use lessico_core::protocol;
use lessico_core::services::validate::{self, Severity};
use lessico_core::services::{batches, pipeline, voices};

/// Maintenance tool for the Italian learning app's vocabulary and reading data.
#[derive(Parser, Debug)]
#[command(name = "lessico-core", version)]
struct Cli {
    /// Directory holding sample_words.json and reading_passages.json
    /// [default: $LESSICO_DATA_DIR, then ./assets/data]
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the batches compiled into this binary
    Batches,

    /// Append a batch of new entries to its dataset
    Append {
        /// Name of an embedded batch
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        batch: Option<String>,

        /// Batch file authored outside the binary
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Dataset file to append to instead of the one under the data dir
        #[arg(long, value_name = "FILE")]
        dataset: Option<PathBuf>,

        /// Build and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a dataset file; exits non-zero when errors are found
    Check {
        #[arg(long, value_enum)]
        kind: DatasetKind,

        #[arg(long, value_name = "FILE")]
        dataset: Option<PathBuf>,
    },

    /// Print level and category totals; both datasets unless --kind is given
    Stats {
        #[arg(long, value_enum)]
        kind: Option<DatasetKind>,

        #[arg(long, value_name = "FILE", requires = "kind")]
        dataset: Option<PathBuf>,
    },

    /// Convert the TTS voice archive into voices.json
    Voices {
        /// Voice to export (repeatable)
        #[arg(long = "voice", value_name = "NAME")]
        voices: Vec<String>,

        /// Expected SHA-256 of the voice archive
        #[arg(long)]
        sha256: Option<String>,

        /// Archive location [default: $LESSICO_VOICES_URL, then the upstream release]
        #[arg(long)]
        url: Option<String>,

        /// Local copy of the archive [default: $LESSICO_VOICES_CACHE, then the temp dir]
        #[arg(long, value_name = "FILE")]
        cache: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Serve JSON-line requests on stdin
    Stdio,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli.data_dir);

    match run(cli.command, &settings) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cmd: Cmd, settings: &Settings) -> Result<ExitCode> {
    match cmd {
        Cmd::Batches => {
            for b in batches::list()? {
                println!(
                    "{:<20} {:<10} {:>4}  {}",
                    b.name,
                    b.kind.as_str(),
                    b.entries,
                    b.description
                );
            }
        }

        Cmd::Append {
            batch,
            file,
            dataset,
            dry_run,
        } => {
            let batch = match (batch, file) {
                (_, Some(path)) => batches::from_file(&path)?,
                (Some(name), None) => batches::embedded(&name)?,
                (None, None) => return Err(CoreError::UnknownBatch(String::new())),
            };
            let path = settings.dataset_or(batch.kind(), dataset);
            let opts = pipeline::AppendOptions {
                dry_run,
                ..Default::default()
            };

            let report = pipeline::append_batch(&path, &batch, &opts)?;
            println!(
                "{}: {} + {} = {} records{}",
                report.dataset.display(),
                report.before,
                report.added,
                report.after,
                if report.dry_run { " (dry run)" } else { "" }
            );
            if let (Some(first), Some(last)) = (&report.first_new_id, &report.last_new_id) {
                println!("new ids: {first} - {last}");
            }
            print!("{}", report.summary);
        }

        Cmd::Check { kind, dataset } => {
            let path = settings.dataset_or(kind, dataset);
            let issues = pipeline::check(kind, &path)?;

            for issue in &issues {
                let tag = match issue.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                println!("{tag:<7} [{}] {}: {}", issue.record_id, issue.code, issue.message);
            }

            if validate::has_errors(&issues) {
                return Ok(ExitCode::FAILURE);
            }
            println!("{}: ok ({} warnings)", path.display(), issues.len());
        }

        Cmd::Stats { kind, dataset } => {
            if let Some(kind) = kind {
                let path = settings.dataset_or(kind, dataset);
                println!("{}", pipeline::stats(kind, &path)?);
                return Ok(ExitCode::SUCCESS);
            }

            for kind in [DatasetKind::Vocabulary, DatasetKind::Passages] {
                let path = settings.dataset_path(kind);
                match pipeline::stats(kind, &path) {
                    Ok(summary) => println!("{summary}"),
                    Err(CoreError::NotFound(p)) => warn!("{} not found, skipping", p.display()),
                    Err(e) => return Err(e),
                }
            }
        }

        Cmd::Voices {
            voices: wanted,
            sha256,
            url,
            cache,
            output,
        } => {
            let opts = config::voice_options(url, cache, output, wanted, sha256);
            let report = voices::convert(&opts)?;
            for v in &report.exported {
                println!("{}: {:?}", v.name, v.shape);
            }
            for name in &report.missing {
                println!("{name}: not found");
            }
            println!(
                "read {} ({} bytes), saved {} ({} bytes)",
                report.cache.display(),
                report.asset_bytes,
                report.output.display(),
                report.bytes_written
            );
        }

        Cmd::Stdio => serve(settings),
    }

    Ok(ExitCode::SUCCESS)
}

fn serve(settings: &Settings) {
    info!("serving requests on stdin (data dir {})", settings.data_dir.display());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = std::panic::catch_unwind(|| protocol::handle(&line, settings));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => serde_json::json!({
                "status": "error",
                "message": "internal core error"
            })
            .to_string(),
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}
