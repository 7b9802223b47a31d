//! Artdrop CLI — batch character uploads from the command line.
//!
//! Set ARTDROP_API_KEY and ARTDROP_API_URL (or API_URL). Uses X-API-Key auth.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use artdrop_api_client::ApiClient;
use artdrop_cli::{content_type_for_path, init_tracing};
use artdrop_core::models::{BulkDefaults, Rarity};
use artdrop_core::{PipelineEvent, UploaderConfig};
use artdrop_pipeline::{FileIntake, NameGenerator, SessionRemotes, UploadSession};

#[derive(Parser)]
#[command(name = "artdrop", about = "Artdrop character upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files for duplicates, then upload them as a batch
    Upload {
        /// Paths of the files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Series applied to every file
        #[arg(long)]
        series: Option<String>,
        /// Rarity applied to every file: common, rare, epic, legendary
        #[arg(long)]
        rarity: Option<String>,
        /// Mark every file as R18
        #[arg(long)]
        r18: bool,
        /// Draw a random name for every file before checking
        #[arg(long)]
        generate_names: bool,
        /// Upload without running duplicate checks first
        #[arg(long)]
        skip_checks: bool,
        /// Drop confirmed duplicates instead of refusing the batch
        #[arg(long)]
        skip_blocked: bool,
    },
    /// Run duplicate checks without uploading
    Check {
        /// Paths of the files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Search the character catalog
    Search {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: Option<u32>,
    },
    /// Draw random character names
    RandomName {
        /// How many names to draw
        #[arg(long, default_value = "1")]
        count: u32,
    },
    /// Ping the service and report latency
    Health,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load_intakes(paths: &[PathBuf]) -> anyhow::Result<Vec<FileIntake>> {
    let mut intakes = Vec::with_capacity(paths.len());
    for path in paths {
        let payload = std::fs::read(path)
            .with_context(|| format!("Read file {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .unwrap_or_else(|| path.display().to_string());
        intakes.push(FileIntake {
            content_type: content_type_for_path(path),
            filename,
            payload: Bytes::from(payload),
        });
    }
    Ok(intakes)
}

fn build_session(config: &UploaderConfig) -> anyhow::Result<UploadSession> {
    let client = Arc::new(ApiClient::from_config(config).context(
        "Failed to create API client. Set ARTDROP_API_KEY and ARTDROP_API_URL (or API_URL)",
    )?);
    Ok(UploadSession::new(
        config.clone(),
        SessionRemotes::shared(client),
    ))
}

async fn intake_or_bail(session: &UploadSession, paths: &[PathBuf]) -> anyhow::Result<()> {
    let report = session.add_files(load_intakes(paths)?).await;
    for rejected in &report.rejected {
        tracing::warn!(
            filename = %rejected.filename,
            reason = %rejected.reason,
            "File rejected at intake"
        );
    }
    anyhow::ensure!(
        !report.added.is_empty(),
        "No files accepted ({} rejected)",
        report.rejected.len()
    );
    Ok(())
}

struct UploadArgs {
    files: Vec<PathBuf>,
    series: Option<String>,
    rarity: Option<String>,
    r18: bool,
    generate_names: bool,
    skip_checks: bool,
    skip_blocked: bool,
}

async fn run_upload(config: UploaderConfig, args: UploadArgs) -> anyhow::Result<()> {
    let rarity = args.rarity.as_deref().map(str::parse::<Rarity>).transpose()?;
    let session = build_session(&config)?;
    session
        .store()
        .set_bulk_defaults(BulkDefaults {
            series: args.series.unwrap_or_default(),
            rarity,
            r18: args.r18,
        })
        .await;

    intake_or_bail(&session, &args.files).await?;

    if args.generate_names {
        let named = session.generate_names_for_all().await;
        tracing::info!(named, "Random names assigned");
    }

    if args.skip_checks {
        tracing::info!("Skipping duplicate checks");
    } else {
        let summary = session.check_pending().await;
        tracing::info!(
            checked = summary.checked,
            warnings = summary.warnings,
            blocked = summary.blocked,
            "Duplicate checks finished"
        );

        if summary.blocked > 0 {
            let mut blocked = Vec::new();
            for id in session.store().ordered_ids().await {
                match session.store().status_of(id).await {
                    Some(status) if status.is_blocked() => blocked.push(id),
                    _ => {}
                }
            }
            for id in &blocked {
                if let Some(file) = session.store().file(*id).await {
                    tracing::warn!(filename = %file.original_filename, "Confirmed duplicate");
                }
            }
            anyhow::ensure!(
                args.skip_blocked,
                "{} confirmed duplicate(s); re-run with --skip-blocked to drop them",
                blocked.len()
            );
            for id in blocked {
                session.store().remove_file_with_undo(id).await?;
                session.store().dismiss_undo().await;
            }
        }
    }

    let mut events = session.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PipelineEvent::BatchProgress { completed, total }) => {
                    tracing::info!(completed, total, "Upload progress");
                }
                Ok(PipelineEvent::RunCompleted { .. }) => break,
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let result = session.submit().await;
    progress.abort();
    let result = result?;
    print_json(&result)?;
    anyhow::ensure!(
        result.total_created > 0 || result.total_errors == 0,
        "All {} file(s) failed to upload",
        result.total_errors
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = UploaderConfig::from_env()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            files,
            series,
            rarity,
            r18,
            generate_names,
            skip_checks,
            skip_blocked,
        } => {
            run_upload(
                config,
                UploadArgs {
                    files,
                    series,
                    rarity,
                    r18,
                    generate_names,
                    skip_checks,
                    skip_blocked,
                },
            )
            .await?;
        }
        Commands::Check { files } => {
            let session = build_session(&config)?;
            intake_or_bail(&session, &files).await?;

            let summary = session.check_pending().await;
            let mut rows = Vec::new();
            for id in session.store().ordered_ids().await {
                let file = session.store().file(id).await;
                let status = session.store().status_of(id).await;
                if let (Some(file), Some(status)) = (file, status) {
                    rows.push(json!({
                        "filename": file.original_filename,
                        "status": status,
                    }));
                }
            }
            print_json(&json!({
                "checked": summary.checked,
                "accepted": summary.accepted,
                "warnings": summary.warnings,
                "blocked": summary.blocked,
                "failed": summary.failed,
                "files": rows,
            }))?;
        }
        Commands::Search { query, limit } => {
            let client = ApiClient::from_config(&config)?;
            let response = client.search_characters(&query, limit).await?;
            print_json(&response)?;
        }
        Commands::RandomName { count } => {
            let client = Arc::new(ApiClient::from_config(&config)?);
            let generator = NameGenerator::new(client);
            let mut names = Vec::with_capacity(count as usize);
            for _ in 0..count {
                names.push(generator.next().await);
            }
            print_json(&names)?;
        }
        Commands::Health => {
            let client = ApiClient::from_config(&config)?;
            let latency = client.health().await?;
            let connection = if latency > config.slow_latency() {
                "slow"
            } else {
                "fast"
            };
            print_json(&json!({
                "status": "ok",
                "latency_ms": latency.as_millis() as u64,
                "connection": connection,
            }))?;
        }
    }

    Ok(())
}
