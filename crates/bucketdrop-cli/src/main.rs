//! Bucketdrop CLI: upload files into your namespace and browse what is there.
//!
//! Configuration comes from the environment or a `.env` file; see USER_EMAIL,
//! STORAGE_BACKEND and the S3_* / LOCAL_STORAGE_PATH variables.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bucketdrop_cli::{format_listing, format_update, init_tracing, print_json, report_error};
use bucketdrop_core::{AppError, Config, ErrorMetadata, LoadMoreMode};
use bucketdrop_services::{
    FileListingPaginator, IdentityProvider, ListingPage, LoadOutcome, PaginatorOptions, RawFile,
    StaticIdentity, TrackerOptions, UploadBatchTracker,
};
use bucketdrop_storage::create_storage;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Parser)]
#[command(name = "bucketdrop", about = "Upload files to object storage and list them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more files as a single batch
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Drop the file at this position (0-based) from the batch before uploading
        #[arg(long = "skip")]
        skip: Vec<usize>,
    },
    /// List uploaded files, newest first
    List {
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
        /// How further pages combine with the first: append or replace
        #[arg(long)]
        mode: Option<LoadMoreMode>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the signed-in user and their namespace
    Whoami,
}

#[derive(Serialize)]
struct WhoAmI {
    email: String,
    namespace: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            init_tracing(None, false);
            return fail(err);
        }
    };
    init_tracing(config.log_filter(), config.is_production());

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn fail(err: AppError) -> ExitCode {
    report_error(&err);
    ExitCode::from(err.exit_code())
}

fn load_config() -> Result<Config, AppError> {
    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;
    config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))?;
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    tracing::debug!(
        environment = config.environment(),
        backend = %config.storage_backend(),
        "Configuration loaded"
    );

    let identity: Arc<dyn IdentityProvider> = Arc::new(StaticIdentity::new(config.user_email()));

    match cli.command {
        Commands::Upload { files, skip } => upload(&config, identity, files, skip).await,
        Commands::List { pages, mode, json } => list(&config, identity, pages, mode, json).await,
        Commands::Whoami => {
            let principal = identity.current_principal().await?;
            let namespace = principal.namespace()?;
            print_json(&WhoAmI {
                email: principal.email,
                namespace,
            })
        }
    }
}

#[tracing::instrument(skip(config, identity))]
async fn upload(
    config: &Config,
    identity: Arc<dyn IdentityProvider>,
    files: Vec<PathBuf>,
    mut skip: Vec<usize>,
) -> Result<(), AppError> {
    let storage = create_storage(config).await?;

    let mut selection = Vec::with_capacity(files.len());
    for path in &files {
        selection.push(RawFile::from_path(path).await?);
    }

    let mut tracker = UploadBatchTracker::new(storage, identity, TrackerOptions::from(config));
    tracker.select_files(selection);

    // Highest index first so earlier removals do not shift later ones.
    skip.sort_unstable_by(|a, b| b.cmp(a));
    skip.dedup();
    for index in skip {
        tracker.remove_from_batch(index);
    }

    let mut events = tracker.subscribe_events();
    let outcome = {
        let upload = tracker.start_upload();
        tokio::pin!(upload);
        loop {
            tokio::select! {
                result = &mut upload => break result?,
                Ok(update) = events.recv() => eprintln!("{}", format_update(&update)),
            }
        }
    };
    loop {
        match events.try_recv() {
            Ok(update) => eprintln!("{}", format_update(&update)),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    print_json(&tracker.history())?;

    let failures = outcome.failures();
    for failure in &failures {
        tracing::warn!(file = %failure.filename, reason = %failure.reason, "Transfer failed");
    }
    match failures.into_iter().next() {
        Some(first) => Err(first.into()),
        None => Ok(()),
    }
}

#[tracing::instrument(skip(config, identity))]
async fn list(
    config: &Config,
    identity: Arc<dyn IdentityProvider>,
    pages: usize,
    mode: Option<LoadMoreMode>,
    json: bool,
) -> Result<(), AppError> {
    let storage = create_storage(config).await?;

    let mut options = PaginatorOptions::from(config);
    if let Some(mode) = mode {
        options.mode = mode;
    }
    let paginator = FileListingPaginator::new(storage, identity, options);

    if let Some(LoadOutcome::Failed(e)) = paginator.activate().await {
        return Err(e.into());
    }
    for _ in 1..pages.max(1) {
        match paginator.load_more().await {
            LoadOutcome::Loaded(_) => {}
            LoadOutcome::Exhausted => break,
            LoadOutcome::Failed(e) => return Err(e.into()),
            LoadOutcome::Busy => {
                return Err(AppError::Internal("listing already in progress".to_string()))
            }
        }
    }

    let page = ListingPage {
        entries: paginator.entries(),
        next_token: paginator.next_token(),
    };

    if json {
        print_json(&page)
    } else {
        print!("{}", format_listing(&page.entries));
        if page.next_token.is_some() {
            println!("(more files available, use --pages to load them)");
        }
        Ok(())
    }
}
