use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, info_span};

use subs_appinfo::ManifestPackageSource;
use subs_cli::validation::{FileReport, validate_file};
use subs_core::{EngineConfig, SubsContext};
use subs_model::RawSubscription;
use subs_updater::UpdateReport;

use crate::cli::{AddArgs, Cli, ImportArgs, RemoveArgs, ResolveArgs, ValidateArgs};
use crate::summary::{print_app_rules, print_subscriptions};

/// Load the configuration named on the command line and open the context.
pub async fn open_context(cli: &Cli) -> Result<SubsContext> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    }
    .context("load configuration")?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    let packages = Arc::new(ManifestPackageSource::new(config.apps_path()));
    SubsContext::open(config, packages)
        .await
        .context("open subscription data")
}

pub async fn run_resolve(cli: &Cli, args: &ResolveArgs) -> Result<()> {
    let context = open_context(cli).await?;
    let summary = context.current_summary();
    match &args.app {
        Some(app_id) => print_app_rules(&summary, app_id),
        None => {
            let items = context.registry().snapshot();
            let documents = context.store().snapshot();
            if items.is_empty() {
                println!("No subscriptions installed.");
            } else {
                print_subscriptions(&items, &documents, &summary);
            }
        }
    }
    Ok(())
}

pub async fn run_check_updates(cli: &Cli) -> Result<UpdateReport> {
    let context = open_context(cli).await?;
    let span = info_span!("check_updates");
    let _guard = span.enter();
    let report = context.check_updates().await;
    info!(
        checked = report.checked(),
        updated = report.updated.len(),
        failed = report.failed.len(),
        "Update pass finished"
    );
    Ok(report)
}

/// Validate every file. Unreadable files are reported and counted as failures.
pub fn run_validate(args: &ValidateArgs) -> (Vec<FileReport>, usize) {
    let mut reports = Vec::new();
    let mut unreadable = 0;
    for path in &args.files {
        match validate_file(path) {
            Ok(report) => reports.push(report),
            Err(error) => {
                eprintln!("error: {error:#}");
                unreadable += 1;
            }
        }
    }
    (reports, unreadable)
}

pub async fn run_import(cli: &Cli, args: &ImportArgs) -> Result<()> {
    let subscription = read_subscription(&args.file)?;
    let context = open_context(cli).await?;
    let stored = context
        .import_local(subscription)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    println!("Imported {} as id {}.", stored.name, stored.id);
    Ok(())
}

pub async fn run_add(cli: &Cli, args: &AddArgs) -> Result<()> {
    let context = open_context(cli).await?;
    let stored = context
        .add_from_url(&args.url)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    println!(
        "Added {} (id {}, version {}).",
        stored.name, stored.id, stored.version
    );
    Ok(())
}

pub async fn run_remove(cli: &Cli, args: &RemoveArgs) -> Result<()> {
    let context = open_context(cli).await?;
    let removed = context
        .delete_subscription(args.id)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    if !removed {
        bail!("subscription {} is not installed", args.id);
    }
    println!("Removed subscription {}.", args.id);
    Ok(())
}

fn read_subscription(path: &Path) -> Result<RawSubscription> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    RawSubscription::from_json(&text).with_context(|| format!("parse {}", path.display()))
}
