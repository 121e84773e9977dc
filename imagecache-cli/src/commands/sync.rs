//! Bulk fill and reconciliation.

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args};
use tracing::info;

use imagecache::cache::{Namespace, SUPPLEMENTS_NAMESPACE};
use imagecache::records::{AnyRecord, Image};
use imagecache::service::{BulkSummary, ImageCache};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for `imagecache sync`.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("input").required(true).args(["urls", "records"])))]
pub struct SyncArgs {
    /// Image URLs forming the namespace's working set
    pub urls: Vec<String>,

    /// Namespace for the URLs
    #[arg(long, short, default_value = SUPPLEMENTS_NAMESPACE)]
    pub namespace: Namespace,

    /// JSON array of program/supplement records. Each kind is synced in its
    /// own namespace and the file is rewritten with resolved references.
    #[arg(long, value_name = "FILE")]
    pub records: Option<PathBuf>,

    /// Only fill; keep stored entries that are not part of this batch
    #[arg(long)]
    pub partial: bool,
}

/// Run `imagecache sync`.
pub fn run(options: &GlobalOptions, args: SyncArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("sync");

    let cache = runner.create_cache()?;

    match &args.records {
        Some(path) => sync_records(&cache, path, args.partial)?,
        None => {
            let summary = sync_urls(&cache, &args.urls, &args.namespace, args.partial);
            print_summary(&args.namespace.to_string(), &summary);
        }
    }

    runner.block_on(cache.shutdown());

    let stats = cache.stats();
    info!(
        fills_succeeded = stats.fills_succeeded,
        fills_failed = stats.fills_failed,
        entries_evicted = stats.entries_evicted,
        "sync finished"
    );
    println!(
        "Fetched {} images ({} failed), evicted {} entries from {}",
        stats.fills_succeeded,
        stats.fills_failed,
        stats.entries_evicted,
        runner.config().cache.directory.display()
    );

    Ok(())
}

fn sync_urls(cache: &ImageCache, urls: &[String], namespace: &Namespace, partial: bool) -> BulkSummary {
    let mut images: Vec<Image> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| Image::new(i as u32, url.as_str()))
        .collect();

    if partial {
        cache.bulk_fill(&mut images, namespace)
    } else {
        cache.bulk_insert(&mut images, namespace)
    }
}

fn sync_records(cache: &ImageCache, path: &Path, partial: bool) -> Result<(), CliError> {
    let mut records = read_records(path)?;

    if partial {
        let mut summary = BulkSummary::default();
        for record in records.iter_mut() {
            let namespace = record.kind().namespace();
            let single = cache.bulk_fill(std::slice::from_mut(record), &namespace);
            summary.hits += single.hits;
            summary.misses += single.misses;
        }
        print_summary("records", &summary);
    } else {
        for (kind, summary) in cache.bulk_insert_any(&mut records) {
            print_summary(kind.namespace().as_str(), &summary);
        }
    }

    write_records(path, &records)
}

fn read_records(path: &Path) -> Result<Vec<AnyRecord>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::Records {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&text).map_err(|e| CliError::Records {
        path: path.to_path_buf(),
        message: format!("invalid records: {}", e),
    })
}

fn write_records(path: &Path, records: &[AnyRecord]) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(records).map_err(|e| CliError::Records {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    std::fs::write(path, text).map_err(|e| CliError::Records {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn print_summary(label: &str, summary: &BulkSummary) {
    println!(
        "{}: {} records, {} cached, {} queued{}",
        label,
        summary.total(),
        summary.hits,
        summary.misses,
        if summary.reconcile_scheduled {
            ", reconciling"
        } else {
            ""
        }
    );
}
