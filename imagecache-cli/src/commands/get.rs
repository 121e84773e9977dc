//! Single image lookup.

use clap::Args;
use tracing::info;

use imagecache::cache::{Namespace, SUPPLEMENTS_NAMESPACE};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for `imagecache get`.
#[derive(Debug, Args)]
pub struct GetArgs {
    /// Remote image URL
    pub url: String,

    /// Namespace to resolve the image in
    #[arg(long, short, default_value = SUPPLEMENTS_NAMESPACE)]
    pub namespace: Namespace,

    /// Wait for a background fill and print the local path
    #[arg(long)]
    pub wait: bool,
}

/// Print where the image should be loaded from.
///
/// A miss still schedules a fill, which is allowed to finish before the
/// process exits. With `--wait` the lookup is repeated afterwards.
pub fn run(options: &GlobalOptions, args: GetArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("get");

    let cache = runner.create_cache()?;
    let location = cache.get_or_populate(&args.url, &args.namespace);
    let hit = location.is_local();

    if args.wait || hit {
        runner.block_on(cache.shutdown());
        let location = if hit {
            location
        } else {
            cache.get_or_populate(&args.url, &args.namespace)
        };
        println!("{}", location);
    } else {
        println!("{}", location);
        runner.block_on(cache.shutdown());
    }

    info!(stats = ?cache.stats(), "get finished");
    Ok(())
}
