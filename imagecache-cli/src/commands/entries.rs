//! Namespace inspection and cleanup.

use clap::Args;

use imagecache::cache::{DiskStore, Namespace, SUPPLEMENTS_NAMESPACE};

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Arguments naming a single namespace.
#[derive(Debug, Args)]
pub struct NamespaceArgs {
    /// Namespace to operate on
    #[arg(long, short, default_value = SUPPLEMENTS_NAMESPACE)]
    pub namespace: Namespace,
}

/// Print every stored key of a namespace, sorted.
pub fn run_list(options: &GlobalOptions, args: NamespaceArgs) -> Result<(), CliError> {
    let store = open_store(options)?;

    let mut keys: Vec<String> = store
        .list(&args.namespace)
        .into_iter()
        .map(|key| key.as_str().to_string())
        .collect();
    keys.sort();

    for key in &keys {
        println!("{}", key);
    }
    eprintln!("{} entries in '{}'", keys.len(), args.namespace);

    Ok(())
}

/// Remove every entry of a namespace.
pub fn run_clear(options: &GlobalOptions, args: NamespaceArgs) -> Result<(), CliError> {
    let store = open_store(options)?;

    println!(
        "Clearing '{}' at: {}",
        args.namespace,
        store.cache_dir().display()
    );
    let removed = store.clear_namespace(&args.namespace);
    println!("Deleted {} entries", removed);

    Ok(())
}

fn open_store(options: &GlobalOptions) -> Result<DiskStore, CliError> {
    let config = options.load_config()?;
    Ok(DiskStore::new(config.cache.directory))
}
