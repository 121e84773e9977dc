//! Configuration initialization.

use imagecache::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Write a default config file unless one exists.
pub fn run(options: &GlobalOptions) -> Result<(), CliError> {
    let path = options.config_path.clone().unwrap_or_else(config_file_path);

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    let path = ConfigFile::ensure_exists_at(path)?;
    println!("Created config file: {}", path.display());
    Ok(())
}
