//! Reading and writing `~/.imagecache/config.ini`.
//!
//! The file has three sections: `[cache]` (entry directory, PNG
//! normalization), `[download]` (timeout, user agent) and `[logging]`
//! (log directory and file name). A missing file is not an error; every
//! key falls back to [`super::defaults`].
//!
//! Writes go through a temporary file next to the target and are renamed
//! into place, so a crash never leaves a truncated config behind.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ini::Ini;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::settings::ConfigFile;

/// Errors raised while loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but is unreadable or is not valid INI
    #[error("Cannot read {}: {source}", .path.display())]
    ReadError { path: PathBuf, source: ini::Error },

    /// The file could not be written
    #[error("Cannot write {}: {source}", .path.display())]
    WriteError { path: PathBuf, source: io::Error },

    /// A key holds a value the cache cannot use
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// The directory holding the file could not be created
    #[error("Cannot create config directory {}: {source}", .path.display())]
    DirectoryError { path: PathBuf, source: io::Error },
}

impl ConfigFile {
    /// Load `~/.imagecache/config.ini`, or defaults if it is absent.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load the config at `path`, or defaults if nothing is there.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        match Ini::load_from_file(path) {
            Ok(ini) => super::parser::parse_ini(&ini),
            Err(ini::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigFileError::ReadError {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write this config to `~/.imagecache/config.ini`.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write this config to `path`, replacing any existing file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let staged = self.stage(path)?;
        staged
            .persist(path)
            .map_err(|e| write_error(path, e.error))?;
        Ok(())
    }

    /// Write `~/.imagecache/config.ini` with defaults unless it exists.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        Self::ensure_exists_at(config_file_path())
    }

    /// Write a default config to `path` unless a file is already there.
    ///
    /// An existing file is never touched, even if it was created between
    /// the check and the write.
    pub fn ensure_exists_at(path: PathBuf) -> Result<PathBuf, ConfigFileError> {
        if path.is_file() {
            return Ok(path);
        }

        let staged = Self::default().stage(&path)?;
        match staged.persist_noclobber(&path) {
            Ok(_) => Ok(path),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(path),
            Err(e) => Err(write_error(&path, e.error)),
        }
    }

    /// Serialize into a temporary file in the target's directory.
    fn stage(&self, path: &Path) -> Result<NamedTempFile, ConfigFileError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|source| ConfigFileError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| write_error(path, e))?;
        staged
            .write_all(super::writer::to_config_string(self).as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| write_error(path, e))?;
        Ok(staged)
    }
}

fn write_error(path: &Path, source: io::Error) -> ConfigFileError {
    ConfigFileError::WriteError {
        path: path.to_path_buf(),
        source,
    }
}

/// Directory holding the config file and default logs (`~/.imagecache`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".imagecache")
}

/// Default config file location (`~/.imagecache/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
