//! Serialization of [`ConfigFile`] back to commented INI text.

use std::path::Path;

use super::settings::ConfigFile;

/// Render the configuration with explanatory comments.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let user_agent = config.download.user_agent.as_deref().unwrap_or("");
    let normalize_png = if config.cache.normalize_png {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[cache]
; Root directory for cached images. Each namespace is a subdirectory.
; If empty, defaults to the platform data directory (e.g. ~/.local/share/imagecache)
directory = {}
; Decode downloaded images and store them re-encoded as PNG (default: true)
normalize_png = {}

[download]
; Timeout in seconds for HTTP requests (default: 30)
timeout = {}
; User-Agent header for image requests. Leave empty for the built-in value.
user_agent = {}

[logging]
; Directory for the log file (default: ~/.imagecache/logs)
directory = {}
; Log file name, cleared at the start of every session
file = {}
"#,
        path_to_string(&config.cache.directory),
        normalize_png,
        config.download.timeout,
        user_agent,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert a path to string, using ~ for home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
