//! Reading the optional `--config` TOML file.

use std::path::Path;

use eyre::WrapErr as _;
use tokio::fs;

use super::FileConfig;

/// Parses the file layer of the reaper's settings.
///
/// Every key is optional and unknown keys are rejected, so a typo in `[exclude]` fails the
/// run instead of silently dropping an exclusion. The result is only the file layer; it is
/// validated together with the command line by [`super::Settings::resolve`].
///
/// # Errors
///
/// Returns an error naming `path` if the file cannot be read or is not a valid reaper config.
pub async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<FileConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Unable to read reaper config {}", path.display()))?;
    toml::from_str(&content)
        .wrap_err_with(|| format!("Invalid reaper config {}", path.display()))
}
