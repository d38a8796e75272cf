//! Thin wrapper around the `yt-dlp` executable.
//!
//! Every call spawns one process and collects its output; yt-dlp keeps no
//! state between runs.

use std::{path::Path, process::Stdio};

use tokio::process::Command;

use crate::{
    debug,
    service::ServiceError,
    types::{YtDlpEntry, YtDlpListing},
};

pub(crate) struct Invocation<'a> {
    binary: &'a str,
    args: Vec<String>,
}

impl<'a> Invocation<'a> {
    pub fn new(binary: &'a str) -> Self {
        Self {
            binary,
            args: vec!["--no-warnings".to_string()],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the process and returns its stdout.
    pub async fn run(self) -> Result<String, ServiceError> {
        debug!("running {} {}", self.binary, self.args.join(" "));

        let output = Command::new(self.binary)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ServiceError::Tool(format!("{} not found, is it installed?", self.binary))
                }
                _ => ServiceError::Tool(format!("failed to run {}: {}", self.binary, e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no output")
                .trim()
                .to_string();
            return Err(classify_failure(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs with `-J --flat-playlist` and parses the listing.
    pub async fn listing(self) -> Result<YtDlpListing, ServiceError> {
        let stdout = self.args(["--flat-playlist", "-J"]).run().await?;
        parse_listing(&stdout)
    }

    /// Runs a full extraction of a single video without downloading it.
    pub async fn details(self, url: impl Into<String>) -> Result<YtDlpEntry, ServiceError> {
        let stdout = self
            .args(["--no-playlist", "--skip-download", "-J"])
            .arg(url)
            .run()
            .await?;
        parse_entry(&stdout)
    }
}

pub fn parse_listing(json: &str) -> Result<YtDlpListing, ServiceError> {
    Ok(serde_json::from_str::<YtDlpListing>(json)?)
}

pub fn parse_entry(json: &str) -> Result<YtDlpEntry, ServiceError> {
    Ok(serde_json::from_str::<YtDlpEntry>(json)?)
}

/// yt-dlp reports everything through stderr; unavailable content is the one
/// case callers treat differently.
fn classify_failure(message: String) -> ServiceError {
    let lower = message.to_lowercase();
    if lower.contains("does not exist")
        || lower.contains("unavailable")
        || lower.contains("not found")
        || lower.contains("404")
    {
        ServiceError::NotFound(message)
    } else {
        ServiceError::Tool(message)
    }
}

/// Path of the downloaded file, printed by `--print after_move:filepath` as the
/// last line of stdout.
pub fn downloaded_path(stdout: &str, output_dir: &Path) -> Option<std::path::PathBuf> {
    let line = stdout.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    let path = Path::new(line);
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        output_dir.join(path)
    })
}

pub async fn version(binary: &str) -> Result<String, ServiceError> {
    let stdout = Command::new(binary)
        .arg("--version")
        .output()
        .await
        .map_err(|e| ServiceError::Tool(format!("{} not available: {}", binary, e)))?;
    Ok(String::from_utf8_lossy(&stdout.stdout).trim().to_string())
}
