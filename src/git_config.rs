//! Organization detection from the current repository's `origin` remote.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

/// Organization detected from a git remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedRemote {
    pub organization: String,
    pub remote_url: String,
}

static SSH_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static HTTPS_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static VISUALSTUDIO_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

// Covers both ssh.dev.azure.com and the older vs-ssh.visualstudio.com host.
fn ssh_regex() -> Option<&'static Regex> {
    SSH_REGEX
        .get_or_init(|| {
            Regex::new(r"^[^@]+@(?:ssh\.dev\.azure\.com|vs-ssh\.visualstudio\.com):v3/([^/]+)/").ok()
        })
        .as_ref()
}

fn https_regex() -> Option<&'static Regex> {
    HTTPS_REGEX
        .get_or_init(|| Regex::new(r"^https://(?:[^@/]+@)?dev\.azure\.com/([^/]+)/").ok())
        .as_ref()
}

fn visualstudio_regex() -> Option<&'static Regex> {
    VISUALSTUDIO_REGEX
        .get_or_init(|| Regex::new(r"^https://(?:[^@/]+@)?([^./]+)\.visualstudio\.com/").ok())
        .as_ref()
}

/// Detect the Azure DevOps organization of the repository at `repo_path`.
///
/// Returns `Ok(None)` when the directory is not a git repository or the remote
/// does not point at Azure DevOps.
pub fn detect_organization<P: AsRef<Path>>(repo_path: P) -> Result<Option<DetectedRemote>> {
    let repo_path = repo_path.as_ref();

    let output = Command::new("git")
        .current_dir(repo_path)
        .args(["remote", "get-url", "origin"])
        .output()
        .context("Failed to run git")?;

    if !output.status.success() {
        return Ok(None);
    }

    let remote_url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(parse_organization(&remote_url).map(|organization| DetectedRemote {
        organization,
        remote_url,
    }))
}

/// Extract the organization name from an Azure DevOps remote URL.
pub fn parse_organization(url: &str) -> Option<String> {
    [ssh_regex(), https_regex(), visualstudio_regex()]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}
