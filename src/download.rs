//! Bulk file downloads from a repository into a local tree.

use futures::StreamExt;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::AdoClient;
use crate::api::repos::GitVersion;
use crate::error::ApiError;
use crate::summary::{FileChanges, merge_commit};

/// Retry and parallelism settings for bulk downloads.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    /// Extra attempts per file after the first.
    pub retries: u32,
    /// Files fetched at once.
    pub concurrency: usize,
    /// Delay unit; attempt `n` waits `n * retry_delay` before retrying.
    pub retry_delay: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            retries: 2,
            concurrency: 4,
            retry_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Ok,
    Failed,
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadStatus::Ok => write!(f, "ok"),
            DownloadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome for one requested repository path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub path: String,
    pub status: DownloadStatus,
    /// Local file written, `null` on failure.
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PrDownloads {
    pub target: Vec<DownloadResult>,
    pub source: Vec<DownloadResult>,
}

/// Result of downloading both sides of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrDownload {
    pub source_commit: String,
    pub target_commit: String,
    pub files: FileChanges,
    pub downloads: PrDownloads,
}

/// Local destination of a repository path under `output_dir`.
///
/// Rejects paths that would leave `output_dir`.
pub fn local_path(output_dir: &Path, repo_path: &str) -> Result<PathBuf, String> {
    let relative = Path::new(repo_path.trim_start_matches(['/', '\\']));
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || relative.as_os_str().is_empty() {
        return Err(format!("refusing to write outside {}: {repo_path}", output_dir.display()));
    }
    Ok(output_dir.join(relative))
}

impl AdoClient {
    async fn download_one(
        &self,
        project: &str,
        repo: &str,
        repo_path: &str,
        output_dir: &Path,
        version: Option<&GitVersion>,
        options: &DownloadOptions,
    ) -> DownloadResult {
        let failed = |error: String| DownloadResult {
            path: repo_path.to_string(),
            status: DownloadStatus::Failed,
            output: None,
            error: Some(error),
        };

        let destination = match local_path(output_dir, repo_path) {
            Ok(path) => path,
            Err(e) => return failed(e),
        };

        let mut last_error = String::new();
        for attempt in 1..=options.retries + 1 {
            match self
                .fetch_to(project, repo, repo_path, &destination, version)
                .await
            {
                Ok(()) => {
                    return DownloadResult {
                        path: repo_path.to_string(),
                        status: DownloadStatus::Ok,
                        output: Some(destination.display().to_string()),
                        error: None,
                    };
                }
                Err(e) => {
                    debug!(path = repo_path, attempt, error = %e, "download attempt failed");
                    last_error = e;
                    if attempt <= options.retries {
                        tokio::time::sleep(options.retry_delay * attempt).await;
                    }
                }
            }
        }

        warn!(path = repo_path, error = %last_error, "download failed");
        failed(last_error)
    }

    async fn fetch_to(
        &self,
        project: &str,
        repo: &str,
        repo_path: &str,
        destination: &Path,
        version: Option<&GitVersion>,
    ) -> Result<(), String> {
        let content = self
            .get_file_content(project, repo, repo_path, version)
            .await
            .map_err(|e| e.to_string())?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        tokio::fs::write(destination, content)
            .await
            .map_err(|e| format!("failed to write {}: {e}", destination.display()))
    }

    /// Download `paths` into `output_dir`, mirroring the repository layout.
    ///
    /// Failures are reported per file. Results keep the order of `paths`
    /// and progress lines go to stderr.
    pub async fn bulk_download_files(
        &self,
        project: &str,
        repo: &str,
        paths: &[String],
        output_dir: &Path,
        version: Option<&GitVersion>,
        options: &DownloadOptions,
    ) -> Vec<DownloadResult> {
        let total = paths.len();
        let mut downloads = futures::stream::iter(paths)
            .map(|path| self.download_one(project, repo, path, output_dir, version, options))
            .buffered(options.concurrency.max(1));

        let mut results = Vec::with_capacity(total);
        while let Some(result) = downloads.next().await {
            eprintln!(
                "[{}/{total}] {}: {}",
                results.len() + 1,
                result.status,
                result.path
            );
            results.push(result);
        }
        results
    }

    /// Download the before and after versions of every file a PR touches.
    ///
    /// Edited and deleted files come from the target merge commit into
    /// `<output_dir>/target`; edited and added files from the source merge
    /// commit into `<output_dir>/source`.
    pub async fn pr_download(
        &self,
        project: &str,
        repo: &str,
        pr_id: u32,
        output_dir: &Path,
        options: &DownloadOptions,
    ) -> Result<PrDownload, ApiError> {
        let pr = self.get_pull_request(project, repo, pr_id, false).await?;
        let (Some(source_commit), Some(target_commit)) = (
            merge_commit(&pr, "lastMergeSourceCommit"),
            merge_commit(&pr, "lastMergeTargetCommit"),
        ) else {
            return Err(ApiError::NoMergeCommit { pr_id });
        };

        let changes = self
            .get_pull_request_changes(project, repo, pr_id, None, None, None)
            .await?;
        let files = FileChanges::classify(&changes);

        let mut downloads = PrDownloads::default();
        let before = files.before_paths();
        if !before.is_empty() {
            let version = GitVersion::Commit(target_commit.clone());
            downloads.target = self
                .bulk_download_files(
                    project,
                    repo,
                    &before,
                    &output_dir.join("target"),
                    Some(&version),
                    options,
                )
                .await;
        }
        let after = files.after_paths();
        if !after.is_empty() {
            let version = GitVersion::Commit(source_commit.clone());
            downloads.source = self
                .bulk_download_files(
                    project,
                    repo,
                    &after,
                    &output_dir.join("source"),
                    Some(&version),
                    options,
                )
                .await;
        }

        Ok(PrDownload {
            source_commit,
            target_commit,
            files,
            downloads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_client;
    use serde_json::json;
    use tempfile::TempDir;

    fn fast(retries: u32) -> DownloadOptions {
        DownloadOptions {
            retries,
            concurrency: 2,
            retry_delay: Duration::ZERO,
        }
    }

    /// # Local Path Mapping
    ///
    /// Tests repository path to local path mapping.
    ///
    /// ## Test Scenario
    /// - A nested path, a traversal path and the root
    ///
    /// ## Expected Outcome
    /// - Nested path lands under the output dir, the others are rejected
    #[test]
    fn test_local_path() {
        let out = Path::new("/tmp/out");
        assert_eq!(
            local_path(out, "/src/Foo/Bar.cs").unwrap(),
            PathBuf::from("/tmp/out/src/Foo/Bar.cs")
        );
        assert!(local_path(out, "/../etc/passwd").is_err());
        assert!(local_path(out, "/src/../../x").is_err());
        assert!(local_path(out, "/").is_err());
    }

    /// # Bulk Download Success
    ///
    /// Tests writing files into a mirrored tree.
    ///
    /// ## Test Scenario
    /// - Two files at a commit
    ///
    /// ## Expected Outcome
    /// - Both are written with their content and reported ok in input order
    #[tokio::test]
    async fn test_bulk_download_writes_files() {
        let (client, transport) = mock_client("contoso");
        transport.push_text("alpha").push_text("beta");
        let dir = TempDir::new().unwrap();

        let paths = vec!["/src/A.cs".to_string(), "/docs/readme.md".to_string()];
        let version = GitVersion::Commit("abc".to_string());
        let results = client
            .bulk_download_files("Web", "app", &paths, dir.path(), Some(&version), &fast(0))
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].path, "/src/A.cs");
        assert_eq!(results[0].status, DownloadStatus::Ok);
        assert_eq!(results[1].path, "/docs/readme.md");
        let written = std::fs::read_to_string(dir.path().join("src/A.cs")).unwrap();
        assert_eq!(written, "alpha");
        let written = std::fs::read_to_string(dir.path().join("docs/readme.md")).unwrap();
        assert_eq!(written, "beta");
        assert_eq!(
            transport.request(0).query_value("versionDescriptor.versionType"),
            Some("commit")
        );
    }

    /// # Bulk Download Retry
    ///
    /// Tests a failure followed by success.
    ///
    /// ## Test Scenario
    /// - retries=1, first response 404, second succeeds
    ///
    /// ## Expected Outcome
    /// - Status ok after two requests, no error key in JSON
    #[tokio::test]
    async fn test_bulk_download_retry_then_ok() {
        let (client, transport) = mock_client("contoso");
        transport
            .push_status(404, json!({"message": "missing"}))
            .push_text("content");
        let dir = TempDir::new().unwrap();

        let results = client
            .bulk_download_files("Web", "app", &["/a.txt".to_string()], dir.path(), None, &fast(1))
            .await;

        assert_eq!(results[0].status, DownloadStatus::Ok);
        assert_eq!(transport.requests().len(), 2);
        let value = serde_json::to_value(&results[0]).unwrap();
        assert!(value.get("error").is_none());
    }

    /// # Bulk Download Permanent Failure
    ///
    /// Tests reporting after all attempts fail.
    ///
    /// ## Test Scenario
    /// - retries=1, both responses are 401
    ///
    /// ## Expected Outcome
    /// - Status failed, output null, error carries the message
    #[tokio::test]
    async fn test_bulk_download_failure() {
        let (client, transport) = mock_client("contoso");
        transport
            .push_status(401, json!({}))
            .push_status(401, json!({}));
        let dir = TempDir::new().unwrap();

        let results = client
            .bulk_download_files("Web", "app", &["/a.txt".to_string()], dir.path(), None, &fast(1))
            .await;

        let value = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["output"], serde_json::Value::Null);
        assert!(value["error"].as_str().unwrap().starts_with("Unauthorized"));
        assert_eq!(transport.requests().len(), 2);
    }

    /// # Traversal Paths Are Not Requested
    ///
    /// Tests that unsafe paths fail without network traffic.
    ///
    /// ## Test Scenario
    /// - A single path containing ..
    ///
    /// ## Expected Outcome
    /// - Failed result and no request sent
    #[tokio::test]
    async fn test_bulk_download_rejects_traversal() {
        let (client, transport) = mock_client("contoso");
        let dir = TempDir::new().unwrap();

        let results = client
            .bulk_download_files(
                "Web",
                "app",
                &["/../outside.txt".to_string()],
                dir.path(),
                None,
                &fast(2),
            )
            .await;

        assert_eq!(results[0].status, DownloadStatus::Failed);
        assert!(transport.requests().is_empty());
    }

    /// # PR Download Missing Merge Commits
    ///
    /// Tests the guard on merge commit information.
    ///
    /// ## Test Scenario
    /// - The PR has a source commit but no target commit
    ///
    /// ## Expected Outcome
    /// - NoMergeCommit error
    #[tokio::test]
    async fn test_pr_download_requires_merge_commits() {
        let (client, transport) = mock_client("contoso");
        transport.push_json(json!({"lastMergeSourceCommit": {"commitId": "s"}}));
        let dir = TempDir::new().unwrap();

        let err = client
            .pr_download("Web", "app", 5, dir.path(), &fast(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoMergeCommit { pr_id: 5 }));
    }

    /// # PR Download Sides
    ///
    /// Tests which files are fetched at which commit.
    ///
    /// ## Test Scenario
    /// - One edited, one added and one deleted file
    ///
    /// ## Expected Outcome
    /// - Target side: edited then deleted at the target commit
    /// - Source side: edited then added at the source commit
    #[tokio::test]
    async fn test_pr_download_sides() {
        let (client, transport) = mock_client("contoso");
        transport
            .push_json(json!({
                "lastMergeSourceCommit": {"commitId": "src1"},
                "lastMergeTargetCommit": {"commitId": "tgt1"}
            }))
            .push_json(json!({"value": [{"id": 1}]}))
            .push_json(json!({"changeEntries": [
                {"changeType": "edit", "item": {"path": "/e.cs"}},
                {"changeType": "add", "item": {"path": "/a.cs"}},
                {"changeType": "delete", "item": {"path": "/d.cs"}}
            ]}))
            .push_text("e-old")
            .push_text("d-old")
            .push_text("e-new")
            .push_text("a-new");
        let dir = TempDir::new().unwrap();

        let options = DownloadOptions {
            concurrency: 1,
            ..fast(0)
        };
        let result = client
            .pr_download("Web", "app", 5, dir.path(), &options)
            .await
            .unwrap();

        assert_eq!(result.source_commit, "src1");
        assert_eq!(result.target_commit, "tgt1");
        let target: Vec<&str> = result.downloads.target.iter().map(|r| r.path.as_str()).collect();
        let source: Vec<&str> = result.downloads.source.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(target, vec!["/e.cs", "/d.cs"]);
        assert_eq!(source, vec!["/e.cs", "/a.cs"]);

        let requests = transport.requests();
        assert_eq!(requests[3].query_value("versionDescriptor.version"), Some("tgt1"));
        assert_eq!(requests[5].query_value("versionDescriptor.version"), Some("src1"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("target/e.cs")).unwrap(),
            "e-old"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("source/a.cs")).unwrap(),
            "a-new"
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["files"]["deleted"], json!(["/d.cs"]));
        assert!(value["downloads"]["target"].is_array());
    }
}
