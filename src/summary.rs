//! Pull request review summary.
//!
//! Folds PR metadata, the changed-file list and human review threads into a
//! single document so a reviewer needs one call instead of four.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::api::AdoClient;
use crate::error::ApiError;

const DESCRIPTION_LIMIT: usize = 500;
const COMMENT_LIMIT: usize = 200;

/// Changed paths grouped by change type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileChanges {
    pub added: Vec<String>,
    pub edited: Vec<String>,
    pub deleted: Vec<String>,
}

impl FileChanges {
    /// Group a PR change list by `changeType`.
    ///
    /// Only `add`, `edit` and `delete` are kept, in input order. Entries
    /// without a path are skipped. A non-list input yields no files.
    pub fn classify(changes: &Value) -> Self {
        let mut files = Self::default();
        let Some(entries) = changes.as_array() else {
            return files;
        };

        for entry in entries {
            let path = entry
                .get("item")
                .and_then(|item| item.get("path"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if path.is_empty() {
                continue;
            }
            let bucket = match entry.get("changeType").and_then(Value::as_str) {
                Some("add") => &mut files.added,
                Some("edit") => &mut files.edited,
                Some("delete") => &mut files.deleted,
                _ => continue,
            };
            bucket.push(path.to_string());
        }
        files
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.edited.is_empty() && self.deleted.is_empty()
    }

    /// Paths whose pre-change version exists on the target branch.
    pub fn before_paths(&self) -> Vec<String> {
        self.edited.iter().chain(&self.deleted).cloned().collect()
    }

    /// Paths whose post-change version exists on the source branch.
    pub fn after_paths(&self) -> Vec<String> {
        self.edited.iter().chain(&self.added).cloned().collect()
    }
}

/// First human comment of a review thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    pub status: String,
    pub author: String,
    pub file_path: String,
    pub content: String,
}

impl ReviewComment {
    /// Build from a thread, or `None` when it has no `text` comment.
    pub fn from_thread(thread: &Value) -> Option<Self> {
        let first = thread
            .get("comments")
            .and_then(Value::as_array)?
            .iter()
            .find(|c| c.get("commentType").and_then(Value::as_str) == Some("text"))?;

        Some(Self {
            status: str_at(thread, &["status"]).unwrap_or("unknown").to_string(),
            author: str_at(first, &["author", "displayName"])
                .unwrap_or("?")
                .to_string(),
            file_path: str_at(thread, &["threadContext", "filePath"])
                .unwrap_or_default()
                .to_string(),
            content: truncate_chars(str_at(first, &["content"]).unwrap_or_default(), COMMENT_LIMIT),
        })
    }
}

/// Review-oriented overview of a pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrSummary {
    pub title: Option<String>,
    pub description: String,
    pub status: Option<String>,
    pub created_by: Option<String>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub source_commit: Option<String>,
    pub target_commit: Option<String>,
    pub work_item_refs: Value,
    pub files: FileChanges,
    pub review_comments: Vec<ReviewComment>,
}

impl PrSummary {
    pub fn build(pr: &Value, changes: &Value, threads: &Value) -> Self {
        let owned = |path: &[&str]| str_at(pr, path).map(str::to_string);

        let review_comments = threads
            .as_array()
            .map(|threads| threads.iter().filter_map(ReviewComment::from_thread).collect())
            .unwrap_or_default();

        Self {
            title: owned(&["title"]),
            description: truncate_chars(
                str_at(pr, &["description"]).unwrap_or_default(),
                DESCRIPTION_LIMIT,
            ),
            status: owned(&["status"]),
            created_by: owned(&["createdBy", "displayName"]),
            source_branch: owned(&["sourceRefName"]),
            target_branch: owned(&["targetRefName"]),
            source_commit: merge_commit(pr, "lastMergeSourceCommit"),
            target_commit: merge_commit(pr, "lastMergeTargetCommit"),
            work_item_refs: pr
                .get("workItemRefs")
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
            files: FileChanges::classify(changes),
            review_comments,
        }
    }
}

/// Commit id of `lastMergeSourceCommit` / `lastMergeTargetCommit`.
pub fn merge_commit(pr: &Value, key: &str) -> Option<String> {
    str_at(pr, &[key, "commitId"])
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
}

/// First `limit` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

impl AdoClient {
    /// PR metadata with work items, changes of the latest iteration and
    /// human review threads.
    pub async fn pr_summary(
        &self,
        project: &str,
        repo: &str,
        pr_id: u32,
    ) -> Result<PrSummary, ApiError> {
        let pr = self.get_pull_request(project, repo, pr_id, true).await?;
        let changes = self
            .get_pull_request_changes(project, repo, pr_id, None, None, None)
            .await?;
        let threads = self
            .list_pr_threads(project, repo, pr_id, None, None, None)
            .await?;

        let summary = PrSummary::build(&pr, &changes, &threads);
        debug!(
            pr_id,
            files = summary.files.added.len() + summary.files.edited.len() + summary.files.deleted.len(),
            comments = summary.review_comments.len(),
            "built PR summary"
        );
        Ok(summary)
    }
}
