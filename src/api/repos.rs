//! Git repository, commit and pull request endpoints.

use clap::Args;
use serde_json::{Map, Value, json};

use super::client::{AdoClient, Endpoint, seg, short_branch, unwrap_list};
use super::params::QueryParams;
use crate::error::ApiError;

/// Version a file or tree is read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitVersion {
    Branch(String),
    Commit(String),
}

impl GitVersion {
    /// Pick a version from optional flags; a branch wins over a commit.
    pub fn from_options(branch: Option<&str>, commit: Option<&str>) -> Option<Self> {
        match (
            branch.filter(|b| !b.is_empty()),
            commit.filter(|c| !c.is_empty()),
        ) {
            (Some(branch), _) => Some(GitVersion::Branch(short_branch(branch).to_string())),
            (None, Some(commit)) => Some(GitVersion::Commit(commit.to_string())),
            (None, None) => None,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            GitVersion::Branch(v) | GitVersion::Commit(v) => v,
        }
    }

    pub fn version_type(&self) -> &'static str {
        match self {
            GitVersion::Branch(_) => "branch",
            GitVersion::Commit(_) => "commit",
        }
    }

    fn apply(&self, params: QueryParams) -> QueryParams {
        params
            .push("versionDescriptor.version", self.version())
            .push("versionDescriptor.versionType", self.version_type())
    }
}

/// Filters for `commitsbatch`.
#[derive(Debug, Clone, Default, Args)]
pub struct CommitSearch {
    /// Author name or email
    #[arg(long)]
    pub author: Option<String>,
    /// Earliest commit date (ISO 8601)
    #[arg(long)]
    pub from_date: Option<String>,
    /// Latest commit date (ISO 8601)
    #[arg(long)]
    pub to_date: Option<String>,
    /// Text to search for in commit messages
    #[arg(long)]
    pub search_text: Option<String>,
    /// Branch to search
    #[arg(long)]
    pub branch: Option<String>,
    /// Include linked work items (true/false)
    #[arg(long, value_parser = crate::cli::parse_bool_flag)]
    pub include_work_items: Option<bool>,
    #[arg(long)]
    pub top: Option<u32>,
    #[arg(long)]
    pub skip: Option<u32>,
}

impl CommitSearch {
    fn body(&self) -> Value {
        let mut body = Map::new();
        let text_fields = [
            ("author", &self.author),
            ("fromDate", &self.from_date),
            ("toDate", &self.to_date),
            ("searchText", &self.search_text),
        ];
        for (key, value) in text_fields {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                body.insert(key.to_string(), json!(v));
            }
        }
        if let Some(branch) = self.branch.as_deref().filter(|b| !b.is_empty()) {
            body.insert(
                "itemVersion".to_string(),
                json!({ "version": short_branch(branch) }),
            );
        }
        if let Some(include) = self.include_work_items {
            body.insert("includeWorkItems".to_string(), json!(include));
        }
        Value::Object(body)
    }
}

/// Filters for listing pull requests.
#[derive(Debug, Clone, Default, Args)]
pub struct PullRequestQuery {
    /// active, abandoned, completed or all
    #[arg(long)]
    pub status: Option<String>,
    /// Source ref, e.g. refs/heads/feature
    #[arg(long)]
    pub source_branch: Option<String>,
    /// Target ref, e.g. refs/heads/main
    #[arg(long)]
    pub target_branch: Option<String>,
    /// Creator identity id
    #[arg(long)]
    pub creator_id: Option<String>,
    /// Reviewer identity id
    #[arg(long)]
    pub reviewer_id: Option<String>,
    #[arg(long)]
    pub top: Option<u32>,
    #[arg(long)]
    pub skip: Option<u32>,
}

/// Base and target of a commit diff.
#[derive(Debug, Clone, Default, Args)]
pub struct DiffQuery {
    /// Base version (commit, branch or tag)
    #[arg(long)]
    pub base: Option<String>,
    /// Target version (commit, branch or tag)
    #[arg(long)]
    pub target: Option<String>,
    /// Base version type: commit, branch or tag
    #[arg(long, default_value = "commit")]
    pub base_type: String,
    /// Target version type: commit, branch or tag
    #[arg(long, default_value = "commit")]
    pub target_type: String,
}

fn repo_path(repo: &str, rest: &str) -> String {
    if rest.is_empty() {
        format!("_apis/git/repositories/{}", seg(repo))
    } else {
        format!("_apis/git/repositories/{}/{rest}", seg(repo))
    }
}

fn pr_path(repo: &str, pr_id: u32, rest: &str) -> String {
    if rest.is_empty() {
        repo_path(repo, &format!("pullrequests/{pr_id}"))
    } else {
        repo_path(repo, &format!("pullrequests/{pr_id}/{rest}"))
    }
}

impl AdoClient {
    /// List repositories in a project, optionally filtered by name substring.
    pub async fn list_repos(
        &self,
        project: &str,
        top: Option<u32>,
        name_filter: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        let params = QueryParams::new().opt("$top", top).opt(
            "$filter",
            name_filter
                .filter(|n| !n.is_empty())
                .map(|n| format!("contains(name, '{n}')")),
        );
        self.get_all(Endpoint::project(project, "_apis/git/repositories").params(params))
            .await
    }

    pub async fn get_repo(&self, project: &str, repo: &str) -> Result<Value, ApiError> {
        self.get(Endpoint::project(project, repo_path(repo, "")))
            .await
    }

    pub async fn list_branches(
        &self,
        project: &str,
        repo: &str,
        filter_contains: Option<&str>,
        top: Option<u32>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .text("filterContains", filter_contains)
            .opt("$top", top)
            .push("filter", "heads/");
        let data = self
            .get(Endpoint::project(project, repo_path(repo, "refs")).params(params))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    /// Look up one branch; `null` when it does not exist.
    pub async fn get_branch(
        &self,
        project: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Value, ApiError> {
        let name = short_branch(branch);
        let params = QueryParams::new()
            .push("filter", format!("heads/{name}"))
            .push("filterContains", name);
        let data = self
            .get(Endpoint::project(project, repo_path(repo, "refs")).params(params))
            .await?;

        Ok(match unwrap_list(data, "value") {
            Value::Array(refs) => refs.into_iter().next().unwrap_or(Value::Null),
            other => other,
        })
    }

    pub async fn search_commits(
        &self,
        project: &str,
        repo: &str,
        search: &CommitSearch,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .opt("$top", search.top)
            .opt("$skip", search.skip);
        self.post(
            Endpoint::project(project, repo_path(repo, "commitsbatch")).params(params),
            search.body(),
        )
        .await
    }

    pub async fn get_commit(
        &self,
        project: &str,
        repo: &str,
        commit_id: &str,
    ) -> Result<Value, ApiError> {
        let path = repo_path(repo, &format!("commits/{}", seg(commit_id)));
        self.get(Endpoint::project(project, path)).await
    }

    pub async fn get_commit_changes(
        &self,
        project: &str,
        repo: &str,
        commit_id: &str,
        top: Option<u32>,
        skip: Option<u32>,
    ) -> Result<Value, ApiError> {
        let path = repo_path(repo, &format!("commits/{}/changes", seg(commit_id)));
        let params = QueryParams::new().opt("$top", top).opt("$skip", skip);
        self.get(Endpoint::project(project, path).params(params))
            .await
    }

    /// List pull requests for one repository, or project-wide when `repo` is `None`.
    pub async fn list_pull_requests(
        &self,
        project: &str,
        repo: Option<&str>,
        query: &PullRequestQuery,
    ) -> Result<Vec<Value>, ApiError> {
        let params = QueryParams::new()
            .text("searchCriteria.status", query.status.as_deref())
            .text(
                "searchCriteria.sourceRefName",
                query.source_branch.as_deref(),
            )
            .text(
                "searchCriteria.targetRefName",
                query.target_branch.as_deref(),
            )
            .text("searchCriteria.creatorId", query.creator_id.as_deref())
            .text("searchCriteria.reviewerId", query.reviewer_id.as_deref())
            .opt("$top", query.top)
            .opt("$skip", query.skip);

        let path = match repo.filter(|r| !r.is_empty()) {
            Some(repo) => repo_path(repo, "pullrequests"),
            None => "_apis/git/pullrequests".to_string(),
        };
        self.get_all(Endpoint::project(project, path).params(params))
            .await
    }

    /// Fetch a pull request; linked work items land in `workItemRefs` on request.
    pub async fn get_pull_request(
        &self,
        project: &str,
        repo: &str,
        pr_id: u32,
        include_work_items: bool,
    ) -> Result<Value, ApiError> {
        let mut pr = self
            .get(Endpoint::project(project, pr_path(repo, pr_id, "")))
            .await?;

        if include_work_items {
            let refs = self
                .get(Endpoint::project(project, pr_path(repo, pr_id, "workitems")))
                .await?;
            if let Value::Object(map) = &mut pr {
                map.insert("workItemRefs".to_string(), unwrap_list(refs, "value"));
            }
        }
        Ok(pr)
    }

    pub async fn get_pull_request_iterations(
        &self,
        project: &str,
        repo: &str,
        pr_id: u32,
    ) -> Result<Value, ApiError> {
        let data = self
            .get(Endpoint::project(project, pr_path(repo, pr_id, "iterations")))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    /// Changes of a pull request iteration.
    ///
    /// Without an explicit iteration the latest one is used, or 1 when the PR
    /// reports no iterations.
    pub async fn get_pull_request_changes(
        &self,
        project: &str,
        repo: &str,
        pr_id: u32,
        iteration: Option<u32>,
        top: Option<u32>,
        skip: Option<u32>,
    ) -> Result<Value, ApiError> {
        let iteration = match iteration {
            Some(id) => id,
            None => {
                let iterations = self
                    .get_pull_request_iterations(project, repo, pr_id)
                    .await?;
                iterations
                    .as_array()
                    .and_then(|list| list.last())
                    .and_then(|last| last.get("id"))
                    .and_then(Value::as_u64)
                    .and_then(|id| u32::try_from(id).ok())
                    .unwrap_or(1)
            }
        };

        let params = QueryParams::new().opt("$top", top).opt("$skip", skip);
        let path = pr_path(repo, pr_id, &format!("iterations/{iteration}/changes"));
        let data = self
            .get(Endpoint::project(project, path).params(params))
            .await?;

        Ok(match data {
            Value::Object(mut map) => map
                .remove("changeEntries")
                .or_else(|| map.remove("value"))
                .unwrap_or_else(|| Value::Array(Vec::new())),
            other => other,
        })
    }

    pub async fn list_pr_threads(
        &self,
        project: &str,
        repo: &str,
        pr_id: u32,
        iteration: Option<u32>,
        top: Option<u32>,
        skip: Option<u32>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .opt("$iteration", iteration)
            .opt("$top", top)
            .opt("$skip", skip);
        let data = self
            .get(Endpoint::project(project, pr_path(repo, pr_id, "threads")).params(params))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn list_pr_thread_comments(
        &self,
        project: &str,
        repo: &str,
        pr_id: u32,
        thread_id: u32,
    ) -> Result<Value, ApiError> {
        let path = pr_path(repo, pr_id, &format!("threads/{thread_id}/comments"));
        let data = self.get(Endpoint::project(project, path)).await?;
        Ok(unwrap_list(data, "value"))
    }

    /// Raw file content at an optional branch or commit.
    pub async fn get_file_content(
        &self,
        project: &str,
        repo: &str,
        path: &str,
        version: Option<&GitVersion>,
    ) -> Result<String, ApiError> {
        let mut params = QueryParams::new().push("path", path);
        if let Some(version) = version {
            params = version.apply(params);
        }
        self.get_text(Endpoint::project(project, repo_path(repo, "items")).params(params))
            .await
    }

    pub async fn list_items(
        &self,
        project: &str,
        repo: &str,
        path: &str,
        branch: Option<&str>,
        recursion: &str,
    ) -> Result<Value, ApiError> {
        let mut params = QueryParams::new()
            .push("scopePath", path)
            .push("recursionLevel", recursion);
        if let Some(version) = GitVersion::from_options(branch, None) {
            params = version.apply(params);
        }
        self.get(Endpoint::project(project, repo_path(repo, "items")).params(params))
            .await
    }

    pub async fn get_diff(
        &self,
        project: &str,
        repo: &str,
        query: &DiffQuery,
    ) -> Result<Value, ApiError> {
        let mut params = QueryParams::new();
        if let Some(base) = query.base.as_deref().filter(|b| !b.is_empty()) {
            params = params
                .push("baseVersionDescriptor.version", short_branch(base))
                .push("baseVersionDescriptor.versionType", &query.base_type);
        }
        if let Some(target) = query.target.as_deref().filter(|t| !t.is_empty()) {
            params = params
                .push("targetVersionDescriptor.version", short_branch(target))
                .push("targetVersionDescriptor.versionType", &query.target_type);
        }
        self.get(Endpoint::project(project, repo_path(repo, "diffs/commits")).params(params))
            .await
    }
}
