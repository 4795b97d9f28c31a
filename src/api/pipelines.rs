//! Builds, build definitions and pipeline runs.

use clap::Args;
use serde_json::Value;

use super::client::{AdoClient, Endpoint, unwrap_list};
use super::params::QueryParams;
use crate::error::ApiError;

/// Filters for listing builds.
#[derive(Debug, Clone, Default, Args)]
pub struct BuildQuery {
    /// Comma-separated definition ids
    #[arg(long)]
    pub definitions: Option<String>,
    /// Branch, e.g. refs/heads/main
    #[arg(long = "branch")]
    pub branch_name: Option<String>,
    /// inProgress, completed, cancelling, postponed, notStarted or all
    #[arg(long = "status")]
    pub status_filter: Option<String>,
    /// succeeded, partiallySucceeded, failed or canceled
    #[arg(long = "result")]
    pub result_filter: Option<String>,
    #[arg(long)]
    pub requested_for: Option<String>,
    #[arg(long)]
    pub top: Option<u32>,
    #[arg(long)]
    pub max_time: Option<String>,
    #[arg(long)]
    pub min_time: Option<String>,
    #[arg(long)]
    pub repository_id: Option<String>,
    #[arg(long)]
    pub build_number: Option<String>,
    /// Comma-separated tags
    #[arg(long = "tags")]
    pub tag_filters: Option<String>,
    /// e.g. finishTimeDescending, queueTimeDescending
    #[arg(long)]
    pub query_order: Option<String>,
}

/// Filters for listing build definitions.
#[derive(Debug, Clone, Default, Args)]
pub struct DefinitionQuery {
    #[arg(long)]
    pub name: Option<String>,
    /// Folder path, e.g. \MyFolder
    #[arg(long)]
    pub path: Option<String>,
    #[arg(long)]
    pub top: Option<u32>,
    /// Include latest builds (true/false)
    #[arg(long = "include-latest", value_parser = crate::cli::parse_bool_flag)]
    pub include_latest_builds: Option<bool>,
    #[arg(long)]
    pub repository_id: Option<String>,
    /// e.g. TfsGit, GitHub
    #[arg(long)]
    pub repository_type: Option<String>,
    #[arg(long)]
    pub yaml_filename: Option<String>,
    #[arg(long)]
    pub query_order: Option<String>,
}

fn build_path(build_id: u32, rest: &str) -> String {
    if rest.is_empty() {
        format!("_apis/build/builds/{build_id}")
    } else {
        format!("_apis/build/builds/{build_id}/{rest}")
    }
}

impl AdoClient {
    pub async fn get_builds(
        &self,
        project: &str,
        query: &BuildQuery,
    ) -> Result<Vec<Value>, ApiError> {
        let params = QueryParams::new()
            .text("definitions", query.definitions.as_deref())
            .text("branchName", query.branch_name.as_deref())
            .text("statusFilter", query.status_filter.as_deref())
            .text("resultFilter", query.result_filter.as_deref())
            .text("requestedFor", query.requested_for.as_deref())
            .opt("$top", query.top)
            .text("maxTime", query.max_time.as_deref())
            .text("minTime", query.min_time.as_deref())
            .text("repositoryId", query.repository_id.as_deref())
            .text("buildNumber", query.build_number.as_deref())
            .text("tagFilters", query.tag_filters.as_deref())
            .text("queryOrder", query.query_order.as_deref());
        self.get_all(Endpoint::project(project, "_apis/build/builds").params(params))
            .await
    }

    pub async fn get_build(&self, project: &str, build_id: u32) -> Result<Value, ApiError> {
        self.get(Endpoint::project(project, build_path(build_id, "")))
            .await
    }

    /// Log files of a build.
    pub async fn get_build_log(&self, project: &str, build_id: u32) -> Result<Value, ApiError> {
        self.get(Endpoint::project(project, build_path(build_id, "logs")))
            .await
    }

    /// Content of one build log, optionally a line range.
    pub async fn get_build_log_by_id(
        &self,
        project: &str,
        build_id: u32,
        log_id: u32,
        start_line: Option<u32>,
        end_line: Option<u32>,
    ) -> Result<String, ApiError> {
        let params = QueryParams::new()
            .opt("startLine", start_line)
            .opt("endLine", end_line);
        let path = build_path(build_id, &format!("logs/{log_id}"));
        self.get_text(Endpoint::project(project, path).params(params))
            .await
    }

    pub async fn get_build_changes(
        &self,
        project: &str,
        build_id: u32,
        top: Option<u32>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().opt("$top", top);
        self.get(Endpoint::project(project, build_path(build_id, "changes")).params(params))
            .await
    }

    pub async fn get_build_definitions(
        &self,
        project: &str,
        query: &DefinitionQuery,
    ) -> Result<Vec<Value>, ApiError> {
        let params = QueryParams::new()
            .text("name", query.name.as_deref())
            .text("path", query.path.as_deref())
            .opt("$top", query.top)
            .flag("includeLatestBuilds", query.include_latest_builds)
            .text("repositoryId", query.repository_id.as_deref())
            .text("repositoryType", query.repository_type.as_deref())
            .text("yamlFilename", query.yaml_filename.as_deref())
            .text("queryOrder", query.query_order.as_deref());
        self.get_all(Endpoint::project(project, "_apis/build/definitions").params(params))
            .await
    }

    pub async fn get_build_definition_revisions(
        &self,
        project: &str,
        definition_id: u32,
    ) -> Result<Value, ApiError> {
        let path = format!("_apis/build/definitions/{definition_id}/revisions");
        self.get(Endpoint::project(project, path)).await
    }

    pub async fn get_pipeline_run(
        &self,
        project: &str,
        pipeline_id: u32,
        run_id: u32,
    ) -> Result<Value, ApiError> {
        let path = format!("_apis/pipelines/{pipeline_id}/runs/{run_id}");
        self.get(Endpoint::project(project, path)).await
    }

    pub async fn list_pipeline_runs(
        &self,
        project: &str,
        pipeline_id: u32,
    ) -> Result<Value, ApiError> {
        let path = format!("_apis/pipelines/{pipeline_id}/runs");
        let data = self.get(Endpoint::project(project, path)).await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn list_artifacts(&self, project: &str, build_id: u32) -> Result<Value, ApiError> {
        let data = self
            .get(Endpoint::project(project, build_path(build_id, "artifacts")))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    /// Stages, jobs and tasks of a build.
    pub async fn get_build_timeline(
        &self,
        project: &str,
        build_id: u32,
    ) -> Result<Value, ApiError> {
        self.get(Endpoint::project(project, build_path(build_id, "timeline")))
            .await
    }
}
