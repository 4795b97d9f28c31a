//! Command line definition.
//!
//! `ado [global flags] <category> <command> [flags]`. Global flags may appear
//! anywhere on the line.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::core::ProjectQuery;
use crate::api::pipelines::{BuildQuery, DefinitionQuery};
use crate::api::repos::{CommitSearch, DiffQuery, PullRequestQuery};
use crate::api::search::{CodeSearch, WikiSearch, WorkItemSearch};
use crate::api::security::AlertQuery;
use crate::api::work_items::MyWorkItemsQuery;

/// Parse a boolean option value: `true`, `1` and `yes` (any case) are true,
/// everything else is false.
pub fn parse_bool_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}

/// Comma-separated integer ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdList(pub Vec<u32>);

pub fn parse_id_list(value: &str) -> Result<IdList, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(|e| format!("invalid id '{s}': {e}")))
        .collect::<Result<Vec<_>, _>>()
        .and_then(|ids| {
            if ids.is_empty() {
                Err("at least one id is required".to_string())
            } else {
                Ok(IdList(ids))
            }
        })
}

/// Comma-separated values, trimmed, empties dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvList(pub Vec<String>);

pub fn parse_csv_list(value: &str) -> Result<CsvList, String> {
    Ok(CsvList(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

#[derive(Parser, Debug)]
#[command(
    name = "ado",
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Read-only Azure DevOps query tool",
    long_about = "Query Azure DevOps projects, repositories, pull requests, work items,\n\
        pipelines, wikis, search, test plans, iterations and security alerts.\n\
        Every command prints JSON.\n\n\
        Configuration can be provided via CLI arguments, environment variables (ADO_*),\n\
        config file (~/.config/ado-cli/config.toml), or auto-detected from the git remote.",
    after_help = "EXAMPLES:\n    \
        ado --org myorg core list-projects\n    \
        ado --org myorg repos list-prs --project Web --repo app --status active\n    \
        ado --org myorg -o pr.json repos pr-summary --project Web --repo app --pr-id 42\n    \
        ado --org myorg wit mine --project Web --type Bug\n    \
        ado --create-config"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Category>,
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Organization name or URL (e.g. 'myorg' or 'https://dev.azure.com/myorg')
    #[arg(long, global = true, help_heading = "Connection")]
    pub org: Option<String>,

    /// Personal access token (otherwise the Azure CLI login is used)
    #[arg(long, global = true, help_heading = "Connection")]
    pub pat: Option<String>,

    /// REST api-version parameter [default: 7.2-preview]
    #[arg(long, global = true, help_heading = "Connection")]
    pub api_version: Option<String>,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long, global = true, help_heading = "Output")]
    pub output_file: Option<PathBuf>,

    /// Request timeout in seconds [default: 60]
    #[arg(long, global = true, help_heading = "Performance Tuning")]
    pub timeout: Option<u64>,

    /// Retries for throttled, failed or timed out requests [default: 2]
    #[arg(long, global = true, help_heading = "Performance Tuning")]
    pub max_retries: Option<u32>,

    /// Maximum pages fetched by paged list commands [default: 20]
    #[arg(long, global = true, help_heading = "Performance Tuning")]
    pub max_pages: Option<usize>,

    /// Parallel file downloads [default: 4]
    #[arg(long, global = true, help_heading = "Performance Tuning")]
    pub concurrency: Option<usize>,

    /// trace, debug, info, warn, error or off [default: warn]
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_file: Option<PathBuf>,

    /// text or json [default: text]
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_format: Option<String>,

    /// Create a sample configuration file at ~/.config/ado-cli/config.toml
    #[arg(long)]
    pub create_config: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    #[arg(long)]
    pub project: String,
    /// Repository name or id
    #[arg(long)]
    pub repo: String,
}

#[derive(Args, Debug, Clone)]
pub struct PrArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
    #[arg(long)]
    pub pr_id: u32,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Paging {
    #[arg(long)]
    pub top: Option<u32>,
    #[arg(long)]
    pub skip: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Category {
    /// Projects, teams, identities
    Core {
        #[command(subcommand)]
        command: CoreCommand,
    },
    /// Repositories, branches, PRs, files
    Repos {
        #[command(subcommand)]
        command: ReposCommand,
    },
    /// Work items, queries, backlogs
    Wit {
        #[command(subcommand)]
        command: WitCommand,
    },
    /// Builds, logs, definitions, runs
    Pipelines {
        #[command(subcommand)]
        command: PipelinesCommand,
    },
    /// Wikis, pages, content
    Wiki {
        #[command(subcommand)]
        command: WikiCommand,
    },
    /// Code, wiki, work item search
    Search {
        #[command(subcommand)]
        command: SearchCommand,
    },
    /// Test plans, suites, cases, results
    Test {
        #[command(subcommand)]
        command: TestCommand,
    },
    /// Iterations, capacity
    Work {
        #[command(subcommand)]
        command: WorkCommand,
    },
    /// Advanced Security alerts
    Security {
        #[command(subcommand)]
        command: SecurityCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum CoreCommand {
    ListProjects(ProjectQuery),
    ListTeams {
        #[arg(long)]
        project: String,
        #[command(flatten)]
        paging: Paging,
        /// Only teams the caller belongs to (true/false)
        #[arg(long, value_parser = parse_bool_flag)]
        mine: Option<bool>,
    },
    GetIdentity {
        /// Display name or email
        #[arg(long)]
        search_filter: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReposCommand {
    List {
        #[arg(long)]
        project: String,
        #[arg(long)]
        top: Option<u32>,
        #[arg(long)]
        name_filter: Option<String>,
    },
    Get {
        #[command(flatten)]
        repo: RepoArgs,
    },
    ListBranches {
        #[command(flatten)]
        repo: RepoArgs,
        /// Substring the branch name must contain
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        top: Option<u32>,
    },
    GetBranch {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        branch: String,
    },
    SearchCommits {
        #[command(flatten)]
        repo: RepoArgs,
        #[command(flatten)]
        search: CommitSearch,
    },
    GetCommit {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        commit_id: String,
    },
    GetCommitChanges {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        commit_id: String,
        #[command(flatten)]
        paging: Paging,
    },
    ListPrs {
        #[arg(long)]
        project: String,
        /// Repository; omit to list PRs across the project
        #[arg(long)]
        repo: Option<String>,
        #[command(flatten)]
        query: PullRequestQuery,
    },
    GetPr {
        #[command(flatten)]
        pr: PrArgs,
        /// Attach linked work items (true/false)
        #[arg(long, value_parser = parse_bool_flag)]
        include_work_items: Option<bool>,
    },
    GetPrChanges {
        #[command(flatten)]
        pr: PrArgs,
        /// Iteration id [default: latest]
        #[arg(long)]
        iteration: Option<u32>,
        #[command(flatten)]
        paging: Paging,
    },
    GetPrIterations {
        #[command(flatten)]
        pr: PrArgs,
    },
    ListPrThreads {
        #[command(flatten)]
        pr: PrArgs,
        #[arg(long)]
        iteration: Option<u32>,
        #[command(flatten)]
        paging: Paging,
    },
    ListPrThreadComments {
        #[command(flatten)]
        pr: PrArgs,
        #[arg(long)]
        thread_id: u32,
    },
    GetFile {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        path: String,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        commit: Option<String>,
    },
    BulkDownload {
        #[command(flatten)]
        repo: RepoArgs,
        /// Comma-separated repo paths (e.g. /src/A.cs,/src/B.cs)
        #[arg(long, value_parser = parse_csv_list)]
        paths: CsvList,
        /// Local directory to write files into
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        commit: Option<String>,
        /// Number of retries per file
        #[arg(long, default_value_t = 2)]
        retries: u32,
    },
    ListItems {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long, default_value = "/")]
        path: String,
        #[arg(long)]
        branch: Option<String>,
        /// none, oneLevel, oneLevelPlusNestedEmptyFolders or full
        #[arg(long, default_value = "oneLevel")]
        recursion: String,
    },
    Diff {
        #[command(flatten)]
        repo: RepoArgs,
        #[command(flatten)]
        query: DiffQuery,
    },
    /// Structured PR overview for code review (metadata + files + threads)
    PrSummary {
        #[command(flatten)]
        pr: PrArgs,
    },
    /// Download all changed files (source + target versions) for a PR
    PrDownload {
        #[command(flatten)]
        pr: PrArgs,
        /// Base directory; files go into source/ and target/ subdirs
        #[arg(long)]
        output_dir: PathBuf,
        /// Number of retries per file
        #[arg(long, default_value_t = 2)]
        retries: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum WitCommand {
    Get {
        #[arg(long)]
        project: String,
        #[arg(long)]
        id: u32,
        /// Comma-separated field reference names
        #[arg(long)]
        fields: Option<String>,
        /// none, relations, fields, links or all
        #[arg(long)]
        expand: Option<String>,
        #[arg(long)]
        as_of: Option<String>,
    },
    Batch {
        #[arg(long)]
        project: String,
        /// Comma-separated ids
        #[arg(long, value_parser = parse_id_list)]
        ids: IdList,
        /// Comma-separated field reference names
        #[arg(long, value_parser = parse_csv_list)]
        fields: Option<CsvList>,
    },
    Comments {
        #[arg(long)]
        project: String,
        #[arg(long)]
        id: u32,
        #[arg(long)]
        top: Option<u32>,
    },
    Revisions {
        #[arg(long)]
        project: String,
        #[arg(long)]
        id: u32,
        #[command(flatten)]
        paging: Paging,
        #[arg(long)]
        expand: Option<String>,
    },
    Type {
        #[arg(long)]
        project: String,
        #[arg(long)]
        type_name: String,
    },
    /// Work items assigned to you
    Mine {
        #[arg(long)]
        project: String,
        #[command(flatten)]
        query: MyWorkItemsQuery,
    },
    Wiql {
        #[arg(long)]
        project: String,
        #[arg(long)]
        query: String,
        #[arg(long)]
        top: Option<u32>,
        #[arg(long)]
        team: Option<String>,
    },
    GetQuery {
        #[arg(long)]
        project: String,
        /// Query id or path
        #[arg(long)]
        query_id: String,
        #[arg(long)]
        depth: Option<u32>,
        #[arg(long)]
        expand: Option<String>,
    },
    QueryResults {
        #[arg(long)]
        query_id: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        top: Option<u32>,
        #[arg(long)]
        team: Option<String>,
    },
    IterationItems {
        #[arg(long)]
        project: String,
        #[arg(long)]
        iteration_id: String,
        #[arg(long)]
        team: Option<String>,
    },
    Backlogs {
        #[arg(long)]
        project: String,
        #[arg(long)]
        team: String,
    },
    BacklogItems {
        #[arg(long)]
        project: String,
        #[arg(long)]
        team: String,
        #[arg(long)]
        backlog_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PipelinesCommand {
    Builds {
        #[arg(long)]
        project: String,
        #[command(flatten)]
        query: BuildQuery,
    },
    Build {
        #[arg(long)]
        project: String,
        #[arg(long)]
        build_id: u32,
    },
    BuildLog {
        #[arg(long)]
        project: String,
        #[arg(long)]
        build_id: u32,
    },
    BuildLogContent {
        #[arg(long)]
        project: String,
        #[arg(long)]
        build_id: u32,
        #[arg(long)]
        log_id: u32,
        #[arg(long)]
        start_line: Option<u32>,
        #[arg(long)]
        end_line: Option<u32>,
    },
    BuildChanges {
        #[arg(long)]
        project: String,
        #[arg(long)]
        build_id: u32,
        #[arg(long)]
        top: Option<u32>,
    },
    Definitions {
        #[arg(long)]
        project: String,
        #[command(flatten)]
        query: DefinitionQuery,
    },
    DefinitionRevisions {
        #[arg(long)]
        project: String,
        #[arg(long)]
        definition_id: u32,
    },
    Run {
        #[arg(long)]
        project: String,
        #[arg(long)]
        pipeline_id: u32,
        #[arg(long)]
        run_id: u32,
    },
    Runs {
        #[arg(long)]
        project: String,
        #[arg(long)]
        pipeline_id: u32,
    },
    Artifacts {
        #[arg(long)]
        project: String,
        #[arg(long)]
        build_id: u32,
    },
    Timeline {
        #[arg(long)]
        project: String,
        #[arg(long)]
        build_id: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum WikiCommand {
    List {
        #[arg(long)]
        project: Option<String>,
    },
    Get {
        #[arg(long)]
        wiki_id: String,
        #[arg(long)]
        project: Option<String>,
    },
    Pages {
        #[arg(long)]
        project: String,
        #[arg(long)]
        wiki_id: String,
        #[arg(long)]
        top: Option<u32>,
        #[arg(long)]
        continuation_token: Option<String>,
        #[arg(long)]
        page_views_for_days: Option<u32>,
    },
    Page {
        #[arg(long)]
        project: String,
        #[arg(long)]
        wiki_id: String,
        #[arg(long)]
        path: String,
        #[arg(long)]
        recursion: Option<String>,
    },
    Content {
        #[arg(long)]
        project: String,
        #[arg(long)]
        wiki_id: String,
        #[arg(long)]
        path: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SearchCommand {
    Code {
        #[arg(long)]
        text: String,
        #[command(flatten)]
        query: CodeSearch,
    },
    Wiki {
        #[arg(long)]
        text: String,
        #[command(flatten)]
        query: WikiSearch,
    },
    Workitems {
        #[arg(long)]
        text: String,
        #[command(flatten)]
        query: WorkItemSearch,
    },
}

#[derive(Subcommand, Debug)]
pub enum TestCommand {
    Plans {
        #[arg(long)]
        project: String,
        /// Only active plans (true/false)
        #[arg(long, value_parser = parse_bool_flag)]
        active: Option<bool>,
        /// Include plan details (true/false)
        #[arg(long, value_parser = parse_bool_flag)]
        include_details: Option<bool>,
        #[arg(long)]
        continuation_token: Option<String>,
    },
    Suites {
        #[arg(long)]
        project: String,
        #[arg(long)]
        plan_id: u32,
        #[arg(long)]
        continuation_token: Option<String>,
    },
    Cases {
        #[arg(long)]
        project: String,
        #[arg(long)]
        plan_id: u32,
        #[arg(long)]
        suite_id: u32,
    },
    Results {
        #[arg(long)]
        project: String,
        #[arg(long)]
        build_id: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkCommand {
    Iterations {
        #[arg(long)]
        project: String,
        #[arg(long)]
        depth: Option<u32>,
    },
    TeamIterations {
        #[arg(long)]
        project: String,
        #[arg(long)]
        team: String,
        /// e.g. current
        #[arg(long)]
        timeframe: Option<String>,
    },
    IterationCapacity {
        #[arg(long)]
        project: String,
        #[arg(long)]
        iteration_id: String,
    },
    TeamCapacity {
        #[arg(long)]
        project: String,
        #[arg(long)]
        team: String,
        #[arg(long)]
        iteration_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SecurityCommand {
    Alerts {
        #[arg(long)]
        project: String,
        #[arg(long)]
        repository: String,
        #[command(flatten)]
        query: AlertQuery,
    },
    AlertDetail {
        #[arg(long)]
        project: String,
        #[arg(long)]
        repository: String,
        #[arg(long)]
        alert_id: u32,
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Boolean Option Values
    ///
    /// Tests the accepted spellings of true.
    ///
    /// ## Test Scenario
    /// - Parses true/1/yes in mixed case and other values
    ///
    /// ## Expected Outcome
    /// - Only true, 1 and yes are true
    #[test]
    fn test_parse_bool_flag() {
        for v in ["true", "TRUE", "1", "Yes"] {
            assert_eq!(parse_bool_flag(v), Ok(true), "{v}");
        }
        for v in ["false", "0", "no", "on", ""] {
            assert_eq!(parse_bool_flag(v), Ok(false), "{v}");
        }
    }

    /// # List Parsers
    ///
    /// Tests id and comma list parsing.
    ///
    /// ## Test Scenario
    /// - Ids with whitespace, a bad id, paths with empties
    ///
    /// ## Expected Outcome
    /// - Whitespace tolerated, bad ids rejected, empties dropped
    #[test]
    fn test_list_parsers() {
        assert_eq!(parse_id_list("1, 2 ,3"), Ok(IdList(vec![1, 2, 3])));
        assert!(parse_id_list("1,x").is_err());
        assert!(parse_id_list(" , ").is_err());
        assert_eq!(
            parse_csv_list(" /a.cs, ,/b.cs ,"),
            Ok(CsvList(vec!["/a.cs".to_string(), "/b.cs".to_string()]))
        );
    }
}
