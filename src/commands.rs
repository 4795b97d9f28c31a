//! Command dispatch: resolve settings, call the client, emit the result.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::api::AdoClient;
use crate::api::repos::GitVersion;
use crate::cli::{
    Category, Cli, CoreCommand, PipelinesCommand, ReposCommand, SearchCommand, SecurityCommand,
    TestCommand, WikiCommand, WitCommand, WorkCommand,
};
use crate::config::Config;
use crate::download::DownloadOptions;
use crate::output::OutputSink;

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Json(Value),
    /// Raw text: file content, log lines, wiki markdown.
    Text(String),
}

impl CommandOutput {
    fn json<T: Serialize>(data: T) -> Result<Self> {
        Ok(Self::Json(
            serde_json::to_value(data).context("Failed to serialize command output")?,
        ))
    }

    pub fn emit(&self, sink: &OutputSink) -> Result<()> {
        match self {
            CommandOutput::Json(value) => sink.json(value),
            CommandOutput::Text(text) => sink.text(text),
        }
    }
}

/// Outcome of `--create-config`.
pub fn create_config() -> Result<PathBuf> {
    let path = Config::create_sample_config()?;
    println!("Configuration file: {}", path.display());
    Ok(path)
}

/// Run a parsed command line to completion.
pub async fn run(cli: Cli) -> Result<()> {
    if cli.global.create_config {
        create_config()?;
        return Ok(());
    }

    let Some(category) = cli.command else {
        anyhow::bail!("No command given; run `ado --help` for usage");
    };

    let settings = Config::load(&cli.global)?;
    let client = AdoClient::from_settings(&settings).context("Failed to create API client")?;
    let sink = OutputSink::new(cli.global.output_file.clone());

    let download = DownloadOptions {
        concurrency: settings.download_concurrency,
        ..DownloadOptions::default()
    };

    tracing::info!(organization = %settings.organization, "running command");
    let output = dispatch(&client, category, &download).await?;
    output.emit(&sink)
}

/// Execute one command against `client`.
pub async fn dispatch(
    client: &AdoClient,
    category: Category,
    download: &DownloadOptions,
) -> Result<CommandOutput> {
    match category {
        Category::Core { command } => core(client, command).await,
        Category::Repos { command } => repos(client, command, download).await,
        Category::Wit { command } => wit(client, command).await,
        Category::Pipelines { command } => pipelines(client, command).await,
        Category::Wiki { command } => wiki(client, command).await,
        Category::Search { command } => search(client, command).await,
        Category::Test { command } => test(client, command).await,
        Category::Work { command } => work(client, command).await,
        Category::Security { command } => security(client, command).await,
    }
}

async fn core(client: &AdoClient, command: CoreCommand) -> Result<CommandOutput> {
    let value = match command {
        CoreCommand::ListProjects(query) => Value::from(client.list_projects(&query).await?),
        CoreCommand::ListTeams {
            project,
            paging,
            mine,
        } => Value::from(
            client
                .list_project_teams(&project, paging.top, paging.skip, mine)
                .await?,
        ),
        CoreCommand::GetIdentity { search_filter } => {
            client.get_identity_ids(&search_filter).await?
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn repos(
    client: &AdoClient,
    command: ReposCommand,
    download: &DownloadOptions,
) -> Result<CommandOutput> {
    let value = match command {
        ReposCommand::List {
            project,
            top,
            name_filter,
        } => Value::from(
            client
                .list_repos(&project, top, name_filter.as_deref())
                .await?,
        ),
        ReposCommand::Get { repo } => client.get_repo(&repo.project, &repo.repo).await?,
        ReposCommand::ListBranches { repo, filter, top } => {
            client
                .list_branches(&repo.project, &repo.repo, filter.as_deref(), top)
                .await?
        }
        ReposCommand::GetBranch { repo, branch } => {
            client.get_branch(&repo.project, &repo.repo, &branch).await?
        }
        ReposCommand::SearchCommits { repo, search } => {
            client
                .search_commits(&repo.project, &repo.repo, &search)
                .await?
        }
        ReposCommand::GetCommit { repo, commit_id } => {
            client
                .get_commit(&repo.project, &repo.repo, &commit_id)
                .await?
        }
        ReposCommand::GetCommitChanges {
            repo,
            commit_id,
            paging,
        } => {
            client
                .get_commit_changes(
                    &repo.project,
                    &repo.repo,
                    &commit_id,
                    paging.top,
                    paging.skip,
                )
                .await?
        }
        ReposCommand::ListPrs {
            project,
            repo,
            query,
        } => Value::from(
            client
                .list_pull_requests(&project, repo.as_deref(), &query)
                .await?,
        ),
        ReposCommand::GetPr {
            pr,
            include_work_items,
        } => {
            client
                .get_pull_request(
                    &pr.repo.project,
                    &pr.repo.repo,
                    pr.pr_id,
                    include_work_items.unwrap_or(false),
                )
                .await?
        }
        ReposCommand::GetPrChanges {
            pr,
            iteration,
            paging,
        } => {
            client
                .get_pull_request_changes(
                    &pr.repo.project,
                    &pr.repo.repo,
                    pr.pr_id,
                    iteration,
                    paging.top,
                    paging.skip,
                )
                .await?
        }
        ReposCommand::GetPrIterations { pr } => {
            client
                .get_pull_request_iterations(&pr.repo.project, &pr.repo.repo, pr.pr_id)
                .await?
        }
        ReposCommand::ListPrThreads {
            pr,
            iteration,
            paging,
        } => {
            client
                .list_pr_threads(
                    &pr.repo.project,
                    &pr.repo.repo,
                    pr.pr_id,
                    iteration,
                    paging.top,
                    paging.skip,
                )
                .await?
        }
        ReposCommand::ListPrThreadComments { pr, thread_id } => {
            client
                .list_pr_thread_comments(&pr.repo.project, &pr.repo.repo, pr.pr_id, thread_id)
                .await?
        }
        ReposCommand::GetFile {
            repo,
            path,
            branch,
            commit,
        } => {
            let version = GitVersion::from_options(branch.as_deref(), commit.as_deref());
            let content = client
                .get_file_content(&repo.project, &repo.repo, &path, version.as_ref())
                .await?;
            return Ok(CommandOutput::Text(content));
        }
        ReposCommand::BulkDownload {
            repo,
            paths,
            output_dir,
            branch,
            commit,
            retries,
        } => {
            let version = GitVersion::from_options(branch.as_deref(), commit.as_deref());
            let options = DownloadOptions {
                retries,
                ..download.clone()
            };
            let results = client
                .bulk_download_files(
                    &repo.project,
                    &repo.repo,
                    &paths.0,
                    &output_dir,
                    version.as_ref(),
                    &options,
                )
                .await;
            return CommandOutput::json(results);
        }
        ReposCommand::ListItems {
            repo,
            path,
            branch,
            recursion,
        } => {
            client
                .list_items(
                    &repo.project,
                    &repo.repo,
                    &path,
                    branch.as_deref(),
                    &recursion,
                )
                .await?
        }
        ReposCommand::Diff { repo, query } => {
            client.get_diff(&repo.project, &repo.repo, &query).await?
        }
        ReposCommand::PrSummary { pr } => {
            let summary = client
                .pr_summary(&pr.repo.project, &pr.repo.repo, pr.pr_id)
                .await?;
            return CommandOutput::json(summary);
        }
        ReposCommand::PrDownload {
            pr,
            output_dir,
            retries,
        } => {
            let options = DownloadOptions {
                retries,
                ..download.clone()
            };
            let result = client
                .pr_download(
                    &pr.repo.project,
                    &pr.repo.repo,
                    pr.pr_id,
                    &output_dir,
                    &options,
                )
                .await?;
            return CommandOutput::json(result);
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn wit(client: &AdoClient, command: WitCommand) -> Result<CommandOutput> {
    let value = match command {
        WitCommand::Get {
            project,
            id,
            fields,
            expand,
            as_of,
        } => {
            client
                .get_work_item(
                    &project,
                    id,
                    fields.as_deref(),
                    expand.as_deref(),
                    as_of.as_deref(),
                )
                .await?
        }
        WitCommand::Batch {
            project,
            ids,
            fields,
        } => Value::from(
            client
                .get_work_items_batch(&project, &ids.0, fields.as_ref().map(|f| f.0.as_slice()))
                .await?,
        ),
        WitCommand::Comments { project, id, top } => {
            client.list_work_item_comments(&project, id, top).await?
        }
        WitCommand::Revisions {
            project,
            id,
            paging,
            expand,
        } => {
            client
                .list_revisions(&project, id, paging.top, paging.skip, expand.as_deref())
                .await?
        }
        WitCommand::Type { project, type_name } => {
            client.get_work_item_type(&project, &type_name).await?
        }
        WitCommand::Mine { project, query } => {
            Value::from(client.my_work_items(&project, &query).await?)
        }
        WitCommand::Wiql {
            project,
            query,
            top,
            team,
        } => {
            client
                .run_wiql(&project, &query, top, team.as_deref())
                .await?
        }
        WitCommand::GetQuery {
            project,
            query_id,
            depth,
            expand,
        } => {
            client
                .get_query(&project, &query_id, depth, expand.as_deref())
                .await?
        }
        WitCommand::QueryResults {
            query_id,
            project,
            top,
            team,
        } => {
            client
                .get_query_results(&query_id, project.as_deref(), top, team.as_deref())
                .await?
        }
        WitCommand::IterationItems {
            project,
            iteration_id,
            team,
        } => {
            client
                .get_work_items_for_iteration(&project, &iteration_id, team.as_deref())
                .await?
        }
        WitCommand::Backlogs { project, team } => client.list_backlogs(&project, &team).await?,
        WitCommand::BacklogItems {
            project,
            team,
            backlog_id,
        } => {
            client
                .list_backlog_work_items(&project, &team, &backlog_id)
                .await?
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn pipelines(client: &AdoClient, command: PipelinesCommand) -> Result<CommandOutput> {
    let value = match command {
        PipelinesCommand::Builds { project, query } => {
            Value::from(client.get_builds(&project, &query).await?)
        }
        PipelinesCommand::Build { project, build_id } => {
            client.get_build(&project, build_id).await?
        }
        PipelinesCommand::BuildLog { project, build_id } => {
            client.get_build_log(&project, build_id).await?
        }
        PipelinesCommand::BuildLogContent {
            project,
            build_id,
            log_id,
            start_line,
            end_line,
        } => {
            let log = client
                .get_build_log_by_id(&project, build_id, log_id, start_line, end_line)
                .await?;
            return Ok(CommandOutput::Text(log));
        }
        PipelinesCommand::BuildChanges {
            project,
            build_id,
            top,
        } => client.get_build_changes(&project, build_id, top).await?,
        PipelinesCommand::Definitions { project, query } => {
            Value::from(client.get_build_definitions(&project, &query).await?)
        }
        PipelinesCommand::DefinitionRevisions {
            project,
            definition_id,
        } => {
            client
                .get_build_definition_revisions(&project, definition_id)
                .await?
        }
        PipelinesCommand::Run {
            project,
            pipeline_id,
            run_id,
        } => client.get_pipeline_run(&project, pipeline_id, run_id).await?,
        PipelinesCommand::Runs {
            project,
            pipeline_id,
        } => client.list_pipeline_runs(&project, pipeline_id).await?,
        PipelinesCommand::Artifacts { project, build_id } => {
            client.list_artifacts(&project, build_id).await?
        }
        PipelinesCommand::Timeline { project, build_id } => {
            client.get_build_timeline(&project, build_id).await?
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn wiki(client: &AdoClient, command: WikiCommand) -> Result<CommandOutput> {
    let value = match command {
        WikiCommand::List { project } => client.list_wikis(project.as_deref()).await?,
        WikiCommand::Get { wiki_id, project } => {
            client.get_wiki(&wiki_id, project.as_deref()).await?
        }
        WikiCommand::Pages {
            project,
            wiki_id,
            top,
            continuation_token,
            page_views_for_days,
        } => {
            client
                .list_wiki_pages(
                    &project,
                    &wiki_id,
                    top,
                    continuation_token.as_deref(),
                    page_views_for_days,
                )
                .await?
        }
        WikiCommand::Page {
            project,
            wiki_id,
            path,
            recursion,
        } => {
            client
                .get_wiki_page(&project, &wiki_id, &path, recursion.as_deref())
                .await?
        }
        WikiCommand::Content {
            project,
            wiki_id,
            path,
        } => {
            let content = client
                .get_wiki_page_content(&project, &wiki_id, &path)
                .await?;
            return Ok(CommandOutput::Text(content));
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn search(client: &AdoClient, command: SearchCommand) -> Result<CommandOutput> {
    let value = match command {
        SearchCommand::Code { text, query } => client.search_code(&text, &query).await?,
        SearchCommand::Wiki { text, query } => client.search_wiki(&text, &query).await?,
        SearchCommand::Workitems { text, query } => {
            client.search_work_items(&text, &query).await?
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn test(client: &AdoClient, command: TestCommand) -> Result<CommandOutput> {
    let value = match command {
        TestCommand::Plans {
            project,
            active,
            include_details,
            continuation_token,
        } => {
            client
                .list_test_plans(
                    &project,
                    active,
                    include_details,
                    continuation_token.as_deref(),
                )
                .await?
        }
        TestCommand::Suites {
            project,
            plan_id,
            continuation_token,
        } => {
            client
                .list_test_suites(&project, plan_id, continuation_token.as_deref())
                .await?
        }
        TestCommand::Cases {
            project,
            plan_id,
            suite_id,
        } => client.list_test_cases(&project, plan_id, suite_id).await?,
        TestCommand::Results { project, build_id } => {
            Value::from(client.get_test_results_by_build(&project, build_id).await?)
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn work(client: &AdoClient, command: WorkCommand) -> Result<CommandOutput> {
    let value = match command {
        WorkCommand::Iterations { project, depth } => {
            client.list_iterations(&project, depth).await?
        }
        WorkCommand::TeamIterations {
            project,
            team,
            timeframe,
        } => {
            client
                .list_team_iterations(&project, &team, timeframe.as_deref())
                .await?
        }
        WorkCommand::IterationCapacity {
            project,
            iteration_id,
        } => client.get_iteration_capacities(&project, &iteration_id).await?,
        WorkCommand::TeamCapacity {
            project,
            team,
            iteration_id,
        } => {
            client
                .get_team_capacity(&project, &team, &iteration_id)
                .await?
        }
    };
    Ok(CommandOutput::Json(value))
}

async fn security(client: &AdoClient, command: SecurityCommand) -> Result<CommandOutput> {
    let value = match command {
        SecurityCommand::Alerts {
            project,
            repository,
            query,
        } => client.get_alerts(&project, &repository, &query).await?,
        SecurityCommand::AlertDetail {
            project,
            repository,
            alert_id,
            git_ref,
        } => {
            client
                .get_alert_details(&project, &repository, alert_id, git_ref.as_deref())
                .await?
        }
    };
    Ok(CommandOutput::Json(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_client;
    use crate::cli::Cli;
    use clap::Parser;
    use serde_json::json;

    fn parse(args: &[&str]) -> Category {
        let cli = Cli::try_parse_from(std::iter::once("ado").chain(args.iter().copied())).unwrap();
        cli.command.unwrap()
    }

    /// # JSON Dispatch
    ///
    /// Tests that a parsed command reaches the matching client call.
    ///
    /// ## Test Scenario
    /// - Dispatches `repos list-prs` with a status filter
    ///
    /// ## Expected Outcome
    /// - The PR list is returned as a JSON array, status is sent
    #[tokio::test]
    async fn test_dispatch_json_command() {
        let (client, transport) = mock_client("contoso");
        transport.push_json(json!({"value": [{"pullRequestId": 7}]}));

        let category = parse(&[
            "repos", "list-prs", "--project", "Web", "--repo", "app", "--status", "active",
        ]);
        let output = dispatch(&client, category, &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(
            output,
            CommandOutput::Json(json!([{"pullRequestId": 7}]))
        );
        assert_eq!(
            transport.request(0).query_value("searchCriteria.status"),
            Some("active")
        );
    }

    /// # Text Dispatch
    ///
    /// Tests that file content is passed through as text.
    ///
    /// ## Test Scenario
    /// - Dispatches `repos get-file` on a branch
    ///
    /// ## Expected Outcome
    /// - Output is the raw body, not JSON
    #[tokio::test]
    async fn test_dispatch_text_command() {
        let (client, transport) = mock_client("contoso");
        transport.push_text("fn main() {}");

        let category = parse(&[
            "repos", "get-file", "--project", "Web", "--repo", "app", "--path", "/src/main.rs",
            "--branch", "main",
        ]);
        let output = dispatch(&client, category, &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(output, CommandOutput::Text("fn main() {}".to_string()));
    }

    /// # Service Errors Propagate
    ///
    /// Tests that an API failure becomes a command error.
    ///
    /// ## Test Scenario
    /// - The service answers 404 for a build
    ///
    /// ## Expected Outcome
    /// - Dispatch fails with the not-found message
    #[tokio::test]
    async fn test_dispatch_error() {
        let (client, transport) = mock_client("contoso");
        transport.push_status(404, json!({"message": "missing"}));

        let category = parse(&["pipelines", "build", "--project", "Web", "--build-id", "9"]);
        let error = dispatch(&client, category, &DownloadOptions::default())
            .await
            .unwrap_err();

        assert!(error.to_string().starts_with("Resource not found"));
    }
}
