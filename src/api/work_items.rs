//! Work items, WIQL queries and backlogs.

use clap::Args;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::client::{AdoClient, Endpoint, seg, unwrap_list};
use super::params::QueryParams;
use crate::error::ApiError;

/// Largest id list `workitemsbatch` accepts in one call.
pub const BATCH_LIMIT: usize = 200;

const DEFAULT_MY_TOP: u32 = 50;

/// Filters for the assigned-to-me query.
#[derive(Debug, Clone, Default, Args)]
pub struct MyWorkItemsQuery {
    /// Work item type, e.g. Bug or "User Story"
    #[arg(long = "type")]
    pub work_item_type: Option<String>,
    /// Maximum number of items (default 50)
    #[arg(long)]
    pub top: Option<u32>,
    /// Include Closed, Done and Removed items (true/false)
    #[arg(long, value_parser = crate::cli::parse_bool_flag)]
    pub include_completed: Option<bool>,
}

impl MyWorkItemsQuery {
    fn limit(&self) -> u32 {
        match self.top {
            Some(top) if top > 0 => top,
            _ => DEFAULT_MY_TOP,
        }
    }

    /// WIQL text selecting the caller's items.
    pub fn wiql(&self) -> String {
        let mut wiql =
            String::from("SELECT [System.Id] FROM WorkItems WHERE [System.AssignedTo] = @Me");
        if let Some(kind) = self.work_item_type.as_deref().filter(|t| !t.is_empty()) {
            wiql.push_str(&format!(
                " AND [System.WorkItemType] = '{}'",
                kind.replace('\'', "''")
            ));
        }
        if !self.include_completed.unwrap_or(false) {
            wiql.push_str(
                " AND [System.State] <> 'Closed' AND [System.State] <> 'Done' AND [System.State] <> 'Removed'",
            );
        }
        wiql.push_str(" ORDER BY [System.ChangedDate] DESC");
        wiql
    }
}

fn as_vec(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

impl AdoClient {
    pub async fn get_work_item(
        &self,
        project: &str,
        id: u32,
        fields: Option<&str>,
        expand: Option<&str>,
        as_of: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .text("fields", fields)
            .text("$expand", expand)
            .text("asOf", as_of);
        self.get(Endpoint::project(project, format!("_apis/wit/workitems/{id}")).params(params))
            .await
    }

    /// Fetch many work items, splitting the ids into service-sized chunks.
    pub async fn get_work_items_batch(
        &self,
        project: &str,
        ids: &[u32],
        fields: Option<&[String]>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_LIMIT) {
            let mut body = Map::new();
            body.insert("ids".to_string(), json!(chunk));
            if let Some(fields) = fields.filter(|f| !f.is_empty()) {
                body.insert("fields".to_string(), json!(fields));
            }
            debug!(count = chunk.len(), "fetching work item batch");
            let data = self
                .post(
                    Endpoint::project(project, "_apis/wit/workitemsbatch"),
                    Value::Object(body),
                )
                .await?;
            items.extend(as_vec(unwrap_list(data, "value")));
        }
        Ok(items)
    }

    pub async fn list_work_item_comments(
        &self,
        project: &str,
        id: u32,
        top: Option<u32>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().opt("$top", top);
        let path = format!("_apis/wit/workitems/{id}/comments");
        let data = self
            .get(Endpoint::project(project, path).params(params))
            .await?;
        Ok(unwrap_list(data, "comments"))
    }

    pub async fn list_revisions(
        &self,
        project: &str,
        id: u32,
        top: Option<u32>,
        skip: Option<u32>,
        expand: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .opt("$top", top)
            .opt("$skip", skip)
            .text("$expand", expand);
        let path = format!("_apis/wit/workitems/{id}/revisions");
        let data = self
            .get(Endpoint::project(project, path).params(params))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn get_work_item_type(
        &self,
        project: &str,
        type_name: &str,
    ) -> Result<Value, ApiError> {
        let path = format!("_apis/wit/workitemtypes/{}", seg(type_name));
        self.get(Endpoint::project(project, path)).await
    }

    /// Work items assigned to the authenticated user, newest change first.
    pub async fn my_work_items(
        &self,
        project: &str,
        query: &MyWorkItemsQuery,
    ) -> Result<Vec<Value>, ApiError> {
        let limit = query.limit();
        let result = self
            .post(
                Endpoint::project(project, "_apis/wit/wiql")
                    .params(QueryParams::new().push("$top", limit)),
                json!({ "query": query.wiql() }),
            )
            .await?;

        let ids: Vec<u32> = result
            .get("workItems")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("id").and_then(Value::as_u64))
            .filter_map(|id| u32::try_from(id).ok())
            .take(limit as usize)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_work_items_batch(project, &ids, None).await
    }

    pub async fn run_wiql(
        &self,
        project: &str,
        query: &str,
        top: Option<u32>,
        team: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().opt("$top", top).text("team", team);
        self.post(
            Endpoint::project(project, "_apis/wit/wiql").params(params),
            json!({ "query": query }),
        )
        .await
    }

    /// Saved query by id or folder path (`Shared Queries/My Query`).
    pub async fn get_query(
        &self,
        project: &str,
        id_or_path: &str,
        depth: Option<u32>,
        expand: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .opt("$depth", depth)
            .text("$expand", expand);
        let path = id_or_path
            .split('/')
            .map(seg)
            .collect::<Vec<_>>()
            .join("/");
        self.get(Endpoint::project(project, format!("_apis/wit/queries/{path}")).params(params))
            .await
    }

    pub async fn get_query_results(
        &self,
        query_id: &str,
        project: Option<&str>,
        top: Option<u32>,
        team: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().opt("$top", top).text("team", team);
        let path = format!("_apis/wit/wiql/{}", seg(query_id));
        self.post(
            Endpoint::maybe_project(project, path).params(params),
            json!({}),
        )
        .await
    }

    pub async fn get_work_items_for_iteration(
        &self,
        project: &str,
        iteration_id: &str,
        team: Option<&str>,
    ) -> Result<Value, ApiError> {
        let path = format!(
            "_apis/work/teamsettings/iterations/{}/workitems",
            seg(iteration_id)
        );
        self.get(Endpoint::team(project, team, path)).await
    }

    pub async fn list_backlogs(&self, project: &str, team: &str) -> Result<Value, ApiError> {
        let data = self
            .get(Endpoint::team(project, Some(team), "_apis/work/backlogs"))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn list_backlog_work_items(
        &self,
        project: &str,
        team: &str,
        backlog_id: &str,
    ) -> Result<Value, ApiError> {
        let path = format!("_apis/work/backlogs/{}/workItems", seg(backlog_id));
        self.get(Endpoint::team(project, Some(team), path)).await
    }
}
