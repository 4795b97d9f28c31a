//! Code, wiki and work item search on the search host.

use clap::Args;
use serde_json::{Map, Value, json};

use super::client::{AdoClient, Area, Endpoint};
use crate::error::ApiError;

const DEFAULT_TOP: u32 = 25;

/// Paging shared by every search kind.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchPage {
    /// Results per page (default 25)
    #[arg(long)]
    pub top: Option<u32>,
    #[arg(long)]
    pub skip: Option<u32>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct CodeSearch {
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub repository: Option<String>,
    #[arg(long)]
    pub branch: Option<String>,
    /// Path prefix, e.g. /src
    #[arg(long)]
    pub path: Option<String>,
    #[command(flatten)]
    pub page: SearchPage,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WikiSearch {
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub wiki: Option<String>,
    #[command(flatten)]
    pub page: SearchPage,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WorkItemSearch {
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long = "type")]
    pub work_item_type: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub assigned_to: Option<String>,
    #[arg(long)]
    pub area_path: Option<String>,
    #[command(flatten)]
    pub page: SearchPage,
}

/// Build a search body; each filter value becomes a one-element list and
/// `filters` is left out when none are set.
fn search_body(text: &str, page: &SearchPage, filters: &[(&str, Option<&String>)]) -> Value {
    let top = page.top.filter(|t| *t > 0).unwrap_or(DEFAULT_TOP);
    let mut body = Map::new();
    body.insert("searchText".to_string(), json!(text));
    body.insert("$top".to_string(), json!(top));
    body.insert("$skip".to_string(), json!(page.skip.unwrap_or(0)));

    let filters: Map<String, Value> = filters
        .iter()
        .filter_map(|(name, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| (name.to_string(), json!([v])))
        })
        .collect();
    if !filters.is_empty() {
        body.insert("filters".to_string(), Value::Object(filters));
    }
    Value::Object(body)
}

impl CodeSearch {
    pub fn body(&self, text: &str) -> Value {
        search_body(
            text,
            &self.page,
            &[
                ("Project", self.project.as_ref()),
                ("Repository", self.repository.as_ref()),
                ("Branch", self.branch.as_ref()),
                ("Path", self.path.as_ref()),
            ],
        )
    }
}

impl WikiSearch {
    pub fn body(&self, text: &str) -> Value {
        search_body(
            text,
            &self.page,
            &[
                ("Project", self.project.as_ref()),
                ("Wiki", self.wiki.as_ref()),
            ],
        )
    }
}

impl WorkItemSearch {
    pub fn body(&self, text: &str) -> Value {
        search_body(
            text,
            &self.page,
            &[
                ("Project", self.project.as_ref()),
                ("Work Item Type", self.work_item_type.as_ref()),
                ("State", self.state.as_ref()),
                ("Assigned To", self.assigned_to.as_ref()),
                ("Area Path", self.area_path.as_ref()),
            ],
        )
    }
}

impl AdoClient {
    async fn search(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.post(Endpoint::org(path).area(Area::Search), body).await
    }

    pub async fn search_code(&self, text: &str, query: &CodeSearch) -> Result<Value, ApiError> {
        self.search("_apis/search/codesearchresults", query.body(text))
            .await
    }

    pub async fn search_wiki(&self, text: &str, query: &WikiSearch) -> Result<Value, ApiError> {
        self.search("_apis/search/wikisearchresults", query.body(text))
            .await
    }

    pub async fn search_work_items(
        &self,
        text: &str,
        query: &WorkItemSearch,
    ) -> Result<Value, ApiError> {
        self.search("_apis/search/workitemsearchresults", query.body(text))
            .await
    }
}
