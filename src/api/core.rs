//! Projects, teams and identities.

use clap::Args;
use serde_json::Value;

use super::client::{AdoClient, Area, Endpoint, seg};
use super::params::QueryParams;
use crate::error::ApiError;

/// Filters for listing projects.
#[derive(Debug, Clone, Default, Args)]
pub struct ProjectQuery {
    #[arg(long)]
    pub top: Option<u32>,
    #[arg(long)]
    pub skip: Option<u32>,
    /// wellFormed, createPending, deleting, new or all
    #[arg(long)]
    pub state_filter: Option<String>,
    /// Project name filter
    #[arg(long)]
    pub name_filter: Option<String>,
}

impl AdoClient {
    pub async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Value>, ApiError> {
        let params = QueryParams::new()
            .opt("$top", query.top)
            .opt("$skip", query.skip)
            .text("stateFilter", query.state_filter.as_deref())
            .text("projectNameFilter", query.name_filter.as_deref());
        self.get_all(Endpoint::org("_apis/projects").params(params))
            .await
    }

    pub async fn list_project_teams(
        &self,
        project: &str,
        top: Option<u32>,
        skip: Option<u32>,
        mine: Option<bool>,
    ) -> Result<Vec<Value>, ApiError> {
        let params = QueryParams::new()
            .opt("$top", top)
            .opt("$skip", skip)
            .flag("$mine", mine);
        let path = format!("_apis/projects/{}/teams", seg(project));
        self.get_all(Endpoint::org(path).params(params)).await
    }

    /// Look up identities by display name or email on the identity host.
    pub async fn get_identity_ids(&self, search_filter: &str) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .push("searchFilter", "General")
            .push("filterValue", search_filter);
        self.get(
            Endpoint::org("_apis/identities")
                .area(Area::Identity)
                .params(params),
        )
        .await
    }
}
