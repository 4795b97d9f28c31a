//! Iterations and team capacity.

use serde_json::Value;

use super::client::{AdoClient, Endpoint, seg, unwrap_list};
use super::params::QueryParams;
use crate::error::ApiError;

fn capacities_path(iteration_id: &str) -> String {
    format!(
        "_apis/work/teamsettings/iterations/{}/capacities",
        seg(iteration_id)
    )
}

impl AdoClient {
    /// Iteration classification tree of a project.
    pub async fn list_iterations(
        &self,
        project: &str,
        depth: Option<u32>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().opt("$depth", depth);
        self.get(
            Endpoint::project(project, "_apis/wit/classificationnodes/iterations").params(params),
        )
        .await
    }

    pub async fn list_team_iterations(
        &self,
        project: &str,
        team: &str,
        timeframe: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().text("$timeframe", timeframe);
        let data = self
            .get(
                Endpoint::team(project, Some(team), "_apis/work/teamsettings/iterations")
                    .params(params),
            )
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn get_iteration_capacities(
        &self,
        project: &str,
        iteration_id: &str,
    ) -> Result<Value, ApiError> {
        self.get(Endpoint::project(project, capacities_path(iteration_id)))
            .await
    }

    pub async fn get_team_capacity(
        &self,
        project: &str,
        team: &str,
        iteration_id: &str,
    ) -> Result<Value, ApiError> {
        self.get(Endpoint::team(project, Some(team), capacities_path(iteration_id)))
            .await
    }
}
