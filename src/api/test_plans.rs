//! Test plans, suites, cases and build test results.

use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use super::client::{AdoClient, Endpoint, unwrap_list};
use super::params::QueryParams;
use crate::error::ApiError;

impl AdoClient {
    pub async fn list_test_plans(
        &self,
        project: &str,
        filter_active: Option<bool>,
        include_plan_details: Option<bool>,
        continuation_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .flag("filterActivePlans", filter_active)
            .flag("includePlanDetails", include_plan_details)
            .text("continuationToken", continuation_token);
        let data = self
            .get(Endpoint::project(project, "_apis/testplan/plans").params(params))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn list_test_suites(
        &self,
        project: &str,
        plan_id: u32,
        continuation_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().text("continuationToken", continuation_token);
        let path = format!("_apis/testplan/plans/{plan_id}/suites");
        let data = self
            .get(Endpoint::project(project, path).params(params))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn list_test_cases(
        &self,
        project: &str,
        plan_id: u32,
        suite_id: u32,
    ) -> Result<Value, ApiError> {
        let path = format!("_apis/testplan/plans/{plan_id}/suites/{suite_id}/testcase");
        let data = self.get(Endpoint::project(project, path)).await?;
        Ok(unwrap_list(data, "value"))
    }

    /// Results of every test run a build produced, tagged with `runName`.
    ///
    /// Runs are fetched concurrently; results keep run order.
    pub async fn get_test_results_by_build(
        &self,
        project: &str,
        build_id: u32,
    ) -> Result<Vec<Value>, ApiError> {
        let params =
            QueryParams::new().push("buildUri", format!("vstfs:///Build/Build/{build_id}"));
        let runs = self
            .get(Endpoint::project(project, "_apis/test/runs").params(params))
            .await?;
        let runs = match unwrap_list(runs, "value") {
            Value::Array(runs) => runs,
            _ => Vec::new(),
        };
        debug!(build_id, runs = runs.len(), "fetching test results");

        let fetches = runs.iter().filter_map(|run| {
            let id = run.get("id")?.as_u64()?;
            let name = run.get("name").cloned().unwrap_or(Value::Null);
            Some(async move {
                let path = format!("_apis/test/runs/{id}/results");
                let data = self.get(Endpoint::project(project, path)).await?;
                let results = match unwrap_list(data, "value") {
                    Value::Array(results) => results,
                    _ => Vec::new(),
                };
                Ok::<_, ApiError>(
                    results
                        .into_iter()
                        .map(|mut result| {
                            if let Value::Object(map) = &mut result {
                                map.insert("runName".to_string(), name.clone());
                            }
                            result
                        })
                        .collect::<Vec<_>>(),
                )
            })
        });

        let per_run = try_join_all(fetches).await?;
        Ok(per_run.into_iter().flatten().collect())
    }
}
