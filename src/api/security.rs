//! Advanced Security alerts.

use clap::Args;
use serde_json::Value;

use super::client::{AdoClient, Endpoint, seg};
use super::params::QueryParams;
use crate::error::ApiError;

/// Alert filters, sent as `criteria.*` parameters.
#[derive(Debug, Clone, Args)]
pub struct AlertQuery {
    /// code, secret or dependency
    #[arg(long)]
    pub alert_type: Option<String>,
    /// Comma-separated severities, e.g. critical,high
    #[arg(long)]
    pub severity: Option<String>,
    /// Comma-separated states, e.g. active,dismissed
    #[arg(long)]
    pub states: Option<String>,
    #[arg(long, default_value = "high")]
    pub confidence: String,
    /// Git ref, e.g. refs/heads/main
    #[arg(long = "ref")]
    pub git_ref: Option<String>,
    #[arg(long)]
    pub top: Option<u32>,
    /// Only alerts on the default branch (true/false)
    #[arg(long, value_parser = crate::cli::parse_bool_flag)]
    pub only_default_branch: Option<bool>,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            alert_type: None,
            severity: None,
            states: None,
            confidence: "high".to_string(),
            git_ref: None,
            top: None,
            only_default_branch: None,
        }
    }
}

impl AdoClient {
    pub async fn get_alerts(
        &self,
        project: &str,
        repository: &str,
        query: &AlertQuery,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .push("criteria.confidenceLevels", &query.confidence)
            .text("criteria.alertType", query.alert_type.as_deref())
            .text("criteria.severities", query.severity.as_deref())
            .text("criteria.states", query.states.as_deref())
            .text("criteria.ref", query.git_ref.as_deref())
            .opt("$top", query.top)
            .flag("criteria.onlyDefaultBranch", query.only_default_branch);
        let path = format!("_apis/alert/repositories/{}/alerts", seg(repository));
        self.get(Endpoint::project(project, path).params(params))
            .await
    }

    pub async fn get_alert_details(
        &self,
        project: &str,
        repository: &str,
        alert_id: u32,
        git_ref: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new().text("ref", git_ref);
        let path = format!(
            "_apis/alert/repositories/{}/alerts/{alert_id}",
            seg(repository)
        );
        self.get(Endpoint::project(project, path).params(params))
            .await
    }
}
