//! Wiki listing and page reads.

use serde_json::Value;

use super::client::{AdoClient, Endpoint, seg, unwrap_list};
use super::params::QueryParams;
use crate::error::ApiError;

fn wiki_path(wiki_id: &str, rest: &str) -> String {
    if rest.is_empty() {
        format!("_apis/wiki/wikis/{}", seg(wiki_id))
    } else {
        format!("_apis/wiki/wikis/{}/{rest}", seg(wiki_id))
    }
}

impl AdoClient {
    /// Wikis of the organization, or of one project.
    pub async fn list_wikis(&self, project: Option<&str>) -> Result<Value, ApiError> {
        let data = self
            .get(Endpoint::maybe_project(project, "_apis/wiki/wikis"))
            .await?;
        Ok(unwrap_list(data, "value"))
    }

    pub async fn get_wiki(&self, wiki_id: &str, project: Option<&str>) -> Result<Value, ApiError> {
        self.get(Endpoint::maybe_project(project, wiki_path(wiki_id, "")))
            .await
    }

    pub async fn list_wiki_pages(
        &self,
        project: &str,
        wiki_id: &str,
        top: Option<u32>,
        continuation_token: Option<&str>,
        page_views_for_days: Option<u32>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .opt("$top", top)
            .text("continuationToken", continuation_token)
            .opt("pageViewsForDays", page_views_for_days);
        self.get(Endpoint::project(project, wiki_path(wiki_id, "pagesbatch")).params(params))
            .await
    }

    /// Page metadata without content.
    pub async fn get_wiki_page(
        &self,
        project: &str,
        wiki_id: &str,
        path: &str,
        recursion_level: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = QueryParams::new()
            .push("path", path)
            .text("recursionLevel", recursion_level);
        self.get(Endpoint::project(project, wiki_path(wiki_id, "pages")).params(params))
            .await
    }

    /// Page content as markdown text.
    pub async fn get_wiki_page_content(
        &self,
        project: &str,
        wiki_id: &str,
        path: &str,
    ) -> Result<String, ApiError> {
        let params = QueryParams::new()
            .push("path", path)
            .push("includeContent", "true");
        self.get_text(Endpoint::project(project, wiki_path(wiki_id, "pages")).params(params))
            .await
    }
}
