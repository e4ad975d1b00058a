use serde::Deserialize;

use super::{error::ApiError, fetch::fetch, illust::IllustrationId};
use crate::config::Endpoints;

#[derive(Deserialize)]
#[serde(rename_all(deserialize = "camelCase", serialize = "snake_case"))]
pub struct UgoiraMeta {
    pub src: Option<String>,
    pub original_src: Option<String>,
    #[serde(alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub frames: Vec<UgoiraFrame>,
}

/// One row of the frame table: archive entry name and display time in ms.
#[derive(Clone, Debug, Deserialize)]
pub struct UgoiraFrame {
    pub file: String,
    pub delay: u32,
}

impl UgoiraMeta {
    /// The full-size archive when the API offers one.
    pub fn archive_src(&self) -> Option<&str> {
        self.original_src.as_deref().or(self.src.as_deref())
    }
}

pub fn fetch_ugoira_meta(
    agent: &ureq::Agent,
    endpoints: &Endpoints,
    id: IllustrationId,
) -> Result<UgoiraMeta, ApiError> {
    fetch(agent, &endpoints.ugoira_meta(id))
}
