use serde::Deserialize;

/// Envelope shared by the ajax API and the login API.
#[derive(Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub error: bool,
    pub body: Option<T>,
    pub message: Option<String>,
}
