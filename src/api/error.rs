use std::borrow::Cow;

/// Failure of a single HTTP exchange, before any stage gives it meaning.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("status {0}: {1}")]
    External(u16, Cow<'static, str>),
    /// The exchange never produced a usable response.
    #[error("{0}")]
    Internal(Cow<'static, str>),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::External(code, Cow::from("")),
            other => Self::Internal(other.to_string().into()),
        }
    }
}
