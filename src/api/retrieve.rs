use tracing::{debug, info};
use ureq::RequestBuilder;

use super::{error::ApiError, fetch::checked, illust::ArchiveLocation, login::Session};
use crate::error::RetrieveError;

/// Upper bound on the archive size kept in memory.
pub const MAX_ARCHIVE_BYTES: u64 = 512 * 1024 * 1024;

pub struct FrameBundleRetriever<'a> {
    agent: &'a ureq::Agent,
    referer: &'a str,
}

impl<'a> FrameBundleRetriever<'a> {
    pub fn new(agent: &'a ureq::Agent, referer: &'a str) -> Self {
        Self { agent, referer }
    }

    /// Check the archive exists, then download it whole.
    pub fn fetch(
        &self,
        location: &ArchiveLocation,
        session: Option<&Session>,
    ) -> Result<Vec<u8>, RetrieveError> {
        let url = location.url();

        let head = self.prepare(self.agent.head(url), session);
        checked(head.call()).map_err(|err| match err {
            ApiError::External(code, _) => RetrieveError::NotFound(code),
            ApiError::Internal(message) => RetrieveError::NetworkFailure(message.into_owned()),
        })?;
        debug!(%url, "Archive exists");

        let get = self.prepare(self.agent.get(url), session);
        let mut response = checked(get.call()).map_err(|err| match err {
            ApiError::External(code, _) => RetrieveError::FetchFailed(code),
            ApiError::Internal(message) => RetrieveError::NetworkFailure(message.into_owned()),
        })?;
        let data = response
            .body_mut()
            .with_config()
            .limit(MAX_ARCHIVE_BYTES)
            .read_to_vec()
            .map_err(|err| RetrieveError::NetworkFailure(err.to_string()))?;

        info!(%url, bytes = data.len(), authenticated = session.is_some(), "Downloaded archive");
        Ok(data)
    }

    fn prepare<B>(&self, request: RequestBuilder<B>, session: Option<&Session>) -> RequestBuilder<B> {
        let request = request.header("Referer", self.referer);
        match session.and_then(Session::cookie_header) {
            Some(cookie) => request.header("Cookie", cookie),
            None => request,
        }
    }
}
