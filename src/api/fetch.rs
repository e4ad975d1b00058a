use serde::de::DeserializeOwned;
use ureq::{http::Response, Body};

use crate::api::{common::ApiResponse, error::ApiError};
use crate::util;

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/* Turn a finished exchange into a 2xx response or an ApiError */
pub(crate) fn checked(
    result: Result<Response<Body>, ureq::Error>,
) -> Result<Response<Body>, ApiError> {
    let mut response = result?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.body_mut().read_to_string().unwrap_or_default();
    Err(ApiError::External(
        status.as_u16(),
        util::truncate(&body, MAX_ERROR_BODY).to_owned().into(),
    ))
}

pub(crate) fn fetch_text(agent: &ureq::Agent, url: &str) -> Result<String, ApiError> {
    let mut response = checked(agent.get(url).call())?;
    Ok(response.body_mut().read_to_string()?)
}

/* Fetch from pixiv ajax API */
pub(crate) fn fetch<T>(agent: &ureq::Agent, url: &str) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let mut response = checked(agent.get(url).call())?;
    let status = response.status().as_u16();
    let text = response.body_mut().read_to_string()?;

    let invalid =
        |err: serde_json::Error| ApiError::External(status, format!("invalid response: {}", err).into());
    let response: ApiResponse<serde_json::Value> = serde_json::from_str(&text).map_err(invalid)?;

    match response.body {
        Some(body) if !response.error => serde_json::from_value(body).map_err(invalid),
        _ => Err(ApiError::External(
            400,
            response.message.unwrap_or_default().into(),
        )),
    }
}
