use std::{collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use ureq::{http::Response, Body};

use super::{common::ApiResponse, fetch::checked};
use crate::{config::Endpoints, error::AuthError};

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 32;

/* Matches both `name="post_key" value="..."` and `"post_key":"..."` */
static POST_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"post_key"\s*(?:value=|:)\s*"([0-9A-Za-z]+)""#).expect("valid post_key pattern")
});

pub struct Credentials<'a> {
    pub id: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials<'_> {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.id.is_empty() {
            return Err(AuthError::InvalidInput("pixiv id is empty"));
        }
        if self.password.is_empty() {
            return Err(AuthError::InvalidInput("password is empty"));
        }
        let len = self.password.chars().count();
        if len < PASSWORD_MIN_LEN {
            return Err(AuthError::InvalidInput("password is too short"));
        }
        if len > PASSWORD_MAX_LEN {
            return Err(AuthError::InvalidInput("password is too long"));
        }
        Ok(())
    }
}

/// Authentication context obtained from a login, or supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<(String, String)>,
    csrf_token: Option<String>,
    redirect_to: Option<String>,
}

impl Session {
    /// Build a session from a raw `Cookie` header such as `PHPSESSID=...; a=b`.
    pub fn from_cookie_header(header: &str) -> Self {
        let mut session = Self::default();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                session.set_cookie(name.trim(), value.trim());
            }
        }
        session
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value for the `Cookie` request header, `None` when no cookie is held.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        Some(pairs.join("; "))
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    fn set_cookie(&mut self, name: &str, value: &str) {
        if name.is_empty() {
            return;
        }
        match self.cookies.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.cookies.push((name.to_owned(), value.to_owned())),
        }
    }

    /* Only the name=value part of each Set-Cookie matters for replay */
    fn absorb_cookies(&mut self, response: &Response<Body>) {
        for header in response.headers().get_all("set-cookie") {
            let Ok(header) = header.to_str() else {
                continue;
            };
            let pair = header.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                self.set_cookie(name.trim(), value.trim());
            }
        }
    }
}

#[derive(Deserialize)]
struct LoginSuccess {
    redirect_to: String,
}

#[derive(Deserialize)]
struct LoginBody {
    success: Option<LoginSuccess>,
    validation_errors: Option<BTreeMap<String, String>>,
}

/// What the login API decided.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Success { redirect_to: String },
    ValidationErrors(BTreeMap<String, String>),
    Rejected(String),
}

impl LoginOutcome {
    pub fn parse(body: &str) -> Self {
        let envelope: ApiResponse<serde_json::Value> = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(err) => return Self::Rejected(format!("malformed login response: {}", err)),
        };

        let message = envelope.message.unwrap_or_default();
        if envelope.error {
            return Self::Rejected(message);
        }

        let body = envelope
            .body
            .and_then(|body| serde_json::from_value::<LoginBody>(body).ok());
        match body {
            Some(LoginBody {
                success: Some(success),
                ..
            }) => Self::Success {
                redirect_to: success.redirect_to,
            },
            Some(LoginBody {
                validation_errors: Some(errors),
                ..
            }) => Self::ValidationErrors(errors),
            _ if message.is_empty() => Self::Rejected("unexpected login response".into()),
            _ => Self::Rejected(message),
        }
    }
}

pub struct SessionAuthenticator<'a> {
    agent: &'a ureq::Agent,
    endpoints: &'a Endpoints,
}

impl<'a> SessionAuthenticator<'a> {
    pub fn new(agent: &'a ureq::Agent, endpoints: &'a Endpoints) -> Self {
        Self { agent, endpoints }
    }

    pub fn login(&self, id: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = Credentials { id, password };
        credentials.validate()?;

        let mut session = Session::default();

        let mut page = checked(self.agent.get(&self.endpoints.login_page).call())
            .map_err(AuthError::PageUnreachable)?;
        session.absorb_cookies(&page);
        let page = page
            .body_mut()
            .read_to_string()
            .map_err(|err| AuthError::PageUnreachable(err.into()))?;

        let token = POST_KEY
            .captures(&page)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_owned())
            .ok_or(AuthError::TokenNotFound)?;
        debug!(len = token.len(), "Found login token");

        let mut request = self
            .agent
            .post(&self.endpoints.login_api)
            .header("Referer", &self.endpoints.login_page);
        if let Some(cookie) = session.cookie_header() {
            request = request.header("Cookie", cookie);
        }
        let form = [
            ("pixiv_id", credentials.id),
            ("password", credentials.password),
            ("captcha", ""),
            ("g_recaptcha_response", ""),
            ("post_key", token.as_str()),
            ("source", "pc"),
            ("return_to", self.endpoints.referer.as_str()),
        ];
        let mut response = checked(request.send_form(form)).map_err(AuthError::ApiUnreachable)?;
        session.absorb_cookies(&response);
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| AuthError::ApiUnreachable(err.into()))?;

        session.csrf_token = Some(token);
        match LoginOutcome::parse(&body) {
            LoginOutcome::Success { redirect_to } => {
                info!(id = credentials.id, "Logged in");
                session.redirect_to = Some(redirect_to);
                Ok(session)
            }
            LoginOutcome::ValidationErrors(errors) => {
                warn!(fields = errors.len(), "Login rejected by validation");
                let message: Vec<String> = errors
                    .into_iter()
                    .map(|(field, message)| format!("{}: {}", field, message))
                    .collect();
                Err(AuthError::InvalidCredentials(message.join("; ")))
            }
            LoginOutcome::Rejected(message) => {
                warn!(%message, "Login rejected");
                Err(AuthError::LoginRejected(message))
            }
        }
    }
}
