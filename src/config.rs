use std::time::Duration;

use ureq::Agent;

use crate::api::illust::IllustrationId;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:97.0) Gecko/20100101 Firefox/97.0";

/// Remote locations the pipeline talks to.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub login_page: String,
    pub login_api: String,
    /// Base of the illustration pages and the ajax API, without trailing slash.
    pub site: String,
    /// Sent as `Referer` on every archive request; the image host refuses
    /// requests without it.
    pub referer: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_hosts("https://accounts.pixiv.net", "https://www.pixiv.net")
    }
}

impl Endpoints {
    /// Rebase every endpoint onto the given account and site hosts.
    pub fn with_hosts(accounts: &str, site: &str) -> Self {
        let accounts = accounts.trim_end_matches('/');
        let site = site.trim_end_matches('/');
        Self {
            login_page: format!("{}/login?lang=en", accounts),
            login_api: format!("{}/api/login?lang=en", accounts),
            site: site.to_owned(),
            referer: format!("{}/", site),
        }
    }

    pub fn illust_page(&self, id: IllustrationId) -> String {
        format!("{}/member_illust.php?mode=medium&illust_id={}", self.site, id)
    }

    pub fn ugoira_meta(&self, id: IllustrationId) -> String {
        format!("{}/ajax/illust/{}/ugoira_meta?lang=en", self.site, id)
    }
}

/// Settings of the shared HTTP agent.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_owned(),
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl ClientConfig {
    /// Status codes are not turned into errors here; every stage decides
    /// what a non-2xx response means for it.
    pub fn build_agent(&self) -> Agent {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .user_agent(self.user_agent.as_str())
            .timeout_global(self.timeout)
            .build();
        Agent::new_with_config(config)
    }
}
