use std::{collections::HashMap, fmt, sync::LazyLock};

use regex::Regex;
use tracing::{debug, info};

use super::{
    error::ApiError,
    fetch::fetch_text,
    ugoira::{fetch_ugoira_meta, UgoiraMeta},
};
use crate::{config::Endpoints, error::ScrapeError};

/* Legacy pages inline the frame table as a script assignment */
static INLINE_UGOIRA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)ugokuIllustData\s*=\s*(\{.*?\})\s*;").expect("valid inline ugoira pattern")
});
/* Modern pages only carry the illustration type in their preload data */
static ILLUST_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""illustType"\s*:\s*(\d+)"#).expect("valid illustType pattern")
});

const ILLUST_TYPE_UGOIRA: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IllustrationId(pub u64);

impl fmt::Display for IllustrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveLocation(pub String);

impl ArchiveLocation {
    pub fn url(&self) -> &str {
        &self.0
    }
}

/// Frame filename to display time in milliseconds.
///
/// Iteration order carries no meaning; playback follows the archive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameTimingMap(HashMap<String, u32>);

impl FrameTimingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous duration when `file` was already present.
    pub fn insert(&mut self, file: impl Into<String>, duration_ms: u32) -> Option<u32> {
        self.0.insert(file.into(), duration_ms)
    }

    pub fn get(&self, file: &str) -> Option<u32> {
        self.0.get(file).copied()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.0.contains_key(file)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for FrameTimingMap {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Clone, Debug)]
pub struct UgoiraMetadata {
    pub archive: ArchiveLocation,
    pub frames: FrameTimingMap,
    pub mime_type: Option<String>,
}

impl TryFrom<UgoiraMeta> for UgoiraMetadata {
    type Error = ScrapeError;

    fn try_from(meta: UgoiraMeta) -> Result<Self, Self::Error> {
        let archive = match meta.archive_src() {
            Some(src) if !src.is_empty() => ArchiveLocation(src.to_owned()),
            _ => return Err(ScrapeError::MetadataMissing("no archive url".into())),
        };
        if meta.frames.is_empty() {
            return Err(ScrapeError::MetadataMissing("frame table is empty".into()));
        }

        let mut frames = FrameTimingMap::new();
        for frame in meta.frames {
            let file = frame.file;
            if frames.contains(&file) {
                return Err(ScrapeError::MetadataMissing(format!(
                    "frame {} listed twice",
                    file
                )));
            }
            frames.insert(file, frame.delay);
        }

        Ok(Self {
            archive,
            frames,
            mime_type: meta.mime_type,
        })
    }
}

/// Body of an illustration page.
pub struct IllustPage {
    pub id: IllustrationId,
    pub body: String,
}

impl IllustPage {
    pub fn is_animation(&self) -> bool {
        INLINE_UGOIRA.is_match(&self.body) || self.illust_type() == Some(ILLUST_TYPE_UGOIRA)
    }

    fn illust_type(&self) -> Option<u8> {
        ILLUST_TYPE
            .captures(&self.body)
            .and_then(|captures| captures[1].parse().ok())
    }

    fn inline_meta(&self) -> Option<Result<UgoiraMeta, ScrapeError>> {
        let captures = INLINE_UGOIRA.captures(&self.body)?;
        Some(
            serde_json::from_str(&captures[1])
                .map_err(|err| ScrapeError::MetadataMissing(format!("bad frame table: {}", err))),
        )
    }
}

pub struct PageScraper<'a> {
    agent: &'a ureq::Agent,
    endpoints: &'a Endpoints,
}

impl<'a> PageScraper<'a> {
    pub fn new(agent: &'a ureq::Agent, endpoints: &'a Endpoints) -> Self {
        Self { agent, endpoints }
    }

    pub fn fetch_page(&self, id: IllustrationId) -> Result<IllustPage, ScrapeError> {
        let url = self.endpoints.illust_page(id);
        debug!(%url, "Fetching illustration page");
        let body = fetch_text(self.agent, &url).map_err(ScrapeError::PageUnreachable)?;
        Ok(IllustPage { id, body })
    }

    pub fn detect_animation(&self, id: IllustrationId) -> Result<bool, ScrapeError> {
        let animated = self.fetch_page(id)?.is_animation();
        info!(%id, animated, "Checked illustration type");
        Ok(animated)
    }

    pub fn extract_metadata(&self, id: IllustrationId) -> Result<UgoiraMetadata, ScrapeError> {
        let page = self.fetch_page(id)?;
        self.metadata_from(&page)
    }

    /// Metadata from an already fetched page, asking the meta API when the
    /// page marks an animation without carrying its frame table.
    pub fn metadata_from(&self, page: &IllustPage) -> Result<UgoiraMetadata, ScrapeError> {
        let meta = match page.inline_meta() {
            Some(meta) => meta?,
            None if page.is_animation() => {
                debug!(id = %page.id, "No inline frame table, asking the meta API");
                fetch_ugoira_meta(self.agent, self.endpoints, page.id).map_err(|err| match err {
                    ApiError::Internal(_) => ScrapeError::PageUnreachable(err),
                    ApiError::External(..) => {
                        ScrapeError::MetadataMissing(format!("meta api: {}", err))
                    }
                })?
            }
            None => return Err(ScrapeError::NotAnimation(page.id)),
        };

        let metadata = UgoiraMetadata::try_from(meta)?;
        info!(
            id = %page.id,
            frames = metadata.frames.len(),
            archive = metadata.archive.url(),
            "Extracted animation metadata"
        );
        Ok(metadata)
    }
}
