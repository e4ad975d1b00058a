use std::path::PathBuf;

use tracing::info;

use crate::{
    api::{
        illust::{IllustrationId, PageScraper},
        login::Session,
        retrieve::FrameBundleRetriever,
    },
    config::Endpoints,
    error::{Result, ScrapeError},
    ugoira::{
        assemble::AnimationAssembler,
        repack::ArchiveRepackager,
        scratch::{ScratchSpace, SystemTemp},
    },
};

/// What to make of the downloaded archive.
#[derive(Clone, Debug)]
pub enum Target {
    Gif { path: PathBuf, speed: f64 },
    Zip { path: PathBuf },
}

/// Scrape, download and convert a single illustration.
pub struct Pipeline<'a, S = SystemTemp> {
    agent: &'a ureq::Agent,
    endpoints: &'a Endpoints,
    scratch: S,
}

impl<'a> Pipeline<'a, SystemTemp> {
    pub fn new(agent: &'a ureq::Agent, endpoints: &'a Endpoints) -> Self {
        Self::with_scratch(agent, endpoints, SystemTemp)
    }
}

impl<'a, S: ScratchSpace> Pipeline<'a, S> {
    pub fn with_scratch(agent: &'a ureq::Agent, endpoints: &'a Endpoints, scratch: S) -> Self {
        Self {
            agent,
            endpoints,
            scratch,
        }
    }

    pub fn run(&self, id: IllustrationId, target: &Target, session: Option<&Session>) -> Result<()> {
        let scraper = PageScraper::new(self.agent, self.endpoints);
        let page = scraper.fetch_page(id)?;
        if !page.is_animation() {
            return Err(ScrapeError::NotAnimation(id).into());
        }
        let metadata = scraper.metadata_from(&page)?;

        let retriever = FrameBundleRetriever::new(self.agent, &self.endpoints.referer);
        let archive = retriever.fetch(&metadata.archive, session)?;

        match target {
            Target::Gif { path, speed } => {
                AnimationAssembler::with_scratch(&self.scratch).build(
                    path,
                    &archive,
                    &metadata.frames,
                    *speed,
                )?;
            }
            Target::Zip { path } => {
                ArchiveRepackager::with_scratch(&self.scratch).persist(path, &archive)?;
            }
        }

        info!(%id, "Done");
        Ok(())
    }
}
