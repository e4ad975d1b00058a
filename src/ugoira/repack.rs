use std::{fs, path::Path};

use tracing::info;

use super::{
    archive::FrameBundle,
    scratch::{ScratchSpace, SystemTemp},
};
use crate::{error::RepackageError, util};

/// Validating copy of a downloaded frame archive.
pub struct ArchiveRepackager<S = SystemTemp> {
    scratch: S,
}

impl ArchiveRepackager<SystemTemp> {
    pub fn new() -> Self {
        Self {
            scratch: SystemTemp,
        }
    }
}

impl Default for ArchiveRepackager<SystemTemp> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ScratchSpace> ArchiveRepackager<S> {
    pub fn with_scratch(scratch: S) -> Self {
        Self { scratch }
    }

    /// Extract every entry and write them back, in order, as a new archive at
    /// `output`. A corrupt input fails before `output` is touched.
    pub fn persist(&self, output: &Path, archive: &[u8]) -> Result<(), RepackageError> {
        let bundle = FrameBundle::from_zip(archive)?;

        let scratch = self.scratch.acquire().map_err(RepackageError::Scratch)?;
        let paths = bundle
            .unpack_into(scratch.path())
            .map_err(RepackageError::Scratch)?;

        let mut copy = FrameBundle::default();
        for (entry, path) in bundle.entries().iter().zip(&paths) {
            let data = fs::read(path).map_err(RepackageError::Scratch)?;
            copy.push(entry.name.as_str(), data);
        }

        let bytes = copy.to_zip()?;
        util::write_atomically(output, &bytes).map_err(RepackageError::WriteFailed)?;

        info!(output = %output.display(), entries = copy.len(), "Wrote archive");
        Ok(())
    }
}
