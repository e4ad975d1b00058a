use std::{io, path::PathBuf};

use tempfile::TempDir;

const PREFIX: &str = "ugoira-";

/// Source of the temporary directory a single build or repack extracts into.
///
/// The returned [`TempDir`] is removed when dropped, whichever way the call
/// that owns it ends.
pub trait ScratchSpace {
    fn acquire(&self) -> io::Result<TempDir>;
}

/// Directories under the system temp location.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTemp;

impl ScratchSpace for SystemTemp {
    fn acquire(&self) -> io::Result<TempDir> {
        tempfile::Builder::new().prefix(PREFIX).tempdir()
    }
}

/// Directories under a caller-chosen parent.
#[derive(Clone, Debug)]
pub struct ScratchIn(pub PathBuf);

impl ScratchSpace for ScratchIn {
    fn acquire(&self) -> io::Result<TempDir> {
        tempfile::Builder::new().prefix(PREFIX).tempdir_in(&self.0)
    }
}

impl<S: ScratchSpace + ?Sized> ScratchSpace for &S {
    fn acquire(&self) -> io::Result<TempDir> {
        (**self).acquire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = ScratchIn(parent.path().to_owned());

        let dir = scratch.acquire().unwrap();
        assert!(dir.path().starts_with(parent.path()));
        std::fs::write(dir.path().join("frame.jpg"), b"x").unwrap();
        drop(dir);

        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }
}
