//! Typed failures, one enum per pipeline stage.
//!
//! Callers branch on the variant; the messages are for humans only.

use std::io;

use thiserror::Error;

use crate::api::error::ApiError;
use crate::api::illust::IllustrationId;
use crate::ugoira::archive::ArchiveError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential shape rejected locally; nothing was sent.
    #[error("invalid login input: {0}")]
    InvalidInput(&'static str),

    #[error("login page unreachable: {0}")]
    PageUnreachable(ApiError),

    #[error("login token not found in login page")]
    TokenNotFound,

    #[error("login api unreachable: {0}")]
    ApiUnreachable(ApiError),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("login rejected: {0}")]
    LoginRejected(String),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("illustration page unreachable: {0}")]
    PageUnreachable(ApiError),

    #[error("illustration {0} is not an animation")]
    NotAnimation(IllustrationId),

    #[error("animation metadata missing: {0}")]
    MetadataMissing(String),
}

#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The existence check answered with a non-2xx status.
    #[error("archive not found (status {0})")]
    NotFound(u16),

    /// The existence check passed but the download answered non-2xx.
    #[error("archive fetch failed (status {0})")]
    FetchFailed(u16),

    #[error("network failure: {0}")]
    NetworkFailure(String),
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("speed factor must be a positive finite number, got {0}")]
    InvalidSpeed(f64),

    #[error("archive has no frames")]
    EmptyBundle,

    #[error("no timing for frame {0}")]
    TimingMissing(String),

    #[error("timing given for frame {0} which is not in the archive")]
    FrameMissing(String),

    #[error("corrupt archive: {0}")]
    CorruptArchive(#[from] ArchiveError),

    #[error("could not prepare extraction area: {0}")]
    Scratch(io::Error),

    #[error("encoding failed: {0}")]
    EncodeFailed(String),
}

#[derive(Debug, Error)]
pub enum RepackageError {
    #[error("corrupt archive: {0}")]
    CorruptArchive(#[from] ArchiveError),

    #[error("could not prepare extraction area: {0}")]
    Scratch(io::Error),

    #[error("could not write archive: {0}")]
    WriteFailed(io::Error),
}

/// Any failure of the end-to-end pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Repackage(#[from] RepackageError),
}
