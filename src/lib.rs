//! Download pixiv animated illustrations (ugoira) and rebuild them as gifs.
//!
//! The pipeline scrapes the illustration page for the frame archive and its
//! timing table, downloads the archive (optionally with a logged-in
//! [`Session`](api::login::Session)), then either assembles an animated gif
//! or keeps a validated copy of the archive.

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod ugoira;
pub mod util;

pub use error::{Error, Result};
