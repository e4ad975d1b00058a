pub mod common;
pub mod error;
mod fetch;
pub mod illust;
pub mod login;
pub mod retrieve;
pub mod ugoira;
