//! GitHub API access for contribution data.

pub mod client;
pub mod error;
pub mod strategy;

pub use client::GitHubClient;
pub use error::{FetchError, FetchErrorKind};
pub use strategy::FetchStrategy;
