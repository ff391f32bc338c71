//! Ready-made clients for well-known APIs.
//!
//! Each preset returns a [`NetworkingClientBuilder`], so the transport,
//! timeout and extra interceptors can still be changed before building.

use std::fmt;

use super::client::NetworkingClientBuilder;
use super::interceptor::AuthorizationInterceptor;

/// Versions of the Imgur API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImgurApiVersion {
    /// `v1`
    V1,
    /// `v2`
    V2,
    /// `v3`, the current one.
    #[default]
    V3,
}

impl fmt::Display for ImgurApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "1"),
            Self::V2 => write!(f, "2"),
            Self::V3 => write!(f, "3"),
        }
    }
}

/// A client for the Imgur API, authorized with `Client-ID {client_id}`.
///
/// ```ignore
/// let imgur = imgur_client("my-client-id", ImgurApiVersion::V3).build()?;
/// let image = imgur.get("image/abc123").send().await?;
/// ```
pub fn imgur_client(
    client_id: impl Into<String>,
    version: ImgurApiVersion,
) -> NetworkingClientBuilder {
    NetworkingClientBuilder::new(format!("https://api.imgur.com/{version}/"))
        .interceptor(AuthorizationInterceptor::new(client_id).scheme("Client-ID"))
}

/// A GitHub repository at a given branch, tag or commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitHubRepository {
    /// User or organization owning the repository.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch, tag or commit SHA.
    pub git_ref: String,
}

impl GitHubRepository {
    /// Create a repository reference.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            git_ref: git_ref.into(),
        }
    }
}

/// A client for raw file contents of a GitHub repository.
///
/// Endpoints are file paths inside the repository.
pub fn raw_github_client(repository: &GitHubRepository) -> NetworkingClientBuilder {
    NetworkingClientBuilder::new(format!(
        "https://raw.githubusercontent.com/{}/{}/{}/",
        repository.owner, repository.repo, repository.git_ref
    ))
}
