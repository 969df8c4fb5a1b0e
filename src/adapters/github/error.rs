use thiserror::Error;

/// Errors raised by the GitHub adapter.
///
/// Non-2xx responses are not errors at this level: the client hands them back
/// to the caller, which decides whether pagination ends.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub token is empty")]
    MissingToken,

    #[error("Request to {url} failed after {attempts} attempt(s): {source}")]
    Network {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
