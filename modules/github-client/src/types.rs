use serde::{Deserialize, Serialize};

/// Entry returned by `GET /repos/{repo}/contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    /// Base64 with embedded newlines. Empty for files over 1 MB.
    #[serde(default)]
    pub content: Option<String>,
}

/// Decoded text file plus the blob sha required to update it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    pub path: String,
    pub sha: String,
    pub text: String,
}

/// Body of `PUT /repos/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateFileRequest {
    pub message: String,
    /// Base64-encoded new content.
    pub content: String,
    /// Blob sha of the version being replaced.
    pub sha: String,
    pub branch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFileResponse {
    pub commit: CommitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}
