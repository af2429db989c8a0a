pub mod error;
pub mod types;

pub use error::{GitHubError, Result};
pub use types::{CommitRef, ContentEntry, FileContents, UpdateFileRequest, UpdateFileResponse};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use types::ErrorBody;

const BASE_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self, accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(USER_AGENT, HeaderValue::from_static("galaxy-bookmarks"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.base_url.trim_end_matches('/'),
            repo,
            path.trim_start_matches('/')
        )
    }

    /// Read a text file and its blob sha from `branch`.
    pub async fn get_file(&self, repo: &str, path: &str, branch: &str) -> Result<FileContents> {
        let url = self.contents_url(repo, path);
        let resp = self
            .client
            .get(&url)
            .query(&[("ref", branch)])
            .bearer_auth(&self.token)
            .headers(self.headers("application/vnd.github+json"))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }

        let entry: ContentEntry = resp.json().await?;
        if entry.kind != "file" {
            return Err(GitHubError::NotAFile(entry.path));
        }

        let text = match entry.content.as_deref() {
            Some(encoded) if !encoded.is_empty() => decode_content(encoded)?,
            // Files over 1 MB come back without inline content.
            _ if entry.size > 0 => self.get_raw(repo, path, branch).await?,
            _ => String::new(),
        };

        tracing::debug!(repo, path, sha = %entry.sha, bytes = text.len(), "Fetched file");

        Ok(FileContents {
            path: entry.path,
            sha: entry.sha,
            text,
        })
    }

    async fn get_raw(&self, repo: &str, path: &str, branch: &str) -> Result<String> {
        let url = self.contents_url(repo, path);
        let resp = self
            .client
            .get(&url)
            .query(&[("ref", branch)])
            .bearer_auth(&self.token)
            .headers(self.headers("application/vnd.github.raw+json"))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }

        Ok(resp.text().await?)
    }

    /// Replace the file with `text`. Fails with [`GitHubError::Conflict`] when
    /// `sha` is no longer the file's current blob.
    pub async fn update_file(
        &self,
        repo: &str,
        path: &str,
        text: &str,
        sha: &str,
        branch: &str,
        message: &str,
    ) -> Result<UpdateFileResponse> {
        let url = self.contents_url(repo, path);
        let body = UpdateFileRequest {
            message: message.to_string(),
            content: STANDARD.encode(text.as_bytes()),
            sha: sha.to_string(),
            branch: branch.to_string(),
        };

        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .headers(self.headers("application/vnd.github+json"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = api_error(status, body);
            return Err(match err {
                GitHubError::Api { status, message } if is_conflict(status, &message) => {
                    GitHubError::Conflict {
                        path: path.to_string(),
                        message,
                    }
                }
                other => other,
            });
        }

        let updated: UpdateFileResponse = resp.json().await?;
        tracing::info!(repo, path, commit = %updated.commit.sha, "File updated");
        Ok(updated)
    }
}

/// Decode the newline-wrapped base64 payload of a contents response.
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

fn api_error(status: StatusCode, body: String) -> GitHubError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or(body);
    GitHubError::Api {
        status: status.as_u16(),
        message,
    }
}

fn is_conflict(status: u16, message: &str) -> bool {
    status == 409 || (status == 422 && message.to_lowercase().contains("sha"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_content_with_line_breaks() {
        let encoded = "PGh0bWw+\nPC9odG1s\nPg==\n";
        assert_eq!(decode_content(encoded).unwrap(), "<html></html>");
    }

    #[test]
    fn test_decode_content_rejects_garbage() {
        assert!(matches!(
            decode_content("not base64!!"),
            Err(GitHubError::Decode(_))
        ));
    }

    #[test]
    fn test_conflict_detection() {
        assert!(is_conflict(409, "is at abc but expected def"));
        assert!(is_conflict(422, "\"sha\" wasn't supplied."));
        assert!(!is_conflict(422, "Invalid request."));
        assert!(!is_conflict(404, "Not Found"));
    }

    #[test]
    fn test_api_error_prefers_message_field() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#.into(),
        );
        match err {
            GitHubError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_contents_url() {
        let client = GitHubClient::new("t".into()).with_base_url("http://localhost:9/");
        assert_eq!(
            client.contents_url("YgalaxyY/BookMarkCore", "/index.html"),
            "http://localhost:9/repos/YgalaxyY/BookMarkCore/contents/index.html"
        );
    }

    #[test]
    fn test_update_response_keeps_commit_link() {
        let body = r#"{"content": {"path": "index.html", "sha": "new"},
            "commit": {"sha": "c0ffee", "html_url": "https://github.com/o/r/commit/c0ffee"}}"#;
        let response: UpdateFileResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.commit.sha, "c0ffee");
        assert_eq!(
            response.commit.html_url.as_deref(),
            Some("https://github.com/o/r/commit/c0ffee")
        );
    }

    #[test]
    fn test_update_request_encodes_content() {
        let req = UpdateFileRequest {
            message: "Add".into(),
            content: STANDARD.encode("hi".as_bytes()),
            sha: "abc".into(),
            branch: "main".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["content"], "aGk=");
        assert_eq!(json["sha"], "abc");
    }
}
