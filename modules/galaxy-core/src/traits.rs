// Trait seams for the bot's external collaborators.
//
// ChatModel    : one chat-completion call against a named model.
// DocumentStore: read/write of the shared HTML document with a revision token.
// Progress     : status line shown to the user while work is in flight.
// Classifier   : text in, ClassificationRecord out; never fails.
//
// Production implementations wrap the HTTP clients; tests use the mocks in
// `crate::testing`.

use anyhow::Result;
use async_trait::async_trait;
use galaxy_common::ClassificationRecord;
use github_client::GitHubClient;

// ---------------------------------------------------------------------------
// ChatModel
// ---------------------------------------------------------------------------

/// A single system + user completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Raw text of the model's answer.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

#[async_trait]
impl ChatModel for ai_client::InferenceClient {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let options = ai_client::ChatOptions::default()
            .max_tokens(request.max_tokens)
            .temperature(request.temperature);
        Ok(ai_client::InferenceClient::complete(
            self,
            request.model,
            request.system,
            request.user,
            options,
        )
        .await?)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Progress: Send + Sync {
    /// Replace the visible status line. Failures are the implementor's problem.
    async fn update(&self, text: &str);
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str, progress: Option<&dyn Progress>) -> ClassificationRecord;
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Current document text plus the token a write must be conditioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub content: String,
    pub revision: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document changed since it was read.
    #[error("revision conflict: {0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Other(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self) -> std::result::Result<RemoteDocument, StoreError>;

    /// Replace the document, but only if it is still at `expected_revision`.
    async fn write(
        &self,
        content: &str,
        expected_revision: &str,
        message: &str,
    ) -> std::result::Result<(), StoreError>;
}

/// One file in one branch of a GitHub repository.
pub struct GitHubDocument {
    client: GitHubClient,
    repo: String,
    path: String,
    branch: String,
}

impl GitHubDocument {
    pub fn new(
        client: GitHubClient,
        repo: impl Into<String>,
        path: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            client,
            repo: repo.into(),
            path: path.into(),
            branch: branch.into(),
        }
    }
}

fn store_error(err: github_client::GitHubError) -> StoreError {
    if err.is_conflict() {
        StoreError::Conflict(err.to_string())
    } else {
        StoreError::Other(err.to_string())
    }
}

#[async_trait]
impl DocumentStore for GitHubDocument {
    async fn read(&self) -> std::result::Result<RemoteDocument, StoreError> {
        let file = self
            .client
            .get_file(&self.repo, &self.path, &self.branch)
            .await
            .map_err(store_error)?;
        Ok(RemoteDocument {
            content: file.text,
            revision: file.sha,
        })
    }

    async fn write(
        &self,
        content: &str,
        expected_revision: &str,
        message: &str,
    ) -> std::result::Result<(), StoreError> {
        let response = self
            .client
            .update_file(
                &self.repo,
                &self.path,
                content,
                expected_revision,
                &self.branch,
                message,
            )
            .await
            .map_err(store_error)?;
        tracing::info!(
            commit = %response.commit.sha,
            url = response.commit.html_url.as_deref().unwrap_or_default(),
            path = %self.path,
            "Document updated"
        );
        Ok(())
    }
}
