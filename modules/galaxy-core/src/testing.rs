// Test mocks for the bot core.
//
// - MockChatModel (ChatModel): per-model scripted answers, failures or stalls
// - MockDocumentStore (DocumentStore): in-memory document with revisions
// - RecordingProgress (Progress): collects status lines
// - FixedClassifier (Classifier): returns a preset record

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use galaxy_common::{Category, ClassificationRecord};

use crate::traits::{
    ChatModel, Classifier, CompletionRequest, DocumentStore, Progress, RemoteDocument, StoreError,
};

// ---------------------------------------------------------------------------
// MockChatModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Scripted {
    Answer(String),
    Fail(String),
    Stall(Duration),
}

/// Scripted chat model. Unregistered models fail.
/// Builder pattern: `.on_answer()`, `.on_error()`, `.on_stall()`.
#[derive(Default)]
pub struct MockChatModel {
    scripts: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_answer(mut self, model: &str, answer: &str) -> Self {
        self.scripts
            .insert(model.to_string(), Scripted::Answer(answer.to_string()));
        self
    }

    pub fn on_error(mut self, model: &str, message: &str) -> Self {
        self.scripts
            .insert(model.to_string(), Scripted::Fail(message.to_string()));
        self
    }

    /// Never answer within `delay`; pair with a shorter cascade timeout.
    pub fn on_stall(mut self, model: &str, delay: Duration) -> Self {
        self.scripts.insert(model.to_string(), Scripted::Stall(delay));
        self
    }

    /// Models called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        self.calls.lock().unwrap().push(request.model.to_string());
        match self.scripts.get(request.model) {
            Some(Scripted::Answer(text)) => Ok(text.clone()),
            Some(Scripted::Fail(message)) => bail!("{message}"),
            Some(Scripted::Stall(delay)) => {
                tokio::time::sleep(*delay).await;
                bail!("stalled model answered too late")
            }
            None => bail!("MockChatModel: no script for model {}", request.model),
        }
    }
}

// ---------------------------------------------------------------------------
// MockDocumentStore
// ---------------------------------------------------------------------------

struct DocumentState {
    content: String,
    revision: u64,
    writes: Vec<String>,
    fail_reads: bool,
    conflict_next_write: bool,
}

/// In-memory document. Each successful write bumps the revision.
pub struct MockDocumentStore {
    state: Mutex<DocumentState>,
}

impl MockDocumentStore {
    pub fn new(content: &str) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                content: content.to_string(),
                revision: 1,
                writes: Vec::new(),
                fail_reads: false,
                conflict_next_write: false,
            }),
        }
    }

    /// A document with every category's marker, one per line.
    pub fn with_all_markers() -> Self {
        let mut content = String::from("<html><body>\n");
        for category in Category::ALL {
            content.push_str(&format!("<section id=\"{category}\">\n"));
            content.push_str(&category.marker());
            content.push_str("\n</section>\n");
        }
        content.push_str("</body></html>\n");
        Self::new(&content)
    }

    pub fn failing_reads(self) -> Self {
        self.state.lock().unwrap().fail_reads = true;
        self
    }

    /// Simulate a concurrent edit landing before the next write.
    pub fn conflict_on_next_write(&self) {
        self.state.lock().unwrap().conflict_next_write = true;
    }

    pub fn content(&self) -> String {
        self.state.lock().unwrap().content.clone()
    }

    /// Commit messages of successful writes, in order.
    pub fn commit_messages(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes.len()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn read(&self) -> std::result::Result<RemoteDocument, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(StoreError::Other("read failed".to_string()));
        }
        Ok(RemoteDocument {
            content: state.content.clone(),
            revision: state.revision.to_string(),
        })
    }

    async fn write(
        &self,
        content: &str,
        expected_revision: &str,
        message: &str,
    ) -> std::result::Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.conflict_next_write {
            state.conflict_next_write = false;
            state.revision += 1;
            return Err(StoreError::Conflict("document was modified".to_string()));
        }
        if expected_revision != state.revision.to_string() {
            return Err(StoreError::Conflict(format!(
                "expected revision {expected_revision}, found {}",
                state.revision
            )));
        }
        state.content = content.to_string();
        state.revision += 1;
        state.writes.push(message.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingProgress
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingProgress {
    lines: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl Progress for RecordingProgress {
    async fn update(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

// ---------------------------------------------------------------------------
// FixedClassifier
// ---------------------------------------------------------------------------

/// Returns the same record for every post and counts calls.
pub struct FixedClassifier {
    record: ClassificationRecord,
    calls: Mutex<usize>,
}

impl FixedClassifier {
    pub fn new(record: ClassificationRecord) -> Self {
        Self {
            record,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _text: &str, _progress: Option<&dyn Progress>) -> ClassificationRecord {
        *self.calls.lock().unwrap() += 1;
        self.record.clone()
    }
}
