//! Session: one watched transcript and the snapshot it was last seen in.
//!
//! A tick runs detect → assemble → complete → write to completion before the
//! next one starts. The snapshot only moves forward on outcomes that are not
//! failures, so a failed request is retried on the next edit.

use quill_core::{
    config::DocumentFormat,
    context::Context,
    error::QuillError,
    message::Reply,
    traits::Provider,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::assemble::assemble;
use crate::detect::{detect, Detection};
use crate::writer::append_reply;


/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Document identical to the last snapshot.
    Unchanged,
    /// Edited, but no completed user turn yet.
    Waiting,
    /// The newest content is already a reply.
    SkippedReply,
    /// A reply was written back to the document.
    Replied {
        reply: Reply,
        /// Number of turns sent upstream, the new user turn included.
        context_turns: usize,
    },
}

/// Engine state for one transcript document.
pub struct Session {
    path: PathBuf,
    format: DocumentFormat,
    system_prompt: String,
    previous: String,
}

impl Session {
    /// Create a session with an explicit starting snapshot.
    pub fn new(path: PathBuf, format: DocumentFormat, previous: String) -> Self {
        Self {
            path,
            format,
            system_prompt: String::new(),
            previous,
        }
    }

    /// Create a session whose starting snapshot is the document as it is now.
    ///
    /// A missing document starts from an empty snapshot.
    pub async fn open(path: PathBuf, format: DocumentFormat) -> Result<Self, QuillError> {
        let previous = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(QuillError::Document(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        debug!("load: initial snapshot of {} bytes", previous.len());
        Ok(Self::new(path, format, previous))
    }

    /// Set the system prompt sent with every request.
    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.system_prompt = system_prompt.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// The last snapshot the engine accepted.
    pub fn previous(&self) -> &str {
        &self.previous
    }

    /// Read the document and process it.
    pub async fn tick(&mut self, provider: &dyn Provider) -> Result<TickOutcome, QuillError> {
        let current = self.read_document().await?;
        self.process(current, provider).await
    }

    /// Process one snapshot of the document.
    pub async fn process(
        &mut self,
        current: String,
        provider: &dyn Provider,
    ) -> Result<TickOutcome, QuillError> {
        let pending = match detect(self.format, &self.previous, &current) {
            Detection::NoChange => {
                debug!("unchanged: no new content");
                return Ok(TickOutcome::Unchanged);
            }
            Detection::WaitingForTerminator => {
                debug!("skip: waiting for double enter");
                self.previous = current;
                return Ok(TickOutcome::Waiting);
            }
            Detection::ReplyIsLast => {
                debug!("skip: last message is a reply");
                self.previous = current;
                return Ok(TickOutcome::SkippedReply);
            }
            Detection::NewUserTurn(pending) => pending,
        };

        let turns = assemble(self.format, &pending.preceding, &pending.text);
        let context_turns = turns.len();
        info!(
            "call: sending {context_turns} turns to {} ({})",
            provider.name(),
            preview(&pending.text)
        );

        let context = Context::new(&self.system_prompt, turns);
        let reply = provider.complete(&context).await?;
        if reply.text.trim().is_empty() {
            return Err(QuillError::Provider(format!(
                "{} returned an empty reply",
                provider.name()
            )));
        }

        append_reply(&self.path, self.format, &reply.text).await?;
        // The snapshot must contain the reply and anything typed meanwhile.
        self.previous = self.read_document().await?;

        info!(
            "write: added {} reply ({} chars, {}ms)",
            reply.metadata.provider_used,
            reply.text.chars().count(),
            reply.metadata.processing_time_ms
        );
        Ok(TickOutcome::Replied {
            reply,
            context_turns,
        })
    }

    async fn read_document(&self) -> Result<String, QuillError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            QuillError::Document(format!("failed to read {}: {e}", self.path.display()))
        })
    }
}

/// First line of a turn, cut to 60 characters for log lines.
fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() > 60 || text.contains('\n') {
        let truncated: String = first.chars().take(60).collect();
        format!("{truncated}...")
    } else {
        first.to_string()
    }
}
