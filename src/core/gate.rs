//! Decides when a message's text gets parsed for artifacts.
//!
//! Parsing on every streamed token would redo the same work hundreds of
//! times per reply, so the gate keeps messages in [`RenderPhase::Streaming`]
//! until the completion signal and then runs the extractor exactly once.
//! The result is cached on the message and reused on later renders until
//! the raw text changes.

use tracing::debug;

use crate::core::artifact::Artifact;
use crate::core::extract::{ArtifactExtractor, Extraction};
use crate::core::message::{ArtifactOrigin, ChatMessage, RenderPhase};

/// What a gate call did to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Still streaming; nothing parsed.
    Deferred,
    /// The extractor ran and found this many artifacts.
    Extracted(usize),
    /// Server-supplied artifacts were kept as-is.
    UsedBackend,
    /// The message was already settled for its current text.
    Cached,
    /// Not an assistant message; settled without parsing.
    Skipped,
}

pub struct ArtifactGate<E> {
    extractor: E,
}

impl<E: ArtifactExtractor> ArtifactGate<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Appends a streamed chunk. Never parses.
    pub fn append_chunk(&self, msg: &mut ChatMessage, chunk: &str) -> GateOutcome {
        if msg.phase != RenderPhase::Streaming {
            debug!(id = %msg.id, "chunk for a finished message, reopening stream");
            msg.phase = RenderPhase::Streaming;
        }
        msg.raw.push_str(chunk);
        msg.content.push_str(chunk);
        GateOutcome::Deferred
    }

    /// Handles the completion signal for a streamed message.
    ///
    /// `backend_artifacts` are the artifacts attached to the final payload,
    /// if any; a non-empty list wins over local extraction.
    pub fn complete(
        &self,
        msg: &mut ChatMessage,
        backend_artifacts: Option<Vec<Artifact>>,
    ) -> GateOutcome {
        if let Some(artifacts) = backend_artifacts.filter(|a| !a.is_empty()) {
            msg.artifacts = Some(artifacts);
            msg.artifact_origin = Some(ArtifactOrigin::Backend);
        }
        match msg.phase {
            RenderPhase::Streaming => {
                msg.phase = RenderPhase::JustFinished;
                self.settle(msg)
            }
            RenderPhase::JustFinished => self.settle(msg),
            RenderPhase::Settled => self.refresh(msg),
        }
    }

    /// Called on render. Settles messages that have not been parsed and
    /// re-parses settled ones whose raw text changed.
    pub fn refresh(&self, msg: &mut ChatMessage) -> GateOutcome {
        match msg.phase {
            RenderPhase::Streaming => GateOutcome::Deferred,
            RenderPhase::JustFinished => self.settle(msg),
            RenderPhase::Settled => {
                if msg.settled_fingerprint == Some(msg.raw_fingerprint()) {
                    return GateOutcome::Cached;
                }
                debug!(id = %msg.id, "raw text changed since settling");
                if msg.artifact_origin == Some(ArtifactOrigin::Local) {
                    msg.artifacts = None;
                    msg.artifact_origin = None;
                }
                msg.content = msg.raw.clone();
                msg.phase = RenderPhase::JustFinished;
                self.settle(msg)
            }
        }
    }

    /// The `JustFinished -> Settled` step.
    fn settle(&self, msg: &mut ChatMessage) -> GateOutcome {
        debug_assert_eq!(msg.phase, RenderPhase::JustFinished);
        let outcome = if msg.has_artifacts() {
            if msg.artifact_origin.is_none() {
                msg.artifact_origin = Some(ArtifactOrigin::Backend);
            }
            GateOutcome::UsedBackend
        } else if !msg.role.is_assistant() {
            GateOutcome::Skipped
        } else {
            let Extraction { content, artifacts } = self.extractor.extract(&msg.raw, &msg.id);
            let count = artifacts.len();
            msg.content = content;
            if count > 0 {
                msg.artifacts = Some(artifacts);
                msg.artifact_origin = Some(ArtifactOrigin::Local);
            } else {
                msg.artifacts = None;
                msg.artifact_origin = None;
            }
            GateOutcome::Extracted(count)
        };
        msg.phase = RenderPhase::Settled;
        msg.settled_fingerprint = Some(msg.raw_fingerprint());
        debug!(id = %msg.id, ?outcome, "message settled");
        outcome
    }
}
