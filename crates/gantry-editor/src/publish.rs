//! Save/publish state machine.
//!
//! ```text
//!            edit                 publish()          progress == 100
//!   Clean ─────────► Dirty ───────────────► Publishing ─────────────► Clean
//!     ▲                │                      (0..100)                (published)
//!     └──── save() ────┘
//! ```
//!
//! A publish works on a snapshot taken when it starts. Edits made while it is
//! in flight are not part of what gets published, and leave the editor dirty
//! once it completes.

use gantry_flow::FlowGraph;

use crate::error::EditorError;

/// Observable editor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorStatus {
  /// No edits since the last save or publish.
  Clean,
  /// Edits pending.
  Dirty,
  Publishing { progress: u8 },
}

/// Outcome of one publish tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishStep {
  /// Progress advanced, publish still running.
  Progress(u8),
  /// Progress reached 100. The snapshot is marked published and must now be
  /// committed; report the outcome with `finish_publish` or `abort_publish`.
  Complete {
    snapshot: FlowGraph,
    revision: u64,
  },
}

#[derive(Debug, Clone)]
struct PublishRun {
  progress: u8,
  snapshot: FlowGraph,
  revision: u64,
}

/// Tracks unsaved changes and drives the scripted publish sequence.
#[derive(Debug, Clone)]
pub struct PublishStateMachine {
  unsaved_changes: bool,
  published: bool,
  /// Bumped on every structural edit.
  revision: u64,
  step: u8,
  run: Option<PublishRun>,
}

impl PublishStateMachine {
  /// A clean state for a flow that is (or is not yet) published.
  pub fn new(published: bool, step: u8) -> Self {
    Self {
      unsaved_changes: false,
      published,
      revision: 0,
      step: step.clamp(1, 100),
      run: None,
    }
  }

  pub fn status(&self) -> EditorStatus {
    match &self.run {
      Some(run) => EditorStatus::Publishing {
        progress: run.progress,
      },
      None if self.unsaved_changes => EditorStatus::Dirty,
      None => EditorStatus::Clean,
    }
  }

  pub fn unsaved_changes(&self) -> bool {
    self.unsaved_changes
  }

  pub fn published(&self) -> bool {
    self.published
  }

  pub fn is_publishing(&self) -> bool {
    self.run.is_some()
  }

  /// Progress of the running publish, if any.
  pub fn progress(&self) -> Option<u8> {
    self.run.as_ref().map(|run| run.progress)
  }

  /// Current edit revision.
  pub fn revision(&self) -> u64 {
    self.revision
  }

  /// Record a structural edit.
  pub fn mark_dirty(&mut self) {
    self.revision += 1;
    self.unsaved_changes = true;
  }

  /// Record that the flow is published. Never reverts.
  pub fn mark_published(&mut self) {
    self.published = true;
  }

  /// Record a successful save of the flow as it was at `revision`.
  pub fn mark_saved(&mut self, revision: u64) {
    self.unsaved_changes = self.revision != revision;
  }

  /// Whether the publish control is enabled.
  ///
  /// The control is disabled while publishing, or when there are no unsaved
  /// changes and the flow was never published. An untouched, never-published
  /// flow cannot be published until it is edited.
  pub fn can_publish(&self) -> bool {
    let disabled =
      self.is_publishing() || (!self.unsaved_changes && !self.published);
    !disabled
  }

  /// Start publishing `snapshot`, taken from the live flow at `revision`.
  pub fn begin_publish(&mut self, snapshot: FlowGraph, revision: u64) -> Result<(), EditorError> {
    if self.is_publishing() {
      return Err(EditorError::AlreadyPublishing);
    }
    if !self.can_publish() {
      return Err(EditorError::PublishDisabled);
    }

    self.run = Some(PublishRun {
      progress: 0,
      snapshot,
      revision,
    });
    Ok(())
  }

  /// Advance the running publish by one step.
  pub fn advance(&mut self) -> Result<PublishStep, EditorError> {
    let run = self.run.as_mut().ok_or(EditorError::NotPublishing)?;
    run.progress = run.progress.saturating_add(self.step).min(100);

    if run.progress < 100 {
      return Ok(PublishStep::Progress(run.progress));
    }

    // Keep the run (at 100) until the commit outcome is reported
    let mut snapshot = run.snapshot.clone();
    snapshot.published = true;
    Ok(PublishStep::Complete {
      snapshot,
      revision: run.revision,
    })
  }

  /// The completed snapshot was committed.
  pub fn finish_publish(&mut self, revision: u64) {
    self.run = None;
    self.published = true;
    self.mark_saved(revision);
  }

  /// The completed snapshot could not be committed; back to the prior state.
  pub fn abort_publish(&mut self) {
    self.run = None;
  }
}
