// src/client/session.rs
// Chat session view-model.
//
// Owns everything the browser UI kept in module-level globals: the draft
// text, the staged image, the conversation history, and the accumulated
// response buffer, driven through an explicit composer state machine so
// the whole interaction is testable without a DOM.

use crate::types::{ChatTurn, HistoryEntry, ImageAttachment};

/// The one user-facing error string. No detail is ever surfaced.
pub const GENERIC_TURN_ERROR: &str =
    "Sorry, something went wrong. Check that the relay is running and try again.";

/// Composer states: `Idle → Sending → Streaming → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    /// Inputs enabled, no turn in flight.
    Idle,
    /// Turn submitted, awaiting response headers.
    Sending,
    /// Response body open, deltas arriving.
    Streaming,
}

/// Why a submit was refused. Refusal leaves the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Neither a non-empty message nor a staged image.
    EmptyTurn,
    /// A turn is already in flight; inputs are disabled.
    TurnInFlight,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    state: State,
    draft: String,
    staged_image: Option<ImageAttachment>,
    history: Vec<HistoryEntry>,
    response: String,
    error: Option<&'static str>,
}

/// Internal state, carrying the in-flight message for the history push.
#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Sending {
        message: String,
    },
    Streaming {
        message: String,
    },
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ComposerState {
        match self.state {
            State::Idle => ComposerState::Idle,
            State::Sending { .. } => ComposerState::Sending,
            State::Streaming { .. } => ComposerState::Streaming,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// Update the draft text. Ignored while a turn is in flight (the input
    /// control is disabled).
    pub fn set_draft(&mut self, text: &str) {
        if self.is_idle() {
            self.draft = text.to_string();
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Stage an image for the next turn, replacing any previous one.
    /// Ignored while a turn is in flight.
    pub fn stage_image(&mut self, image: ImageAttachment) {
        if self.is_idle() {
            self.staged_image = Some(image);
        }
    }

    /// Explicit user removal of the staged image.
    pub fn remove_image(&mut self) {
        if self.is_idle() {
            self.staged_image = None;
        }
    }

    pub fn staged_image(&self) -> Option<&ImageAttachment> {
        self.staged_image.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The accumulated response text, rebuilt in full on every delta.
    pub fn rendered(&self) -> &str {
        &self.response
    }

    /// The fixed error string, if the last turn failed.
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Submit the composer: snapshot the outgoing turn and disable inputs.
    ///
    /// Requires a non-empty trimmed message or a staged image, and no turn
    /// already in flight.
    pub fn begin_send(&mut self) -> Result<ChatTurn, SubmitError> {
        if !self.is_idle() {
            return Err(SubmitError::TurnInFlight);
        }

        let message = self.draft.trim().to_string();
        if message.is_empty() && self.staged_image.is_none() {
            return Err(SubmitError::EmptyTurn);
        }

        self.response.clear();
        self.error = None;
        self.state = State::Sending {
            message: message.clone(),
        };

        Ok(ChatTurn {
            history: self.history.clone(),
            message: Some(message),
            image: self.staged_image.clone(),
        })
    }

    /// Response headers arrived with a readable body.
    pub fn streaming_started(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            State::Sending { message } | State::Streaming { message } => {
                State::Streaming { message }
            }
            State::Idle => State::Idle,
        };
    }

    /// Apply one decoded delta to the response buffer.
    pub fn apply_delta(&mut self, text: &str) {
        self.response.push_str(text);
    }

    /// Stream completed. Records the exchange in the history, clears the
    /// composer, and re-enables inputs.
    pub fn finish_turn(&mut self) {
        let message = match std::mem::take(&mut self.state) {
            State::Sending { message } | State::Streaming { message } => message,
            State::Idle => return,
        };

        if !self.response.is_empty() {
            self.history.push(HistoryEntry::user(message));
            self.history.push(HistoryEntry::model(self.response.clone()));
        }

        self.clear_composer();
    }

    /// Any failure, at any state: fixed generic error in place of content,
    /// composer cleared, inputs re-enabled.
    pub fn fail_turn(&mut self) {
        self.state = State::Idle;
        self.response.clear();
        self.error = Some(GENERIC_TURN_ERROR);
        self.clear_composer();
    }

    fn clear_composer(&mut self) {
        self.draft.clear();
        self.staged_image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn png() -> ImageAttachment {
        ImageAttachment {
            data: "aGVsbG8=".into(),
            mime_type: "image/png".into(),
        }
    }

    #[test]
    fn test_successful_turn_accumulates_and_resets() {
        let mut session = ChatSession::new();
        session.set_draft("say hello");

        let turn = session.begin_send().unwrap();
        assert_eq!(turn.message.as_deref(), Some("say hello"));
        assert_eq!(session.state(), ComposerState::Sending);

        session.streaming_started();
        assert_eq!(session.state(), ComposerState::Streaming);

        for chunk in ["Hel", "lo, ", "world!"] {
            session.apply_delta(chunk);
        }
        assert_eq!(session.rendered(), "Hello, world!");

        session.finish_turn();
        assert!(session.is_idle());
        assert_eq!(session.draft(), "");
        assert!(session.staged_image().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_success_appends_history_in_order() {
        let mut session = ChatSession::new();
        session.set_draft("hi");
        session.begin_send().unwrap();
        session.streaming_started();
        session.apply_delta("hey there");
        session.finish_turn();

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, Role::User);
        assert_eq!(session.history()[0].parts[0].text, "hi");
        assert_eq!(session.history()[1].role, Role::Model);
        assert_eq!(session.history()[1].parts[0].text, "hey there");
    }

    #[test]
    fn test_empty_submit_refused() {
        let mut session = ChatSession::new();
        session.set_draft("   ");
        assert_eq!(session.begin_send(), Err(SubmitError::EmptyTurn));
        assert!(session.is_idle());
    }

    #[test]
    fn test_image_only_submit_allowed() {
        let mut session = ChatSession::new();
        session.stage_image(png());
        let turn = session.begin_send().unwrap();
        assert_eq!(turn.message.as_deref(), Some(""));
        assert!(turn.image.is_some());
    }

    #[test]
    fn test_single_turn_in_flight() {
        let mut session = ChatSession::new();
        session.set_draft("one");
        session.begin_send().unwrap();

        assert_eq!(session.begin_send(), Err(SubmitError::TurnInFlight));
        // Inputs are disabled mid-flight.
        session.set_draft("two");
        assert_eq!(session.draft(), "one");
        session.stage_image(png());
        assert!(session.staged_image().is_none());
    }

    #[test]
    fn test_failure_shows_generic_error_and_resets() {
        let mut session = ChatSession::new();
        session.set_draft("hello");
        session.stage_image(png());
        session.begin_send().unwrap();
        session.streaming_started();
        session.apply_delta("partial out");

        session.fail_turn();
        assert!(session.is_idle());
        assert_eq!(session.error(), Some(GENERIC_TURN_ERROR));
        assert_eq!(session.rendered(), "");
        assert_eq!(session.draft(), "");
        assert!(session.staged_image().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_error_cleared_on_next_send() {
        let mut session = ChatSession::new();
        session.set_draft("first");
        session.begin_send().unwrap();
        session.fail_turn();
        assert!(session.error().is_some());

        session.set_draft("second");
        session.begin_send().unwrap();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_turn_snapshot_carries_history() {
        let mut session = ChatSession::new();
        session.set_draft("a");
        session.begin_send().unwrap();
        session.streaming_started();
        session.apply_delta("b");
        session.finish_turn();

        session.set_draft("c");
        let turn = session.begin_send().unwrap();
        assert_eq!(turn.history.len(), 2);
    }
}
