//! # Interaction Controller
//!
//! The one place host events turn into backend calls:
//!
//! ```text
//! submit() ─► validate ─► history gate ─► append user ─► query ─┐
//! choose_option() ─► disable set ─► submit_option ──────────────┤
//! submit_privacy() ─► selection? ─► hide popup ─► submit_option ┤
//!                                                               ▼
//!                          cancel reveal ─► append bot ─► start reveal
//! ```
//!
//! Validation failures are reported through the host notifier and stop the
//! action before anything is sent or recorded. Backend failures are not
//! special: they come back as an `Error: ...` reply and render like any other.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::api::{Backend, PrivacyRequest, Reply, SearchRequest};
use crate::core::markdown;
use crate::core::reveal::{OnComplete, RevealAnimator, RevealConfig, RevealMode};
use crate::core::transcript::{Message, OptionSet, OptionSetId, Transcript};
use crate::host::{HostSurfaces, Visibility};

/// Phrases that mark a query as asking about the user's browsing history.
pub const HISTORY_KEYWORDS: &[&str] = &[
    "browser history",
    "visited sites",
    "recent tabs",
    "history",
    "my history",
    "what did i visit",
];

/// Case-insensitive substring match against [`HISTORY_KEYWORDS`].
pub fn is_browser_history_query(query: &str) -> bool {
    let query = query.to_lowercase();
    HISTORY_KEYWORDS.iter().any(|keyword| query.contains(keyword))
}

/// Why an action was refused before any request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyInput,
    HistoryAccessDisabled,
    NoPrivacySelection,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::EmptyInput => write!(f, "Please enter a query before submitting."),
            Rejection::HistoryAccessDisabled => write!(
                f,
                "History access is disabled. Please enable it to ask history-related questions."
            ),
            Rejection::NoPrivacySelection => {
                write!(f, "Please select an option before submitting.")
            }
        }
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A request went out; this is what got rendered for it.
    Sent(Reply),
    Rejected(Rejection),
    /// Nothing to do (unknown or already used option set).
    Ignored,
}

/// Shows the thinking indicator for as long as it lives and hides it exactly
/// once on drop, whichever way the request settles.
struct ThinkingGuard {
    indicator: Arc<dyn Visibility>,
}

impl ThinkingGuard {
    fn show(indicator: &Arc<dyn Visibility>) -> Self {
        indicator.set_visible(true);
        Self {
            indicator: indicator.clone(),
        }
    }
}

impl Drop for ThinkingGuard {
    fn drop(&mut self) {
        self.indicator.set_visible(false);
    }
}

pub struct Controller {
    host: HostSurfaces,
    backend: Arc<dyn Backend>,
    transcript: Mutex<Transcript>,
    animator: RevealAnimator,
}

impl Controller {
    pub fn new(host: HostSurfaces, backend: Arc<dyn Backend>, reveal: RevealConfig) -> Self {
        let transcript = Transcript::new(host.messages.clone(), host.input.clone());
        let animator = RevealAnimator::new(host.messages.clone(), reveal);
        info!("Controller ready (backend: {})", backend.name());
        Self {
            host,
            backend,
            transcript: Mutex::new(transcript),
            animator,
        }
    }

    fn transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn animator(&self) -> &RevealAnimator {
        &self.animator
    }

    pub fn messages(&self) -> Vec<Message> {
        self.transcript().messages().to_vec()
    }

    pub fn option_set(&self, id: OptionSetId) -> Option<OptionSet> {
        self.transcript().option_set(id).cloned()
    }

    pub fn latest_option_set(&self) -> Option<OptionSet> {
        self.transcript().latest_option_set().cloned()
    }

    /// Shows the initial bot line with the cursor-mode reveal.
    pub fn greet(&self, text: &str, on_complete: Option<OnComplete>) -> Message {
        let entry = self.transcript().append_bot(text, &[]);
        self.animator.start(
            entry.slot,
            &markdown::render(text),
            RevealMode::Cursor,
            on_complete,
        );
        entry.message
    }

    /// Free-text submission. Reads the input field and the history flag at
    /// call time.
    pub async fn submit(&self) -> Outcome {
        let raw = self.host.input.value();
        let query = raw.trim();
        if query.is_empty() {
            return self.reject(Rejection::EmptyInput);
        }

        let history_access = self.host.history_flag.is_set();
        if is_browser_history_query(query) && !history_access {
            return self.reject(Rejection::HistoryAccessDisabled);
        }

        self.transcript().append_user(query);

        let request = SearchRequest {
            query: query.to_string(),
            history_access,
        };
        let result = {
            let _thinking = ThinkingGuard::show(&self.host.thinking);
            self.backend.query(&request).await
        };
        Outcome::Sent(self.render(Reply::from_search(result)))
    }

    /// A click on one option of `set`. The whole set is disabled before the
    /// request goes out, so a second click can never send a duplicate.
    pub async fn choose_option(&self, set: OptionSetId, label: &str) -> Outcome {
        {
            let mut transcript = self.transcript();
            let usable = transcript
                .option_set(set)
                .is_some_and(|s| !s.disabled && s.labels.iter().any(|l| l == label));
            if !usable || !transcript.disable_option_set(set) {
                info!("Ignoring click on {:?} in option set {}", label, set);
                return Outcome::Ignored;
            }
        }
        Outcome::Sent(self.send_option(label).await)
    }

    pub fn show_privacy_popup(&self) {
        self.host.privacy_popup.set_visible(true);
    }

    /// Submits whatever is selected in the privacy radio group.
    pub async fn submit_privacy(&self) -> Outcome {
        let Some(choice) = self.host.privacy_choice.selected() else {
            return self.reject(Rejection::NoPrivacySelection);
        };
        self.host.privacy_popup.set_visible(false);
        Outcome::Sent(self.send_option(&choice).await)
    }

    /// Asks the server to turn history access on for this session.
    pub async fn enable_history(&self) -> Outcome {
        let result = {
            let _thinking = ThinkingGuard::show(&self.host.thinking);
            self.backend.enable_history().await
        };
        Outcome::Sent(self.render(Reply::from_privacy(result)))
    }

    async fn send_option(&self, label: &str) -> Reply {
        let request = PrivacyRequest {
            option: label.to_string(),
        };
        let result = {
            let _thinking = ThinkingGuard::show(&self.host.thinking);
            self.backend.submit_option(&request).await
        };
        self.render(Reply::from_privacy(result))
    }

    fn reject(&self, rejection: Rejection) -> Outcome {
        warn!("Rejected input: {:?}", rejection);
        self.host.notifier.notify(&rejection.to_string());
        Outcome::Rejected(rejection)
    }

    /// Replaces any running reveal with this reply.
    fn render(&self, reply: Reply) -> Reply {
        if reply.failed {
            warn!("Rendering failed request as chat line: {}", reply.text);
        }
        let entry = self.transcript().append_bot(&reply.text, &reply.options);
        self.animator.start(
            entry.slot,
            &markdown::render(&reply.text),
            RevealMode::Accumulate,
            None,
        );
        reply
    }
}
