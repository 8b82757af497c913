//! # Transcript Store
//!
//! Append-only record of the conversation, mirrored into the host's message
//! list as it grows. Messages are immutable once created; the only thing that
//! ever changes after the fact is an option set flipping to disabled.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::markdown;
use crate::host::{InputField, MessageList, ScrollBehavior, SlotHandle};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "bot")]
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    origin: Origin,
    raw_text: String,
    rendered_at: DateTime<Utc>,
}

impl Message {
    fn new(origin: Origin, raw_text: &str) -> Self {
        Self {
            origin,
            raw_text: raw_text.to_string(),
            rendered_at: Utc::now(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn rendered_at(&self) -> DateTime<Utc> {
        self.rendered_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionSetId(Uuid);

impl OptionSetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OptionSetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OptionSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Single-use follow-up choices attached to one bot message.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSet {
    pub id: OptionSetId,
    pub labels: Vec<String>,
    pub disabled: bool,
    /// Index of the bot message the set belongs to.
    pub message_index: usize,
}

/// What `append_bot` hands back: the recorded message, the empty slot the
/// reveal should write into, and the option set if one was attached.
#[derive(Debug, Clone)]
pub struct BotEntry {
    pub message: Message,
    pub slot: SlotHandle,
    pub options: Option<OptionSetId>,
}

pub struct Transcript {
    list: Arc<dyn MessageList>,
    input: Arc<dyn InputField>,
    messages: Vec<Message>,
    option_sets: Vec<OptionSet>,
}

impl Transcript {
    pub fn new(list: Arc<dyn MessageList>, input: Arc<dyn InputField>) -> Self {
        Self {
            list,
            input,
            messages: Vec::new(),
            option_sets: Vec::new(),
        }
    }

    /// Records and shows the user's message, then clears the input field.
    ///
    /// User text is escaped but not rendered as markdown.
    pub fn append_user(&mut self, text: &str) -> Message {
        let message = Message::new(Origin::User, text);
        let slot = self.list.append(Origin::User);
        self.list.set_content(slot, &markdown::escape(text));
        self.list.scroll_to_bottom(ScrollBehavior::Smooth);
        self.input.clear();
        debug!("Appended user message at {}", slot);
        self.messages.push(message.clone());
        message
    }

    /// Records a bot message and appends an empty slot for its reveal.
    /// Non-empty `options` become a fresh option set.
    pub fn append_bot(&mut self, raw_text: &str, options: &[String]) -> BotEntry {
        let message = Message::new(Origin::Bot, raw_text);
        let slot = self.list.append(Origin::Bot);
        self.messages.push(message.clone());

        let options = if options.is_empty() {
            None
        } else {
            let id = OptionSetId::new();
            self.list.append_options(id, options);
            self.option_sets.push(OptionSet {
                id,
                labels: options.to_vec(),
                disabled: false,
                message_index: self.messages.len() - 1,
            });
            debug!("Attached option set {} ({} options)", id, options.len());
            Some(id)
        };

        self.list.scroll_to_bottom(ScrollBehavior::Smooth);
        BotEntry {
            message,
            slot,
            options,
        }
    }

    /// Disables every control in the set. Returns `true` only for the call that
    /// actually disabled it; unknown or already-disabled sets return `false`.
    pub fn disable_option_set(&mut self, id: OptionSetId) -> bool {
        let Some(set) = self.option_sets.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if set.disabled {
            return false;
        }
        set.disabled = true;
        self.list.disable_options(id);
        debug!("Disabled option set {}", id);
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn option_set(&self, id: OptionSetId) -> Option<&OptionSet> {
        self.option_sets.iter().find(|s| s.id == id)
    }

    /// Most recently attached option set, disabled or not.
    pub fn latest_option_set(&self) -> Option<&OptionSet> {
        self.option_sets.last()
    }
}
