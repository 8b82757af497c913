//! # Host Surfaces
//!
//! The core never looks anything up in a page or terminal. Everything it touches
//! is handed to it as one of these traits, bundled in [`HostSurfaces`].
//!
//! ```text
//! HostSurfaces
//! ├── input: InputField            // text typed by the user
//! ├── messages: MessageList        // the visible transcript
//! ├── thinking: Visibility         // "thinking" indicator
//! ├── privacy_choice: ChoiceGroup  // privacy radio group
//! ├── privacy_popup: Visibility    // privacy popup
//! ├── history_flag: FlagSource     // history-access toggle
//! └── notifier: Notifier           // synchronous user notices
//! ```
//!
//! All methods take `&self`. Implementations use interior mutability and must
//! be callable from any tokio worker.

pub mod memory;

use std::fmt;
use std::sync::Arc;

pub use memory::MemoryHost;

use crate::core::transcript::{OptionSetId, Origin};

/// Opaque reference to one entry in the host's message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(pub usize);

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// How the message list should scroll to its bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
}

pub trait InputField: Send + Sync {
    fn value(&self) -> String;
    fn clear(&self);
}

pub trait MessageList: Send + Sync {
    /// Appends an empty entry for `origin` and returns its handle.
    fn append(&self, origin: Origin) -> SlotHandle;

    /// Replaces the markup shown in `slot`.
    fn set_content(&self, slot: SlotHandle, markup: &str);

    /// Appends one clickable control per label, grouped under `set`.
    fn append_options(&self, set: OptionSetId, labels: &[String]);

    /// Disables every control that belongs to `set`.
    fn disable_options(&self, set: OptionSetId);

    fn scroll_to_bottom(&self, behavior: ScrollBehavior);
}

/// A show/hide toggle (thinking indicator, privacy popup).
pub trait Visibility: Send + Sync {
    fn set_visible(&self, visible: bool);
}

/// A radio group; `None` when nothing is selected.
pub trait ChoiceGroup: Send + Sync {
    fn selected(&self) -> Option<String>;
}

pub trait FlagSource: Send + Sync {
    fn is_set(&self) -> bool;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Every host surface the core reads or writes.
#[derive(Clone)]
pub struct HostSurfaces {
    pub input: Arc<dyn InputField>,
    pub messages: Arc<dyn MessageList>,
    pub thinking: Arc<dyn Visibility>,
    pub privacy_choice: Arc<dyn ChoiceGroup>,
    pub privacy_popup: Arc<dyn Visibility>,
    pub history_flag: Arc<dyn FlagSource>,
    pub notifier: Arc<dyn Notifier>,
}
