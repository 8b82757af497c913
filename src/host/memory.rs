//! Headless host that keeps every surface in memory.
//!
//! Used by the test suites and by embedders that drive the core without a
//! page or terminal. Every write is recorded so callers can inspect not only
//! the current state but how it was reached (e.g. how many times the thinking
//! indicator was hidden).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{
    ChoiceGroup, FlagSource, HostSurfaces, InputField, MessageList, Notifier, ScrollBehavior,
    SlotHandle, Visibility,
};
use crate::core::transcript::{OptionSetId, Origin};

/// One entry of the in-memory message list.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub origin: Origin,
    pub content: String,
    /// Number of `set_content` calls that hit this entry.
    pub writes: usize,
}

/// One group of option controls.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionGroup {
    pub set: OptionSetId,
    pub labels: Vec<String>,
    pub disabled: bool,
    /// Number of `disable_options` calls for this group.
    pub disable_calls: usize,
}

#[derive(Default)]
pub struct MemoryInput {
    value: Mutex<String>,
}

impl MemoryInput {
    /// Simulates the user typing into the field.
    pub fn set(&self, value: &str) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value.to_string();
    }
}

impl InputField for MemoryInput {
    fn value(&self) -> String {
        self.value.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn clear(&self) {
        self.value.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[derive(Default)]
pub struct MemoryMessageList {
    entries: Mutex<Vec<Entry>>,
    options: Mutex<Vec<OptionGroup>>,
    scrolls: Mutex<Vec<ScrollBehavior>>,
}

impl MemoryMessageList {
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn entry(&self, slot: SlotHandle) -> Option<Entry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(slot.0)
            .cloned()
    }

    pub fn option_groups(&self) -> Vec<OptionGroup> {
        self.options.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn option_group(&self, set: OptionSetId) -> Option<OptionGroup> {
        self.option_groups().into_iter().find(|g| g.set == set)
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls().len()
    }

    /// Every scroll request, in order.
    pub fn scrolls(&self) -> Vec<ScrollBehavior> {
        self.scrolls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl MessageList for MemoryMessageList {
    fn append(&self, origin: Origin) -> SlotHandle {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(Entry {
            origin,
            content: String::new(),
            writes: 0,
        });
        SlotHandle(entries.len() - 1)
    }

    fn set_content(&self, slot: SlotHandle, markup: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(slot.0) {
            entry.content = markup.to_string();
            entry.writes += 1;
        }
    }

    fn append_options(&self, set: OptionSetId, labels: &[String]) {
        self.options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OptionGroup {
                set,
                labels: labels.to_vec(),
                disabled: false,
                disable_calls: 0,
            });
    }

    fn disable_options(&self, set: OptionSetId) {
        let mut options = self.options.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(group) = options.iter_mut().find(|g| g.set == set) {
            group.disabled = true;
            group.disable_calls += 1;
        }
    }

    fn scroll_to_bottom(&self, behavior: ScrollBehavior) {
        self.scrolls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(behavior);
    }
}

/// Records every visibility change.
#[derive(Default)]
pub struct MemoryToggle {
    transitions: Mutex<Vec<bool>>,
}

impl MemoryToggle {
    pub fn is_visible(&self) -> bool {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
            .unwrap_or(false)
    }

    pub fn transitions(&self) -> Vec<bool> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn hide_count(&self) -> usize {
        self.transitions().iter().filter(|v| !**v).count()
    }
}

impl Visibility for MemoryToggle {
    fn set_visible(&self, visible: bool) {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(visible);
    }
}

#[derive(Default)]
pub struct MemoryChoice {
    selected: Mutex<Option<String>>,
}

impl MemoryChoice {
    pub fn select(&self, value: Option<&str>) {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = value.map(str::to_string);
    }
}

impl ChoiceGroup for MemoryChoice {
    fn selected(&self) -> Option<String> {
        self.selected.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Default)]
pub struct MemoryFlag {
    set: AtomicBool,
}

impl MemoryFlag {
    pub fn set(&self, value: bool) {
        self.set.store(value, Ordering::SeqCst);
    }
}

impl FlagSource for MemoryFlag {
    fn is_set(&self) -> bool {
        self.set.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// All surfaces, kept individually addressable for inspection.
#[derive(Default, Clone)]
pub struct MemoryHost {
    pub input: Arc<MemoryInput>,
    pub messages: Arc<MemoryMessageList>,
    pub thinking: Arc<MemoryToggle>,
    pub privacy_choice: Arc<MemoryChoice>,
    pub privacy_popup: Arc<MemoryToggle>,
    pub history_flag: Arc<MemoryFlag>,
    pub notifier: Arc<MemoryNotifier>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces(&self) -> HostSurfaces {
        HostSurfaces {
            input: self.input.clone(),
            messages: self.messages.clone(),
            thinking: self.thinking.clone(),
            privacy_choice: self.privacy_choice.clone(),
            privacy_popup: self.privacy_popup.clone(),
            history_flag: self.history_flag.clone(),
            notifier: self.notifier.clone(),
        }
    }
}
