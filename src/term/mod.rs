//! # Terminal Host
//!
//! Runs the widget in a plain line-oriented terminal. Stdin lines become
//! controller calls; the host surfaces print through a shared [`Console`].
//!
//! The transcript is printed top to bottom and never redrawn: a reveal prints
//! only the text its slot gained since the last write. Writes to a slot older
//! than the one currently printing are recorded but not shown.

mod command;

use std::io::{self, Write, stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, StyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::HttpBackend;
use crate::api::types::{ENABLE_HISTORY_ACCESS, PROCEED_NORMALLY};
use crate::core::config::ResolvedConfig;
use crate::core::markdown::LINE_BREAK;
use crate::core::reveal::CURSOR_MARKER;
use crate::core::transcript::{OptionSetId, Origin};
use crate::core::Controller;
use crate::host::{
    ChoiceGroup, FlagSource, HostSurfaces, InputField, MessageList, Notifier, ScrollBehavior,
    SlotHandle, Visibility,
};
use command::{Command, HELP};

/// Choices offered by the privacy popup, in display order.
const PRIVACY_CHOICES: [&str; 2] = [ENABLE_HISTORY_ACCESS, PROCEED_NORMALLY];

/// Markup → terminal text: drops the cursor marker and tags, turns line
/// breaks into newlines and undoes the renderer's escaping.
fn to_plain(markup: &str) -> String {
    let text = markup.replace(CURSOR_MARKER, "").replace(LINE_BREAK, "\n");
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn label(origin: Origin) -> StyledContent<&'static str> {
    match origin {
        Origin::User => "you> ".cyan().bold(),
        Origin::Bot => "quill> ".green().bold(),
    }
}

fn report(result: io::Result<()>) {
    if let Err(e) = result {
        warn!("Terminal write failed: {}", e);
    }
}

struct ConsoleState {
    /// Origin and plain text shown so far, per slot.
    slots: Vec<(Origin, String)>,
    /// Slot whose text is on the last printed line.
    current: Option<usize>,
    at_line_start: bool,
    thinking_shown: bool,
}

/// Serializes every write to stdout.
pub struct Console {
    state: Mutex<ConsoleState>,
}

impl Console {
    fn new() -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                slots: Vec::new(),
                current: None,
                at_line_start: true,
                thinking_shown: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear_thinking(state: &mut ConsoleState, out: &mut impl Write) -> io::Result<()> {
        if state.thinking_shown {
            queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            state.thinking_shown = false;
            state.at_line_start = true;
        }
        Ok(())
    }

    /// Prints `content` on a line of its own.
    pub fn print_line(&self, content: impl std::fmt::Display) -> io::Result<()> {
        let mut state = self.lock();
        let mut out = stdout().lock();
        Self::clear_thinking(&mut state, &mut out)?;
        if !state.at_line_start {
            queue!(out, Print("\n"))?;
        }
        queue!(out, Print(content), Print("\n"))?;
        state.at_line_start = true;
        state.current = None;
        out.flush()
    }

    fn add_slot(&self, origin: Origin) -> SlotHandle {
        let mut state = self.lock();
        state.slots.push((origin, String::new()));
        SlotHandle(state.slots.len() - 1)
    }

    fn write_slot(&self, slot: SlotHandle, markup: &str) -> io::Result<()> {
        let plain = to_plain(markup);
        let mut state = self.lock();
        let Some((origin, shown)) = state.slots.get(slot.0).cloned() else {
            return Ok(());
        };
        state.slots[slot.0].1 = plain.clone();
        if state.current.is_some_and(|c| slot.0 < c) {
            return Ok(());
        }

        let mut out = stdout().lock();
        Self::clear_thinking(&mut state, &mut out)?;
        let printed = if state.current == Some(slot.0) && plain.starts_with(&shown) {
            &plain[shown.len()..]
        } else {
            if !state.at_line_start {
                queue!(out, Print("\n"))?;
            }
            queue!(out, PrintStyledContent(label(origin)))?;
            state.current = Some(slot.0);
            state.at_line_start = false;
            plain.as_str()
        };
        if !printed.is_empty() {
            queue!(out, Print(printed))?;
            state.at_line_start = printed.ends_with('\n');
        }
        out.flush()
    }

    fn set_thinking(&self, visible: bool) -> io::Result<()> {
        let mut state = self.lock();
        let mut out = stdout().lock();
        if !visible {
            Self::clear_thinking(&mut state, &mut out)?;
            return out.flush();
        }
        if !state.at_line_start {
            queue!(out, Print("\n"))?;
        }
        queue!(out, PrintStyledContent("thinking...".dark_grey().italic()))?;
        state.thinking_shown = true;
        state.at_line_start = false;
        out.flush()
    }
}

pub struct TermInput {
    value: Mutex<String>,
}

impl TermInput {
    fn set(&self, value: &str) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value.to_string();
    }
}

impl InputField for TermInput {
    fn value(&self) -> String {
        self.value.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn clear(&self) {
        self.value.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

pub struct TermMessageList {
    console: Arc<Console>,
}

impl MessageList for TermMessageList {
    fn append(&self, origin: Origin) -> SlotHandle {
        self.console.add_slot(origin)
    }

    fn set_content(&self, slot: SlotHandle, markup: &str) {
        report(self.console.write_slot(slot, markup));
    }

    fn append_options(&self, _set: OptionSetId, labels: &[String]) {
        let line = labels
            .iter()
            .enumerate()
            .map(|(i, l)| format!("[/{}] {}", i + 1, l))
            .collect::<Vec<_>>()
            .join("   ");
        report(self.console.print_line(format!("  {line}").dark_grey()));
    }

    fn disable_options(&self, _set: OptionSetId) {
        report(self.console.print_line("  (choices closed)".dark_grey().italic()));
    }

    fn scroll_to_bottom(&self, _behavior: ScrollBehavior) {
        // The terminal always follows the newest line.
    }
}

pub struct ThinkingIndicator {
    console: Arc<Console>,
}

impl Visibility for ThinkingIndicator {
    fn set_visible(&self, visible: bool) {
        report(self.console.set_thinking(visible));
    }
}

pub struct PrivacyPopup {
    console: Arc<Console>,
}

impl Visibility for PrivacyPopup {
    fn set_visible(&self, visible: bool) {
        if !visible {
            return;
        }
        let choices = PRIVACY_CHOICES
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{}] {}", i + 1, c))
            .collect::<Vec<_>>()
            .join("   ");
        report(self.console.print_line(
            format!("Privacy: {choices}  (answer with /privacy N)").yellow(),
        ));
    }
}

#[derive(Default)]
pub struct TermChoice {
    selected: Mutex<Option<String>>,
}

impl TermChoice {
    fn select(&self, value: Option<&str>) {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = value.map(str::to_string);
    }
}

impl ChoiceGroup for TermChoice {
    fn selected(&self) -> Option<String> {
        self.selected.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Default)]
pub struct TermFlag(AtomicBool);

impl FlagSource for TermFlag {
    fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct TermNotifier {
    console: Arc<Console>,
}

impl Notifier for TermNotifier {
    fn notify(&self, message: &str) {
        report(self.console.print_line(format!("! {message}").yellow()));
    }
}

/// Every terminal surface, plus the console they share.
pub struct TerminalHost {
    console: Arc<Console>,
    input: Arc<TermInput>,
    privacy_choice: Arc<TermChoice>,
    history_flag: Arc<TermFlag>,
    notifier: Arc<TermNotifier>,
}

impl TerminalHost {
    pub fn new() -> Self {
        let console = Arc::new(Console::new());
        Self {
            input: Arc::new(TermInput {
                value: Mutex::new(String::new()),
            }),
            privacy_choice: Arc::new(TermChoice::default()),
            history_flag: Arc::new(TermFlag::default()),
            notifier: Arc::new(TermNotifier {
                console: console.clone(),
            }),
            console,
        }
    }

    pub fn surfaces(&self) -> HostSurfaces {
        HostSurfaces {
            input: self.input.clone(),
            messages: Arc::new(TermMessageList {
                console: self.console.clone(),
            }),
            thinking: Arc::new(ThinkingIndicator {
                console: self.console.clone(),
            }),
            privacy_choice: self.privacy_choice.clone(),
            privacy_popup: Arc::new(PrivacyPopup {
                console: self.console.clone(),
            }),
            history_flag: self.history_flag.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads stdin until EOF or `/quit`, driving a controller against the
/// configured backend.
pub async fn run(config: ResolvedConfig) -> io::Result<()> {
    let host = TerminalHost::new();
    let backend = Arc::new(HttpBackend::new(config.base_url.clone()));
    info!("Using backend at {}", backend.base_url());
    let controller = Controller::new(host.surfaces(), backend, config.reveal.clone());

    let console = host.console.clone();
    controller.greet(
        &config.greeting,
        Some(Box::new(move || {
            report(console.print_line("Type /help for commands.".dark_grey()));
        })),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match command::parse(&line) {
            Command::Submit(text) => {
                host.input.set(&text);
                controller.submit().await;
            }
            Command::Choose(n) => {
                let target = controller.latest_option_set().and_then(|set| {
                    let label = set.labels.get(n.checked_sub(1)?)?.clone();
                    Some((set.id, label))
                });
                match target {
                    Some((set, label)) => {
                        controller.choose_option(set, &label).await;
                    }
                    None => host.notifier.notify(&format!("There is no choice {n}.")),
                }
            }
            Command::History(enabled) => {
                host.history_flag.0.store(enabled, Ordering::SeqCst);
                info!("History access toggled {}", if enabled { "on" } else { "off" });
                if enabled {
                    controller.enable_history().await;
                }
            }
            Command::ShowPrivacy => controller.show_privacy_popup(),
            Command::Privacy(n) => {
                let choice = n.checked_sub(1).and_then(|i| PRIVACY_CHOICES.get(i));
                host.privacy_choice.select(choice.copied());
                controller.submit_privacy().await;
            }
            Command::Help => report(host.console.print_line(HELP)),
            Command::Quit => break,
            Command::Unknown(cmd) => host
                .notifier
                .notify(&format!("Unknown command {cmd}. Type /help.")),
        }
    }

    controller.animator().cancel();
    info!("Terminal session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_plain_strips_markup() {
        assert_eq!(
            to_plain("<h1>Title</h1><br />a &lt;b&gt; &amp; <strong>c</strong>"),
            "Title\na <b> & c"
        );
    }

    #[test]
    fn test_to_plain_drops_cursor_marker() {
        assert_eq!(to_plain(&format!("Hel{CURSOR_MARKER}")), "Hel");
    }

    #[test]
    fn test_choice_and_flag_surfaces() {
        let host = TerminalHost::new();
        let surfaces = host.surfaces();
        assert!(surfaces.privacy_choice.selected().is_none());
        host.privacy_choice.select(Some(PROCEED_NORMALLY));
        assert_eq!(
            surfaces.privacy_choice.selected().as_deref(),
            Some(PROCEED_NORMALLY)
        );
        assert!(!surfaces.history_flag.is_set());
        host.history_flag.0.store(true, Ordering::SeqCst);
        assert!(surfaces.history_flag.is_set());
    }

    #[test]
    fn test_input_set_and_clear() {
        let host = TerminalHost::new();
        host.input.set("hi");
        assert_eq!(host.input.value(), "hi");
        host.input.clear();
        assert_eq!(host.input.value(), "");
    }
}
