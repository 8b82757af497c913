//! # Reveal Animator
//!
//! Shows a block of rendered markup a little at a time, as if it were being
//! typed. Only one reveal is ever live:
//!
//! ```text
//! start(B) ──► lock slot ──► abort A's timer ──► generation += 1 ──► spawn B
//!                  ▲                                                  │
//!                  └──── every step of B: lock slot, check gen, write ┘
//! ```
//!
//! Every step write happens under the same lock `start` and `cancel` take, and
//! a step whose generation is stale writes nothing. A preempted reveal can
//! therefore never touch the message list again, even if its task was mid-wake
//! when it got replaced.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::core::markdown::LINE_BREAK;
use crate::host::{MessageList, ScrollBehavior, SlotHandle};

/// Appended after the revealed prefix in cursor mode.
pub const CURSOR_MARKER: &str = r#"<span class="cursor">|</span>"#;

pub const DEFAULT_CURSOR_SPEED: Duration = Duration::from_millis(20);
pub const DEFAULT_ACCUMULATE_SPEED: Duration = Duration::from_millis(50);

/// Runs once a cursor-mode reveal has fully finished. Dropped unrun if the
/// reveal is cancelled or preempted.
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealMode {
    /// Trailing cursor marker, removed at the end; fires the completion callback.
    Cursor,
    /// Text just grows; fire-and-forget.
    Accumulate,
}

/// Size of one reveal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Char,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevealConfig {
    pub cursor_speed: Duration,
    pub accumulate_speed: Duration,
    pub granularity: Granularity,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            cursor_speed: DEFAULT_CURSOR_SPEED,
            accumulate_speed: DEFAULT_ACCUMULATE_SPEED,
            granularity: Granularity::default(),
        }
    }
}

impl RevealConfig {
    pub fn speed(&self, mode: RevealMode) -> Duration {
        match mode {
            RevealMode::Cursor => self.cursor_speed,
            RevealMode::Accumulate => self.accumulate_speed,
        }
    }
}

/// Byte offsets at which each reveal step ends.
///
/// In `Char` mode every visible character is one step. Tags are never split:
/// a tag joins the step of the character after it (or the last step if
/// nothing visible follows), and an entity like `&lt;` counts as one character.
fn step_ends(markup: &str, granularity: Granularity) -> Vec<usize> {
    let len = markup.len();
    let mut ends = Vec::new();

    match granularity {
        Granularity::Char => {
            let mut i = 0;
            while i < len {
                let rest = &markup[i..];
                if rest.starts_with('<') {
                    i = rest.find('>').map_or(len, |p| i + p + 1);
                    continue;
                }
                i += if rest.starts_with('&') {
                    rest.find(';').filter(|p| *p <= 8).map_or(1, |p| p + 1)
                } else {
                    rest.chars().next().map_or(1, char::len_utf8)
                };
                ends.push(i);
            }
        }
        Granularity::Line => {
            let mut from = 0;
            while let Some(p) = markup[from..].find(LINE_BREAK) {
                from += p + LINE_BREAK.len();
                ends.push(from);
            }
        }
    }

    let covered = ends.last().copied().unwrap_or(0);
    if covered < len {
        if granularity == Granularity::Char && !ends.is_empty() {
            ends.pop();
        }
        ends.push(len);
    }
    ends
}

/// One reveal of `target_text` into `destination`.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealJob {
    pub target_text: String,
    /// Number of steps revealed so far.
    pub cursor_position: usize,
    pub is_active: bool,
    pub destination: SlotHandle,
    pub mode: RevealMode,
    ends: Vec<usize>,
}

impl RevealJob {
    fn new(destination: SlotHandle, text: &str, mode: RevealMode, granularity: Granularity) -> Self {
        Self {
            target_text: text.to_string(),
            cursor_position: 0,
            is_active: true,
            destination,
            mode,
            ends: step_ends(text, granularity),
        }
    }

    pub fn total_steps(&self) -> usize {
        self.ends.len()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor_position >= self.ends.len()
    }

    /// The part of the target shown so far, without any cursor marker.
    pub fn revealed(&self) -> &str {
        match self.cursor_position {
            0 => "",
            n => &self.target_text[..self.ends[n - 1]],
        }
    }

    fn advance(&mut self) {
        if !self.is_complete() {
            self.cursor_position += 1;
        }
    }

    /// What the destination shows at the current step.
    fn frame(&self) -> String {
        match self.mode {
            RevealMode::Cursor => format!("{}{}", self.revealed(), CURSOR_MARKER),
            RevealMode::Accumulate => self.revealed().to_string(),
        }
    }
}

struct Active {
    generation: u64,
    job: RevealJob,
    on_complete: Option<OnComplete>,
    timer: AbortHandle,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    active: Option<Active>,
}

/// Decrements the live-timer count when a step task ends, however it ends.
struct LiveTimer(Arc<AtomicUsize>);

impl LiveTimer {
    fn register(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count.clone())
    }
}

impl Drop for LiveTimer {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the single active reveal. Cheap to clone; clones share the slot.
#[derive(Clone)]
pub struct RevealAnimator {
    list: Arc<dyn MessageList>,
    config: RevealConfig,
    slot: Arc<Mutex<Slot>>,
    live_timers: Arc<AtomicUsize>,
    busy: watch::Sender<bool>,
}

impl RevealAnimator {
    pub fn new(list: Arc<dyn MessageList>, config: RevealConfig) -> Self {
        Self {
            list,
            config,
            slot: Arc::new(Mutex::new(Slot::default())),
            live_timers: Arc::new(AtomicUsize::new(0)),
            busy: watch::Sender::new(false),
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts revealing `text` into `destination`, cancelling whatever reveal
    /// was running first. Must be called from within a tokio runtime.
    pub fn start(
        &self,
        destination: SlotHandle,
        text: &str,
        mode: RevealMode,
        on_complete: Option<OnComplete>,
    ) {
        let mut slot = self.lock();
        if let Some(previous) = slot.active.take() {
            let job = self.retire(previous);
            debug!(
                "Preempted reveal into {} at step {}/{}",
                job.destination,
                job.cursor_position,
                job.total_steps()
            );
        }
        slot.generation += 1;
        let generation = slot.generation;

        let job = RevealJob::new(destination, text, mode, self.config.granularity);
        info!(
            "Starting {:?} reveal into {}: {} steps",
            mode,
            destination,
            job.total_steps()
        );

        let timer = LiveTimer::register(&self.live_timers);
        let animator = self.clone();
        let speed = self.config.speed(mode);
        let handle = tokio::spawn(async move {
            let _timer = timer;
            animator.run(generation, mode, speed).await;
        });

        slot.active = Some(Active {
            generation,
            job,
            on_complete,
            timer: handle.abort_handle(),
        });
        self.busy.send_replace(true);
    }

    /// Stops the active reveal, leaving its destination as it was. Returns the
    /// job that was stopped.
    pub fn cancel(&self) -> Option<RevealJob> {
        let mut slot = self.lock();
        let active = slot.active.take()?;
        let job = self.retire(active);
        self.busy.send_replace(false);
        debug!(
            "Cancelled reveal into {} at step {}",
            job.destination, job.cursor_position
        );
        Some(job)
    }

    /// Stops a job's timer and leaves its destination showing the revealed
    /// prefix. A cursor-mode frame gets rewritten without the marker. Callers
    /// hold the slot lock.
    fn retire(&self, active: Active) -> RevealJob {
        active.timer.abort();
        let mut job = active.job;
        if job.mode == RevealMode::Cursor {
            self.list.set_content(job.destination, job.revealed());
        }
        job.is_active = false;
        job
    }

    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Snapshot of the active job, if any.
    pub fn active_job(&self) -> Option<RevealJob> {
        self.lock().active.as_ref().map(|a| a.job.clone())
    }

    /// Number of step tasks still alive. Never more than one once a preempted
    /// task has been reaped by the runtime.
    pub fn live_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    /// Resolves once no reveal is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.busy.subscribe();
        let _ = rx.wait_for(|busy| !*busy).await;
    }

    async fn run(&self, generation: u64, mode: RevealMode, speed: Duration) {
        loop {
            if mode == RevealMode::Accumulate {
                tokio::time::sleep(speed).await;
            }
            if !self.step(generation) {
                return;
            }
            if mode == RevealMode::Cursor {
                tokio::time::sleep(speed).await;
            }
        }
    }

    /// Performs one tick. Returns `false` when the task should stop, either
    /// because the job finished or because it was superseded.
    fn step(&self, generation: u64) -> bool {
        let mut slot = self.lock();
        let Some(active) = slot.active.as_mut().filter(|a| a.generation == generation) else {
            return false;
        };

        if !active.job.is_complete() {
            active.job.advance();
            self.list.set_content(active.job.destination, &active.job.frame());
            self.list.scroll_to_bottom(ScrollBehavior::Smooth);
            return true;
        }

        if active.job.mode == RevealMode::Cursor {
            self.list
                .set_content(active.job.destination, &active.job.target_text);
        }
        let on_complete = slot.active.take().and_then(|a| a.on_complete);
        self.busy.send_replace(false);
        drop(slot);

        debug!("Reveal generation {} finished", generation);
        if let Some(callback) = on_complete {
            callback();
        }
        false
    }
}
