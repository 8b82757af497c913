//! # Core Widget Logic
//!
//! Everything between "the user pressed send" and "the reply finished
//! appearing". It knows nothing about any specific host.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • controller (events)  │
//!                    │  • transcript (record)  │
//!                    │  • reveal (animation)   │
//!                    │  • markdown (render)    │
//!                    └───────────┬─────────────┘
//!                                │ host traits
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Terminal  │      │   Memory   │      │  Browser   │
//!     │   (term)   │      │  (tests)   │      │  (future)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`controller`]: `Controller`, the entry points for host events
//! - [`transcript`]: append-only message record and option sets
//! - [`reveal`]: the single-active-job reveal animator
//! - [`markdown`]: escaping markdown-subset renderer
//! - [`config`]: config file, env and CLI resolution

pub mod config;
pub mod controller;
pub mod markdown;
pub mod reveal;
pub mod transcript;

pub use controller::{Controller, Outcome, Rejection};
