//! # Backend Client
//!
//! Everything that talks to the remote query service.
//!
//! - [`types`]: wire shapes for `/search`, `/privacy` and `/enable-history`
//! - [`backend`]: the `Backend` trait, `BackendError`, and `Reply` (the
//!   error-absorbing view the controller renders)
//! - [`client`]: `HttpBackend`, the reqwest implementation

pub mod backend;
pub mod client;
pub mod types;

pub use backend::{Backend, BackendError, Reply};
pub use client::HttpBackend;
pub use types::{PrivacyRequest, PrivacyResponse, SearchRequest, SearchResponse};
