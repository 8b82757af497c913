//! Quill library exports for testing and embedding

pub mod api;
pub mod core;
pub mod host;
pub mod term;

#[cfg(test)]
pub mod test_support;
