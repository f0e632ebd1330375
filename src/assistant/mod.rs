//! Natural-language assistant.
//!
//! The assistant only ever sees the bounded [`DataSummary`](crate::summary::DataSummary)
//! prompt, never individual records.

pub mod client;

pub use client::AssistantClient;
