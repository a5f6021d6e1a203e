//! PR Build Trigger - polls open pull requests and decides when a CI build
//! should be (re)triggered.
//!
//! This library provides the domain types, the comment ledger, the trigger
//! decision and orchestration, and a GitHub backend for them.

pub mod comments;
pub mod config;
pub mod effects;
pub mod engine;
pub mod filter;
pub mod github;
pub mod server;
pub mod types;
pub mod worker;

#[cfg(test)]
pub mod test_utils;
