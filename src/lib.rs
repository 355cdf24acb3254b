//! # Current Affairs
//!
//! Browse categorized current affairs content: category → subcategory →
//! article. Every read goes to the remote content service first and falls back
//! to an embedded dataset when the service fails or has nothing, so callers
//! always receive data of the same shape.
//!
//! ## Architecture
//!
//! 1. **Transport** ([`api`]): the [`api::ContentApi`] trait and its reqwest
//!    implementation
//! 2. **Resolution** ([`catalog`], [`articles`]): remote first, then
//!    [`fallback`], both normalized through [`normalize`]
//! 3. **Fallback shaping** ([`filter`], [`pagination`]): language, scope and
//!    month filters, date ordering and page slicing
//! 4. **Session** ([`state`], [`prefs`]): query state, load lifecycle and the
//!    stored language preference
//! 5. **Output** ([`outputs`]): terminal text and JSON snapshots

pub mod api;
pub mod articles;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod outputs;
pub mod pagination;
pub mod prefs;
pub mod state;
pub mod utils;
