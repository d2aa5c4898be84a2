//! Movie Code Bot Library
//!
//! Core logic for a chat-platform bot that catalogs video content behind
//! short numeric codes.
//!
//! This crate provides:
//! - The admin content-intake wizard (multi-step guided dialogue)
//! - Subscription gating behind required-channel membership
//! - Rate-limited broadcast delivery to the whole user base
//! - Rating capture and code-based content delivery
//!
//! Storage and the messaging transport are collaborator traits
//! ([`catalog::CatalogStore`], [`transport::Transport`]); the crate ships an
//! in-memory store and a scripted transport for tests and local runs.

pub mod broadcast;
pub mod catalog;
pub mod config;
pub mod delivery;
pub mod format;
pub mod gate;
pub mod rating;
pub mod transport;
pub mod wizard;
