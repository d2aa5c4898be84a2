//! Catalog domain model and storage collaborator.
//!
//! The catalog owns the five persistent entities (entries, actors, required
//! channels, view events, ratings) behind the [`CatalogStore`] trait. The
//! bot core only issues queries and commands against that surface.

mod entry;
mod memory;
mod store;

pub use entry::{
    Actor, CatalogEntry, FileRef, NewEntry, Quality, Rating, RatingSummary, RequiredChannel,
    ViewEvent,
};
pub use memory::MemoryStore;
pub use store::{ActorStats, CatalogStore, GlobalStats, StoreError};
