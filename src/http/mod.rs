//! JSON endpoints for the analytics reports.
//!
//! Handlers load the manufacturing collection from the shared
//! [`DocumentStore`](crate::documents::DocumentStore) and hand it to the
//! pure aggregations in [`crate::analytics`].

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
