#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Test fixtures shared across the federation workspace: an in-memory
//! [`loader::InMemoryDocumentLoader`] standing in for
//! `fedi_loader::HttpDocumentLoader` in tests that would otherwise need a
//! live server, and [`actor::generate_actor`] for a ready-to-serve actor
//! with a published, working keypair.
//!
//! `fedi_loader::InMemoryKvStore` and `fedi_queue::MemoryQueue` already
//! double as test fixtures for their own traits and are re-exported by
//! their owning crates directly; this crate only adds what isn't already
//! covered there.

/// A generated actor fixture with a published, working RSA key.
pub mod actor;
/// An in-memory, fixture-backed [`fedi_loader::DocumentLoader`].
pub mod loader;

pub use actor::{generate_actor, TestActor};
pub use loader::InMemoryDocumentLoader;
