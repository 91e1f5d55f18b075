#![deny(unsafe_code)]
#![warn(missing_docs)]
//! URI-template routing for federation endpoints: actor, inbox, outbox,
//! following, followers, featured, liked, and arbitrary object paths.
//!
//! ```
//! use fedi_router::Router;
//!
//! let mut router = Router::new();
//! router.register("actor_inbox", "/users/{handle}/inbox").unwrap();
//! let m = router.match_path("/users/alice/inbox").unwrap();
//! assert_eq!(m.vars["handle"], "alice");
//! ```

/// Router errors.
pub mod error;
/// The route registry: matching and building.
pub mod router;

pub use error::RouterError;
pub use router::{RouteMatch, Router};
