//! In-process build trigger for frozen.
//!
//! A host application mounts [`freeze_router`] next to its own routes. A request
//! to the build endpoint renders the site by requesting every page from the
//! same origin the request arrived on, so the application renders itself.

pub mod server;

pub use server::{freeze_router, FreezeService, ServerError, FREEZE_PATH};
