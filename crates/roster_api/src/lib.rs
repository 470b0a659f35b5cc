//! HTTP boundary for Roster.
//! Routes decode wire shapes, call `roster_core` and map typed errors to
//! responses; no domain rules live here.

pub mod api;
pub mod error;

pub use api::{build_router, AppState, BirthDateRange, SharedService};
pub use error::{ApiError, ApiResult};
