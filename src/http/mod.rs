//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign/propagate request ID)
//!     → security::auth (Basic auth, when configured)
//!     → update.rs (collect uploads, body and query into an UpdateJob)
//!     → editor::UpdateHandle (merge, persist, reload)
//!     → response.rs (map failures to status codes)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod update;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer};
