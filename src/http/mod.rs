//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, metrics)
//!     → middleware/ (host check, CSRF)
//!     → handlers.rs (extract, validate)
//!     → gateway.rs (one device call at a time)
//!     → response.rs (JSON envelope, error mapping)
//! ```

pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use gateway::Gateway;
pub use response::{ApiError, ApiResponse};
pub use server::{router, ApiConfig, ApiServer, AppState, HttpServer, HttpServerFactory, ServerFactory};
