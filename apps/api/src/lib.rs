//! # storehub-api: REST Server for StoreHub
//!
//! Thin HTTP layer over `storehub-db`. Every handler follows the same
//! shape:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  AuthUser    │──►│  validate    │──►│  repository  │──►│  Json / 201  │
//! │  (+ role)    │   │  (core)      │   │  call        │   │  / 204       │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!        │ 401/403          │ 400              │ 404/409/422
//!        └──────────────────┴──────────────────┴──────────► ApiError
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (`storehub.toml` + `STOREHUB__*`)
//! - [`auth`] - JWT, password hashing, the [`auth::AuthUser`] extractor
//! - [`email`] - Provider seam and the template email service
//! - [`error`] - [`error::ApiError`] and its status mapping
//! - [`extract`] - `Json`, `Query`, `Path` rejecting with `ApiError`
//! - [`routes`] - One router per resource
//! - [`server`] - [`server::AppState`], router assembly, graceful serve

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod extract;
pub mod routes;
pub mod server;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{build_router, AppState};
