//! # Email Notifications
//!
//! Renders stored templates and hands them to a transactional email
//! provider.
//!
//! ```text
//! route handler ──► EmailService::send(template, to, variables)
//!                      │
//!                      ├── EmailRepository::active_template
//!                      ├── template::render_email        (storehub-core)
//!                      ├── dyn EmailProvider::send       (Resend | log)
//!                      └── EmailRepository::insert_log   (every attempt)
//! ```

pub mod provider;
pub mod service;

pub use provider::{EmailError, EmailProvider, LogProvider, OutgoingEmail, ResendProvider};
pub use service::EmailService;
