//! # Authentication Module
//!
//! The already-authenticated iCloud session consumed by the drive layer.
//!
//! ## Overview
//!
//! Signing in (password, two-factor and two-step verification) happens outside
//! this workspace. What the drive layer needs afterwards is the resulting
//! session: the account `dsid`, the web-auth cookies, and the per-account
//! web service endpoints (`drivews`, `docws`). [`Session`] holds those and
//! renders them into the query parameters and headers that must accompany
//! every request.
//!
//! Cookie values are never logged and are redacted from `Debug` output.

pub mod error;
pub mod session;

pub use error::{AuthError, Result};
pub use session::{ServiceEndpoint, Session, DOCWS_SERVICE, DRIVEWS_SERVICE};
