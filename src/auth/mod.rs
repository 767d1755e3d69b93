// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Hub cookie authentication and grader authorization.
//!
//! ## Auth Flow
//!
//! 1. The browser reaches this service through the hub's proxy, carrying
//!    the hub session cookie (`jupyter-hub-token` by default)
//! 2. No cookie: redirect to `{hub}/hub/login?next={remap path}`
//! 3. Otherwise the cookie is checked with the hub API, authenticated with
//!    this service's own hub API token
//! 4. The returned user name must be in the grader allow-list
//!
//! ## Failure handling
//!
//! - Stale cookie (404) or unexpected status: back to login
//! - Hub rejects our token (403): 500, the service needs a new token
//! - Hub down (5xx, transport): 502
//! - Not a grader: 403

pub mod authenticator;
pub mod error;
pub mod extractor;
pub mod graders;
pub mod middleware;

pub use authenticator::{found_redirect, AuthDecision, AuthenticatedGrader, Authenticator};
pub use error::AuthError;
pub use extractor::Grader;
pub use graders::GraderAllowList;
pub use middleware::require_grader;
