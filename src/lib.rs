// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hub Grader Auth - JupyterHub-backed gatekeeper for the grading tool
//!
//! This crate fronts the grading tool with JupyterHub identity: session
//! cookies are validated against the hub API, graders are authorized from a
//! static allow-list, and the service registers itself with the
//! configurable HTTP proxy at startup.
//!
//! ## Modules
//!
//! - `api` - HTTP routes mounted under the remap path (Axum)
//! - `auth` - Cookie authentication and grader authorization
//! - `clients` - Typed hub API and proxy API clients
//! - `notebook` - Notebook server lookup, start and admin cookies
//! - `startup` - Explicit initialization (proxy route registration)

pub mod api;
pub mod auth;
pub mod clients;
pub mod config;
pub mod cookies;
pub mod error;
pub mod notebook;
pub mod startup;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
