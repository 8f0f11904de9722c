// ABOUTME: Request middleware for the HTTP surface
// ABOUTME: Bearer/cookie authentication guard with public-path exemptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

/// Authentication guard
pub mod auth;

pub use auth::{require_auth, AuthenticatedUser};
