// ABOUTME: Core data models shared across database, OAuth, and route layers
// ABOUTME: User, OAuthClient, AuthorizationCode, and Tenant definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

//! Core data models

mod oauth;
mod user;

pub use oauth::{AuthorizationCode, OAuthClient, Tenant};
pub use user::{PublicUser, User};
