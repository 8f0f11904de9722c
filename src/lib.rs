// ABOUTME: Main library entry point for the Parley authorization server
// ABOUTME: OAuth 2.0 authorization-code grant, direct login, and per-user provider credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

#![deny(unsafe_code)]

//! # Parley Auth Server
//!
//! An OAuth 2.0 Authorization-Code-Grant server. Registered client
//! applications send users through an interactive login that issues a
//! short-lived single-use authorization code; the client backend exchanges
//! the code for a signed bearer access token. A companion direct-login path
//! produces a session JWT for the browser dashboard, and each user carries an
//! encrypted-at-rest store of third-party API credentials consumed by the
//! downstream chat-completion proxy.
//!
//! ## Architecture
//!
//! - **`oauth2`**: the authorization-code state machine: client/redirect
//!   validation, single-use code issuance with expiry, race-safe redemption
//! - **`auth`**: token codec for the three bearer token kinds
//! - **`crypto`**: password hashing with a configurable work factor
//! - **`database`**: SQLite persistence through parameterized queries
//! - **`cache` / `captcha`**: short-TTL challenge storage and SVG rendering
//! - **`routes` / `middleware`**: axum HTTP surface behind a token guard

/// Token codec for login, access, and session tokens
pub mod auth;
/// Short-TTL key/value cache with pluggable backends
pub mod cache;
/// Captcha challenge generation and verification
pub mod captcha;
/// Configuration management
pub mod config;
/// Application constants
pub mod constants;
/// Shared server resources
pub mod context;
/// Password hashing
pub mod crypto;
/// SQLite persistence
pub mod database;
/// Unified error handling
pub mod errors;
/// Logging configuration
pub mod logging;
/// Request middleware
pub mod middleware;
/// Core data models
pub mod models;
/// OAuth 2.0 authorization server core
pub mod oauth2;
/// HTTP routes
pub mod routes;
