// ABOUTME: Configuration management for the authorization server
// ABOUTME: Environment-driven settings built once at startup and threaded through constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

/// Environment-based configuration
pub mod environment;

pub use environment::{
    AuthConfig, CaptchaConfig, DatabaseConfig, Environment, PasswordConfig, ServerConfig,
};
