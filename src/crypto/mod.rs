// ABOUTME: Cryptographic utilities for the authorization server
// ABOUTME: Password hashing lives here; token signing is in crate::auth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

/// Password hashing and verification
pub mod passwords;

pub use passwords::PasswordHasher;
