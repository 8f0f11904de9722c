// ABOUTME: OAuth 2.0 authorization-code server core
// ABOUTME: Client registry, single-use code ledger, and the authorization/token endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

/// Authorization and token-exchange orchestration
pub mod endpoints;
/// Authorization code state machine
pub mod ledger;
/// OAuth 2.0 request/response and error types
pub mod models;
/// Registered-client validation
pub mod registry;

pub use endpoints::OAuth2AuthorizationServer;
pub use ledger::{CodeLedger, LedgerError, RedeemedCode};
pub use models::{OAuth2Error, OAuthLoginRequest, OAuthLoginResponse, TokenRequest, TokenResponse};
pub use registry::ClientRegistry;
