// ABOUTME: SVG captcha challenge generation and single-use answer storage
// ABOUTME: Answers live in the short-TTL cache and are consumed on first verification
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

//! # Captcha challenges
//!
//! Issues a four-glyph SVG challenge and stores the lowercase answer under a
//! namespaced cache key with a five-minute TTL. Verification consumes the
//! stored answer on first use whether or not it matches, so a challenge id can
//! never be replayed.

use crate::cache::Cache;
use crate::constants::captcha::{
    CAPTCHA_CHARSET, CAPTCHA_HEIGHT, CAPTCHA_KEY_PREFIX, CAPTCHA_LENGTH, CAPTCHA_NOISE_LINES,
    CAPTCHA_WIDTH,
};
use crate::errors::AppResult;
use rand::Rng;
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;
use uuid::Uuid;

/// A freshly issued challenge: opaque id plus inline SVG markup
#[derive(Debug, Clone, Serialize)]
pub struct CaptchaChallenge {
    /// Challenge identifier the client echoes back at login
    pub id: String,
    /// SVG markup rendered by the browser
    pub data: String,
}

/// Render a challenge, returning the expected text and its SVG markup
fn render_challenge() -> (String, String) {
    let mut rng = rand::thread_rng();

    let text: String = (0..CAPTCHA_LENGTH)
        .map(|_| char::from(CAPTCHA_CHARSET[rng.gen_range(0..CAPTCHA_CHARSET.len())]))
        .collect();

    let width = CAPTCHA_WIDTH;
    let height = CAPTCHA_HEIGHT;
    let mut svg = format!(
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#
    );
    svg.push_str(r##"<rect width="100%" height="100%" fill="#f0f0f0"/>"##);

    for _ in 0..CAPTCHA_NOISE_LINES {
        let x1 = rng.gen_range(0.0..f64::from(width));
        let y1 = rng.gen_range(0.0..f64::from(height));
        let x2 = rng.gen_range(0.0..f64::from(width));
        let y2 = rng.gen_range(0.0..f64::from(height));
        let _ = write!(
            svg,
            r##"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="#ccc" stroke-width="1" opacity="0.5"/>"##
        );
    }

    for (i, glyph) in text.chars().enumerate() {
        let x = 20 + i as u32 * 25;
        let y = 28.0 + rng.gen_range(-4.0..4.0);
        let rotate = rng.gen_range(-15.0..15.0);
        let font_size = 24 + rng.gen_range(0..4);
        let _ = write!(
            svg,
            r##"<text x="{x}" y="{y:.1}" font-family="Arial, sans-serif" font-size="{font_size}" font-weight="bold" fill="#333" transform="rotate({rotate:.1}, {x}, {y:.1})">{glyph}</text>"##
        );
    }

    svg.push_str("</svg>");
    (text, svg)
}

/// Captcha issuance and single-use verification over the cache backend
#[derive(Clone)]
pub struct CaptchaStore {
    cache: Cache,
    ttl: Duration,
}

impl CaptchaStore {
    /// Create a store writing answers with the given TTL
    #[must_use]
    pub const fn new(cache: Cache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Issue a new challenge and persist its lowercase answer
    ///
    /// # Errors
    /// Returns an error if the cache write fails
    pub async fn issue(&self) -> AppResult<CaptchaChallenge> {
        let (text, data) = render_challenge();
        let id = Uuid::new_v4().to_string();

        self.cache
            .set(
                &format!("{CAPTCHA_KEY_PREFIX}{id}"),
                &text.to_lowercase(),
                self.ttl,
            )
            .await?;

        tracing::debug!("Issued captcha challenge {}", id);
        Ok(CaptchaChallenge { id, data })
    }

    /// Verify an answer, consuming the stored entry regardless of outcome
    ///
    /// Fails closed: a missing, expired, or already-consumed challenge id
    /// verifies as `false`. Comparison is case-insensitive.
    ///
    /// # Errors
    /// Returns an error only if the cache backend fails
    pub async fn verify(&self, id: &str, answer: &str) -> AppResult<bool> {
        let stored = self.cache.take(&format!("{CAPTCHA_KEY_PREFIX}{id}")).await?;

        match stored {
            Some(expected) => Ok(expected == answer.to_lowercase()),
            None => Ok(false),
        }
    }
}
