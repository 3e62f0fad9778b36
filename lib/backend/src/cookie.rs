//! Session cookie encoding.
//!
//! The session is stored as JSON, base64url-encoded behind a `base64-`
//! marker. Browsers cap a single cookie at roughly 4 KB, so long values are
//! split across `<name>.0`, `<name>.1`, ... and joined again on read.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use tatame_access::{AuthenticationError, CookieMutation, CookieOptions, SessionCookies};

const BASE64_PREFIX: &str = "base64-";

/// Longest value written to a single cookie.
pub const MAX_CHUNK_SIZE: usize = 3180;

/// Token pair persisted in the session cookie.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry in unix seconds. Missing values force a refresh.
    #[serde(default)]
    pub expires_at: i64,
}

impl StoredSession {
    /// Returns true if the access token expires within `margin_seconds` of `now`.
    #[must_use]
    pub fn expires_within(&self, margin_seconds: i64, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp().saturating_add(margin_seconds)
    }
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Reads and writes the session cookie family named `name`.
#[derive(Debug, Clone)]
pub struct SessionCookieCodec {
    name: String,
    options: CookieOptions,
}

impl SessionCookieCodec {
    #[must_use]
    pub fn new(name: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{}", self.name, index)
    }

    /// Returns true if `cookie` is the unchunked cookie or one of its chunks.
    fn owns(&self, cookie: &str) -> bool {
        match cookie.strip_prefix(self.name.as_str()) {
            Some("") => true,
            Some(rest) => rest
                .strip_prefix('.')
                .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())),
            None => false,
        }
    }

    fn raw_value(&self, cookies: &SessionCookies) -> Option<String> {
        if let Some(value) = cookies.get(&self.name) {
            return Some(value.to_string());
        }

        let mut joined = String::new();
        for index in 0.. {
            match cookies.get(&self.chunk_name(index)) {
                Some(chunk) => joined.push_str(chunk),
                None => break,
            }
        }
        (!joined.is_empty()).then_some(joined)
    }

    /// Decodes the stored session, if any cookie of the family is present.
    pub fn read(
        &self,
        cookies: &SessionCookies,
    ) -> Result<Option<StoredSession>, Report<AuthenticationError>> {
        let Some(raw) = self.raw_value(cookies) else {
            return Ok(None);
        };

        let json = match raw.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(encoded.trim_end_matches('='))
                    .map_err(|e| self.malformed(e.to_string()))?;
                String::from_utf8(bytes).map_err(|e| self.malformed(e.to_string()))?
            }
            None => raw,
        };

        let session = serde_json::from_str::<StoredSession>(&json)
            .map_err(|e| self.malformed(e.to_string()))?;
        Ok(Some(session))
    }

    fn malformed(&self, reason: String) -> AuthenticationError {
        AuthenticationError::MalformedCookie {
            name: self.name.clone(),
            reason,
        }
    }

    /// Encodes `session` into cookie writes, removing any family member the
    /// new layout no longer uses.
    pub fn write(
        &self,
        session: &StoredSession,
        cookies: &SessionCookies,
    ) -> Result<Vec<CookieMutation>, Report<AuthenticationError>> {
        let json = serde_json::to_string(session).map_err(|e| self.malformed(e.to_string()))?;
        let value = format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json));

        let written: Vec<(String, String)> = if value.len() <= MAX_CHUNK_SIZE {
            vec![(self.name.clone(), value)]
        } else {
            // base64 output is ASCII, so byte chunks are valid strings.
            value
                .as_bytes()
                .chunks(MAX_CHUNK_SIZE)
                .enumerate()
                .map(|(index, chunk)| {
                    (
                        self.chunk_name(index),
                        String::from_utf8_lossy(chunk).into_owned(),
                    )
                })
                .collect()
        };

        let mut mutations: Vec<CookieMutation> = self
            .present_names(cookies)
            .into_iter()
            .filter(|name| !written.iter().any(|(n, _)| n == name))
            .map(|name| self.removal(name))
            .collect();

        mutations.extend(written.into_iter().map(|(name, value)| CookieMutation::Set {
            name,
            value,
            options: self.options.clone(),
        }));
        Ok(mutations)
    }

    /// Removes every family member present in `cookies`.
    #[must_use]
    pub fn clear(&self, cookies: &SessionCookies) -> Vec<CookieMutation> {
        self.present_names(cookies)
            .into_iter()
            .map(|name| self.removal(name))
            .collect()
    }

    fn present_names(&self, cookies: &SessionCookies) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in cookies.names_with_prefix(&self.name) {
            if self.owns(name) && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    fn removal(&self, name: String) -> CookieMutation {
        CookieMutation::Remove {
            name,
            path: self.options.path.clone(),
        }
    }
}
