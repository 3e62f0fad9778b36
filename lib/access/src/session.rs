//! Session model carried through request cookies.
//!
//! The session itself is owned by the external session store. This module
//! only models what passes through a request: the opaque cookie set, the
//! identity a session resolves to, and the cookie changes the store asks
//! for when it refreshes or clears a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use tatame_core::UserId;

/// The cookies sent with a request, kept in arrival order.
///
/// Names and values are opaque here; the session store decides which
/// entries belong to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    entries: Vec<(String, String)>,
}

impl SessionCookies {
    /// Creates an empty cookie set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the value of a `Cookie` request header.
    ///
    /// Pairs without `=` are ignored.
    #[must_use]
    pub fn parse_header(header: &str) -> Self {
        header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect()
    }

    /// Returns the value of the first cookie with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if a cookie with the given name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the names of all cookies starting with `prefix`.
    pub fn names_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .map(|(n, _)| n.as_str())
            .filter(move |n| n.starts_with(prefix))
    }

    /// Returns true if no cookies were sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cookie set as seen after applying `mutations`.
    ///
    /// This is the view downstream handlers must get once the store has
    /// refreshed a session, so they never replay a rotated token.
    #[must_use]
    pub fn apply(&self, mutations: &[CookieMutation]) -> Self {
        let mut entries = self.entries.clone();
        for mutation in mutations {
            match mutation {
                CookieMutation::Set { name, value, .. } => {
                    match entries.iter_mut().find(|(n, _)| n == name) {
                        Some(entry) => entry.1.clone_from(value),
                        None => entries.push((name.clone(), value.clone())),
                    }
                    // A replaced cookie must not linger as a duplicate.
                    let mut seen = false;
                    entries.retain(|(n, _)| {
                        if n != name {
                            return true;
                        }
                        let keep = !seen;
                        seen = true;
                        keep
                    });
                }
                CookieMutation::Remove { name, .. } => {
                    entries.retain(|(n, _)| n != name);
                }
            }
        }
        Self { entries }
    }

    /// Serializes the set back into a `Cookie` request header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        self.entries
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromIterator<(String, String)> for SessionCookies {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// SameSite attribute for a cookie written by the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

/// Attributes for a cookie written by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieOptions {
    pub path: String,
    /// `None` makes a browser-session cookie.
    pub max_age_seconds: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age_seconds: None,
            http_only: true,
            secure: true,
            same_site: SameSitePolicy::Lax,
        }
    }
}

/// One change to the caller's cookie jar requested by the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieMutation {
    /// Write (or overwrite) a cookie.
    Set {
        name: String,
        value: String,
        options: CookieOptions,
    },
    /// Expire a cookie.
    Remove { name: String, path: String },
}

impl CookieMutation {
    /// Returns the name of the cookie this mutation touches.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Remove { name, .. } => name,
        }
    }
}

/// A bearer token that authenticated an identity.
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// The user a valid session resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: UserId,
    email: Option<String>,
    /// Token of the session that resolved this identity; the backend uses it
    /// so row-level rules see the caller rather than an anonymous client.
    access_token: Option<AccessToken>,
}

impl Identity {
    #[must_use]
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self {
            id,
            email,
            access_token: None,
        }
    }

    /// Attaches the bearer token the identity was resolved with.
    #[must_use]
    pub fn with_access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }
}

/// Result of validating (and possibly refreshing) a session.
///
/// The cookie changes are returned rather than applied so the caller decides
/// where they land: the inbound request view and the outgoing response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionValidation {
    pub identity: Option<Identity>,
    pub cookie_mutations: Vec<CookieMutation>,
}

impl SessionValidation {
    /// No session and nothing to change.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            cookie_mutations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mutations(mut self, mutations: Vec<CookieMutation>) -> Self {
        self.cookie_mutations = mutations;
        self
    }
}

/// Result of a password sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Credentials accepted; the mutations write the new session cookies.
    Authenticated {
        identity: Identity,
        cookie_mutations: Vec<CookieMutation>,
    },
    /// Credentials rejected by the store.
    Rejected,
}
