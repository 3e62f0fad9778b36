//! tatame back-office web server.
//!
//! This crate wires the authorization gate from `tatame-access` and the
//! hosted backend from `tatame-backend` into an axum application: public
//! pages, the sign-in API, and the staff dashboard and API under the
//! protected prefix.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod pages;
pub mod types;

#[cfg(test)]
mod test_support;
