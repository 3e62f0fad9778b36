//! Core domain types and utilities for the tatame academy back-office.
//!
//! This crate provides the identifier types and the error-handling alias
//! shared by the access, backend and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{
    ClassGroupId, ParseIdError, PaymentId, PlanId, StudentId, TrialClassId, UserId,
};
