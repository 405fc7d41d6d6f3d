//! Pure authorization decision protocol (no IO).
//!
//! Input: a user, a set of requests, and the collaborators that check, solve and fetch.
//! Output: the final state when authorized, or the reason the requests are forbidden.

#![forbid(unsafe_code)]

pub mod checker;
pub mod checks;
pub mod error;
pub mod fetch;
pub mod model;
pub mod policy;
pub mod report;
pub mod rules;
pub mod scenarios;
pub mod solver;

mod engine;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{Authorizer, authorize};
