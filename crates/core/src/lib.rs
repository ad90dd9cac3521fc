//! Domain logic for the TEMU job board onboarding wizards.
//!
//! Everything in this crate is free of HTTP and SQL concerns. The database
//! is reached only through the [`onboarding::profile::ProfileStore`] trait.

pub mod error;
pub mod onboarding;
pub mod roles;
pub mod types;
