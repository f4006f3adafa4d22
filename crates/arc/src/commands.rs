//! One module per CLI subcommand.

pub mod auth;
pub mod build;
pub mod doctor;
pub mod export;
pub mod refresh;
pub mod relate;
pub mod trace;
pub mod why;
