//! Library to backup a MySQL database off-site.
//!
//! A backup run dumps the database, compresses the dump, uploads it with one of
//! the [`backends`] and mails the download link to the operator. The [`mega`]
//! module contains the client side encrypting MEGA upload client.

#![forbid(unsafe_code)]

pub mod backends;
pub mod cli;
pub mod mega;
pub mod notify;
mod run;

pub use run::{run, RunError};
