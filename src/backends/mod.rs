//! Backend modules performing the individual steps of a backup.
//!
//! - [MySql]: Dump of the database to a plain SQL file.
//! - [gzip]: Compression of the dump.
//! - [MegaBackend] and [Rclone]: Off-site upload of the compressed dump, see [Upload].

pub mod gzip;
pub mod mega;
pub mod mysql;
pub mod rclone;

use std::path::Path;

use clap::ValueEnum;
use derive_more::Display;

pub use gzip::CompressionError;
pub use mega::MegaBackend;
pub use mysql::{DumpError, MySql};
pub use rclone::{Rclone, RcloneError};

/// Generic off-site upload backend.
pub trait Upload {
    /// Error that may happen on upload.
    type Error;

    /// Uploads `file` and returns a link the operator can download it from.
    fn upload(&mut self, file: &Path) -> Result<String, Self::Error>;
}

/// Available [Upload] backends.
#[derive(Copy, Clone, ValueEnum, Debug, Display, Default, PartialEq, Eq)]
pub enum UploadBackend {
    /// Client side encrypted upload to a MEGA cloud drive.
    #[default]
    #[display("mega")]
    Mega,
    /// Copy to any remote supported by rclone.
    #[display("rclone")]
    Rclone,
}
