use derive_more::{Display, Error, From};

use crate::backends::{
    gzip, CompressionError, DumpError, MegaBackend, MySql, Rclone, RcloneError, Upload,
    UploadBackend,
};
use crate::cli::Cli;
use crate::mega::MegaError;
use crate::notify::{Mailer, NotificationError, Report};

/// Fatal error of a backup run, tagged with the failed phase.
#[derive(Debug, Display, Error, From)]
pub enum RunError {
    #[display("database dump failed: {_0}")]
    #[from]
    Dump(DumpError),
    #[display("compression failed: {_0}")]
    #[from]
    Compression(CompressionError),
    #[display("MEGA {_0}")]
    #[from]
    Mega(MegaError),
    #[display("rclone upload failed: {_0}")]
    #[from]
    Rclone(RcloneError),
    /// The backup was uploaded, but the operator could not be notified.
    #[display("notification failed: {_0}")]
    #[from]
    Notification(NotificationError),
}

/// Performs one backup: dump, compress, upload and notify, strictly in order.
///
/// The first failing phase aborts the run. Returns the download link.
pub fn run(cli: &Cli) -> Result<String, RunError> {
    let database = &cli.database.name;
    log::info!(target: "run", "Backup of database '{database}' started");

    let dump = MySql::with_config(&cli.backup_dir, cli.database.clone()).dump()?;
    let compressed = gzip::compress(&dump)?;

    let link = match cli.backend {
        UploadBackend::Mega => MegaBackend::with_config(&cli.mega)?.upload(&compressed)?,
        UploadBackend::Rclone => Rclone::with_config(&cli.rclone).upload(&compressed)?,
    };
    log::info!(target: "run", "Backup uploaded: {link}");

    if cli.notification {
        let report = Report::new(database, &compressed, &link);
        Mailer::with_config(&cli.smtp)?.send(&report)?;
    } else {
        log::debug!(target: "run", "Notification disabled");
    }

    Ok(link)
}
