//! Implements the database dump using `mysqldump`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use chrono::Local;
use derive_more::{Display, Error};

use crate::cli::DatabaseArgs;

/// Errors while dumping the database.
#[derive(Debug, Display, Error)]
pub enum DumpError {
    /// The backup directory can't be created.
    #[display("unable to create the backup directory: {_0}")]
    BackupDir(io::Error),
    /// The dump file can't be created.
    #[display("unable to create the dump file: {_0}")]
    DumpFile(io::Error),
    /// The dump command could not be started.
    #[display("unable to run the dump command: {_0}")]
    NotRun(io::Error),
    /// The dump command exited unsuccessfully.
    #[display("dump command failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// Dumps a MySQL (or MariaDB) database into the backup directory.
pub struct MySql {
    config: DatabaseArgs,
    dump_dest: PathBuf,
}

impl MySql {
    /// Create a new [MySql] instance writing to `backup_dir`.
    pub fn with_config(backup_dir: &Path, config: DatabaseArgs) -> Self {
        if backup_dir.is_relative() {
            log::warn!(target: "backend::mysql", "backup_dir is relative: {}", backup_dir.display());
        }

        Self {
            config,
            dump_dest: backup_dir.to_path_buf(),
        }
    }

    fn generate_dump_filename(&self) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");

        self.dump_dest
            .join(format!("{}_{timestamp}.sql", self.config.name))
    }

    /// Runs the dump command and returns the path of the written dump.
    ///
    /// The password is handed over in `MYSQL_PWD` so it doesn't show up in the
    /// process list. A failed dump leaves no file behind.
    pub fn dump(&self) -> Result<PathBuf, DumpError> {
        let DatabaseArgs {
            host,
            user,
            password,
            name,
            dump_command,
        } = &self.config;
        log::info!(target: "backend::mysql", "Create dump of database '{name}' on {host}");
        log::trace!(target: "backend::mysql", "Using user '{user}' for the dump");

        fs::create_dir_all(&self.dump_dest).map_err(DumpError::BackupDir)?;
        let dump_file = self.generate_dump_filename();
        log::debug!(target: "backend::mysql", "Save database dump at: {}", dump_file.display());
        let output_file = File::create_new(&dump_file).map_err(DumpError::DumpFile)?;

        let output = Command::new(dump_command)
            .arg(format!("--host={host}"))
            .arg(format!("--user={user}"))
            .arg(name)
            .env("MYSQL_PWD", password)
            .stdin(Stdio::null())
            .stdout(output_file)
            .stderr(Stdio::piped())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                remove_partial_dump(&dump_file);
                return Err(DumpError::NotRun(e));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        if !output.status.success() {
            remove_partial_dump(&dump_file);
            return Err(DumpError::Failed {
                status: output.status,
                stderr,
            });
        }

        // relay warnings of the dump tool
        if !stderr.is_empty() {
            log::warn!(target: "backend::mysql", "{stderr}");
        }
        log::info!(target: "backend::mysql", "Finished database dump: {}", dump_file.display());

        Ok(dump_file)
    }
}

fn remove_partial_dump(dump_file: &Path) {
    if let Err(e) = fs::remove_file(dump_file) {
        log::warn!(target: "backend::mysql", "Removing incomplete dump {} failed: {e}", dump_file.display());
    }
}
