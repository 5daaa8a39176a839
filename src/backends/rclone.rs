//! Upload backend delegating to [rclone](https://rclone.org).

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use derive_more::{Display, Error};

use crate::backends::Upload;
use crate::cli::RcloneArgs;

/// Errors of the [Rclone] backend.
#[derive(Debug, Display, Error)]
pub enum RcloneError {
    /// No destination configured.
    #[display("no rclone remote configured")]
    NoRemote,
    /// The path to upload has no file name.
    #[display("upload path has no file name")]
    NotAFile,
    /// rclone could not be started.
    #[display("unable to run rclone: {_0}")]
    NotRun(io::Error),
    /// rclone exited unsuccessfully.
    #[display("rclone {command} failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Copies dumps to an rclone remote and shares them with `rclone link`.
pub struct Rclone {
    command: PathBuf,
    remote: String,
}

impl Rclone {
    pub fn with_config(config: &RcloneArgs) -> Self {
        Self {
            command: config.rclone_command.clone(),
            remote: config.remote.clone(),
        }
    }

    fn execute_command(&self, command: &str, args: &[&OsStr]) -> Result<String, RcloneError> {
        let output = Command::new(&self.command)
            .arg(command)
            .args(args)
            .output()
            .map_err(RcloneError::NotRun)?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        if !output.status.success() {
            return Err(RcloneError::Failed {
                command: command.to_string(),
                status: output.status,
                stderr,
            });
        }

        // relay stderr
        if !stderr.is_empty() {
            log::warn!(target: "backend::rclone", "{stderr}");
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Location of `file_name` inside `remote`.
fn remote_path(remote: &str, file_name: &str) -> String {
    if remote.ends_with(':') || remote.ends_with('/') {
        format!("{remote}{file_name}")
    } else {
        format!("{remote}/{file_name}")
    }
}

impl Upload for Rclone {
    type Error = RcloneError;

    fn upload(&mut self, file: &Path) -> Result<String, Self::Error> {
        if self.remote.is_empty() {
            return Err(RcloneError::NoRemote);
        }
        let file_name = file
            .file_name()
            .ok_or(RcloneError::NotAFile)?
            .to_string_lossy();

        log::info!(target: "backend::rclone", "Copy {} to {}", file.display(), self.remote);
        self.execute_command("copy", &[file.as_os_str(), OsStr::new(&self.remote)])?;

        let uploaded = remote_path(&self.remote, &file_name);
        let link = self.execute_command("link", &[OsStr::new(&uploaded)])?;
        log::info!(target: "backend::rclone", "Finished upload to {uploaded}");

        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rclone(command: &str, remote: &str) -> Rclone {
        Rclone::with_config(&RcloneArgs {
            remote: remote.to_string(),
            rclone_command: command.into(),
        })
    }

    #[test]
    fn joins_remote_paths() {
        assert_eq!(remote_path("s3:", "a.gz"), "s3:a.gz");
        assert_eq!(remote_path("s3:backups/", "a.gz"), "s3:backups/a.gz");
        assert_eq!(remote_path("s3:backups", "a.gz"), "s3:backups/a.gz");
    }

    #[test]
    fn link_is_taken_from_stdout() {
        // `echo` stands in for rclone and prints its arguments
        let link = rclone("echo", "s3:backups")
            .upload(Path::new("/tmp/mydatabase.sql.gz"))
            .unwrap();
        assert_eq!(link, "link s3:backups/mydatabase.sql.gz");
    }

    #[test]
    fn requires_remote() {
        let err = rclone("echo", "")
            .upload(Path::new("/tmp/mydatabase.sql.gz"))
            .unwrap_err();
        assert!(matches!(err, RcloneError::NoRemote));
    }

    #[test]
    fn reports_failures() {
        let err = rclone("false", "s3:backups")
            .upload(Path::new("/tmp/mydatabase.sql.gz"))
            .unwrap_err();
        assert!(matches!(err, RcloneError::Failed { ref command, .. } if command == "copy"));
    }
}
