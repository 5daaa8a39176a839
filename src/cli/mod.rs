use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};
use log::LevelFilter;
use reqwest::Url;

use crate::backends::UploadBackend;

/// Every option can also be supplied through the environment variable named in
/// its help text.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,

    /// Folder the database dumps are written to.
    #[arg(long, short = 'r', env = "BACKUP_DIR", default_value = "./backups")]
    pub backup_dir: PathBuf,

    /// Where to upload the compressed dump to.
    #[arg(long, env = "UPLOAD_BACKEND", default_value = "mega")]
    pub backend: UploadBackend,

    /// Don't send a notification mail after the upload.
    #[arg(
        long = "no-notification",
        action = ArgAction::SetFalse
    )]
    pub notification: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub mega: MegaArgs,

    #[command(flatten)]
    pub rclone: RcloneArgs,

    #[command(flatten)]
    pub smtp: SmtpArgs,
}

/// Database to back up.
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Host of the MySQL server.
    #[arg(long = "db-host", env = "DB_HOST", default_value = "localhost")]
    pub host: String,

    /// User performing the dump.
    #[arg(long = "db-user", env = "DB_USER", default_value = "root")]
    pub user: String,

    /// Password of the dump user.
    #[arg(
        id = "db_password",
        long = "db-password",
        env = "DB_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub password: String,

    /// Name of the database.
    #[arg(long = "db-name", env = "DB_NAME", default_value = "mydatabase")]
    pub name: String,

    /// Program writing the dump to stdout.
    #[arg(long = "dump-command", env = "DUMP_COMMAND", default_value = "mysqldump")]
    pub dump_command: PathBuf,
}

/// Account and endpoints of the MEGA backend.
#[derive(Args, Debug, Clone)]
pub struct MegaArgs {
    /// E-mail of the MEGA account.
    #[arg(long = "mega-email", env = "MEGA_EMAIL", default_value = "")]
    pub email: String,

    /// Password of the MEGA account.
    #[arg(
        id = "mega_password",
        long = "mega-password",
        env = "MEGA_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub password: String,

    /// Endpoint of the MEGA API.
    #[arg(
        long = "mega-api-url",
        env = "MEGA_API_URL",
        default_value = "https://g.api.mega.co.nz/cs"
    )]
    pub api_url: Url,

    /// Base of the generated download links.
    #[arg(long = "mega-link-base", env = "MEGA_LINK_BASE", default_value = "https://mega.nz")]
    pub link_base: String,

    /// Handle of the folder to upload into, the root folder if unset.
    #[arg(long = "mega-target", env = "MEGA_TARGET")]
    pub target: Option<String>,

    /// Timeout of API requests in seconds.
    ///
    /// Transfers of the file itself use a longer timeout depending on its size.
    #[arg(long = "mega-api-timeout", env = "MEGA_API_TIMEOUT", default_value = "60")]
    pub api_timeout: u64,
}

/// Remote of the rclone backend.
#[derive(Args, Debug, Clone)]
pub struct RcloneArgs {
    /// Destination as understood by rclone, e.g. `remote:backups`.
    #[arg(long = "rclone-remote", env = "RCLONE_REMOTE", default_value = "")]
    pub remote: String,

    /// The rclone executable.
    #[arg(long = "rclone-command", env = "RCLONE_COMMAND", default_value = "rclone")]
    pub rclone_command: PathBuf,
}

/// Mail server and addresses of the backup notification.
#[derive(Args, Debug, Clone)]
pub struct SmtpArgs {
    /// SMTP server supporting STARTTLS.
    #[arg(long = "smtp-server", env = "SMTP_SERVER", default_value = "smtp.gmail.com")]
    pub server: String,

    #[arg(long = "smtp-port", env = "SMTP_PORT", default_value = "587")]
    pub port: u16,

    /// Sender address, also used as SMTP login.
    #[arg(long = "email-from", env = "EMAIL_FROM", default_value = "")]
    pub from: String,

    /// SMTP password of the sender.
    #[arg(
        id = "smtp_password",
        long = "email-password",
        env = "EMAIL_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub password: String,

    /// Receiver of the notification.
    #[arg(long = "email-to", env = "EMAIL_TO", default_value = "")]
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["db_backup"]).unwrap();
        assert_eq!(cli.backend, UploadBackend::Mega);
        assert!(cli.notification);
        assert_eq!(cli.database.dump_command, PathBuf::from("mysqldump"));
        assert_eq!(cli.mega.api_url.as_str(), "https://g.api.mega.co.nz/cs");
        assert_eq!(cli.mega.target, None);
        assert_eq!(cli.smtp.port, 587);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "db_backup",
            "--backend",
            "rclone",
            "--no-notification",
            "--db-name",
            "shop",
            "--db-password",
            "hunter2",
            "--rclone-remote",
            "s3:backups",
            "--verbose",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.backend, UploadBackend::Rclone);
        assert!(!cli.notification);
        assert_eq!(cli.database.name, "shop");
        assert_eq!(cli.database.password, "hunter2");
        assert_eq!(cli.rclone.remote, "s3:backups");
        assert_eq!(cli.verbose, Some(LevelFilter::Debug));
    }

    #[test]
    fn passwords_are_independent() {
        let cli = Cli::try_parse_from([
            "db_backup",
            "--mega-password",
            "a",
            "--email-password",
            "b",
        ])
        .unwrap();
        assert_eq!(cli.database.password, "");
        assert_eq!(cli.mega.password, "a");
        assert_eq!(cli.smtp.password, "b");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["db_backup", "--backend", "ftp"]).is_err());
    }

    #[test]
    fn command_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
