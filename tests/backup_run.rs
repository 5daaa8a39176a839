use std::fs;
use std::path::Path;

use clap::Parser;
use db_backup_lib::cli::Cli;
use db_backup_lib::{run, RunError};
use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;

fn cli(backup_dir: &Path, args: &[&str]) -> Cli {
    let backup_dir = backup_dir.to_string_lossy();
    let mut argv = vec!["db_backup", "--backup-dir", &*backup_dir, "--no-notification"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn mega_backup_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/cs").body_contains(r#""a":"us""#);
        then.status(200).json_body(json!([{ "tsid": "SESSION" }]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/cs").body_contains(r#""a":"u""#);
        then.status(200)
            .json_body(json!([{ "p": server.url("/ul") }]));
    });
    let transfer = server.mock(|when, then| {
        when.method(POST).path("/ul");
        then.status(200).body("COMPLETION");
    });
    server.mock(|when, then| {
        when.method(POST).path("/cs").body_contains(r#""a":"p""#);
        then.status(200).json_body(json!([{ "f": [{ "h": "XYZ" }] }]));
    });

    let dir = tempfile::tempdir().unwrap();
    let api_url = server.url("/cs");
    let cli = cli(
        dir.path(),
        &[
            "--dump-command",
            "echo",
            "--db-name",
            "shop",
            "--mega-email",
            "ops@example.com",
            "--mega-api-url",
            api_url.as_str(),
        ],
    );

    let link = run(&cli).unwrap();

    assert!(link.starts_with("https://mega.nz/file/XYZ#"), "{link}");
    transfer.assert_hits(1);

    // only the compressed dump is left
    let files = files_in(dir.path());
    assert_eq!(files.len(), 1, "{files:?}");
    assert!(files[0].starts_with("shop_"), "{files:?}");
    assert!(files[0].ends_with(".sql.gz"), "{files:?}");
}

#[test]
fn rclone_backup_run() {
    let dir = tempfile::tempdir().unwrap();
    let cli = cli(
        dir.path(),
        &[
            "--dump-command",
            "echo",
            "--backend",
            "rclone",
            "--rclone-command",
            "echo",
            "--rclone-remote",
            "s3:backups",
        ],
    );

    let link = run(&cli).unwrap();

    assert!(link.starts_with("link s3:backups/mydatabase_"), "{link}");
    assert!(link.ends_with(".sql.gz"), "{link}");
}

#[test]
fn failing_dump_aborts_run() {
    let server = MockServer::start();
    let api = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!([{}]));
    });

    let dir = tempfile::tempdir().unwrap();
    let api_url = server.url("/cs");
    let cli = cli(
        dir.path(),
        &["--dump-command", "false", "--mega-api-url", api_url.as_str()],
    );

    let err = run(&cli).unwrap_err();

    assert!(matches!(err, RunError::Dump(_)), "{err}");
    assert!(files_in(dir.path()).is_empty());
    api.assert_hits(0);
}

#[test]
fn failing_notification_fails_run_after_upload() {
    let dir = tempfile::tempdir().unwrap();
    let backup_dir = dir.path().to_string_lossy();
    let cli = Cli::try_parse_from([
        "db_backup",
        "--backup-dir",
        &*backup_dir,
        "--dump-command",
        "echo",
        "--backend",
        "rclone",
        "--rclone-command",
        "echo",
        "--rclone-remote",
        "s3:backups",
        "--email-from",
        "not an address",
    ])
    .unwrap();

    let err = run(&cli).unwrap_err();

    assert!(matches!(err, RunError::Notification(_)), "{err}");
    // the uploaded backup stays in place
    assert_eq!(files_in(dir.path()).len(), 1);
}
