//! Minimal client of the [MEGA] cloud storage API.
//!
//! Only what an unattended upload needs is implemented: login, requesting an
//! upload ticket, encrypting and transferring the file, and registering the
//! resulting node in the cloud drive. The shareable link of the uploaded file is
//! returned.
//!
//! ```no_run
//! # use db_backup_lib::cli::MegaArgs;
//! # use db_backup_lib::mega::Mega;
//! # fn run(args: &MegaArgs) -> Result<(), db_backup_lib::mega::MegaError> {
//! let mut mega = Mega::with_config(args)?;
//! mega.login(&args.email, &args.password)?;
//! let link = mega.upload("backups/mydatabase.sql.gz".as_ref())?;
//! println!("{link}");
//! # Ok(())
//! # }
//! ```
//!
//! [MEGA]: https://mega.io

use std::io;
use std::time::Duration;

use derive_more::{Display, Error, From};
use reqwest::blocking::Client;

use crate::cli::MegaArgs;

pub mod api;
pub mod crypto;
pub mod encoding;
pub mod link;
mod upload;

pub use api::ApiClient;
pub use crypto::{derive_key, FileKey};
pub use upload::UploadTicket;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client bound to one MEGA session.
pub struct Mega {
    api: ApiClient,
    http: Client,
    link_base: String,
    target: Option<String>,
}

impl Mega {
    /// Create a new, not yet logged in, client.
    pub fn with_config(config: &MegaArgs) -> Result<Self, MegaError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(MegaError::Client)?;
        let api = ApiClient::new(
            http.clone(),
            config.api_url.clone(),
            Duration::from_secs(config.api_timeout),
        );

        Ok(Self {
            api,
            http,
            link_base: config.link_base.trim_end_matches('/').to_string(),
            target: config.target.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Authenticates the session, see [`ApiClient::login`].
    pub fn login(&mut self, email: &str, passphrase: &str) -> Result<(), MegaError> {
        self.api.login(email, passphrase)
    }

    /// The underlying RPC client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

/// Errors of the request/response layer of the API.
#[derive(Debug, Display, Error, From)]
pub enum ProtocolError {
    /// The HTTP request could not be completed.
    #[display("request to the storage service failed: {_0}")]
    #[from]
    Transport(reqwest::Error),
    /// The endpoint answered with a non-success HTTP status.
    #[display("storage service answered with HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The response body is not JSON.
    #[display("malformed response envelope: {_0}")]
    Malformed(serde_json::Error),
    /// The response is an empty JSON array.
    #[display("empty response envelope")]
    EmptyEnvelope,
    /// The service reported a negative error code.
    #[display("storage service returned error code {_0}")]
    Status(#[error(ignore)] i64),
}

/// Login failures.
#[derive(Debug, Display, Error)]
pub enum AuthenticationError {
    /// The service rejected the credentials.
    #[display("login rejected with error code {_0}")]
    Rejected(#[error(ignore)] i64),
    /// Neither a long-lived nor a temporary session token was returned.
    #[display("login response contained no session token")]
    MissingSessionToken,
}

/// Phases of an upload that talk to the service.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum UploadPhase {
    #[display("upload ticket request")]
    Ticket,
    #[display("data transfer")]
    Transfer,
    #[display("node registration")]
    Registration,
}

/// Failures while uploading a file.
#[derive(Debug, Display, Error)]
pub enum UploadError {
    /// The service answered a phase with a negative error code.
    #[display("{phase} rejected with error code {code}")]
    Rejected { phase: UploadPhase, code: i64 },
    /// A phase failed below the protocol level.
    #[display("{phase} failed: {source}")]
    Protocol {
        phase: UploadPhase,
        source: ProtocolError,
    },
    /// The ticket response carries no target URL.
    #[display("upload ticket contains no target URL")]
    MissingTargetUrl,
    /// Sending the ciphertext failed.
    #[display("transfer of the encrypted file failed: {_0}")]
    Transfer(reqwest::Error),
    /// The upload target answered with a non-success HTTP status.
    #[display("upload target answered with HTTP {_0}")]
    TransferStatus(#[error(ignore)] u16),
    /// The registration response lists no file node.
    #[display("node registration returned no file handle")]
    MissingNodeHandle,
}

impl UploadError {
    /// Attributes a [`ProtocolError`] to the `phase` it happened in.
    pub(crate) fn in_phase(phase: UploadPhase) -> impl FnOnce(ProtocolError) -> Self {
        move |err| match err {
            ProtocolError::Status(code) => Self::Rejected { phase, code },
            source => Self::Protocol { phase, source },
        }
    }
}

/// Any failure of the [Mega] client.
#[derive(Debug, Display, Error, From)]
pub enum MegaError {
    /// The local file could not be read.
    #[display("reading the local file failed: {_0}")]
    #[from]
    Io(io::Error),
    /// The HTTP client could not be set up.
    #[display("building the HTTP client failed: {_0}")]
    Client(reqwest::Error),
    #[display("{_0}")]
    #[from]
    Protocol(ProtocolError),
    #[display("authentication failed: {_0}")]
    #[from]
    Authentication(AuthenticationError),
    #[display("upload failed: {_0}")]
    #[from]
    Upload(UploadError),
}
