use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use super::{encoding, link, FileKey, Mega, MegaError, UploadError, UploadPhase};

/// Lower bound of the time allowed for transferring the ciphertext.
const MIN_TRANSFER_TIMEOUT: Duration = Duration::from_secs(600);
/// Slowest transfer rate still accepted, in bytes per second.
const MIN_TRANSFER_RATE: u64 = 256 * 1024;

/// Grant to upload one file of `size` bytes to `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub url: String,
    pub size: u64,
}

#[derive(Serialize)]
struct NodeAttributes<'a> {
    #[serde(rename = "n")]
    name: &'a str,
}

fn transfer_timeout(size: u64) -> Duration {
    MIN_TRANSFER_TIMEOUT.max(Duration::from_secs(size / MIN_TRANSFER_RATE))
}

impl Mega {
    /// Uploads the file at `path` into the configured target folder.
    ///
    /// The whole file is read into memory and encrypted under a fresh
    /// [`FileKey`]. Returns the shareable link of the new file node.
    pub fn upload(&mut self, path: &Path) -> Result<String, MegaError> {
        self.upload_with_key(path, FileKey::generate())
    }

    /// Same as [`upload`](Self::upload) with a caller supplied key.
    ///
    /// Never reuse a key for a second upload.
    pub fn upload_with_key(&mut self, path: &Path, file_key: FileKey) -> Result<String, MegaError> {
        let data = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = data.len() as u64;
        log::info!(target: "mega::upload", "Preparing upload of {} ({size} bytes)", path.display());

        let ticket = self.request_ticket(size)?;

        let ciphertext = file_key.encrypt_payload(&data);
        drop(data);
        let completion_handle = self.transfer(&ticket, ciphertext)?;
        log::debug!(target: "mega::upload", "Transferred encrypted file, completion handle: {completion_handle}");

        let attributes = serde_json::to_vec(&NodeAttributes { name: &file_name })
            .map_err(|err| MegaError::Io(err.into()))?;
        let attributes = file_key.encrypt_attributes(&attributes);

        let response = self
            .api
            .request(json!({
                "a": "p",
                "t": self.target,
                "n": [{
                    "h": completion_handle,
                    "t": 0,
                    "a": encoding::encode(&attributes),
                    "k": encoding::encode(&file_key.key_material()),
                }],
            }))
            .map_err(UploadError::in_phase(UploadPhase::Registration))?;

        let handle = response
            .get("f")
            .and_then(|nodes| nodes.get(0))
            .and_then(|node| node.get("h"))
            .and_then(Value::as_str)
            .filter(|handle| !handle.is_empty())
            .ok_or(UploadError::MissingNodeHandle)?;
        log::info!(target: "mega::upload", "Upload of {file_name} complete, node handle: {handle}");

        Ok(link::build(&self.link_base, handle, &file_key))
    }

    fn request_ticket(&mut self, size: u64) -> Result<UploadTicket, UploadError> {
        let response = self
            .api
            .request(json!({ "a": "u", "s": size }))
            .map_err(UploadError::in_phase(UploadPhase::Ticket))?;

        let url = response
            .get("p")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or(UploadError::MissingTargetUrl)?;
        log::trace!(target: "mega::upload", "Upload ticket for {size} bytes: {url}");

        Ok(UploadTicket {
            url: url.to_string(),
            size,
        })
    }

    /// Posts the ciphertext and returns the completion handle.
    fn transfer(&self, ticket: &UploadTicket, ciphertext: Vec<u8>) -> Result<String, UploadError> {
        let response = self
            .http
            .post(&ticket.url)
            .timeout(transfer_timeout(ticket.size))
            .body(ciphertext)
            .send()
            .map_err(UploadError::Transfer)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::TransferStatus(status.as_u16()));
        }

        let handle = response.text().map_err(UploadError::Transfer)?;
        match handle.trim().parse::<i64>() {
            Ok(code) if code < 0 => Err(UploadError::Rejected {
                phase: UploadPhase::Transfer,
                code,
            }),
            _ => Ok(handle),
        }
    }
}
