//! Upload backend storing dumps encrypted in a MEGA cloud drive.

use std::path::Path;

use crate::backends::Upload;
use crate::cli::MegaArgs;
use crate::mega::{Mega, MegaError};

/// [Upload] backend using the built-in [Mega] client.
pub struct MegaBackend {
    client: Mega,
    email: String,
    password: String,
}

impl MegaBackend {
    pub fn with_config(config: &MegaArgs) -> Result<Self, MegaError> {
        Ok(Self {
            client: Mega::with_config(config)?,
            email: config.email.clone(),
            password: config.password.clone(),
        })
    }
}

impl Upload for MegaBackend {
    type Error = MegaError;

    /// Logs in and uploads `file`; nothing is uploaded if the login fails.
    fn upload(&mut self, file: &Path) -> Result<String, Self::Error> {
        log::info!(target: "backend::mega", "Upload {} to MEGA", file.display());
        self.client.login(&self.email, &self.password)?;
        let link = self.client.upload(file)?;
        log::info!(target: "backend::mega", "Finished upload to MEGA");

        Ok(link)
    }
}
