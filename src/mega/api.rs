//! Request/response layer of the MEGA API.
//!
//! Every command is a JSON object posted inside a one-element array to a single
//! endpoint. Requests are numbered by the `id` query parameter, which has to
//! increase by one with every request of a session, and authenticated by the
//! `sid` query parameter once logged in.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::{json, Value};

use super::{crypto, encoding, AuthenticationError, MegaError, ProtocolError};

/// Stateful RPC client of one session.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    endpoint: Url,
    timeout: Duration,
    sequence: u64,
    session_id: Option<String>,
}

impl ApiClient {
    pub fn new(http: Client, endpoint: Url, timeout: Duration) -> Self {
        Self {
            http,
            endpoint,
            timeout,
            sequence: 0,
            session_id: None,
        }
    }

    /// Id the next request will carry.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Session token, present after a successful [login](Self::login).
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Issues a single API command and returns its unwrapped result.
    ///
    /// The sequence number is consumed even if the request fails.
    pub fn request(&mut self, payload: Value) -> Result<Value, ProtocolError> {
        let id = self.sequence;
        self.sequence += 1;

        let mut query = vec![("id", id.to_string())];
        if let Some(sid) = &self.session_id {
            query.push(("sid", sid.clone()));
        }
        log::trace!(target: "mega::api", "Request {id}: a={}", payload["a"]);

        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&query)
            .timeout(self.timeout)
            .json(&[payload])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ProtocolError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Value = serde_json::from_str(&body).map_err(ProtocolError::Malformed)?;
        unwrap_envelope(envelope)
    }

    /// Logs in with the account e-mail and passphrase.
    ///
    /// The passphrase key is derived with [`crypto::derive_key`] and sent as
    /// `uh`. The session token is taken from `csid`, falling back to `tsid`.
    pub fn login(&mut self, email: &str, passphrase: &str) -> Result<(), MegaError> {
        log::info!(target: "mega::api", "Logging in as {email}");

        let user_hash = encoding::encode(&crypto::derive_key(passphrase));
        let response = self
            .request(json!({
                "a": "us",
                "user": email,
                "uh": user_hash,
            }))
            .map_err(|err| match err {
                ProtocolError::Status(code) => AuthenticationError::Rejected(code).into(),
                other => MegaError::from(other),
            })?;

        let session_id = ["csid", "tsid"]
            .iter()
            .filter_map(|field| response.get(field).and_then(Value::as_str))
            .find(|sid| !sid.is_empty())
            .ok_or(AuthenticationError::MissingSessionToken)?;

        self.session_id = Some(session_id.to_string());
        log::debug!(target: "mega::api", "Login successful");

        Ok(())
    }
}

/// Extracts the single result from a response envelope.
///
/// Besides the regular one-element array the service may answer with a bare
/// value, usually a negative error code.
fn unwrap_envelope(envelope: Value) -> Result<Value, ProtocolError> {
    let result = match envelope {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or(ProtocolError::EmptyEnvelope)?,
        other => other,
    };

    match result.as_i64() {
        Some(code) if code < 0 => Err(ProtocolError::Status(code)),
        _ => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_single_element_array() {
        let result = unwrap_envelope(json!([{"p": "https://upload"}])).unwrap();
        assert_eq!(result, json!({"p": "https://upload"}));
    }

    #[test]
    fn accepts_bare_values() {
        assert_eq!(unwrap_envelope(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(unwrap_envelope(json!(0)).unwrap(), json!(0));
    }

    #[test]
    fn negative_codes_are_errors() {
        assert!(matches!(
            unwrap_envelope(json!(-9)),
            Err(ProtocolError::Status(-9))
        ));
        assert!(matches!(
            unwrap_envelope(json!([-3])),
            Err(ProtocolError::Status(-3))
        ));
    }

    #[test]
    fn empty_array_is_malformed() {
        assert!(matches!(
            unwrap_envelope(json!([])),
            Err(ProtocolError::EmptyEnvelope)
        ));
    }
}
