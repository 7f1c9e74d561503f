/*
 * session.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::fmt;

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;
use uuid::Uuid;

use crate::connection_file::ConnectionFile;
use crate::error::Error;

/// The signature scheme used when none is given.
pub const DEFAULT_SIGNATURE_SCHEME: &str = "hmac-sha256";

/// Client session state shared by all the sockets connected to one kernel.
#[derive(Clone)]
pub struct Session {
    /// Signing key, if messages are to be signed
    pub hmac: Option<Hmac<Sha256>>,

    /// Username stamped on outgoing message headers
    pub username: String,

    /// Session ID stamped on outgoing message headers
    pub session_id: String,
}

impl Session {
    /// Create a session from a signing key and a signature scheme name. An
    /// empty key creates an unauthenticated session.
    pub fn create(key: &str, scheme: &str) -> Result<Self, Error> {
        Ok(Self {
            hmac: hmac_from_key(key, scheme)?,
            username: String::from("username"),
            session_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn from_connection_file(connection_file: &ConnectionFile) -> Result<Self, Error> {
        Self::create(&connection_file.key, &connection_file.signature_scheme)
    }

    /// Replace the identity stamped on outgoing messages.
    pub fn with_identity(mut self, username: impl Into<String>, session_id: impl Into<String>) -> Self {
        self.username = username.into();
        self.session_id = session_id.into();
        self
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("signed", &self.hmac.is_some())
            .field("username", &self.username)
            .field("session_id", &self.session_id)
            .finish()
    }
}

/// Build the HMAC signer for a key. Both the wire identifier `hmac-sha256`
/// and the bare digest name `sha256` select HMAC-SHA256, the only supported
/// construction.
pub fn hmac_from_key(key: &str, scheme: &str) -> Result<Option<Hmac<Sha256>>, Error> {
    match scheme {
        "hmac-sha256" | "sha256" => {},
        _ => return Err(Error::UnsupportedSignatureScheme(String::from(scheme))),
    }

    if key.is_empty() {
        return Ok(None);
    }

    match Hmac::<Sha256>::new_from_slice(key.as_bytes()) {
        Ok(hmac) => Ok(Some(hmac)),
        Err(err) => Err(Error::HmacKeyInvalid(String::from(key), err)),
    }
}
