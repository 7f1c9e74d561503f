/*
 * connection_file.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::wire::jupyter_channel::JupyterChannel;

/// The contents of a Jupyter connection file, as handed to us by whatever
/// launched the kernel.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConnectionFile {
    pub control_port: u16,
    pub shell_port: u16,
    pub stdin_port: u16,
    pub iopub_port: u16,
    pub hb_port: u16,

    /// Generally "tcp"
    pub transport: String,

    /// Generally "hmac-sha256"
    #[serde(default = "default_signature_scheme")]
    pub signature_scheme: String,

    pub ip: String,

    /// The HMAC signing key, or an empty string for an unauthenticated
    /// connection
    pub key: String,
}

fn default_signature_scheme() -> String {
    String::from(crate::session::DEFAULT_SIGNATURE_SCHEME)
}

impl ConnectionFile {
    /// Create a ConnectionFile by parsing the contents of a connection file.
    pub fn from_file<P: AsRef<Path>>(connection_file: P) -> Result<ConnectionFile, Error> {
        let path = connection_file.as_ref().display().to_string();
        let file = match File::open(connection_file) {
            Ok(file) => file,
            Err(err) => return Err(Error::ReadConnectionFile(path, err)),
        };
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|err| Error::ParseConnectionFile(path, err))
    }

    /// Given a port, return a URI-like string that can be used to connect to
    /// the port, given the other parameters in the connection file.
    ///
    /// Example: `32` => `"tcp://127.0.0.1:32"`
    pub fn endpoint(&self, port: u16) -> String {
        format!("{}://{}:{}", self.transport, self.ip, port)
    }

    /// The endpoint a transport should use for the given channel.
    pub fn channel_endpoint(&self, channel: JupyterChannel) -> String {
        let port = match channel {
            JupyterChannel::Shell => self.shell_port,
            JupyterChannel::IOPub => self.iopub_port,
            JupyterChannel::Stdin => self.stdin_port,
            JupyterChannel::Control => self.control_port,
            JupyterChannel::Heartbeat => self.hb_port,
        };
        self.endpoint(port)
    }
}
