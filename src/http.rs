//! HTTP client factory.
//!
//! Every API client shares one `reqwest::Client` built here. Its trust store is
//! the platform root store plus any certificates found in extra PEM files
//! (normally taken from `NODE_EXTRA_CA_CERTS`), and it never negotiates below
//! TLS 1.2. Building the client performs no network I/O.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqwest::{tls, Certificate};
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Environment variable naming an extra PEM bundle to trust.
pub const EXTRA_CA_CERTS_ENV: &str = "NODE_EXTRA_CA_CERTS";

/// Options for [`new_client`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpClientOptions {
    /// Disable verification of server certificates. Defaults to `false`.
    pub tls_skip_verify: bool,
    /// PEM files whose certificates are added to the trust store.
    pub extra_certificates: Vec<PathBuf>,
}

impl HttpClientOptions {
    /// Options with verification enabled and no extra certificates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options honouring `NODE_EXTRA_CA_CERTS` when it is set.
    pub fn from_env() -> Self {
        let mut options = Self::new();
        if let Ok(path) = std::env::var(EXTRA_CA_CERTS_ENV) {
            options = options.with_extra_certificates(path);
        }
        options
    }

    /// Enable or disable server certificate verification.
    pub fn with_tls_skip_verify(mut self, tls_skip_verify: bool) -> Self {
        self.tls_skip_verify = tls_skip_verify;
        self
    }

    /// Trust the certificates in the PEM file at `path`.
    ///
    /// An empty path, or a path that does not exist, adds nothing.
    pub fn with_extra_certificates(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_certificates.push(path.into());
        self
    }
}

/// Build the shared HTTP client.
///
/// # Errors
///
/// Returns [`ProviderError::Configuration`] if an existing certificate file
/// cannot be read or holds no parsable certificate, and
/// [`ProviderError::Transport`] if the TLS backend cannot be initialised.
pub fn new_client(options: &HttpClientOptions) -> Result<reqwest::Client, ProviderError> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .min_tls_version(tls::Version::TLS_1_2)
        .danger_accept_invalid_certs(options.tls_skip_verify)
        .user_agent(concat!("snyk-provider/", env!("CARGO_PKG_VERSION")));

    if options.tls_skip_verify {
        warn!("TLS certificate verification is disabled");
    }

    for path in &options.extra_certificates {
        for cert in load_certificates(path)? {
            builder = builder.add_root_certificate(cert);
        }
    }

    Ok(builder.build()?)
}

/// Read every certificate from a PEM bundle.
///
/// A missing file yields an empty list.
fn load_certificates(path: &Path) -> Result<Vec<Certificate>, ProviderError> {
    if path.as_os_str().is_empty() {
        return Ok(Vec::new());
    }

    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "extra certificate file not found, skipping");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(ProviderError::Configuration(format!(
                "load certificate {}: read certificates: {}",
                path.display(),
                err
            )))
        }
    };

    let certs = Certificate::from_pem_bundle(&data).map_err(|err| {
        ProviderError::Configuration(format!(
            "load certificate {}: parse certificates: {}",
            path.display(),
            err
        ))
    })?;

    if certs.is_empty() {
        return Err(ProviderError::Configuration(format!(
            "load certificate {}: no certificates found from {}",
            path.display(),
            EXTRA_CA_CERTS_ENV
        )));
    }

    debug!(path = %path.display(), count = certs.len(), "loaded extra certificates");
    Ok(certs)
}
