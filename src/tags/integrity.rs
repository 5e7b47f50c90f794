//! Subresource-integrity hashes for emitted asset URLs.

use std::io::Read;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use sha2::{Digest, Sha384};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Computes the integrity attribute value for an asset URL.
///
/// The default implementation fetches the URL over HTTP; hosts that already
/// hold the asset bytes, and tests, implement this directly instead.
pub trait IntegrityProvider {
  /// Integrity attribute value (for example `sha384-...`) for the URL.
  fn integrity_for(&self, url: &str) -> Result<String, IntegrityError>;
}

/// Errors raised while computing an integrity hash.
#[derive(Debug)]
pub enum IntegrityError {
  /// The asset could not be fetched; timeouts land here as well.
  Fetch {
    /// URL whose fetch failed.
    url: String,
    /// Source transport error.
    source: ureq::Error,
  },
  /// The response body could not be read to its end.
  Read {
    /// URL whose body read failed.
    url: String,
    /// Source I/O error.
    source: std::io::Error,
  },
}

impl std::fmt::Display for IntegrityError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Fetch { url, source } => {
        write!(f, "failed to fetch `{url}` for integrity hashing: {source}")
      }
      Self::Read { url, source } => {
        write!(f, "failed to read `{url}` for integrity hashing: {source}")
      }
    }
  }
}

impl std::error::Error for IntegrityError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Fetch { source, .. } => Some(source),
      Self::Read { source, .. } => Some(source),
    }
  }
}

/// Default provider fetching each URL and hashing its body with SHA-384.
pub struct FetchIntegrityProvider {
  agent: ureq::Agent,
}

impl FetchIntegrityProvider {
  /// Provider with the default per-request timeout.
  pub fn new() -> Self {
    Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
  }

  /// Provider whose fetches abort after the given timeout; a timeout is
  /// reported as the same failure class as any other fetch error.
  pub fn with_timeout(timeout: Duration) -> Self {
    let config = ureq::Agent::config_builder()
      .timeout_global(Some(timeout))
      .build();
    Self {
      agent: config.into(),
    }
  }
}

impl Default for FetchIntegrityProvider {
  fn default() -> Self {
    Self::new()
  }
}

impl IntegrityProvider for FetchIntegrityProvider {
  fn integrity_for(&self, url: &str) -> Result<String, IntegrityError> {
    // Protocol-relative CDN URLs cannot be fetched as written.
    let absolute = if url.starts_with("//") {
      format!("https:{url}")
    } else {
      url.to_string()
    };

    let response = self
      .agent
      .get(&absolute)
      .call()
      .map_err(|source| IntegrityError::Fetch {
        url: url.to_string(),
        source,
      })?;

    let mut body = Vec::new();
    response
      .into_body()
      .into_reader()
      .read_to_end(&mut body)
      .map_err(|source| IntegrityError::Read {
        url: url.to_string(),
        source,
      })?;

    Ok(encode_integrity(&body))
  }
}

/// Format a SHA-384 digest of the content as an integrity attribute value.
pub fn encode_integrity(content: &[u8]) -> String {
  let digest = Sha384::digest(content);
  format!("sha384-{}", BASE64_STANDARD.encode(digest))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encodes_the_sha384_digest_in_base64() {
    assert_eq!(
      encode_integrity(b""),
      "sha384-OLBgp1GsljhM2TJ+sbHjaiH9txEUvgdDTAzHv2P24donTt6/529l+9Ua0vFImLlb"
    );
    assert_eq!(
      encode_integrity(b"hello world"),
      "sha384-/b2OdaZ/KfcBpOBAOF4uI5hjA+oQI5IRr5B/y7g1eLPkF8txzmRu/QgZ3YwIjeG9"
    );
  }

  #[test]
  fn errors_name_the_offending_url() {
    let err = IntegrityError::Read {
      url: "https://unpkg.com/istanbul@0.4.5/index.js".to_string(),
      source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "cut short"),
    };
    assert!(err.to_string().contains("istanbul@0.4.5"));
  }
}
