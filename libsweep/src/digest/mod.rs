//! OCI Content Digest validation and manipulation.
//!
//! This module provides a wrapper around the `oci_spec::image::Digest` type
//! to integrate with Sweep's error handling and provide a consistent API.

use crate::error::{Result, SweepError};
use oci_spec::image::Digest as OciDigest;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;


/// Represents a content digest, wrapping the `oci_spec::image::Digest` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl FromStr for Digest {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s).map_err(|e| SweepError::Validation {
            message: format!("Invalid digest format: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(Digest(oci_digest))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Digest {
    /// Returns the encoded part of the digest (the hex string after the colon).
    pub fn encoded(&self) -> &str {
        self.0.digest()
    }

    /// Returns a short form suitable for tables: the first 12 encoded characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::Digest;
    ///
    /// let digest: Digest = "sha256:7173b809ca12ec5dee4506cd86be934c4596dd234ee82c0662eac04a8c2c71dc"
    ///     .parse()
    ///     .unwrap();
    /// assert_eq!(digest.short(), "7173b809ca12");
    /// ```
    pub fn short(&self) -> &str {
        let encoded = self.encoded();
        &encoded[..encoded.len().min(12)]
    }
}
