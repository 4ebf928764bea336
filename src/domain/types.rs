//! Type-safe wrappers using the new-type pattern.

use std::fmt;
use std::str::FromStr;

use crate::infra::error::{KmsError, KmsResult};

/// Collection segments of a fully qualified crypto key version path.
const KEY_VERSION_COLLECTIONS: [&str; 5] = [
    "projects",
    "locations",
    "keyRings",
    "cryptoKeys",
    "cryptoKeyVersions",
];

/// Characters that would change the meaning of a request URL built from a path.
const URL_RESERVED: [char; 3] = ['?', '#', '%'];

/// Identifier of a key held by the key service.
///
/// Usually a crypto key version resource name such as
/// `projects/p/locations/global/keyRings/r/cryptoKeys/k/cryptoKeyVersions/1`,
/// but any slash-separated path is accepted so that other services can be
/// plugged in behind [`crate::KeyService`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath(String);

impl KeyPath {
    /// Create a new `KeyPath` after validation
    pub fn new(path: impl AsRef<str>) -> KmsResult<Self> {
        let path = path.as_ref();
        Self::validate_path(path)?;
        Ok(KeyPath(path.to_string()))
    }

    /// Build a crypto key version resource name from its components.
    pub fn crypto_key_version(
        project: &str,
        location: &str,
        key_ring: &str,
        crypto_key: &str,
        version: &str,
    ) -> KmsResult<Self> {
        Self::new(format!(
            "projects/{project}/locations/{location}/keyRings/{key_ring}/cryptoKeys/{crypto_key}/cryptoKeyVersions/{version}"
        ))
    }

    /// Get the path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path has the shape of a fully qualified crypto key version.
    #[must_use]
    pub fn is_crypto_key_version(&self) -> bool {
        let segments: Vec<&str> = self.0.split('/').collect();
        segments.len() == KEY_VERSION_COLLECTIONS.len() * 2
            && segments
                .chunks(2)
                .zip(KEY_VERSION_COLLECTIONS)
                .all(|(pair, collection)| pair[0] == collection)
    }

    fn validate_path(path: &str) -> KmsResult<()> {
        if path.is_empty() {
            return Err(KmsError::ValidationError(
                "Key path must not be empty".to_string(),
            ));
        }

        if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(KmsError::ValidationError(format!(
                "Key path must not contain whitespace or control characters: {path:?}"
            )));
        }

        if let Some(c) = path.chars().find(|c| URL_RESERVED.contains(c)) {
            return Err(KmsError::ValidationError(format!(
                "Key path must not contain '{c}': {path}"
            )));
        }

        if path.starts_with('/') || path.ends_with('/') {
            return Err(KmsError::ValidationError(format!(
                "Key path must not start or end with '/': {path}"
            )));
        }

        if path.split('/').any(str::is_empty) {
            return Err(KmsError::ValidationError(format!(
                "Key path contains an empty segment: {path}"
            )));
        }

        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = KmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_key_version_path() {
        let key = KeyPath::crypto_key_version("my-project", "global", "ring", "signer", "1")
            .unwrap();
        assert_eq!(
            key.as_str(),
            "projects/my-project/locations/global/keyRings/ring/cryptoKeys/signer/cryptoKeyVersions/1"
        );
        assert!(key.is_crypto_key_version());
    }

    #[test]
    fn test_short_paths_are_accepted_but_not_versions() {
        let key: KeyPath = "test-key".parse().unwrap();
        assert_eq!(key.to_string(), "test-key");
        assert!(!key.is_crypto_key_version());

        let key = KeyPath::new("projects/p/locations/l/keyRings/r/cryptoKeys/k").unwrap();
        assert!(!key.is_crypto_key_version());
    }

    #[test]
    fn test_invalid_paths() {
        assert!(KeyPath::new("").is_err());
        assert!(KeyPath::new("has space").is_err());
        assert!(KeyPath::new("line\nbreak").is_err());
        assert!(KeyPath::new("/leading").is_err());
        assert!(KeyPath::new("trailing/").is_err());
        assert!(KeyPath::new("double//slash").is_err());
    }

    #[test]
    fn test_url_reserved_characters_rejected() {
        for path in ["key?alt=json", "key#fragment", "key%2Fother", "projects/p%3Fx"] {
            assert!(
                matches!(KeyPath::new(path), Err(KmsError::ValidationError(_))),
                "{path}"
            );
        }
    }
}
