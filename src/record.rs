//! DKIM key record parsing (RFC 6376 tag-list syntax).
//!
//! A DKIM key record is the TXT value published under
//! `<selector>._domainkey.<domain>`, e.g.
//! `v=DKIM1; k=rsa; p=MIGfMA0...`. Tags are `name=value` pairs separated
//! by semicolons; unknown tags are ignored. The `p=` tag carries the
//! base64 SubjectPublicKeyInfo and is the only required tag.

use std::fmt;

use thiserror::Error;

/// Key type declared by the `k=` tag. Defaults to RSA when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    Ed25519,
    Other(String),
}

impl KeyType {
    fn from_tag(value: &str) -> Self {
        match value {
            "rsa" => KeyType::Rsa,
            "ed25519" => KeyType::Ed25519,
            other => KeyType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Rsa => write!(f, "rsa"),
            KeyType::Ed25519 => write!(f, "ed25519"),
            KeyType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Why a record string could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A tag was not of the form `name=value`.
    #[error("malformed tag `{0}`")]
    MalformedTag(String),
    /// A `v=` tag was present with a version other than DKIM1.
    #[error("unsupported record version `{0}`")]
    UnsupportedVersion(String),
    /// No `p=` tag in the record.
    #[error("record has no p= tag")]
    MissingPublicKey,
    /// An empty `p=` tag, which RFC 6376 defines as a revoked key.
    #[error("key has been revoked (empty p= tag)")]
    RevokedKey,
}

/// A parsed DKIM key record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// `v=` tag, if present (always `DKIM1` when present).
    pub version: Option<String>,
    /// `k=` tag, defaulting to RSA.
    pub key_type: KeyType,
    /// `h=` tag: colon-separated acceptable hash algorithms.
    pub hash_algorithms: Option<String>,
    /// `s=` tag: colon-separated service types.
    pub service_types: Option<String>,
    /// `t=` tag: colon-separated flags (`y` testing, `s` strict).
    pub flags: Option<String>,
    /// `n=` tag: human-readable notes.
    pub notes: Option<String>,
    /// `p=` tag with all whitespace removed: base64 SubjectPublicKeyInfo.
    pub public_key_data: String,
}

impl KeyRecord {
    /// Parse a DKIM TXT record value.
    ///
    /// Whitespace around tags and tag names is tolerated, as is folding
    /// whitespace inside the `p=` value (common when the TXT record was
    /// split across multiple strings).
    pub fn parse(record: &str) -> Result<KeyRecord, RecordError> {
        let mut version = None;
        let mut key_type = None;
        let mut hash_algorithms = None;
        let mut service_types = None;
        let mut flags = None;
        let mut notes = None;
        let mut public_key_data = None;

        for tag in record.split(';') {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            let (name, value) = tag
                .split_once('=')
                .ok_or_else(|| RecordError::MalformedTag(tag.to_string()))?;
            let name = name.trim();
            let value = value.trim();
            match name {
                "v" => {
                    if value != "DKIM1" {
                        return Err(RecordError::UnsupportedVersion(value.to_string()));
                    }
                    version = Some(value.to_string());
                }
                "k" => key_type = Some(KeyType::from_tag(value)),
                "h" => hash_algorithms = Some(value.to_string()),
                "s" => service_types = Some(value.to_string()),
                "t" => flags = Some(value.to_string()),
                "n" => notes = Some(value.to_string()),
                "p" => {
                    let data: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                    public_key_data = Some(data);
                }
                // Unknown tags must be ignored per RFC 6376 §3.6.1.
                _ => {}
            }
        }

        let public_key_data = public_key_data.ok_or(RecordError::MissingPublicKey)?;
        if public_key_data.is_empty() {
            return Err(RecordError::RevokedKey);
        }

        Ok(KeyRecord {
            version,
            key_type: key_type.unwrap_or(KeyType::Rsa),
            hash_algorithms,
            service_types,
            flags,
            notes,
            public_key_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let record =
            KeyRecord::parse("v=DKIM1; k=rsa; h=sha256; s=email; t=y; n=test key; p=MIGfMA0G")
                .unwrap();
        assert_eq!(record.version.as_deref(), Some("DKIM1"));
        assert_eq!(record.key_type, KeyType::Rsa);
        assert_eq!(record.hash_algorithms.as_deref(), Some("sha256"));
        assert_eq!(record.service_types.as_deref(), Some("email"));
        assert_eq!(record.flags.as_deref(), Some("y"));
        assert_eq!(record.notes.as_deref(), Some("test key"));
        assert_eq!(record.public_key_data, "MIGfMA0G");
    }

    #[test]
    fn test_optional_tags_default_to_none() {
        let record = KeyRecord::parse("v=DKIM1; k=rsa; p=MIGfMA0G").unwrap();
        assert_eq!(record.hash_algorithms, None);
        assert_eq!(record.service_types, None);
        assert_eq!(record.flags, None);
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_key_type_defaults_to_rsa() {
        let record = KeyRecord::parse("p=MIGfMA0G").unwrap();
        assert_eq!(record.key_type, KeyType::Rsa);
        assert_eq!(record.version, None);
    }

    #[test]
    fn test_ed25519_key_type() {
        let record = KeyRecord::parse("v=DKIM1; k=ed25519; p=11qYAYKx").unwrap();
        assert_eq!(record.key_type, KeyType::Ed25519);
    }

    #[test]
    fn test_unknown_key_type_is_preserved() {
        let record = KeyRecord::parse("k=dsa; p=AAAA").unwrap();
        assert_eq!(record.key_type, KeyType::Other("dsa".to_string()));
    }

    #[test]
    fn test_whitespace_stripped_from_public_key_data() {
        let record = KeyRecord::parse("v=DKIM1; k=rsa; p=MIGf MA0G\n CSqG").unwrap();
        assert_eq!(record.public_key_data, "MIGfMA0GCSqG");
    }

    #[test]
    fn test_missing_public_key_tag() {
        assert_eq!(
            KeyRecord::parse("v=DKIM1; k=rsa"),
            Err(RecordError::MissingPublicKey)
        );
    }

    #[test]
    fn test_empty_public_key_is_revoked() {
        assert_eq!(
            KeyRecord::parse("v=DKIM1; k=rsa; p="),
            Err(RecordError::RevokedKey)
        );
    }

    #[test]
    fn test_unsupported_version() {
        assert_eq!(
            KeyRecord::parse("v=DKIM2; p=AAAA"),
            Err(RecordError::UnsupportedVersion("DKIM2".to_string()))
        );
    }

    #[test]
    fn test_malformed_tag() {
        assert_eq!(
            KeyRecord::parse("v=DKIM1; rsa; p=AAAA"),
            Err(RecordError::MalformedTag("rsa".to_string()))
        );
    }

    #[test]
    fn test_unknown_tags_ignored() {
        let record = KeyRecord::parse("v=DKIM1; g=*; q=dns; p=AAAA").unwrap();
        assert_eq!(record.public_key_data, "AAAA");
    }

    #[test]
    fn test_trailing_semicolon() {
        let record = KeyRecord::parse("v=DKIM1; k=rsa; p=AAAA;").unwrap();
        assert_eq!(record.public_key_data, "AAAA");
    }
}
