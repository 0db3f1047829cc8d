//! Binary cache for parsed rule sets.
//!
//! A priced option's settings JSON only changes when a store manager edits
//! it, so a caller may keep the normalized [`RuleSet`](crate::RuleSet) as
//! bytes and skip re-reading the JSON on every rate calculation.
//!
//! ```text
//! Offset  Size  Field
//! 0       4     b"RGRS"
//! 4       2     cache format revision (u16 LE), must equal the reader's
//! 6       2     writer revision (u16 LE), not checked
//! 8       4     zero
//! 12      4     payload length (u32 LE)
//! 16      16    BLAKE3 of the payload, first 16 bytes
//! 32..    var   bincode payload
//! ```
//!
//! A blob of another format revision fails with
//! [`DeserializeError::IncompatibleVersion`]; callers should drop it and
//! reload the settings JSON. The payload may embed a digest of that JSON
//! (see [`source_digest`]) so a stale cache entry can be detected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::{MatchMode, RuleRecord, RuleSet, Value};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"RGRS";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleSet`](crate::RuleSet) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule set: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to encode stored fields: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoded rule set of {0} bytes is too large to cache")]
    TooLarge(usize),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleSet`](crate::RuleSet) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a rategate binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRuleSet {
    metadata: RuleSetMetadata,
    match_mode: MatchMode,
    hide_unconditionally: bool,
    rules_disabled_for_privileged: bool,
    /// Stored `match_type` that names no mode, as JSON text.
    unrecognized_match_type: Option<String>,
    rules: Vec<SerializedRule>,
    /// Uninterpreted top-level fields as a JSON object.
    extra: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleSetMetadata {
    rule_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    rule_type: String,
    operator: String,
    params: Vec<(String, SerializedValue)>,
    extra: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
    /// Canonical literal, reparsed on load.
    DateTime(String),
    Bool(bool),
}

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

fn serialize_value(value: &Value) -> SerializedValue {
    match value {
        Value::Number(n) => SerializedValue::Number(*n),
        Value::Text(s) => SerializedValue::Text(s.clone()),
        Value::List(items) => SerializedValue::List(items.clone()),
        Value::DateTime(t) => SerializedValue::DateTime(t.to_string()),
        Value::Bool(b) => SerializedValue::Bool(*b),
    }
}

fn deserialize_value(value: SerializedValue) -> Result<Value, DeserializeError> {
    Ok(match value {
        SerializedValue::Number(n) => Value::Number(n),
        SerializedValue::Text(s) => Value::Text(s),
        SerializedValue::List(items) => Value::List(items),
        SerializedValue::DateTime(s) => {
            let t = crate::parse::parse_temporal(&s).map_err(|e| {
                DeserializeError::Validation(format!("bad temporal literal '{s}': {e}"))
            })?;
            Value::DateTime(t)
        }
        SerializedValue::Bool(b) => Value::Bool(b),
    })
}

fn serialize_map(map: &Map<String, Json>) -> Result<String, SerializeError> {
    Ok(serde_json::to_string(map)?)
}

fn deserialize_map(json: &str) -> Result<Map<String, Json>, DeserializeError> {
    serde_json::from_str(json)
        .map_err(|e| DeserializeError::Validation(format!("stored fields are not an object: {e}")))
}

// ---------------------------------------------------------------------------
// RuleSet <-> SerializedRuleSet
// ---------------------------------------------------------------------------

fn ruleset_to_serialized(
    ruleset: &RuleSet,
    source_text: Option<&str>,
) -> Result<SerializedRuleSet, SerializeError> {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    let rules = ruleset
        .rules
        .iter()
        .map(|rule| {
            Ok(SerializedRule {
                rule_type: rule.rule_type.clone(),
                operator: rule.operator.clone(),
                params: rule
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), serialize_value(v)))
                    .collect(),
                extra: serialize_map(&rule.extra)?,
            })
        })
        .collect::<Result<Vec<_>, SerializeError>>()?;

    Ok(SerializedRuleSet {
        metadata: RuleSetMetadata {
            rule_count: ruleset.rules.len(),
            source_digest,
        },
        match_mode: ruleset.match_mode,
        hide_unconditionally: ruleset.hide_unconditionally,
        rules_disabled_for_privileged: ruleset.rules_disabled_for_privileged,
        unrecognized_match_type: ruleset
            .unrecognized_match_type
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?,
        rules,
        extra: serialize_map(&ruleset.extra)?,
    })
}

fn serialized_to_ruleset(ser: SerializedRuleSet) -> Result<RuleSet, DeserializeError> {
    validate(&ser)?;

    let rules = ser
        .rules
        .into_iter()
        .map(|sr| {
            let mut rule = RuleRecord::new(&sr.rule_type, &sr.operator);
            for (key, value) in sr.params {
                rule.params.insert(key, deserialize_value(value)?);
            }
            rule.extra = deserialize_map(&sr.extra)?;
            Ok(rule)
        })
        .collect::<Result<Vec<_>, DeserializeError>>()?;

    Ok(RuleSet {
        rules,
        match_mode: ser.match_mode,
        hide_unconditionally: ser.hide_unconditionally,
        rules_disabled_for_privileged: ser.rules_disabled_for_privileged,
        unrecognized_match_type: ser
            .unrecognized_match_type
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| {
                    DeserializeError::Validation(format!("bad stored match type: {e}"))
                })
            })
            .transpose()?,
        extra: deserialize_map(&ser.extra)?,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedRuleSet) -> Result<(), DeserializeError> {
    if ser.metadata.rule_count != ser.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count,
            ser.rules.len()
        )));
    }

    for (idx, rule) in ser.rules.iter().enumerate() {
        if rule.rule_type.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "rule {idx} has an empty rule type"
            )));
        }
        for window in rule.params.windows(2) {
            if window[0].0 >= window[1].0 {
                return Err(DeserializeError::Validation(format!(
                    "rule {idx} parameters not sorted or duplicated at '{}'",
                    window[1].0
                )));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// The fixed 32-byte preamble in front of every cached rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    format_version: u16,
    payload_len: u32,
    checksum: [u8; 16],
}

impl Header {
    fn for_payload(payload: &[u8]) -> Result<Self, SerializeError> {
        let payload_len =
            u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;
        Ok(Self {
            format_version: FORMAT_VERSION,
            payload_len,
            checksum: checksum(payload),
        })
    }

    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(MAGIC);
        out[4..6].copy_from_slice(&self.format_version.to_le_bytes());
        out[6..8].copy_from_slice(&ENGINE_VERSION.to_le_bytes());
        out[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        out[16..32].copy_from_slice(&self.checksum);
        out
    }

    /// Read the preamble of `bytes`. Anything that is not a rategate cache
    /// of the current format revision is rejected here.
    fn parse(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let Some(head) = bytes.get(..HEADER_SIZE) else {
            return Err(DeserializeError::LengthMismatch {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        };
        if &head[0..4] != MAGIC {
            return Err(DeserializeError::BadMagic);
        }

        let format_version = u16::from_le_bytes([head[4], head[5]]);
        if format_version != FORMAT_VERSION {
            return Err(DeserializeError::IncompatibleVersion {
                blob: format_version,
                supported: FORMAT_VERSION,
            });
        }

        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&head[16..32]);
        Ok(Self {
            format_version,
            payload_len: u32::from_le_bytes([head[12], head[13], head[14], head[15]]),
            checksum,
        })
    }

    /// The payload that follows this header, once its length and checksum
    /// agree with the header.
    fn payload<'b>(&self, bytes: &'b [u8]) -> Result<&'b [u8], DeserializeError> {
        let body = bytes.get(HEADER_SIZE..).unwrap_or_default();
        let expected = self.payload_len as usize;
        let Some(payload) = body.get(..expected) else {
            return Err(DeserializeError::LengthMismatch {
                expected,
                actual: body.len(),
            });
        };
        if checksum(payload) != self.checksum {
            return Err(DeserializeError::ChecksumMismatch);
        }
        Ok(payload)
    }
}

/// First 16 bytes of the payload's BLAKE3 hash.
fn checksum(payload: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&blake3::hash(payload).as_bytes()[..16]);
    out
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    ruleset: &RuleSet,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = ruleset_to_serialized(ruleset, source_text)?;
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&Header::for_payload(&payload)?.to_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    serialized_to_ruleset(decode_payload(bytes)?)
}

fn decode_payload(bytes: &[u8]) -> Result<SerializedRuleSet, DeserializeError> {
    let payload = Header::parse(bytes)?.payload(bytes)?;
    let (serialized, _) = bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// RuleSet API
// ---------------------------------------------------------------------------

impl RuleSet {
    /// Serialize this rule set to a byte vector.
    ///
    /// The optional `source_text` (typically the settings JSON the set was
    /// loaded from) is hashed with BLAKE3 and embedded in the payload
    /// metadata, so a cache can tell when the stored settings changed.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if encoding fails.
    pub fn to_bytes(&self, source_text: Option<&str>) -> Result<Vec<u8>, SerializeError> {
        encode(self, source_text)
    }

    /// Deserialize a rule set previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] on format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        decode(bytes)
    }

    /// Serialize this rule set and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] on encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the rule set it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] on I/O, format, integrity, or validation
    /// failure.
    pub fn from_binary_file(path: impl AsRef<std::path::Path>) -> Result<Self, DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// BLAKE3 digest of the source text embedded by [`RuleSet::to_bytes`], if any.
///
/// # Errors
///
/// Returns [`DeserializeError`] on format or integrity failure.
pub fn source_digest(bytes: &[u8]) -> Result<Option<[u8; 32]>, DeserializeError> {
    Ok(decode_payload(bytes)?.metadata.source_digest)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
