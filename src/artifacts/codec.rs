//! Native `.gbx` artifact format.
//!
//! The format is a 24-byte header followed by a Postcard-encoded payload.
//!
//! # Format Structure
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("GBXA")
//! 4       1     Version major
//! 5       1     Version minor
//! 6       1     Artifact kind
//! 7       1     Reserved
//! 8       4     Payload size (bytes, little-endian)
//! 12      4     CRC32 checksum of payload
//! 16      4     Number of features
//! 20      4     Reserved
//! ```

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::payload::{ArtifactPayload, Payload, PayloadV1, ScalerPayload};
use crate::model::RegressionModel;
use crate::scaler::StandardScaler;

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying a glassbox artifact file.
pub const MAGIC: &[u8; 4] = b"GBXA";

/// Current format version (major).
pub const CURRENT_VERSION_MAJOR: u8 = 1;

/// Current format version (minor).
pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 24;

// ============================================================================
// Artifact Kind
// ============================================================================

/// Artifact type identifier stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArtifactKind {
    /// Regression model.
    Model = 0,
    /// Fitted scaler.
    Scaler = 1,
}

impl ArtifactKind {
    /// Convert from u8, returning None for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Model),
            1 => Some(Self::Scaler),
            _ => None,
        }
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// 24-byte header for the native artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    /// Format version (major).
    pub version_major: u8,
    /// Format version (minor).
    pub version_minor: u8,
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Size of the payload in bytes.
    pub payload_size: u32,
    /// CRC32 checksum of the payload.
    pub checksum: u32,
    /// Number of input features.
    pub n_features: u32,
}

impl FormatHeader {
    /// Create a header with the current version.
    pub fn new(kind: ArtifactKind, n_features: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            kind,
            payload_size: 0,
            checksum: 0,
            n_features,
        }
    }

    /// Serialize the header to 24 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = self.kind as u8;
        buf[8..12].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf[16..20].copy_from_slice(&self.n_features.to_le_bytes());
        buf
    }

    /// Parse a header from 24 bytes.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DecodeError> {
        if &buf[0..4] != MAGIC {
            return Err(DecodeError::NotAnArtifact);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(DecodeError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        let kind = ArtifactKind::from_u8(buf[6])
            .ok_or_else(|| DecodeError::CorruptPayload("invalid artifact kind".into()))?;
        let payload_size = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let checksum = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let n_features = u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]);

        Ok(Self {
            version_major,
            version_minor,
            kind,
            payload_size,
            checksum,
            n_features,
        })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during artifact serialization.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Postcard encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),
}

/// Errors that can occur during artifact deserialization.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// File is not a glassbox artifact (wrong magic).
    #[error("not a glassbox artifact file")]
    NotAnArtifact,

    /// Artifact requires a newer format version.
    #[error("artifact requires format {major}.{minor} or later")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Payload checksum doesn't match.
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// File was truncated or incomplete.
    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Expected one artifact kind, found another.
    #[error("artifact kind mismatch: expected {expected:?}, got {actual:?}")]
    KindMismatch {
        expected: ArtifactKind,
        actual: ArtifactKind,
    },

    /// Payload is corrupt or malformed.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// I/O error during reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Postcard decoding error.
    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),
}

// ============================================================================
// Encoding
// ============================================================================

fn encode(kind: ArtifactKind, n_features: u32, payload: &Payload) -> Result<Vec<u8>, EncodeError> {
    let body = postcard::to_allocvec(payload)?;

    let mut header = FormatHeader::new(kind, n_features);
    header.payload_size = body.len() as u32;
    header.checksum = crc32fast::hash(&body);

    let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

fn decode(bytes: &[u8], expected_kind: ArtifactKind) -> Result<ArtifactPayload, DecodeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DecodeError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        });
    }
    let mut header_buf = [0u8; HEADER_SIZE];
    header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = FormatHeader::from_bytes(&header_buf)?;

    if header.kind != expected_kind {
        return Err(DecodeError::KindMismatch {
            expected: expected_kind,
            actual: header.kind,
        });
    }

    let expected_len = HEADER_SIZE + header.payload_size as usize;
    if bytes.len() < expected_len {
        return Err(DecodeError::Truncated {
            expected: expected_len,
            actual: bytes.len(),
        });
    }
    let body = &bytes[HEADER_SIZE..expected_len];

    let actual_crc = crc32fast::hash(body);
    if actual_crc != header.checksum {
        return Err(DecodeError::ChecksumMismatch {
            expected: header.checksum,
            actual: actual_crc,
        });
    }

    let Payload::V1(v1) = postcard::from_bytes::<Payload>(body)?;
    Ok(v1.artifact)
}

// ============================================================================
// Public API
// ============================================================================

/// Serialize a model to its `.gbx` byte representation.
pub fn model_to_bytes(model: &RegressionModel) -> Result<Vec<u8>, EncodeError> {
    let payload = Payload::V1(PayloadV1 {
        artifact: ArtifactPayload::Model(model.into()),
    });
    encode(ArtifactKind::Model, model.n_features() as u32, &payload)
}

/// Serialize a scaler to its `.gbx` byte representation.
pub fn scaler_to_bytes(scaler: &StandardScaler) -> Result<Vec<u8>, EncodeError> {
    let payload = Payload::V1(PayloadV1 {
        artifact: ArtifactPayload::Scaler(ScalerPayload::from(scaler)),
    });
    encode(ArtifactKind::Scaler, scaler.n_features() as u32, &payload)
}

/// Deserialize a model from `.gbx` bytes.
pub fn model_from_bytes(bytes: &[u8]) -> Result<RegressionModel, DecodeError> {
    match decode(bytes, ArtifactKind::Model)? {
        ArtifactPayload::Model(p) => {
            RegressionModel::try_from(p).map_err(|e| DecodeError::CorruptPayload(e.to_string()))
        }
        ArtifactPayload::Scaler(_) => Err(DecodeError::CorruptPayload(
            "model header over a scaler payload".into(),
        )),
    }
}

/// Deserialize a scaler from `.gbx` bytes.
pub fn scaler_from_bytes(bytes: &[u8]) -> Result<StandardScaler, DecodeError> {
    match decode(bytes, ArtifactKind::Scaler)? {
        ArtifactPayload::Scaler(p) => Ok(p.into()),
        ArtifactPayload::Model(_) => Err(DecodeError::CorruptPayload(
            "scaler header over a model payload".into(),
        )),
    }
}

/// Write a model artifact file.
pub fn write_model(path: impl AsRef<Path>, model: &RegressionModel) -> Result<(), EncodeError> {
    fs::write(path, model_to_bytes(model)?)?;
    Ok(())
}

/// Read a model artifact file.
pub fn read_model(path: impl AsRef<Path>) -> Result<RegressionModel, DecodeError> {
    model_from_bytes(&fs::read(path)?)
}

/// Write a scaler artifact file.
pub fn write_scaler(path: impl AsRef<Path>, scaler: &StandardScaler) -> Result<(), EncodeError> {
    fs::write(path, scaler_to_bytes(scaler)?)?;
    Ok(())
}

/// Read a scaler artifact file.
pub fn read_scaler(path: impl AsRef<Path>) -> Result<StandardScaler, DecodeError> {
    scaler_from_bytes(&fs::read(path)?)
}

// ============================================================================
// Tests
// ============================================================================
