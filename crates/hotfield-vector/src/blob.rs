//! Packed little-endian `f32` blob encoding, for storage in a `BLOB` column.

use crate::error::VectorError;

/// Encode a vector as a packed little-endian `f32` byte sequence.
#[must_use]
pub fn encode(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() * 4);
    for x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

/// Decode a packed little-endian `f32` byte sequence.
///
/// # Errors
///
/// Returns [`VectorError::MalformedBlob`] if the byte length is not a
/// multiple of 4.
pub fn decode(blob: &[u8]) -> Result<Vec<f32>, VectorError> {
    if blob.len() % 4 != 0 {
        return Err(VectorError::MalformedBlob(format!(
            "blob length {} is not a multiple of 4",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let v = vec![0.9_f32, -0.1, 0.0, 3.5, -1234.5];
        let blob = encode(&v);
        assert_eq!(blob.len(), v.len() * 4);
        let back = decode(&blob).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn decode_rejects_truncated_blob() {
        let err = decode(&[0u8, 1, 2]).unwrap_err();
        assert!(matches!(err, VectorError::MalformedBlob(_)));
    }

    #[test]
    fn decode_empty_blob_is_empty_vector() {
        assert_eq!(decode(&[]).unwrap(), Vec::<f32>::new());
    }
}
