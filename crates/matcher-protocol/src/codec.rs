//! One-line JSON codec.
//!
//! One record per line, newline-terminated. The encoded form is what goes
//! over the client stream, into the journals, and out as feed datagrams;
//! keeping a single codec means a journal line replays byte-for-byte as a
//! feed line would have looked.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// A line that could not be encoded or decoded.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed line: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode one record as a newline-terminated JSON line.
pub fn encode_line<T: Serialize>(msg: &T) -> Result<String, WireError> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}

/// Decode one record from a line; the trailing newline is optional.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, WireError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ClientEnvelope;

    #[test]
    fn encoded_line_is_newline_terminated_and_single_line() {
        let envelope = ClientEnvelope::state_marker(7);
        let line = encode_line(&envelope).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn decode_tolerates_missing_newline() {
        let envelope = ClientEnvelope::state_marker(7);
        let line = encode_line(&envelope).unwrap();
        let back: ClientEnvelope = decode_line(line.trim_end()).unwrap();
        assert_eq!(back, envelope);
    }
}
