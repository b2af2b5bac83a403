//! Low-level RLP helpers layered on top of `alloy_rlp`'s canonical, length-checked codec.
//!
//! Every concrete wire type in this crate derives `RlpEncodable`/`RlpDecodable` (which already
//! enforces minimal-length integers and rejects non-canonical/trailing encodings); this module
//! only covers the handful of places that need to build or inspect a list payload by hand, such
//! as a transaction's unsigned signing payload.

use alloy_rlp::{Encodable, Header};

/// Wraps an already-encoded sequence of RLP items (concatenated) in a list header.
pub fn wrap_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header { list: true, payload_length: payload.len() }.encode(&mut out);
    out.extend_from_slice(&payload);
    out
}
