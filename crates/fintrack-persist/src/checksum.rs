//! Integrity checksums for stored values.
//!
//! A cheap rolling 32-bit hash over the serialized JSON form of a value.
//! Its only job is accidental-corruption detection: equal inputs always
//! produce equal checksums, and the function is pure. It is **not**
//! cryptographic and offers no tamper resistance.

use serde::Serialize;

/// Compute the checksum of `value` over its serialized JSON form.
///
/// Struct serialization has stable field order, so two deeply-equal values
/// always yield the same checksum.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if the value cannot be serialized.
pub fn checksum_of<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(rolling_hash(&json).to_string())
}

/// The `(hash << 5) - hash + byte` rolling hash, with wrapping arithmetic.
fn rolling_hash(input: &str) -> u32 {
    let mut hash: u32 = 0;
    for byte in input.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(u32::from(byte));
    }
    hash
}
