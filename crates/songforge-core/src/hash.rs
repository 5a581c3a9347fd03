//! Canonical hashing and seed derivation.
//!
//! Determinism policy for the pipeline:
//! - arrangements and other JSON documents are canonicalized (sorted keys,
//!   minimal escaping, stable number formatting) before hashing,
//! - all hashes are BLAKE3, rendered as 64-char lowercase hex,
//! - synthesis randomness uses PCG32 seeds derived from those hashes, so a
//!   render is a pure function of its inputs and component versions.

use serde::Serialize;

use crate::arrangement::SymbolicArrangement;
use crate::error::SongError;
use crate::voice::VoiceSpec;

/// Computes a BLAKE3 hash of arbitrary bytes as lowercase hex.
pub fn blake3_hex(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Computes the canonical BLAKE3 hash of any serializable value.
///
/// The value is serialized to JSON, canonicalized, and hashed. Two values
/// that serialize to the same logical JSON document hash identically
/// regardless of key order.
pub fn canonical_value_hash<T: Serialize>(value: &T) -> Result<String, SongError> {
    let json = serde_json::to_value(value)
        .map_err(|e| SongError::invalid_input(format!("serialization failed: {}", e)))?;
    Ok(blake3_hex(canonicalize_value(&json).as_bytes()))
}

/// Content-addressed render key for stems and masters.
///
/// The key covers the full arrangement, the voice specification, and the
/// component versions involved, so any change to inputs or models yields a
/// different key while identical retries hit the cache.
pub fn render_key(
    arrangement: &SymbolicArrangement,
    voice_spec: &VoiceSpec,
    versions: &[&str],
) -> Result<String, SongError> {
    let arrangement_hash = canonical_value_hash(arrangement)?;
    let mut input = String::with_capacity(128);
    input.push_str("arrangement:");
    input.push_str(&arrangement_hash);
    input.push_str(",voice:");
    input.push_str(&voice_spec.cache_tag());
    for v in versions {
        input.push_str(",v:");
        input.push_str(v);
    }
    Ok(blake3_hex(input.as_bytes()))
}

/// Derives a PCG32 seed for a named component from a base hex hash.
///
/// ```text
/// seed = truncate_u64(BLAKE3(base_hash || key))
/// ```
pub fn derive_component_seed(base_hash: &str, key: &str) -> u64 {
    let mut input = Vec::with_capacity(base_hash.len() + key.len());
    input.extend_from_slice(base_hash.as_bytes());
    input.extend_from_slice(key.as_bytes());
    let hash = blake3::hash(&input);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Canonicalizes a JSON value: sorted object keys, no whitespace, stable
/// number formatting, minimal string escaping.
fn canonicalize_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => format_number(n),
        serde_json::Value::String(s) => format_string(s),
        serde_json::Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(canonicalize_value).collect();
            format!("[{}]", items.join(","))
        }
        serde_json::Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let pairs: Vec<String> = keys
                .iter()
                .map(|k| format!("{}:{}", format_string(k), canonicalize_value(&obj[*k])))
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    if let Some(f) = n.as_f64() {
        if f.is_nan() || f.is_infinite() {
            return "null".to_string();
        }
        if f == 0.0 {
            return "0".to_string();
        }
        if f.fract() == 0.0 && f.abs() < 1e15 {
            return format!("{}", f as i64);
        }
        let s = format!("{}", f);
        if s.contains('.') && !s.contains('e') && !s.contains('E') {
            return s.trim_end_matches('0').trim_end_matches('.').to_string();
        }
        s
    } else {
        "null".to_string()
    }
}

fn format_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
