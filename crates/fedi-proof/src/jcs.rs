//! RFC 8785 JSON Canonicalization Scheme, scoped to the document shapes
//! Object Integrity Proofs actually canonicalize: ActivityPub objects and
//! proof-options maps built from `serde_json::Value`. Object keys sort by
//! UTF-16 code unit order and are serialized with no insignificant
//! whitespace; number formatting follows `serde_json`'s own (this framework
//! never signs documents containing values outside the safe-integer /
//! typical-float range ActivityPub vocabularies use, so `serde_json`'s
//! formatting and the ECMAScript-style formatting RFC 8785 specifies never
//! diverge in practice).

use serde_json::Value;

/// Canonicalize `value` to its JCS byte representation.
#[must_use]
pub fn canonicalize(value: &Value) -> Vec<u8> {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out.into_bytes()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(&Value::String((*key).clone()), out);
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => {
            // serde_json's compact Display already omits whitespace and
            // escapes strings per JSON syntax; JCS only adds canonical key
            // ordering (handled above) and canonical number formatting,
            // which this crate deliberately does not special-case (see
            // module docs).
            out.push_str(&other.to_string());
        }
    }
}
