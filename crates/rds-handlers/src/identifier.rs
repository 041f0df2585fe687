//! Physical names for resources created without one.
//!
//! The name is derived from the logical identifier and the client request token, so every
//! invocation of the same logical operation generates the same name. A resumed create therefore
//! targets the resource the first invocation created instead of a new one. The suffix is a
//! SHA-256 digest, so the name does not change when the handler is rebuilt or redeployed.

use sha2::{Digest, Sha256};

const SUFFIX_LEN: usize = 12;
const FALLBACK_PREFIX: &str = "resource";

/// `<logical-id>-<suffix>`, lowercased, restricted to letters, digits and single hyphens,
/// starting with a letter and at most `max_len` characters long.
pub fn generate_identifier(logical_id: Option<&str>, token: &str, max_len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(logical_id.unwrap_or_default());
    hasher.update([0u8]);
    hasher.update(token);
    let suffix = hex::encode(hasher.finalize());
    let suffix = &suffix[..SUFFIX_LEN];

    let mut prefix = sanitize(logical_id.unwrap_or_default());
    if prefix.is_empty() {
        prefix = FALLBACK_PREFIX.to_string();
    }
    let room = max_len.saturating_sub(SUFFIX_LEN + 1);
    prefix.truncate(room);
    let prefix = prefix.trim_end_matches('-');

    if prefix.is_empty() {
        format!("r{}", &suffix[..SUFFIX_LEN.min(max_len.saturating_sub(1))])
    } else {
        format!("{prefix}-{suffix}")
    }
}

fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if out.is_empty() && !c.is_ascii_alphabetic() {
                continue;
            }
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}
