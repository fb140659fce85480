//! Content fingerprinting. A chapter's version token is a hash of its
//! canonical JSON form, so two loads of semantically identical content agree
//! regardless of key insertion order or which editor produced the file.

use serde_json::Value;

use crate::error::Result;
use crate::raw_data::RawChapterFile;

pub const VERSION_PREFIX: &str = "v1.1.0-";

const DIGEST_LEN: usize = 6;

/// Compact encoding with object keys in sorted order. `serde_json` maps are
/// backed by a BTreeMap, so serializing a `Value` already yields sorted keys.
pub fn canonical_json_bytes(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Fingerprint of the persisted content subset: the chapter file form minus
/// the `version` field itself. The active flag lives only in the manifest and
/// never participates.
pub fn content_fingerprint(content: &RawChapterFile) -> Result<String> {
    let mut value = serde_json::to_value(content)?;
    if let Some(object) = value.as_object_mut() {
        object.remove("version");
    }

    let bytes = canonical_json_bytes(&value)?;
    let digest = blake3::hash(&bytes);

    Ok(format!(
        "{VERSION_PREFIX}{}",
        &digest.to_hex().as_str()[..DIGEST_LEN]
    ))
}
