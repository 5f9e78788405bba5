//! The wire `UserData` node: an opaque host object, marshaled entirely
//! through the Codec Seam (`crate::codec`).

use serde::{Deserialize, Serialize};

/// `type_tag` and `data` are both opaque to the core; it treats them as
/// inert bytes handed to and returned by the user-supplied codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    /// A codec-chosen tag identifying the host type this payload decodes to.
    #[serde(rename = "Type")]
    pub type_tag: String,
    /// The opaque payload produced by `UserDataCodec::dump`.
    #[serde(rename = "Data")]
    pub data: Vec<u8>,
}
