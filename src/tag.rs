//! The tag record every constructor produces.
//!
//! A [`Tag`] is plain data: a discriminant string and a payload. It keeps no
//! reference to the union that built it, so it can be encoded, stored or sent
//! elsewhere and later checked against a union again by its discriminant
//! alone. On the wire it is exactly `{"type": <discriminant>, "payload": <value>}`.

use serde::{
    de::{self, DeserializeOwned},
    Deserialize, Serialize,
};
use serde_json::Value;

use crate::error::{UnionError, UnionResult};

/// The discriminant field name in the wire representation.
pub const DISCRIMINANT_FIELD: &str = "type";

/// The payload field name in the wire representation.
pub const PAYLOAD_FIELD: &str = "payload";

// The field names below must stay in sync with the constants above.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag<P = Value> {
    #[serde(rename = "type")]
    discriminant: String,
    payload: P,
}

impl<P> Tag<P> {
    /// Build a tag from its raw parts. Constructors apply the union prefix
    /// before calling this; no validation happens here.
    pub fn new(discriminant: impl Into<String>, payload: P) -> Self {
        Tag {
            discriminant: discriminant.into(),
            payload,
        }
    }

    /// The prefixed discriminant.
    pub fn discriminant(&self) -> &str {
        &self.discriminant
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn into_parts(self) -> (String, P) {
        (self.discriminant, self.payload)
    }

    /// Replace the payload, keeping the discriminant.
    pub fn map<P2>(self, f: impl FnOnce(P) -> P2) -> Tag<P2> {
        Tag {
            discriminant: self.discriminant,
            payload: f(self.payload),
        }
    }
}

impl<P: Serialize> Tag<P> {
    /// Encode the tag in its wire representation.
    pub fn encode(&self) -> UnionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_value(&self) -> UnionResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<P: DeserializeOwned> Tag<P> {
    /// Decode a tag from its wire representation without checking it against
    /// any union. Use [`Methods::decode`] to also check membership.
    ///
    /// [`Methods::decode`]: crate::Methods::decode
    pub fn from_json(text: &str) -> UnionResult<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Decode a tag from an already parsed wire record.
    ///
    /// The payload field is required even when `P` would accept its absence,
    /// as `Option` does.
    pub fn from_value(value: Value) -> UnionResult<Self> {
        if let Value::Object(fields) = &value {
            if !fields.contains_key(PAYLOAD_FIELD) {
                let err = <serde_json::Error as de::Error>::missing_field(PAYLOAD_FIELD);
                return Err(UnionError::Json(err));
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}
