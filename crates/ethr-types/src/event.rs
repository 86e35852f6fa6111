//! Change events recorded by the on-ledger DID registry.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::error::TypeError;

/// Reference to the block holding the next-older batch of events for an identity.
///
/// Pointers strictly decrease along a chain; `0` is the "no previous change"
/// sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangePointer(pub u64);

impl ChangePointer {
    pub const NONE: ChangePointer = ChangePointer(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    pub fn into_option(self) -> Option<ChangePointer> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for ChangePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fixed 32-byte registry field (delegate type or attribute name),
/// right-padded with NUL bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    /// Pack a short string into a padded 32-byte field.
    pub fn from_name(name: &str) -> Result<Self, TypeError> {
        let raw = name.as_bytes();
        if raw.len() > 32 {
            return Err(TypeError::NameTooLong(name.to_string()));
        }
        let mut bytes = [0u8; 32];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    /// The field as text with trailing NUL padding stripped.
    pub fn normalized(&self) -> String {
        let end = self.0.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({:?})", self.normalized())
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normalized())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Bytes32::from_name(&s).map_err(serde::de::Error::custom)
    }
}

/// Raw attribute value bytes as written to the registry.
///
/// Serialized as text, which is how attribute values are written in practice
/// (hex-encoded key material, PEM blocks).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributeValue(pub Vec<u8>);

impl AttributeValue {
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeValue({:?})", self.as_text())
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_text())
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(String::deserialize(deserializer)?.into_bytes()))
    }
}

/// The mutation recorded by a change event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeKind {
    OwnerChanged {
        owner: Address,
    },
    DelegateChanged {
        delegate_type: Bytes32,
        delegate: Address,
        valid_to: u64,
    },
    AttributeChanged {
        name: Bytes32,
        value: AttributeValue,
        valid_to: u64,
    },
}

impl ChangeKind {
    /// Registry event name, used as the first component of slot keys.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChangeKind::OwnerChanged { .. } => "DIDOwnerChanged",
            ChangeKind::DelegateChanged { .. } => "DIDDelegateChanged",
            ChangeKind::AttributeChanged { .. } => "DIDAttributeChanged",
        }
    }
}

/// One event read from the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub identity: Address,
    /// Block number of the identity's previous change at the time of this event.
    pub previous_change: ChangePointer,
    /// Block the event was recorded in.
    pub block: ChangePointer,
    /// Position of the event within its block.
    pub log_index: u32,
    #[serde(flatten)]
    pub kind: ChangeKind,
}
