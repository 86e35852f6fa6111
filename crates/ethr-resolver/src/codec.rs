//! Interpretation of `did:ethr` method-specific identifiers.
//!
//! An identifier is an optional `<network>:` prefix followed by either a
//! 20-byte address or a 33-byte compressed secp256k1 public key, both
//! `0x`-prefixed hex.

use std::sync::LazyLock;

use ethr_types::{chain_id_for, Address, Did, ADDRESS_HEX_LEN};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use regex::Regex;

use crate::error::{ResolveError, Result};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)?(0x[0-9a-fA-F]{40}|0x[0-9a-fA-F]{66})$")
        .expect("identifier pattern is a valid regex")
});

/// A public key carried by the identifier itself, in uncompressed SEC1 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedKey {
    uncompressed: Vec<u8>,
}

impl EmbeddedKey {
    /// Decompress a 33-byte compressed secp256k1 key.
    pub fn from_compressed(compressed: &[u8]) -> Result<Self> {
        let key = PublicKey::from_sec1_bytes(compressed)
            .map_err(|e| ResolveError::InvalidIdentifier(format!("undecodable public key: {e}")))?;
        Ok(Self {
            uncompressed: key.to_encoded_point(false).as_bytes().to_vec(),
        })
    }

    /// The 65-byte uncompressed key, leading `0x04`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.uncompressed
    }

    /// Address controlled by this key.
    pub fn address(&self) -> Result<Address> {
        Address::from_uncompressed_key(&self.uncompressed)
            .map_err(|e| ResolveError::InvalidIdentifier(e.to_string()))
    }
}

/// The on-ledger identity named by an identifier, with the key it embedded, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub address: Address,
    pub embedded_key: Option<EmbeddedKey>,
}

/// Everything the walker needs to know about a parsed `did:ethr` DID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionTarget {
    /// The bare DID; becomes the document id.
    pub did: String,
    pub chain_id: u64,
    pub identity: Identity,
}

/// Turn an address or compressed key string into an identity handle.
///
/// Strings longer than an address are treated as compressed public keys.
pub fn interpret_identifier(identifier: &str) -> Result<Identity> {
    if identifier.len() > ADDRESS_HEX_LEN {
        let digits = identifier.strip_prefix("0x").unwrap_or(identifier);
        let compressed = hex::decode(digits)
            .map_err(|e| ResolveError::InvalidIdentifier(format!("{identifier}: {e}")))?;
        let key = EmbeddedKey::from_compressed(&compressed)?;
        return Ok(Identity {
            address: key.address()?,
            embedded_key: Some(key),
        });
    }
    let address = Address::from_hex(identifier)
        .map_err(|e| ResolveError::InvalidIdentifier(format!("{identifier}: {e}")))?;
    Ok(Identity {
        address,
        embedded_key: None,
    })
}

/// Split a parsed `did:ethr` DID into network and identity.
pub fn parse_target(did: &Did, default_network: &str) -> Result<ResolutionTarget> {
    if did.method != "ethr" {
        return Err(ResolveError::InvalidIdentifier(format!(
            "unknown did method: '{}'",
            did.method
        )));
    }
    let caps = IDENTIFIER
        .captures(&did.id)
        .ok_or_else(|| ResolveError::InvalidIdentifier(format!("not a valid ethr did: {did}")))?;

    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let network = if prefix.is_empty() {
        default_network
    } else {
        prefix
            .strip_suffix(':')
            .ok_or_else(|| ResolveError::InvalidIdentifier(format!("not a valid ethr did: {did}")))?
    };
    let chain_id = chain_id_for(network)
        .map_err(|e| ResolveError::InvalidIdentifier(format!("{did}: {e}")))?;

    let identifier = caps.get(2).map_or("", |m| m.as_str());
    Ok(ResolutionTarget {
        did: did.did(),
        chain_id,
        identity: interpret_identifier(identifier)?,
    })
}
