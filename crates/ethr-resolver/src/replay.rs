//! Folds a chronological change log into document fragments.
//!
//! Two ordinals run across the whole history: one for delegates and `pub`
//! attributes, one for `svc` attributes. Both advance on every applicable
//! event, including revocations and expired entries, so a fragment id never
//! depends on which earlier entries survived.

use std::sync::LazyLock;

use ethr_types::multibase::{self, Base};
use ethr_types::{Address, AttributeValue, Bytes32, ChangeEvent, ChangeKind, Service, VerificationMethod};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{ResolveError, Result};
use crate::slots::{SlotIndex, SlotKey};

pub const RECOVERY_METHOD_TYPE: &str = "EcdsaSecp256k1RecoveryMethod2020";

const DELEGATE_VERI_KEY: &str = "veriKey";
const DELEGATE_SIG_AUTH: &str = "sigAuth";

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^did/(pub|svc)/(\w+)(/(\w+))?(/(\w+))?$").expect("attribute pattern is a valid regex")
});

fn legacy_kind(kind: &str) -> Option<&'static str> {
    match kind {
        "sigAuth" => Some("SignatureAuthentication2018"),
        "veriKey" => Some("VerificationKey2018"),
        "enc" => Some("KeyAgreementKey2019"),
        _ => None,
    }
}

fn legacy_algorithm(algorithm_and_kind: &str) -> Option<&'static str> {
    match algorithm_and_kind {
        "Secp256k1VerificationKey2018" => Some("EcdsaSecp256k1VerificationKey2019"),
        "Ed25519SignatureAuthentication2018" => Some("Ed25519VerificationKey2018"),
        "Secp256k1SignatureAuthentication2018" => Some("EcdsaSecp256k1VerificationKey2019"),
        "RSAVerificationKey2018" => Some("RSAVerificationKey2018"),
        "Ed25519VerificationKey2018" => Some("Ed25519VerificationKey2018"),
        "X25519KeyAgreementKey2019" => Some("X25519KeyAgreementKey2019"),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Pub,
    Svc,
}

/// A parsed `did/<section>/<algorithm>[/<kind>][/<encoding>]` attribute name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeName {
    pub section: Section,
    pub algorithm: String,
    pub kind: Option<String>,
    pub encoding: Option<String>,
}

impl AttributeName {
    pub fn parse(name: &str) -> Option<Self> {
        let caps = ATTRIBUTE.captures(name)?;
        let section = match caps.get(1)?.as_str() {
            "pub" => Section::Pub,
            _ => Section::Svc,
        };
        Some(Self {
            section,
            algorithm: caps.get(2)?.as_str().to_string(),
            kind: caps.get(4).map(|m| m.as_str().to_string()),
            encoding: caps.get(6).map(|m| m.as_str().to_string()),
        })
    }

    /// Verification method type after legacy aliasing.
    pub fn method_type(&self) -> String {
        let kind = self
            .kind
            .as_deref()
            .map(|k| legacy_kind(k).unwrap_or(k))
            .unwrap_or_default();
        legacy_algorithm(&format!("{}{}", self.algorithm, kind))
            .map(str::to_string)
            .unwrap_or_else(|| self.algorithm.clone())
    }

    pub fn is_signature_authentication(&self) -> bool {
        self.kind.as_deref() == Some(DELEGATE_SIG_AUTH)
    }
}

/// Fragments accumulated by a replay, in slot insertion order.
#[derive(Clone, Debug, Default)]
pub struct ReplayOutcome {
    pub verification_methods: SlotIndex<SlotKey, VerificationMethod>,
    pub authentication: SlotIndex<SlotKey, String>,
    pub services: SlotIndex<SlotKey, Service>,
    pub deactivated: bool,
    pub delegate_ordinal: u64,
    pub service_ordinal: u64,
}

impl ReplayOutcome {
    fn remove_everywhere(&mut self, key: &SlotKey) {
        self.authentication.remove(key);
        self.verification_methods.remove(key);
        self.services.remove(key);
    }
}

/// Replays change events for one DID against a point in time.
pub struct Replayer<'a> {
    did: &'a str,
    chain_id: u64,
    now: u64,
}

impl<'a> Replayer<'a> {
    pub fn new(did: &'a str, chain_id: u64, now: u64) -> Self {
        Self { did, chain_id, now }
    }

    pub fn replay(&self, events: &[ChangeEvent]) -> Result<ReplayOutcome> {
        let mut outcome = ReplayOutcome::default();
        for event in events {
            match &event.kind {
                ChangeKind::OwnerChanged { owner } => {
                    if owner.is_zero() {
                        warn!(did = self.did, block = event.block.0, "identity deactivated");
                        outcome.deactivated = true;
                        break;
                    }
                }
                ChangeKind::DelegateChanged {
                    delegate_type,
                    delegate,
                    valid_to,
                } => self.apply_delegate(&mut outcome, delegate_type, delegate, *valid_to),
                ChangeKind::AttributeChanged {
                    name,
                    value,
                    valid_to,
                } => self.apply_attribute(&mut outcome, name, value, *valid_to)?,
            }
        }
        Ok(outcome)
    }

    fn apply_delegate(
        &self,
        outcome: &mut ReplayOutcome,
        delegate_type: &Bytes32,
        delegate: &Address,
        valid_to: u64,
    ) {
        let delegate_type = delegate_type.normalized();
        let key = SlotKey::new("DIDDelegateChanged", delegate_type.as_str(), delegate.to_checksum());
        outcome.delegate_ordinal += 1;

        if valid_to < self.now {
            outcome.remove_everywhere(&key);
            return;
        }

        let id = format!("{}#delegate-{}", self.did, outcome.delegate_ordinal);
        match delegate_type.as_str() {
            DELEGATE_SIG_AUTH => {
                outcome.authentication.upsert(key.clone(), id.clone());
                outcome
                    .verification_methods
                    .upsert(key, self.recovery_method(id, delegate));
            }
            DELEGATE_VERI_KEY => {
                outcome
                    .verification_methods
                    .upsert(key, self.recovery_method(id, delegate));
            }
            other => debug!(delegate_type = other, "ignoring delegate type"),
        }
    }

    fn apply_attribute(
        &self,
        outcome: &mut ReplayOutcome,
        name: &Bytes32,
        value: &AttributeValue,
        valid_to: u64,
    ) -> Result<()> {
        let name = name.normalized();
        let Some(attribute) = AttributeName::parse(&name) else {
            debug!(attribute = %name, "skipping unrecognised attribute");
            return Ok(());
        };
        let raw = value.as_text();
        let key = SlotKey::new("DIDAttributeChanged", name.as_str(), value.0.clone());
        let payload = raw.strip_prefix("0x").unwrap_or(&raw);

        match attribute.section {
            Section::Pub => outcome.delegate_ordinal += 1,
            Section::Svc => outcome.service_ordinal += 1,
        }

        if valid_to < self.now {
            outcome.remove_everywhere(&key);
            return Ok(());
        }

        match attribute.section {
            Section::Pub => {
                let id = format!("{}#delegate-{}", self.did, outcome.delegate_ordinal);
                let mut method = VerificationMethod {
                    id: id.clone(),
                    kind: attribute.method_type(),
                    controller: self.did.to_string(),
                    ..Default::default()
                };
                match attribute.encoding.as_deref() {
                    None | Some("hex") => {
                        method.public_key_multibase =
                            Some(multibase::encode(Base::Base16, &decode_hex(&name, payload)?));
                    }
                    Some("base64") => {
                        method.public_key_multibase =
                            Some(multibase::encode(Base::Base64, &decode_hex(&name, payload)?));
                    }
                    Some("base58") => {
                        method.public_key_multibase =
                            Some(multibase::encode(Base::Base58Btc, &decode_hex(&name, payload)?));
                    }
                    Some("pem") => method.public_key_pem = Some(payload.to_string()),
                    Some(other) => debug!(attribute = %name, encoding = other, "unknown key encoding"),
                }
                outcome.verification_methods.upsert(key.clone(), method);
                if attribute.is_signature_authentication() {
                    outcome.authentication.upsert(key, id);
                }
            }
            Section::Svc => {
                let endpoint = String::from_utf8_lossy(&decode_hex(&name, payload)?).into_owned();
                outcome.services.upsert(
                    key,
                    Service {
                        id: format!("{}#service-{}", self.did, outcome.service_ordinal),
                        kind: attribute.algorithm,
                        service_endpoint: endpoint,
                    },
                );
            }
        }
        Ok(())
    }

    fn recovery_method(&self, id: String, account: &Address) -> VerificationMethod {
        VerificationMethod {
            id,
            kind: RECOVERY_METHOD_TYPE.into(),
            controller: self.did.to_string(),
            blockchain_account_id: Some(account_id(account, self.chain_id)),
            ..Default::default()
        }
    }
}

/// CAIP-10 style account reference used for `blockchainAccountId`.
pub fn account_id(account: &Address, chain_id: u64) -> String {
    format!("{}@eip155:{}", account.to_checksum(), chain_id)
}

fn decode_hex(name: &str, payload: &str) -> Result<Vec<u8>> {
    hex::decode(payload).map_err(|e| ResolveError::MalformedAttributeEncoding {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
