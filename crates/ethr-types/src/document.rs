//! Resolved DID documents.

use serde::{Deserialize, Serialize};

pub const DID_CONTEXT: &str = "https://w3id.org/did/v1";
pub const SECP256K1_RECOVERY_CONTEXT: &str =
    "https://identity.foundation/EcdsaSecp256k1RecoverySignature2020/lds-ecdsa-secp256k1-recovery2020-0.0.jsonld";

/// Describes how to authenticate or authorize interactions with a DID subject.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub controller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_pem: Option<String>,
}

/// An `authentication` entry: a reference to a verification method id or an
/// embedded method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authentication {
    Reference(String),
    Embedded(VerificationMethod),
}

impl From<String> for Authentication {
    fn from(id: String) -> Self {
        Authentication::Reference(id)
    }
}

/// A network address at which services operate on behalf of a DID subject.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub service_endpoint: String,
}

/// A DID document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<Authentication>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

impl Document {
    /// An empty active document with the full context list.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: vec![DID_CONTEXT.into(), SECP256K1_RECOVERY_CONTEXT.into()],
            id: id.into(),
            verification_method: Vec::new(),
            authentication: Vec::new(),
            service: Vec::new(),
        }
    }

    /// The minimal document returned for a deactivated identity.
    pub fn deactivated(id: impl Into<String>) -> Self {
        Self {
            context: vec![DID_CONTEXT.into()],
            id: id.into(),
            verification_method: Vec::new(),
            authentication: Vec::new(),
            service: Vec::new(),
        }
    }

    pub fn find_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_document_shape() {
        let mut doc = Document::new("did:ethr:0xabc");
        doc.verification_method.push(VerificationMethod {
            id: "did:ethr:0xabc#controller".into(),
            kind: "EcdsaSecp256k1RecoveryMethod2020".into(),
            controller: "did:ethr:0xabc".into(),
            blockchain_account_id: Some("0xabc@eip155:1".into()),
            ..Default::default()
        });
        doc.authentication
            .push(Authentication::from("did:ethr:0xabc#controller".to_string()));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["@context"][0], DID_CONTEXT);
        assert_eq!(json["verificationMethod"][0]["type"], "EcdsaSecp256k1RecoveryMethod2020");
        assert_eq!(json["verificationMethod"][0]["blockchainAccountId"], "0xabc@eip155:1");
        assert!(json["verificationMethod"][0].get("publicKeyMultibase").is_none());
        assert_eq!(json["authentication"][0], "did:ethr:0xabc#controller");
        assert!(json.get("service").is_none());
    }

    #[test]
    fn deactivated_document_is_minimal() {
        let doc = Document::deactivated("did:ethr:0xabc");
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            json,
            r#"{"@context":["https://w3id.org/did/v1"],"id":"did:ethr:0xabc"}"#
        );
    }

    #[test]
    fn authentication_accepts_embedded_methods() {
        let raw = r#"["did:x:1#a", {"id":"did:x:1#b","type":"T","controller":"did:x:1"}]"#;
        let auth: Vec<Authentication> = serde_json::from_str(raw).unwrap();
        assert_eq!(auth[0], Authentication::Reference("did:x:1#a".into()));
        assert!(matches!(&auth[1], Authentication::Embedded(m) if m.id == "did:x:1#b"));
    }
}
