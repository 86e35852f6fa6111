use ethr_types::multibase::{self, Base};
use ethr_types::{Address, Authentication, Document, VerificationMethod};

use crate::codec::EmbeddedKey;
use crate::error::{ResolveError, Result};
use crate::replay::{account_id, ReplayOutcome, RECOVERY_METHOD_TYPE};

pub const EMBEDDED_KEY_METHOD_TYPE: &str = "EcdsaSecp256k1VerificationKey2019";

/// Builds the final document from the controller, the surviving embedded key
/// and the replayed slots.
pub struct DocumentAssembler<'a> {
    did: &'a str,
    chain_id: u64,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(did: &'a str, chain_id: u64) -> Self {
        Self { did, chain_id }
    }

    /// A deactivated outcome yields `Err(Deactivated)` carrying the minimal document.
    pub fn assemble(
        &self,
        controller: &Address,
        embedded_key: Option<&EmbeddedKey>,
        outcome: ReplayOutcome,
    ) -> Result<Document> {
        if outcome.deactivated {
            return Err(ResolveError::Deactivated(Box::new(Document::deactivated(
                self.did,
            ))));
        }

        let mut doc = Document::new(self.did);
        let controller_id = format!("{}#controller", self.did);
        doc.verification_method.push(VerificationMethod {
            id: controller_id.clone(),
            kind: RECOVERY_METHOD_TYPE.into(),
            controller: self.did.to_string(),
            blockchain_account_id: Some(account_id(controller, self.chain_id)),
            ..Default::default()
        });
        doc.authentication.push(controller_id.into());

        if let Some(key) = embedded_key {
            let key_id = format!("{}#controllerKey", self.did);
            doc.verification_method.push(VerificationMethod {
                id: key_id.clone(),
                kind: EMBEDDED_KEY_METHOD_TYPE.into(),
                controller: self.did.to_string(),
                public_key_multibase: Some(multibase::encode(Base::Base16, key.as_bytes())),
                ..Default::default()
            });
            doc.authentication.push(key_id.into());
        }

        doc.verification_method
            .extend(outcome.verification_methods.into_values());
        doc.authentication.extend(
            outcome
                .authentication
                .into_values()
                .into_iter()
                .map(Authentication::from),
        );
        doc.service.extend(outcome.services.into_values());
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use ethr_types::Service;

    use super::*;
    use crate::slots::SlotKey;

    const DID: &str = "did:ethr:0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    fn controller() -> Address {
        Address::from_hex("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap()
    }

    #[test]
    fn empty_outcome_has_only_controller() {
        let doc = DocumentAssembler::new(DID, 1)
            .assemble(&controller(), None, ReplayOutcome::default())
            .unwrap();
        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(doc.verification_method[0].id, format!("{DID}#controller"));
        assert_eq!(
            doc.verification_method[0].blockchain_account_id.as_deref(),
            Some("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf@eip155:1")
        );
        assert_eq!(
            doc.authentication,
            vec![Authentication::Reference(format!("{DID}#controller"))]
        );
        assert!(doc.service.is_empty());
        assert_eq!(doc.context.len(), 2);
    }

    #[test]
    fn embedded_key_follows_controller() {
        let key = EmbeddedKey::from_compressed(
            &hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap(),
        )
        .unwrap();
        let doc = DocumentAssembler::new(DID, 1337)
            .assemble(&controller(), Some(&key), ReplayOutcome::default())
            .unwrap();
        let method = doc.find_method(&format!("{DID}#controllerKey")).unwrap();
        assert_eq!(method.kind, EMBEDDED_KEY_METHOD_TYPE);
        let multibase = method.public_key_multibase.as_deref().unwrap();
        assert!(multibase.starts_with("f0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"));
        assert_eq!(multibase.len(), 1 + 130);
        assert_eq!(
            doc.authentication[1],
            Authentication::Reference(format!("{DID}#controllerKey"))
        );
    }

    #[test]
    fn slots_are_appended_in_order() {
        let mut outcome = ReplayOutcome::default();
        for (n, name) in ["b", "a"].iter().enumerate() {
            let key = SlotKey::new("DIDAttributeChanged", *name, "00");
            outcome.services.upsert(
                key,
                Service {
                    id: format!("{DID}#service-{}", n + 1),
                    kind: name.to_string(),
                    service_endpoint: "https://x".into(),
                },
            );
        }
        let doc = DocumentAssembler::new(DID, 1)
            .assemble(&controller(), None, outcome)
            .unwrap();
        let kinds: Vec<_> = doc.service.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, ["b", "a"]);
    }

    #[test]
    fn deactivated_outcome_is_minimal() {
        let outcome = ReplayOutcome {
            deactivated: true,
            ..Default::default()
        };
        let err = DocumentAssembler::new(DID, 1)
            .assemble(&controller(), None, outcome)
            .unwrap_err();
        match err {
            ResolveError::Deactivated(doc) => {
                assert_eq!(doc.id, DID);
                assert_eq!(doc.context, vec![ethr_types::DID_CONTEXT.to_string()]);
                assert!(doc.verification_method.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
