use ethr_ledger::LedgerGateway;
use ethr_types::{Did, Document};
use tracing::{debug, info};

use crate::assemble::DocumentAssembler;
use crate::clock::{Clock, SystemClock};
use crate::codec::{parse_target, ResolutionTarget};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::replay::Replayer;
use crate::walker::{ChangeLog, ChangeLogWalker};

/// Resolves `did:ethr` identifiers against one ledger.
///
/// Holds no per-resolution state; every call walks, replays and assembles
/// from scratch, so one resolver can serve concurrent callers.
pub struct EthrResolver<G> {
    gateway: G,
    config: ResolverConfig,
    clock: Box<dyn Clock>,
}

impl<G: LedgerGateway> EthrResolver<G> {
    pub fn new(gateway: G, config: ResolverConfig) -> Self {
        Self {
            gateway,
            config,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the time source used to judge expiry.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolve a DID string.
    pub fn resolve(&self, did: &str) -> Result<Document> {
        let parsed = Did::parse(did).map_err(|e| ResolveError::InvalidIdentifier(e.to_string()))?;
        self.resolve_parsed(&parsed)
    }

    pub fn resolve_parsed(&self, did: &Did) -> Result<Document> {
        let target = self.target(did)?;
        let log = self.walk(&target)?;

        let now = self.clock.now();
        let outcome = Replayer::new(&target.did, target.chain_id, now).replay(&log.events)?;
        let doc = DocumentAssembler::new(&target.did, target.chain_id).assemble(
            &log.controller,
            log.embedded_key.as_ref(),
            outcome,
        )?;

        info!(
            did = %target.did,
            methods = doc.verification_method.len(),
            services = doc.service.len(),
            "resolved"
        );
        Ok(doc)
    }

    /// The chronological change log behind a DID, without replaying it.
    pub fn change_log(&self, did: &Did) -> Result<ChangeLog> {
        let target = self.target(did)?;
        self.walk(&target)
    }

    fn target(&self, did: &Did) -> Result<ResolutionTarget> {
        let target = parse_target(did, &self.config.default_network)?;
        let configured = self.gateway.chain_id();
        if target.chain_id != configured {
            return Err(ResolveError::UnsupportedNetwork {
                requested: target.chain_id,
                configured,
            });
        }
        Ok(target)
    }

    fn walk(&self, target: &ResolutionTarget) -> Result<ChangeLog> {
        debug!(did = %target.did, identity = %target.identity.address, "walking change log");
        ChangeLogWalker::new(
            &self.gateway,
            self.config.registry_address,
            self.config.batch_order,
        )
        .walk(
            target.identity.address,
            target.identity.embedded_key.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ethr_ledger::{GatewayError, InMemoryRegistry, LedgerFixture};
    use ethr_types::{Address, Authentication, DID_CONTEXT};

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::BatchOrder;

    const GENESIS: u64 = 1_600_000_000;
    const OWNER: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
    const OWNER_KEY: &str = "0x0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn owner() -> Address {
        Address::from_hex(OWNER).unwrap()
    }

    fn addr(seed: u8) -> Address {
        Address::from_bytes([seed; 20])
    }

    fn setup() -> (Arc<InMemoryRegistry>, EthrResolver<Arc<InMemoryRegistry>>) {
        setup_with(BatchOrder::Retrieval)
    }

    fn setup_with(
        order: BatchOrder,
    ) -> (Arc<InMemoryRegistry>, EthrResolver<Arc<InMemoryRegistry>>) {
        let registry = Arc::new(InMemoryRegistry::with_timestamp(1337, addr(0xee), GENESIS));
        let config = ResolverConfig::default()
            .with_registry(registry.address())
            .with_batch_order(order);
        let resolver = EthrResolver::new(Arc::clone(&registry), config);
        (registry, resolver)
    }

    fn at(resolver: EthrResolver<Arc<InMemoryRegistry>>, now: u64) -> EthrResolver<Arc<InMemoryRegistry>> {
        resolver.with_clock(FixedClock(now))
    }

    fn did() -> String {
        format!("did:ethr:dev:{OWNER}")
    }

    fn hex_url(url: &str) -> Vec<u8> {
        hex::encode(url).into_bytes()
    }

    #[test]
    fn untouched_identity_resolves_to_controller_only() {
        let (_, resolver) = setup();
        let doc = resolver.resolve(&did()).unwrap();
        assert_eq!(doc.id, did());
        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(doc.verification_method[0].id, format!("{}#controller", did()));
        assert_eq!(
            doc.verification_method[0].blockchain_account_id.as_deref(),
            Some(format!("{OWNER}@eip155:1337").as_str())
        );
        assert_eq!(
            doc.authentication,
            vec![Authentication::Reference(format!("{}#controller", did()))]
        );
        assert!(doc.service.is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let (registry, resolver) = setup();
        let resolver = at(resolver, GENESIS);
        registry
            .add_delegate(owner(), owner(), "veriKey", addr(3), 3600)
            .unwrap();
        registry
            .set_attribute(owner(), owner(), "did/svc/Hub", &hex_url("https://hub"), 3600)
            .unwrap();
        registry.mine().unwrap();

        let first = serde_json::to_vec(&resolver.resolve(&did()).unwrap()).unwrap();
        let second = serde_json::to_vec(&resolver.resolve(&did()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn expired_delegate_disappears() {
        let (registry, resolver) = setup();
        registry
            .add_delegate(owner(), owner(), "sigAuth", addr(3), 100)
            .unwrap();
        registry.mine().unwrap();

        let before = at(resolver, GENESIS + 50);
        let doc = before.resolve(&did()).unwrap();
        assert_eq!(doc.verification_method.len(), 2);
        assert_eq!(doc.authentication.len(), 2);

        let after = before.with_clock(FixedClock(GENESIS + 1_000));
        let doc = after.resolve(&did()).unwrap();
        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(doc.authentication.len(), 1);
    }

    #[test]
    fn revoking_earlier_delegate_keeps_later_id() {
        let (registry, resolver) = setup();
        let resolver = at(resolver, GENESIS);
        registry
            .add_delegate(owner(), owner(), "veriKey", addr(3), 3600)
            .unwrap();
        registry.mine().unwrap();
        registry
            .add_delegate(owner(), owner(), "veriKey", addr(4), 3600)
            .unwrap();
        registry.mine().unwrap();
        let before = resolver.resolve(&did()).unwrap();

        registry
            .revoke_delegate(owner(), owner(), "veriKey", addr(3))
            .unwrap();
        registry.mine().unwrap();
        let after = resolver.resolve(&did()).unwrap();

        let id = format!("{}#delegate-2", did());
        assert_eq!(
            before.find_method(&id).unwrap(),
            after.find_method(&id).unwrap()
        );
        assert!(after.find_method(&format!("{}#delegate-1", did())).is_none());
        assert_eq!(after.verification_method.len(), 2);
    }

    #[test]
    fn deactivation_is_terminal() {
        let (registry, resolver) = setup();
        let resolver = at(resolver, GENESIS);
        registry
            .add_delegate(owner(), owner(), "veriKey", addr(3), 3600)
            .unwrap();
        registry.mine().unwrap();
        registry.change_owner(owner(), owner(), Address::ZERO).unwrap();
        registry.mine().unwrap();

        let err = resolver.resolve(&did()).unwrap_err();
        assert!(err.is_deactivated());
        let ResolveError::Deactivated(doc) = err else {
            unreachable!()
        };
        assert_eq!(doc.id, did());
        assert_eq!(doc.context, vec![DID_CONTEXT.to_string()]);
        assert!(doc.verification_method.is_empty());
        assert!(doc.authentication.is_empty());
    }

    #[test]
    fn owner_change_invalidates_embedded_key() {
        let (registry, resolver) = setup();
        let resolver = at(resolver, GENESIS);
        let key_did = format!("did:ethr:dev:{OWNER_KEY}");

        let doc = resolver.resolve(&key_did).unwrap();
        assert!(doc.find_method(&format!("{key_did}#controllerKey")).is_some());
        assert_eq!(doc.authentication.len(), 2);

        let new_owner = addr(9);
        registry.change_owner(owner(), owner(), new_owner).unwrap();
        registry.mine().unwrap();

        let doc = resolver.resolve(&key_did).unwrap();
        assert!(doc.find_method(&format!("{key_did}#controllerKey")).is_none());
        let controller = doc.find_method(&format!("{key_did}#controller")).unwrap();
        assert_eq!(
            controller.blockchain_account_id.as_deref(),
            Some(format!("{}@eip155:1337", new_owner.to_checksum()).as_str())
        );
    }

    #[test]
    fn set_and_revoke_in_one_batch_depends_on_order() {
        let write = |registry: &InMemoryRegistry| {
            registry
                .set_attribute(owner(), owner(), "did/svc/Foo", &hex_url("https://x"), 1000)
                .unwrap();
            registry
                .revoke_attribute(owner(), owner(), "did/svc/Foo", &hex_url("https://x"))
                .unwrap();
            registry.mine().unwrap();
        };

        let (registry, resolver) = setup_with(BatchOrder::Retrieval);
        let resolver = at(resolver, GENESIS);
        write(&registry);
        let doc = resolver.resolve(&did()).unwrap();
        assert!(doc.service.is_empty());

        // Reversed order applies the revoke first, so the set survives.
        let (registry, resolver) = setup_with(BatchOrder::Reversed);
        let resolver = at(resolver, GENESIS);
        write(&registry);
        let doc = resolver.resolve(&did()).unwrap();
        assert_eq!(doc.service.len(), 1);
        assert_eq!(doc.service[0].id, format!("{}#service-2", did()));
    }

    #[test]
    fn two_services_in_one_batch() {
        let (registry, resolver) = setup();
        let resolver = at(resolver, GENESIS);
        registry
            .set_attribute(owner(), owner(), "did/svc/A", &hex_url("https://a"), 1000)
            .unwrap();
        registry
            .set_attribute(owner(), owner(), "did/svc/B", &hex_url("https://b"), 1000)
            .unwrap();
        registry.mine().unwrap();

        let doc = resolver.resolve(&did()).unwrap();
        let ids: Vec<_> = doc.service.iter().map(|s| s.id.clone()).collect();
        assert_eq!(
            ids,
            [format!("{}#service-1", did()), format!("{}#service-2", did())]
        );
        assert_eq!(doc.service[1].service_endpoint, "https://b");
    }

    #[test]
    fn wrong_network_is_unsupported() {
        let (_, resolver) = setup();
        let err = resolver
            .resolve(&format!("did:ethr:mainnet:{OWNER}"))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnsupportedNetwork {
                requested: 1,
                configured: 1337
            }
        ));
    }

    #[test]
    fn malformed_input_is_invalid_identifier() {
        let (_, resolver) = setup();
        for raw in ["", "not a did", "did:ethr:0x12", "did:ethr:dev:0xZZ"] {
            assert!(
                matches!(resolver.resolve(raw), Err(ResolveError::InvalidIdentifier(_))),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn gateway_errors_abort_resolution() {
        let registry = Arc::new(InMemoryRegistry::with_timestamp(1337, addr(0xee), GENESIS));
        let resolver = EthrResolver::new(registry, ResolverConfig::default());
        let err = resolver.resolve(&did()).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::LedgerUnavailable(GatewayError::UnknownRegistry(_))
        ));
    }

    #[test]
    fn resolves_fixture_histories() {
        let fixture = LedgerFixture::from_json_str(&format!(
            r#"{{
                "chain_id": 1337,
                "registry": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
                "genesis_time": {GENESIS},
                "blocks": [
                    {{ "writes": [
                        {{ "op": "set_attribute", "caller": "{OWNER}", "identity": "{OWNER}",
                           "name": "did/pub/Secp256k1/veriKey/hex",
                           "value": "{OWNER_KEY}", "validity": 86400 }}
                    ] }}
                ]
            }}"#
        ))
        .unwrap();
        let registry = fixture.into_registry().unwrap();
        let config = ResolverConfig::default().with_registry(registry.address());
        let resolver = EthrResolver::new(registry, config).with_clock(FixedClock(GENESIS));

        let doc = resolver.resolve(&did()).unwrap();
        let method = doc.find_method(&format!("{}#delegate-1", did())).unwrap();
        assert_eq!(method.kind, "EcdsaSecp256k1VerificationKey2019");
        assert_eq!(
            method.public_key_multibase.as_deref(),
            Some("f0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
        );
    }

    #[test]
    fn change_log_exposes_history() {
        let (registry, resolver) = setup();
        registry.change_owner(owner(), owner(), addr(5)).unwrap();
        registry.mine().unwrap();
        let log = resolver.change_log(&Did::parse(&did()).unwrap()).unwrap();
        assert_eq!(log.controller, addr(5));
        assert_eq!(log.events.len(), 1);
        assert_eq!(log.batches.len(), 1);
    }
}
