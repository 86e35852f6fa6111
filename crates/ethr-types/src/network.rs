use crate::error::TypeError;

/// Network names understood in the network segment of a `did:ethr` identifier.
pub const KNOWN_NETWORKS: &[(&str, u64)] = &[
    ("dev", 1337),
    ("mainnet", 1),
    ("ropsten", 3),
    ("rinkeby", 4),
    ("goerli", 5),
    ("kovan", 42),
];

/// Map a network name to its chain id.
///
/// Known names are looked up first; anything else is read as a hexadecimal
/// chain id with an optional `0x` prefix.
pub fn chain_id_for(network: &str) -> Result<u64, TypeError> {
    if let Some((_, id)) = KNOWN_NETWORKS.iter().find(|(name, _)| *name == network) {
        return Ok(*id);
    }
    let digits = network.strip_prefix("0x").unwrap_or(network);
    u64::from_str_radix(digits, 16).map_err(|_| TypeError::UnknownNetwork(network.to_string()))
}
