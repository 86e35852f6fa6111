use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;

/// Multibase alphabets used for `publicKeyMultibase` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Base {
    /// `f` prefix, lowercase hex.
    Base16,
    /// `m` prefix, standard alphabet without padding.
    Base64,
    /// `z` prefix, bitcoin alphabet.
    Base58Btc,
}

impl Base {
    pub fn prefix(self) -> char {
        match self {
            Base::Base16 => 'f',
            Base::Base64 => 'm',
            Base::Base58Btc => 'z',
        }
    }
}

pub fn encode(base: Base, bytes: &[u8]) -> String {
    let body = match base {
        Base::Base16 => hex::encode(bytes),
        Base::Base64 => STANDARD_NO_PAD.encode(bytes),
        Base::Base58Btc => bs58::encode(bytes).into_string(),
    };
    let mut out = String::with_capacity(body.len() + 1);
    out.push(base.prefix());
    out.push_str(&body);
    out
}
