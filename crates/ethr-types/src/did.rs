//! DID URL parsing.
//!
//! Accepted form: `did:<method>:<method-specific-id>[;name=value]*[?query][#fragment]`.
//! The method must be lowercase alphanumeric; the method-specific id may
//! contain `:` separated segments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A single `;name=value` DID URL parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidParam {
    pub name: String,
    pub value: Option<String>,
}

/// A parsed DID URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Did {
    pub method: String,
    pub id: String,
    pub params: Vec<DidParam>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Did {
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidDid(format!("{input}: {reason}"));

        let rest = input
            .strip_prefix("did:")
            .ok_or_else(|| invalid("missing 'did:' scheme"))?;

        let (rest, fragment) = match rest.split_once('#') {
            Some((head, frag)) => (head, Some(frag.to_string())),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((head, q)) => (head, Some(q.to_string())),
            None => (rest, None),
        };

        let (method, rest) = rest
            .split_once(':')
            .ok_or_else(|| invalid("missing method-specific id"))?;
        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid("method must be lowercase alphanumeric"));
        }

        let mut segments = rest.split(';');
        let id = segments.next().unwrap_or_default();
        if id.is_empty() {
            return Err(invalid("missing method-specific id"));
        }
        if !id.chars().all(is_id_char) {
            return Err(invalid("illegal character in method-specific id"));
        }
        if id.ends_with(':') {
            return Err(invalid("method-specific id must not end with ':'"));
        }

        let mut params = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                return Err(invalid("empty parameter"));
            }
            let (name, value) = match segment.split_once('=') {
                Some((n, v)) => (n, Some(v.to_string())),
                None => (segment, None),
            };
            if name.is_empty() {
                return Err(invalid("empty parameter name"));
            }
            params.push(DidParam {
                name: name.to_string(),
                value,
            });
        }

        Ok(Self {
            method: method.to_string(),
            id: id.to_string(),
            params,
            query,
            fragment,
        })
    }

    /// The bare DID (`did:<method>:<id>`), without parameters, query or fragment.
    pub fn did(&self) -> String {
        format!("did:{}:{}", self.method, self.id)
    }

    /// Value of the named parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '%')
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.id)?;
        for param in &self.params {
            match &param.value {
                Some(value) => write!(f, ";{}={}", param.name, value)?,
                None => write!(f, ";{}", param.name)?,
            }
        }
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_did() {
        let did = Did::parse("did:ethr:0xb9c5714089478a327f09197987f16f9e5d936e8a").unwrap();
        assert_eq!(did.method, "ethr");
        assert_eq!(did.id, "0xb9c5714089478a327f09197987f16f9e5d936e8a");
        assert!(did.params.is_empty());
        assert_eq!(did.did(), "did:ethr:0xb9c5714089478a327f09197987f16f9e5d936e8a");
    }

    #[test]
    fn parses_network_segment_params_and_fragment() {
        let did = Did::parse("did:ethr:rinkeby:0xabc;no-cache=true;flag?x=1#controller").unwrap();
        assert_eq!(did.id, "rinkeby:0xabc");
        assert_eq!(did.param("no-cache"), Some("true"));
        assert_eq!(did.params[1].name, "flag");
        assert_eq!(did.params[1].value, None);
        assert_eq!(did.query.as_deref(), Some("x=1"));
        assert_eq!(did.fragment.as_deref(), Some("controller"));
        assert_eq!(did.did(), "did:ethr:rinkeby:0xabc");
    }

    #[test]
    fn display_preserves_components() {
        let input = "did:ethr:dev:0xabc;no-cache=true#key-1";
        assert_eq!(Did::parse(input).unwrap().to_string(), input);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "ethr:0xabc",
            "did:ethr",
            "did::0xabc",
            "did:ETHR:0xabc",
            "did:ethr:",
            "did:ethr:dev:",
            "did:ethr:0x abc",
            "did:ethr:0xabc;",
        ] {
            assert!(Did::parse(bad).is_err(), "{bad} should not parse");
        }
    }
}
