//! Identity types
//!
//! Both types are opaque strings owned by the node. They are wrapped so a DID
//! can never be passed where a signature is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_opaque_string {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_opaque_string!(Did, "Decentralized identifier naming a signer or ledger account");
define_opaque_string!(Signature, "Hex-encoded signature returned by the node");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_serializes_as_plain_string() {
        let did = Did::new("bafybmi-test");
        assert_eq!(serde_json::to_string(&did).unwrap(), "\"bafybmi-test\"");

        let parsed: Did = serde_json::from_str("\"bafybmi-test\"").unwrap();
        assert_eq!(parsed, did);
    }

    #[test]
    fn test_display_is_raw_value() {
        assert_eq!(Signature::from("3044abcd").to_string(), "3044abcd");
    }
}
