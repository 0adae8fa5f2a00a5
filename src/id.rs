use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Content hash identifying a transaction. The all-zero value is the root sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; 32]);

#[derive(Debug, Error)]
pub enum IdError {
    #[error("Id is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Id must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl Id {
    /// The identifier every chain terminates at.
    pub const ROOT: Id = Id([0; 32]);

    pub fn digest(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())?;
        let len = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| IdError::InvalidLength(len))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_zero() {
        assert!(Id::ROOT.is_root());
        assert!(Id::default().is_root());
        assert!(!Id::digest(b"anything").is_root());
    }

    #[test]
    fn test_parse_display() {
        let id = Id::digest(b"ledger");
        let parsed: Id = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.to_string().len(), 64);
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!("abcd".parse::<Id>(), Err(IdError::InvalidLength(2))));
    }

    #[test]
    fn test_parse_not_hex() {
        assert!(matches!("zz".parse::<Id>(), Err(IdError::InvalidHex(_))));
    }
}
