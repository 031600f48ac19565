// Identifier types
// All identifiers are numeric and encoded big endian in storage keys so that
// prefix scans return them in creation order.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const SIZE: usize = 8;

            pub fn to_bytes(&self) -> [u8; Self::SIZE] {
                self.0.to_be_bytes()
            }

            /// Read an identifier from the first 8 bytes of a key
            pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
                let raw: [u8; Self::SIZE] = bytes.get(..Self::SIZE)?.try_into().ok()?;
                Some(Self(u64::from_be_bytes(raw)))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Stable identity of a user account, supplied by the authentication layer
    AccountId,
    "acc"
);
define_id!(
    /// Catalog identifier of a product
    ProductId,
    "prd"
);
define_id!(
    /// Identifier of a purchased contract
    ContractId,
    "ctr"
);
define_id!(WithdrawalId, "wd");
define_id!(RechargeId, "rc");
define_id!(OverrideId, "ovr");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_bytes_roundtrip() {
        let id = AccountId(0x0102_0304_0506_0708);
        let bytes = id.to_bytes();
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(AccountId::from_bytes(&bytes), Some(id));
        // Trailing bytes of a composite key are ignored
        let mut key = bytes.to_vec();
        key.extend_from_slice(&[9, 9]);
        assert_eq!(AccountId::from_bytes(&key), Some(id));
        assert_eq!(AccountId::from_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ContractId(42).to_string(), "ctr-42");
        assert_eq!(WithdrawalId(7).to_string(), "wd-7");
    }
}
