mod account;
mod contract;
mod overrides;
mod product;
mod recharge;
mod withdrawal;

pub use account::AccountProvider;
pub use contract::ContractProvider;
pub use overrides::OverrideProvider;
pub use product::ProductProvider;
pub use recharge::RechargeProvider;
pub use withdrawal::WithdrawalProvider;

/// `{a}{b}` key of the index columns, both parts big endian
pub(super) fn pair_key(a: [u8; 8], b: [u8; 8]) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&a);
    key[8..].copy_from_slice(&b);
    key
}

/// Second half of a `pair_key`
pub(super) fn suffix_id(key: &[u8]) -> Option<u64> {
    let raw: [u8; 8] = key.get(8..16)?.try_into().ok()?;
    Some(u64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key() {
        let key = pair_key(1u64.to_be_bytes(), 258u64.to_be_bytes());
        assert_eq!(&key[..8], &1u64.to_be_bytes());
        assert_eq!(suffix_id(&key), Some(258));
        assert_eq!(suffix_id(&key[..12]), None);
    }
}
