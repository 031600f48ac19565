// Inviter chain captured at registration

use serde::{Deserialize, Serialize};

use crate::{config::INVITER_CHAIN_LEVELS, id::AccountId};

/// Fixed-size list of ancestors, index 0 is the direct inviter (level A).
///
/// The chain is built once from the inviter's own chain and never mutated,
/// so it cannot contain cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviterChain {
    levels: [Option<AccountId>; INVITER_CHAIN_LEVELS],
}

impl InviterChain {
    pub fn new(levels: [Option<AccountId>; INVITER_CHAIN_LEVELS]) -> Self {
        Self { levels }
    }

    /// Build the chain of a new account invited by `inviter`:
    /// the inviter becomes level A and its own A..C shift to B..D.
    pub fn from_inviter(inviter: AccountId, inviter_chain: &InviterChain) -> Self {
        let mut levels = [None; INVITER_CHAIN_LEVELS];
        levels[0] = Some(inviter);
        for level in 1..INVITER_CHAIN_LEVELS {
            levels[level] = inviter_chain.levels[level - 1];
        }
        Self { levels }
    }

    /// Ancestor at a 0-indexed level
    pub fn get(&self, level: usize) -> Option<AccountId> {
        self.levels.get(level).copied().flatten()
    }

    pub fn direct_inviter(&self) -> Option<AccountId> {
        self.get(0)
    }

    /// Iterate over the existing ancestors with their 0-indexed level
    pub fn iter(&self) -> impl Iterator<Item = (usize, AccountId)> + '_ {
        self.levels
            .iter()
            .enumerate()
            .filter_map(|(level, ancestor)| ancestor.map(|id| (level, id)))
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.levels.iter().any(|level| level.as_ref() == Some(account))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_shift() {
        let root = InviterChain::default();
        let a = InviterChain::from_inviter(AccountId(1), &root);
        let b = InviterChain::from_inviter(AccountId(2), &a);
        let c = InviterChain::from_inviter(AccountId(3), &b);
        let d = InviterChain::from_inviter(AccountId(4), &c);
        let e = InviterChain::from_inviter(AccountId(5), &d);

        assert_eq!(b.get(0), Some(AccountId(2)));
        assert_eq!(b.get(1), Some(AccountId(1)));
        assert_eq!(b.get(2), None);

        // Only four levels are kept, the root falls off
        let levels: Vec<_> = e.iter().collect();
        assert_eq!(
            levels,
            vec![
                (0, AccountId(5)),
                (1, AccountId(4)),
                (2, AccountId(3)),
                (3, AccountId(2)),
            ]
        );
        assert!(!e.contains(&AccountId(1)));
    }

    #[test]
    fn test_sparse_chain_iteration() {
        let chain = InviterChain::new([Some(AccountId(9)), None, Some(AccountId(7)), None]);
        let levels: Vec<_> = chain.iter().collect();
        assert_eq!(levels, vec![(0, AccountId(9)), (2, AccountId(7))]);
        assert!(!chain.is_empty());
        assert!(InviterChain::default().is_empty());
        assert_eq!(InviterChain::default().get(10), None);
    }
}
