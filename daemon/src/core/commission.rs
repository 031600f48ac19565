// Commission Distributor
// Runs inside the purchase unit only, a retry always replays the whole purchase.

use log::{debug, warn};
use harvest_common::{
    account::{Account, WalletField},
    event::LedgerEvent,
    id::ContractId,
    referral::{level_name, CommissionCredit, CommissionRatios},
};

use super::{
    accounts::credit,
    error::LedgerError,
    storage::{AccountProvider, Storage, StorageTransaction},
};

/// Credit the invite wallet of every existing ancestor of `purchaser`.
/// Missing levels are skipped, returns the credits applied with their events.
pub(super) fn distribute<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    ratios: &CommissionRatios,
    purchaser: &Account,
    contract: ContractId,
    principal: u64,
) -> Result<(Vec<CommissionCredit>, Vec<LedgerEvent>), LedgerError> {
    let plan = ratios.plan(&purchaser.inviter_chain, principal);
    let mut credits = Vec::with_capacity(plan.len());
    let mut events = Vec::with_capacity(plan.len());

    for commission in plan {
        if !tx.has_account(&commission.ancestor)? {
            warn!(
                "level {} ancestor {} of {} does not exist, commission skipped",
                level_name(commission.level as usize),
                commission.ancestor,
                purchaser.id
            );
            continue;
        }

        if commission.amount > 0 {
            credit(tx, &commission.ancestor, WalletField::Invite, commission.amount)?;
        }

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "commission {} to level {} ancestor {} for {}",
                commission.amount,
                level_name(commission.level as usize),
                commission.ancestor,
                contract
            );
        }

        events.push(LedgerEvent::CommissionCredited {
            account: commission.ancestor,
            purchaser: purchaser.id,
            contract,
            level: commission.level,
            amount: commission.amount,
        });
        credits.push(commission);
    }

    Ok((credits, events))
}
