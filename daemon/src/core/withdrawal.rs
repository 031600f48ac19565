// Withdrawal Processor
//
// pending -> approved | rejected, both terminal.
// The amount is reserved on the spendable balance at request time,
// a rejection with refund credits it back in the same unit as the transition.

use log::{info, warn};
use harvest_common::{
    account::WalletField,
    event::LedgerEvent,
    id::{AccountId, ProductId, WithdrawalId},
    overrides::OverrideKind,
    time::is_same_calendar_day,
    utils::format_coin,
    withdrawal::{
        BankDetails, RechargeRuleInput, RequirementShortfall, TransitionOutcome, WithdrawalDecision,
        WithdrawalRequest, WithdrawalRules, WithdrawalStatus,
    },
};

use super::{
    accounts::credit,
    error::LedgerError,
    ledger::{record_override, require_override_reason, Committed, Ledger},
    storage::{
        AccountProvider, ContractProvider, RechargeProvider, Storage, StorageTransaction,
        WithdrawalProvider,
    },
};

/// Approved recharges of every account below `account` in the referral tree
fn team_recharge<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    account: &AccountId,
    levels: usize,
) -> Result<u64, LedgerError> {
    let mut total: u64 = 0;
    for level in 0..levels {
        for member in tx.get_downline(account, level as u8)? {
            total = total.saturating_add(tx.get_approved_recharge_total(&member)?);
        }
    }
    Ok(total)
}

/// Recharge cap rule, only evaluated when a cap is configured
fn check_recharge_cap<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    rules: &WithdrawalRules,
    levels: usize,
    account: &AccountId,
    products: &[ProductId],
    amount: u64,
) -> Result<(), LedgerError> {
    if rules.max_withdrawal_percent_of_recharge.is_none() {
        return Ok(());
    }

    let outstanding = tx
        .get_account_withdrawals(account)?
        .iter()
        .filter(|request| request.status != WithdrawalStatus::Rejected)
        .fold(0u64, |total, request| total.saturating_add(request.amount));

    let input = RechargeRuleInput {
        own_recharge: tx.get_approved_recharge_total(account)?,
        team_recharge: team_recharge(tx, account, levels)?,
        outstanding,
        amount,
        requirement: rules.highest_requirement(products),
    };

    rules
        .check_recharge_rule(&input)
        .map_err(LedgerError::ProductRequirementNotMet)
}

fn state_event(request: &WithdrawalRequest, refunded: Option<u64>) -> LedgerEvent {
    LedgerEvent::WithdrawalStateChanged {
        account: request.account_id,
        withdrawal: request.id,
        status: request.status,
        refunded,
    }
}

impl<S: Storage> Ledger<S> {
    /// Request a withdrawal, the amount is debited immediately.
    ///
    /// Checks run in order: amount range, bank details, restriction,
    /// one request per calendar day, a product bought, balance, recharge cap.
    pub async fn request_withdrawal(
        &self,
        account: &AccountId,
        amount: u64,
        bank_details: BankDetails,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let rules = &self.config().withdrawal_rules;
        if !rules.is_amount_in_range(amount) {
            return Err(LedgerError::AmountOutOfRange {
                amount,
                min: rules.min_amount,
                max: rules.max_amount,
            });
        }
        if !bank_details.is_complete() {
            return Err(LedgerError::MissingBankDetails);
        }

        let now = self.now();
        let utc_offset = self.config().utc_offset_secs;
        let levels = self.config().commission_ratios.levels();

        let request = self
            .execute("request_withdrawal", |tx| {
                let mut owner = tx.get_account(account)?;

                if let Some(restriction) = owner.active_restriction(now) {
                    return Err(LedgerError::RestrictionActive {
                        account: *account,
                        reason: restriction.reason.clone(),
                        until: restriction.until,
                    });
                }

                if let Some(last_request) = owner.last_withdrawal_request_at {
                    if is_same_calendar_day(last_request, now, utc_offset) {
                        return Err(LedgerError::DailyLimitReached {
                            account: *account,
                            last_request,
                        });
                    }
                }

                let products: Vec<ProductId> = tx
                    .get_account_contracts(account)?
                    .into_iter()
                    .map(|contract| contract.product_id)
                    .collect();
                if products.is_empty() {
                    return Err(LedgerError::ProductRequirementNotMet(RequirementShortfall::NoPurchase));
                }

                if owner.spendable_balance < amount {
                    return Err(LedgerError::InsufficientFunds {
                        account: *account,
                        need: amount,
                        have: owner.spendable_balance,
                    });
                }

                check_recharge_cap(tx, rules, levels, account, &products, amount)?;

                let request = WithdrawalRequest::new(
                    WithdrawalId(tx.next_id()?),
                    *account,
                    amount,
                    rules.fee_bps,
                    bank_details.clone(),
                    now,
                );

                let debit = i64::try_from(amount).map_err(|_| LedgerError::BalanceOverflow)?;
                owner
                    .apply_delta(WalletField::Spendable, -debit)
                    .map_err(|e| LedgerError::from_balance(*account, e))?;
                owner.last_withdrawal_request_at = Some(now);
                tx.set_account(&owner)?;
                tx.set_withdrawal(&request)?;

                let event = state_event(&request, None);
                Ok(Committed::new(request, vec![event]))
            })
            .await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} requested withdrawal {} of {} (fee {}, net {})",
                account,
                request.id,
                format_coin(request.amount),
                format_coin(request.fee),
                format_coin(request.net_payout)
            );
        }
        Ok(request)
    }

    /// Admin decision on a pending request.
    /// Repeating the recorded decision is a no-op, it never refunds twice.
    pub async fn decide_withdrawal(
        &self,
        id: &WithdrawalId,
        decision: WithdrawalDecision,
        refund: bool,
        actor: &str,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let now = self.now();

        let (request, outcome) = self
            .execute("decide_withdrawal", |tx| {
                let mut request = tx.get_withdrawal(id)?;
                let outcome = request
                    .decide(decision, refund, now)
                    .map_err(|e| LedgerError::from_withdrawal(*id, e))?;

                let refund = match outcome {
                    TransitionOutcome::AlreadyApplied => {
                        return Ok(Committed::silent((request, outcome)));
                    }
                    TransitionOutcome::Applied { refund } => refund,
                };

                if let Some(amount) = refund {
                    credit(tx, &request.account_id, WalletField::Spendable, amount)?;
                }
                tx.set_withdrawal(&request)?;

                let event = state_event(&request, refund);
                Ok(Committed::new((request, outcome), vec![event]))
            })
            .await?;

        match outcome {
            TransitionOutcome::AlreadyApplied => warn!(
                "{} repeated decision {:?} on {}, nothing done",
                actor, decision, id
            ),
            TransitionOutcome::Applied { refund } => {
                if log::log_enabled!(log::Level::Info) {
                    info!(
                        "{} set withdrawal {} of {} to {:?}, refund {:?}",
                        actor, id, request.account_id, request.status, refund
                    );
                }
            }
        }
        Ok(request)
    }

    /// The owner cancels a pending request, the amount is refunded
    pub async fn cancel_withdrawal(&self, account: &AccountId, id: &WithdrawalId) -> Result<WithdrawalRequest, LedgerError> {
        let now = self.now();

        self.execute("cancel_withdrawal", |tx| {
            let mut request = tx.get_withdrawal(id)?;
            if request.account_id != *account {
                return Err(LedgerError::WithdrawalNotFound(*id));
            }
            if request.status != WithdrawalStatus::Pending {
                return Err(LedgerError::WithdrawalNotPending {
                    withdrawal: *id,
                    status: request.status,
                });
            }

            let refund = match request
                .decide(WithdrawalDecision::Reject, true, now)
                .map_err(|e| LedgerError::from_withdrawal(*id, e))?
            {
                TransitionOutcome::Applied { refund } => refund,
                TransitionOutcome::AlreadyApplied => None,
            };
            if let Some(amount) = refund {
                credit(tx, account, WalletField::Spendable, amount)?;
            }
            tx.set_withdrawal(&request)?;

            let event = state_event(&request, refund);
            Ok(Committed::new(request, vec![event]))
        })
        .await
        .inspect(|request| {
            if log::log_enabled!(log::Level::Info) {
                info!("{} cancelled withdrawal {}", account, request.id);
            }
        })
    }

    /// Admin correction of a pending amount.
    /// The reserved balance is left as it was at request time.
    pub async fn edit_withdrawal_amount(
        &self,
        id: &WithdrawalId,
        new_amount: u64,
        actor: &str,
        reason: &str,
    ) -> Result<WithdrawalRequest, LedgerError> {
        require_override_reason(actor, reason)?;
        if new_amount == 0 {
            return Err(LedgerError::Validation("withdrawal amount cannot be zero".to_string()));
        }
        let now = self.now();

        let (request, previous) = self
            .execute("edit_withdrawal_amount", |tx| {
                let mut request = tx.get_withdrawal(id)?;
                let previous = request.amount;
                request
                    .edit_amount(new_amount, reason)
                    .map_err(|e| LedgerError::from_withdrawal(*id, e))?;
                tx.set_withdrawal(&request)?;

                record_override(
                    tx,
                    actor,
                    reason,
                    OverrideKind::WithdrawalAmount {
                        account: request.account_id,
                        withdrawal: request.id,
                        previous,
                        amount: new_amount,
                        reserved: request.reserved_amount,
                    },
                    now,
                )?;
                Ok(Committed::silent((request, previous)))
            })
            .await?;

        if request.is_diverged() {
            warn!(
                "withdrawal {} amount {} now differs from the reserved {}",
                id,
                format_coin(request.amount),
                format_coin(request.reserved_amount)
            );
        }
        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} edited withdrawal {} from {} to {}: {}",
                actor,
                id,
                format_coin(previous),
                format_coin(new_amount),
                reason
            );
        }
        Ok(request)
    }

    /// Permanently remove a rejected request, no balance effect
    pub async fn delete_withdrawal(&self, id: &WithdrawalId, actor: &str, reason: &str) -> Result<(), LedgerError> {
        require_override_reason(actor, reason)?;
        let now = self.now();

        self.execute("delete_withdrawal", |tx| {
            let request = tx.get_withdrawal(id)?;
            if !request.is_deletable() {
                return Err(LedgerError::WithdrawalNotDeletable(*id));
            }
            tx.delete_withdrawal(&request);
            record_override(
                tx,
                actor,
                reason,
                OverrideKind::WithdrawalDeleted {
                    account: request.account_id,
                    withdrawal: request.id,
                },
                now,
            )?;
            Ok(Committed::silent(()))
        })
        .await?;

        if log::log_enabled!(log::Level::Info) {
            info!("{} deleted withdrawal {}: {}", actor, id, reason);
        }
        Ok(())
    }

    pub fn get_withdrawal(&self, id: &WithdrawalId) -> Result<WithdrawalRequest, LedgerError> {
        self.read(|tx| tx.get_withdrawal(id))
    }

    /// Requests of an account, oldest first
    pub fn get_withdrawals(&self, account: &AccountId) -> Result<Vec<WithdrawalRequest>, LedgerError> {
        self.read(|tx| {
            tx.get_account(account)?;
            tx.get_account_withdrawals(account)
        })
    }
}
