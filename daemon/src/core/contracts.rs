// Contract Ledger
// A purchase is one atomic unit: principal debit, day one income,
// contract creation, purchase counter and commissions.

use log::{info, warn};
use harvest_common::{
    account::WalletField,
    api::{BulkAdjustReport, PurchaseReceipt, SkippedContract},
    contract::{Contract, ContractError, PeriodAdjustment, Product},
    event::LedgerEvent,
    id::{AccountId, ContractId, ProductId},
    overrides::OverrideKind,
    time::TimestampSeconds,
    utils::format_coin,
};

use super::{
    accounts::apply_delta,
    commission::distribute,
    error::LedgerError,
    ledger::{record_override, require_override_reason, Committed, Ledger},
    storage::{AccountProvider, ContractProvider, ProductProvider, Storage, StorageTransaction},
};

fn map_period_error(err: ContractError) -> LedgerError {
    match err {
        ContractError::InvalidPeriod { requested } => LedgerError::InvalidPeriod(requested),
        other => other.into(),
    }
}

/// Apply a period change to a loaded contract and write it back
fn adjust_in<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    contract: &mut Contract,
    new_period: i64,
    now: TimestampSeconds,
) -> Result<PeriodAdjustment, LedgerError> {
    let adjustment = contract
        .adjust_period(new_period, now)
        .map_err(map_period_error)?;
    tx.set_contract(contract)?;
    Ok(adjustment)
}

fn adjusted_event(contract: &Contract) -> LedgerEvent {
    LedgerEvent::ContractAdjusted {
        account: contract.account_id,
        contract: contract.id,
        new_period: contract.contract_period,
        remaining_days: contract.remaining_days,
        status: contract.status,
    }
}

impl<S: Storage> Ledger<S> {
    /// Add or replace a product of the catalog
    pub async fn upsert_product(&self, product: Product) -> Result<Product, LedgerError> {
        product.validate()?;
        self.execute("upsert_product", |tx| {
            tx.set_product(&product)?;
            Ok(Committed::silent(product.clone()))
        })
        .await
        .inspect(|product| {
            if log::log_enabled!(log::Level::Info) {
                info!(
                    "product {} '{}' price {} daily {} over {} days, limit {}",
                    product.id,
                    product.name,
                    format_coin(product.price),
                    format_coin(product.daily_income),
                    product.contract_period,
                    product.purchase_limit
                );
            }
        })
    }

    pub fn get_product(&self, id: &ProductId) -> Result<Product, LedgerError> {
        self.read(|tx| tx.get_product(id))
    }

    pub fn get_products(&self) -> Result<Vec<Product>, LedgerError> {
        self.read(|tx| tx.get_products())
    }

    /// Buy a product: pay the principal and immediately receive day one.
    ///
    /// The purchase counter is read inside the unit, so concurrent purchases
    /// of the same account conflict on it and on the balance.
    pub async fn purchase(&self, account: &AccountId, product: &ProductId) -> Result<PurchaseReceipt, LedgerError> {
        let now = self.now();
        let ratios = &self.config().commission_ratios;

        let receipt = self
            .execute("purchase", |tx| {
                let product = tx.get_product(product)?;
                let buyer = tx.get_account(account)?;

                let held = tx.get_purchase_count(account, &product.id)?;
                if !product.allows_purchase(held) {
                    return Err(LedgerError::PurchaseLimitExceeded {
                        product: product.id,
                        held,
                        limit: product.purchase_limit,
                    });
                }

                if buyer.spendable_balance < product.price {
                    return Err(LedgerError::InsufficientFunds {
                        account: *account,
                        need: product.price,
                        have: buyer.spendable_balance,
                    });
                }

                let contract = Contract::open(ContractId(tx.next_id()?), *account, &product, now)?;
                let principal = i64::try_from(product.price).map_err(|_| LedgerError::BalanceOverflow)?;
                let day_one = i64::try_from(product.daily_income).map_err(|_| LedgerError::BalanceOverflow)?;
                // debit first, the day one credit never funds the principal
                apply_delta(tx, account, WalletField::Spendable, -principal)?;
                let buyer = apply_delta(tx, account, WalletField::Spendable, day_one)?;

                tx.set_contract(&contract)?;
                tx.set_purchase_count(account, &product.id, held + 1)?;

                let (commissions, mut commission_events) =
                    distribute(tx, ratios, &buyer, contract.id, product.price)?;

                let mut events = Vec::with_capacity(1 + commission_events.len());
                events.push(LedgerEvent::PurchaseCommitted {
                    account: *account,
                    contract: contract.id,
                    product: product.id,
                    principal: product.price,
                    day_one_income: product.daily_income,
                });
                events.append(&mut commission_events);

                let receipt = PurchaseReceipt {
                    contract,
                    balance_after: buyer.spendable_balance,
                    commissions,
                };
                Ok(Committed::new(receipt, events))
            })
            .await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} bought {} as {} for {}, balance {}, {} commissions",
                account,
                product,
                receipt.contract.id,
                format_coin(receipt.contract.principal),
                format_coin(receipt.balance_after),
                receipt.commissions.len()
            );
        }
        Ok(receipt)
    }

    pub fn get_contract(&self, id: &ContractId) -> Result<Contract, LedgerError> {
        self.read(|tx| tx.get_contract(id))
    }

    /// Every contract of an account, oldest first
    pub fn get_contracts(&self, account: &AccountId) -> Result<Vec<Contract>, LedgerError> {
        self.read(|tx| {
            tx.get_account(account)?;
            tx.get_account_contracts(account)
        })
    }

    /// Audited override of one contract period
    pub async fn adjust_contract_period(
        &self,
        id: &ContractId,
        new_period: i64,
        actor: &str,
        reason: &str,
    ) -> Result<PeriodAdjustment, LedgerError> {
        require_override_reason(actor, reason)?;
        if new_period <= 0 {
            return Err(LedgerError::InvalidPeriod(new_period));
        }
        let now = self.now();

        let adjustment = self
            .execute("adjust_contract_period", |tx| {
                let mut contract = tx.get_contract(id)?;
                let adjustment = adjust_in(tx, &mut contract, new_period, now)?;
                record_override(
                    tx,
                    actor,
                    reason,
                    OverrideKind::ContractPeriod {
                        account: contract.account_id,
                        contract: contract.id,
                        previous_period: adjustment.previous_period,
                        new_period: adjustment.new_period,
                    },
                    now,
                )?;
                Ok(Committed::new(adjustment, vec![adjusted_event(&contract)]))
            })
            .await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} changed period of {} from {} to {} days: {}",
                actor, id, adjustment.previous_period, adjustment.new_period, reason
            );
        }
        Ok(adjustment)
    }

    /// Apply a signed day delta to every active contract in one unit.
    /// Contracts whose period would drop to zero or below are skipped.
    pub async fn bulk_adjust_contract_periods(
        &self,
        day_delta: i64,
        actor: &str,
        reason: &str,
    ) -> Result<BulkAdjustReport, LedgerError> {
        require_override_reason(actor, reason)?;
        if day_delta == 0 {
            return Err(LedgerError::Validation("day delta cannot be zero".to_string()));
        }
        let now = self.now();

        let report = self
            .execute("bulk_adjust_contract_periods", |tx| {
                let mut report = BulkAdjustReport::default();
                let mut events = Vec::new();

                for account in tx.get_accounts_with_active_contracts()? {
                    for id in tx.get_active_contract_ids(&account)? {
                        let mut contract = tx.get_contract(&id)?;
                        let requested = contract.contract_period as i64 + day_delta;
                        if requested <= 0 {
                            report.skipped.push(SkippedContract {
                                contract: id,
                                current_period: contract.contract_period,
                                requested_period: requested,
                            });
                            continue;
                        }

                        let adjustment = adjust_in(tx, &mut contract, requested, now)?;
                        events.push(adjusted_event(&contract));
                        report.adjusted.push((id, adjustment));
                    }
                }

                record_override(
                    tx,
                    actor,
                    reason,
                    OverrideKind::BulkContractPeriod {
                        day_delta,
                        adjusted: report.adjusted.len() as u32,
                        skipped: report.skipped.len() as u32,
                    },
                    now,
                )?;
                Ok(Committed::new(report, events))
            })
            .await?;

        if !report.skipped.is_empty() {
            warn!(
                "bulk period change of {} days skipped {} contracts",
                day_delta,
                report.skipped.len()
            );
        }
        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} shifted {} contracts by {} days: {}",
                actor,
                report.adjusted.len(),
                day_delta,
                reason
            );
        }
        Ok(report)
    }
}
