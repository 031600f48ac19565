use std::sync::Arc;

use log::info;
use harvest_common::{
    api::{
        AccountParams, AdjustContractPeriodParams, BulkAdjustContractPeriodsParams,
        CancelWithdrawalParams, ClearRestrictionParams, DecideRechargeParams, DecideWithdrawalParams,
        DeleteWithdrawalParams, EditWithdrawalAmountParams, GetOverridesParams, PurchaseParams,
        RegisterAccountParams, RequestWithdrawalParams, SetBalanceParams, SetRestrictionParams,
        SubmitRechargeParams,
    },
    async_handler,
    config::VERSION,
    context::Context,
    contract::Product,
    rpc::{parse_params, require_no_params, server::ClientAddr, InternalRpcError, RPCHandler},
};
use serde_json::{json, Value};

use crate::core::{storage::Storage, Ledger};

/// Admin methods must only be accessible from the local machine.
/// Fail-closed: an unknown client address is rejected too.
fn require_localhost(context: &Context) -> Result<(), InternalRpcError> {
    let client_addr: Option<&ClientAddr> = context.get_optional();
    match client_addr {
        Some(addr) if addr.is_loopback() => Ok(()),
        Some(_) => Err(InternalRpcError::AdminOnly(
            "Admin methods are only accessible from localhost",
        )),
        None => Err(InternalRpcError::AdminOnly(
            "Admin methods require client address verification (localhost only)",
        )),
    }
}

pub fn register_methods<S: Storage>(handler: &mut RPCHandler<Arc<Ledger<S>>>, allow_admin_methods: bool) {
    info!("Registering RPC methods...");
    handler.register_method("get_version", async_handler!(version::<S>));
    handler.register_method("register_account", async_handler!(register_account::<S>));
    handler.register_method("get_account", async_handler!(get_account::<S>));
    handler.register_method("get_products", async_handler!(get_products::<S>));
    handler.register_method("get_contracts", async_handler!(get_contracts::<S>));
    handler.register_method("purchase", async_handler!(purchase::<S>));
    handler.register_method("session_start", async_handler!(session_start::<S>));
    handler.register_method("submit_recharge", async_handler!(submit_recharge::<S>));
    handler.register_method("get_recharges", async_handler!(get_recharges::<S>));
    handler.register_method("request_withdrawal", async_handler!(request_withdrawal::<S>));
    handler.register_method("cancel_withdrawal", async_handler!(cancel_withdrawal::<S>));
    handler.register_method("get_withdrawals", async_handler!(get_withdrawals::<S>));
    handler.register_method("claim_vip_salary", async_handler!(claim_vip_salary::<S>));

    if allow_admin_methods {
        info!("Registering admin RPC methods (localhost only)...");
        handler.register_method("upsert_product", async_handler!(upsert_product::<S>));
        handler.register_method("set_balance", async_handler!(set_balance::<S>));
        handler.register_method(
            "adjust_contract_period",
            async_handler!(adjust_contract_period::<S>),
        );
        handler.register_method(
            "bulk_adjust_contract_periods",
            async_handler!(bulk_adjust_contract_periods::<S>),
        );
        handler.register_method("decide_withdrawal", async_handler!(decide_withdrawal::<S>));
        handler.register_method(
            "edit_withdrawal_amount",
            async_handler!(edit_withdrawal_amount::<S>),
        );
        handler.register_method("delete_withdrawal", async_handler!(delete_withdrawal::<S>));
        handler.register_method("approve_recharge", async_handler!(approve_recharge::<S>));
        handler.register_method("reject_recharge", async_handler!(reject_recharge::<S>));
        handler.register_method("set_restriction", async_handler!(set_restriction::<S>));
        handler.register_method("clear_restriction", async_handler!(clear_restriction::<S>));
        handler.register_method("audit_account", async_handler!(audit_account::<S>));
        handler.register_method("sync_all", async_handler!(sync_all::<S>));
        handler.register_method("evaluate_vip", async_handler!(evaluate_vip::<S>));
        handler.register_method("get_overrides", async_handler!(get_overrides::<S>));
    }
}

async fn version<S: Storage>(_: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_no_params(body)?;
    Ok(json!(VERSION))
}

async fn register_account<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: RegisterAccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let account = ledger.register_account(params.inviter).await?;
    Ok(json!(account))
}

async fn get_account<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.get_account(&params.account)?))
}

async fn get_products<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_no_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.get_products()?))
}

async fn get_contracts<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.get_contracts(&params.account)?))
}

async fn purchase<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: PurchaseParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let receipt = ledger.purchase(&params.account, &params.product).await?;
    Ok(json!(receipt))
}

// Login hook: brings the account's contracts up to date
async fn session_start<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let report = ledger.on_session_start(&params.account).await?;
    Ok(json!(report))
}

async fn submit_recharge<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: SubmitRechargeParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let recharge = ledger
        .submit_recharge(&params.account, params.amount, &params.reference)
        .await?;
    Ok(json!(recharge))
}

async fn get_recharges<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.get_recharges(&params.account)?))
}

async fn request_withdrawal<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: RequestWithdrawalParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let request = ledger
        .request_withdrawal(&params.account, params.amount, params.bank_details)
        .await?;
    Ok(json!(request))
}

async fn cancel_withdrawal<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: CancelWithdrawalParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let request = ledger
        .cancel_withdrawal(&params.account, &params.withdrawal)
        .await?;
    Ok(json!(request))
}

async fn get_withdrawals<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.get_withdrawals(&params.account)?))
}

async fn claim_vip_salary<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let receipt = ledger.claim_vip_salary(&params.account).await?;
    Ok(json!(receipt))
}

async fn upsert_product<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let product: Product = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.upsert_product(product).await?))
}

async fn set_balance<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: SetBalanceParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let result = ledger
        .set_balance(
            &params.account,
            params.field,
            params.value,
            &params.actor,
            &params.reason,
        )
        .await?;
    Ok(json!(result))
}

async fn adjust_contract_period<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: AdjustContractPeriodParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let adjustment = ledger
        .adjust_contract_period(&params.contract, params.new_period, &params.actor, &params.reason)
        .await?;
    Ok(json!(adjustment))
}

async fn bulk_adjust_contract_periods<S: Storage>(
    context: &Context,
    body: Value,
) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: BulkAdjustContractPeriodsParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let report = ledger
        .bulk_adjust_contract_periods(params.day_delta, &params.actor, &params.reason)
        .await?;
    Ok(json!(report))
}

async fn decide_withdrawal<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: DecideWithdrawalParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let request = ledger
        .decide_withdrawal(&params.withdrawal, params.decision, params.refund, &params.actor)
        .await?;
    Ok(json!(request))
}

async fn edit_withdrawal_amount<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: EditWithdrawalAmountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let request = ledger
        .edit_withdrawal_amount(&params.withdrawal, params.new_amount, &params.actor, &params.reason)
        .await?;
    Ok(json!(request))
}

async fn delete_withdrawal<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: DeleteWithdrawalParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    ledger
        .delete_withdrawal(&params.withdrawal, &params.actor, &params.reason)
        .await?;
    Ok(json!(true))
}

async fn approve_recharge<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: DecideRechargeParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.approve_recharge(&params.recharge, &params.actor).await?))
}

async fn reject_recharge<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: DecideRechargeParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.reject_recharge(&params.recharge, &params.actor).await?))
}

async fn set_restriction<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: SetRestrictionParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let account = ledger
        .set_restriction(&params.account, &params.reason, params.until, &params.actor)
        .await?;
    Ok(json!(account))
}

async fn clear_restriction<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: ClearRestrictionParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    let account = ledger
        .clear_restriction(&params.account, &params.actor, &params.reason)
        .await?;
    Ok(json!(account))
}

async fn audit_account<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.audit_account(&params.account)?))
}

async fn sync_all<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    require_no_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.sync_all().await?))
}

async fn evaluate_vip<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    let params: AccountParams = parse_params(body)?;
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.evaluate_vip(&params.account).await?))
}

async fn get_overrides<S: Storage>(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_localhost(context)?;

    // no params lists every override
    let params: GetOverridesParams = match body {
        Value::Null => GetOverridesParams { account: None },
        body => parse_params(body)?,
    };
    let ledger: &Arc<Ledger<S>> = context.get()?;
    Ok(json!(ledger.get_overrides(params.account)?))
}
