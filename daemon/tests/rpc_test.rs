mod common;

use std::net::{IpAddr, Ipv4Addr};

use common::*;
use harvest_common::{
    context::Context,
    rpc::{server::ClientAddr, RPCHandler},
};
use harvest_daemon::{
    core::{storage::MemoryStorage, Ledger},
    rpc::rpc::register_methods,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn handler(t: &TestLedger) -> RPCHandler<Arc<Ledger<MemoryStorage>>> {
    let mut handler = RPCHandler::new(Arc::clone(&t.ledger));
    register_methods(&mut handler, true);
    handler
}

fn request(method: &str, params: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    }))
    .unwrap()
}

async fn call_from(
    handler: &RPCHandler<Arc<Ledger<MemoryStorage>>>,
    addr: Option<IpAddr>,
    method: &str,
    params: Value,
) -> Value {
    let mut context = Context::new();
    context.store(Arc::clone(handler.get_data()));
    context.store(ClientAddr(addr));

    match handler
        .handle_request_with_context(context, &request(method, params))
        .await
    {
        Ok(response) => response,
        Err(e) => e.to_json(),
    }
}

async fn admin_call(handler: &RPCHandler<Arc<Ledger<MemoryStorage>>>, method: &str, params: Value) -> Value {
    call_from(handler, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), method, params).await
}

#[tokio::test]
async fn test_user_flow_over_rpc() {
    let t = setup();
    let handler = handler(&t);

    let product = json!({
        "id": 1,
        "name": "Starter",
        "price": coins(500),
        "dailyIncome": coins(50),
        "contractPeriod": 10
    });
    let response = admin_call(&handler, "upsert_product", product).await;
    assert_eq!(response["result"]["id"], json!(1));

    let response = handler
        .handle_request(&request("register_account", json!({})))
        .await
        .unwrap();
    let account = response["result"]["id"].as_u64().unwrap();

    admin_call(
        &handler,
        "set_balance",
        json!({
            "account": account,
            "field": "spendable",
            "value": coins(1000),
            "actor": ADMIN,
            "reason": "initial deposit"
        }),
    )
    .await;

    let response = handler
        .handle_request(&request("purchase", json!({ "account": account, "product": 1 })))
        .await
        .unwrap();
    assert_eq!(response["result"]["balanceAfter"], json!(coins(550)));
    assert_eq!(response["result"]["contract"]["remainingDays"], json!(9));

    let response = handler
        .handle_request(&request("get_contracts", json!({ "account": account })))
        .await
        .unwrap();
    assert_eq!(response["result"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_admin_methods_require_loopback() {
    let t = setup();
    let handler = handler(&t);
    let params = json!({ "account": 1 });

    // unknown client address
    let err = handler
        .handle_request(&request("audit_account", params.clone()))
        .await
        .unwrap_err()
        .to_json();
    assert_eq!(err["error"]["code"], json!(-32600));

    let remote = Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)));
    let response = call_from(&handler, remote, "audit_account", params).await;
    assert_eq!(response["error"]["code"], json!(-32600));
}

#[tokio::test]
async fn test_ledger_errors_keep_their_code() {
    let t = setup();
    let handler = handler(&t);
    let account = t.account(None, 0).await;

    let response = handler
        .handle_request(&request(
            "purchase",
            json!({ "account": account.0, "product": 77 }),
        ))
        .await
        .unwrap_err()
        .to_json();
    assert_eq!(response["error"]["code"], json!(9));

    let response = admin_call(
        &handler,
        "set_balance",
        json!({
            "account": account.0,
            "field": "spendable",
            "value": 1,
            "actor": ADMIN,
            "reason": ""
        }),
    )
    .await;
    assert_eq!(response["error"]["code"], json!(1));
}

#[tokio::test]
async fn test_admin_methods_can_be_left_out() {
    let t = setup();
    let mut handler = RPCHandler::new(Arc::clone(&t.ledger));
    register_methods(&mut handler, false);

    assert!(handler.has_method("purchase"));
    assert!(!handler.has_method("set_balance"));
    assert!(!handler.has_method("decide_withdrawal"));
}
