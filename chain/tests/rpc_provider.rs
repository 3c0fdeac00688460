//! JSON-RPC provider against a local mock node.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use reclaim_chain::{ChainError, EthRpcProvider, RpcClient, VerifyReportCall, WalletProvider};
use reclaim_types::{Identity, ReportId, TxHash, Wei};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const OPERATOR: &str = "0x6054060A93943D7eAB480B815dC2E2350Ae48C19";
const CONTRACT: &str = "0x00000000000000000000000000000000000000c0";

// ---------------------------------------------------------------------------
// Mock node
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockNode {
    /// Every request body received, in order.
    requests: Mutex<Vec<Value>>,
    /// Whether `eth_requestAccounts` is unknown to this node.
    no_request_accounts: bool,
    /// Receipt polls answered with `null` before the receipt appears.
    pending_polls: Mutex<u32>,
    /// Receipt status to report.
    receipt_status: &'static str,
    /// Error object returned for `eth_sendTransaction`, if any.
    send_error: Option<Value>,
}

fn tx_hash() -> String {
    format!("0x{}", "ab".repeat(32))
}

async fn handle(State(node): State<Arc<MockNode>>, Json(req): Json<Value>) -> Json<Value> {
    node.requests.lock().unwrap().push(req.clone());
    let id = req["id"].clone();
    let method = req["method"].as_str().unwrap_or_default();

    let reply = match method {
        "eth_requestAccounts" if node.no_request_accounts => {
            json!({"error": {"code": -32601, "message": "method not found"}})
        }
        "eth_requestAccounts" | "eth_accounts" => json!({"result": [OPERATOR]}),
        "eth_sendTransaction" => match &node.send_error {
            Some(err) => json!({ "error": err }),
            None => json!({ "result": tx_hash() }),
        },
        "eth_getTransactionReceipt" => {
            let mut pending = node.pending_polls.lock().unwrap();
            if *pending > 0 {
                *pending -= 1;
                json!({ "result": null })
            } else {
                json!({"result": {
                    "transactionHash": tx_hash(),
                    "blockNumber": "0x2a",
                    "status": node.receipt_status,
                }})
            }
        }
        _ => json!({"error": {"code": -32601, "message": "method not found"}}),
    };

    let mut reply = reply;
    reply["jsonrpc"] = json!("2.0");
    reply["id"] = id;
    Json(reply)
}

async fn spawn_node(node: MockNode) -> Result<(Arc<MockNode>, String)> {
    let node = Arc::new(node);
    let app = Router::new().route("/", post(handle)).with_state(node.clone());
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((node, format!("http://{addr}")))
}

fn provider(url: &str) -> EthRpcProvider {
    EthRpcProvider::new(RpcClient::new(url).unwrap()).with_poll_interval(Duration::from_millis(10))
}

fn ok_node() -> MockNode {
    MockNode {
        receipt_status: "0x1",
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_accounts_returns_disclosed_identity() -> Result<()> {
    let (_node, url) = spawn_node(ok_node()).await?;
    let accounts = provider(&url).request_accounts().await?;
    assert_eq!(accounts, vec![Identity::parse(OPERATOR)?]);
    Ok(())
}

#[tokio::test]
async fn request_accounts_falls_back_to_eth_accounts() -> Result<()> {
    let (node, url) = spawn_node(MockNode {
        no_request_accounts: true,
        ..ok_node()
    })
    .await?;
    let accounts = provider(&url).request_accounts().await?;
    assert_eq!(accounts.len(), 1);

    let methods: Vec<String> = node
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| r["method"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(methods, vec!["eth_requestAccounts", "eth_accounts"]);
    Ok(())
}

#[tokio::test]
async fn unreachable_node_is_reported() {
    // Port 9 (discard) is never an RPC endpoint on a test host.
    let err = provider("http://127.0.0.1:9").request_accounts().await.unwrap_err();
    assert!(matches!(err, ChainError::Unreachable(_) | ChainError::Transport(_)));
}

// ---------------------------------------------------------------------------
// Verification transaction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verify_report_sends_value_equal_to_reward() -> Result<()> {
    let (node, url) = spawn_node(ok_node()).await?;
    let provider = provider(&url);
    let signer = provider.signer(&Identity::parse(OPERATOR)?).await?;
    let contract = provider.contract(&Identity::parse(CONTRACT)?, signer)?;

    let reward = Wei::from_ether_str("0.2")?;
    let call = VerifyReportCall::new(ReportId::new(1), reward);
    let hash = contract.verify_report(&call).await?;
    assert_eq!(hash, TxHash::parse(&tx_hash())?);

    let requests = node.requests.lock().unwrap();
    let sent = &requests[0]["params"][0];
    assert_eq!(sent["from"], OPERATOR.to_lowercase());
    assert_eq!(sent["to"], CONTRACT);
    assert_eq!(sent["value"], "0x2c68af0bb140000");
    assert_eq!(sent["data"], call.calldata_hex());
    Ok(())
}

#[tokio::test]
async fn user_rejection_maps_to_rejected() -> Result<()> {
    let (_node, url) = spawn_node(MockNode {
        send_error: Some(json!({"code": 4001, "message": "User denied transaction signature"})),
        ..ok_node()
    })
    .await?;
    let provider = provider(&url);
    let signer = provider.signer(&Identity::parse(OPERATOR)?).await?;
    let contract = provider.contract(&Identity::parse(CONTRACT)?, signer)?;

    let err = contract
        .verify_report(&VerifyReportCall::new(ReportId::new(1), Wei::new(1)))
        .await
        .unwrap_err();
    assert!(err.is_user_rejection());
    Ok(())
}

#[tokio::test]
async fn confirmation_polls_until_receipt() -> Result<()> {
    let (node, url) = spawn_node(MockNode {
        pending_polls: Mutex::new(3),
        ..ok_node()
    })
    .await?;
    let provider = provider(&url);
    let signer = provider.signer(&Identity::parse(OPERATOR)?).await?;
    let contract = provider.contract(&Identity::parse(CONTRACT)?, signer)?;

    let receipt = contract
        .wait_for_confirmation(TxHash::parse(&tx_hash())?)
        .await?;
    assert_eq!(receipt.block_number, 42);
    assert_eq!(node.requests.lock().unwrap().len(), 4);
    Ok(())
}

#[tokio::test]
async fn reverted_receipt_is_an_error() -> Result<()> {
    let (_node, url) = spawn_node(MockNode {
        receipt_status: "0x0",
        ..Default::default()
    })
    .await?;
    let provider = provider(&url);
    let signer = provider.signer(&Identity::parse(OPERATOR)?).await?;
    let contract = provider.contract(&Identity::parse(CONTRACT)?, signer)?;

    let err = contract
        .wait_for_confirmation(TxHash::parse(&tx_hash())?)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Reverted(_)));
    Ok(())
}
