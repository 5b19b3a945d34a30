use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// The SPL token program that owns standard token accounts.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: String,
    id: u64,
    method: String,
    params: Vec<serde_json::Value>,
}

impl RpcRequest {
    fn new(method: &str, params: Vec<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: method.to_string(),
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: T,
    #[allow(dead_code)]
    id: u64,
}

async fn post_rpc(
    request: RpcRequest,
    rpc_url: Option<&str>,
) -> Result<serde_json::Value, String> {
    let client = Client::new();
    let url = rpc_url.unwrap_or(DEFAULT_RPC_URL);

    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("RPC error: {}", response.status()));
    }

    let json: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;

    if let Some(error) = json.get("error") {
        return Err(format!("RPC error: {:?}", error));
    }

    Ok(json)
}

/// Fetch the SOL balance for an address, in whole SOL.
pub async fn get_balance(address: &str, rpc_url: Option<&str>) -> Result<f64, String> {
    let request = RpcRequest::new(
        "getBalance",
        vec![
            serde_json::Value::String(address.to_string()),
            serde_json::json!({ "commitment": "finalized" }),
        ],
    );

    let json = post_rpc(request, rpc_url).await?;

    if let Some(value) = json.pointer("/result/value").and_then(|v| v.as_u64()) {
        return Ok(value as f64 / 1_000_000_000.0);
    }

    Err(format!("Failed to parse balance from response: {:?}", json))
}

#[derive(Debug, Deserialize)]
struct TokenAccountsResult {
    value: Vec<TokenAccount>,
}

#[derive(Debug, Deserialize)]
struct TokenAccount {
    account: AccountData,
    pubkey: String,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    data: ParsedData,
}

#[derive(Debug, Deserialize)]
struct ParsedData {
    parsed: ParsedInfo,
}

#[derive(Debug, Deserialize)]
struct ParsedInfo {
    info: TokenInfo,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    mint: String,
    owner: String,
    state: String,
    #[serde(rename = "tokenAmount")]
    token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    decimals: u8,
    // Null for amounts the node could not render as a float.
    #[serde(rename = "uiAmount")]
    ui_amount: Option<f64>,
}

/// Parameters for filtering token accounts by mint or program ID.
#[derive(Debug, Serialize)]
pub enum TokenAccountFilter {
    Mint(String),
    ProgramId(String),
}

/// Token account details in a display-friendly shape.
#[derive(Debug, Clone, Serialize)]
pub struct TokenAccountInfo {
    pub pubkey: String,
    pub mint: String,
    pub owner: String,
    pub amount: Option<f64>,
    pub decimals: u8,
    pub state: String,
}

/// Fetches token accounts owned by the specified address, filtered by mint
/// or program ID.
pub async fn get_token_accounts_by_owner(
    address: &str,
    filter: Option<TokenAccountFilter>,
    rpc_url: Option<&str>,
) -> Result<Vec<TokenAccountInfo>, String> {
    let filter_param = match filter {
        Some(TokenAccountFilter::Mint(mint)) => serde_json::json!({ "mint": mint }),
        Some(TokenAccountFilter::ProgramId(program_id)) => {
            serde_json::json!({ "programId": program_id })
        }
        None => serde_json::json!({ "programId": TOKEN_PROGRAM_ID }),
    };

    let request = RpcRequest::new(
        "getTokenAccountsByOwner",
        vec![
            serde_json::Value::String(address.to_string()),
            filter_param,
            serde_json::json!({
                "encoding": "jsonParsed",
                "commitment": "finalized"
            }),
        ],
    );

    let json = post_rpc(request, rpc_url).await?;

    let rpc_response: RpcResponse<TokenAccountsResult> = serde_json::from_value(json)
        .map_err(|e| format!("Failed to deserialize response: {}", e))?;

    let token_accounts = rpc_response
        .result
        .value
        .into_iter()
        .map(|account| TokenAccountInfo {
            pubkey: account.pubkey,
            mint: account.account.data.parsed.info.mint,
            owner: account.account.data.parsed.info.owner,
            amount: account.account.data.parsed.info.token_amount.ui_amount,
            decimals: account.account.data.parsed.info.token_amount.decimals,
            state: account.account.data.parsed.info.state,
        })
        .collect();

    Ok(token_accounts)
}
