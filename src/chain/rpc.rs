//! Ethereum JSON-RPC implementation of the registry interface
//!
//! Submits transactions with `eth_sendTransaction` from the service
//! account (the RPC node holds the key; the configured private key is
//! used to derive the sender address), then polls
//! `eth_getTransactionReceipt` until the transaction confirms or the
//! configured timeout elapses.

use async_trait::async_trait;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::chain::abi::{bytes32_from_str, encode_call, AbiValue};
use crate::chain::registry::{IpRegistry, MintOutcome, TxReceipt};
use crate::config::Args;
use crate::types::{IpsphereError, Result};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Chain client configuration extracted from the service arguments
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub private_key: String,
    pub request_timeout: Duration,
    pub confirm_timeout: Duration,
}

impl ChainConfig {
    /// Build from args; `None` when the chain client is not configured
    pub fn from_args(args: &Args) -> Option<Self> {
        Some(Self {
            rpc_url: args.rpc_url.clone()?,
            contract_address: args.contract_address.clone()?,
            private_key: args.private_key.clone()?,
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            confirm_timeout: Duration::from_millis(args.chain_confirm_timeout_ms),
        })
    }
}

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: Value,
    id: u64,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Receipt shape returned by `eth_getTransactionReceipt`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: String,
    gas_used: String,
    status: String,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
struct RpcLog {
    #[serde(default)]
    topics: Vec<String>,
}

/// Registry client over Ethereum JSON-RPC
pub struct EthRegistry {
    http: reqwest::Client,
    rpc_url: String,
    contract_address: String,
    sender: String,
    confirm_timeout: Duration,
    request_id: AtomicU64,
}

impl EthRegistry {
    /// Create a client, deriving the sender address from the private key
    pub fn new(config: ChainConfig) -> Result<Self> {
        let sender = derive_address(&config.private_key)?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IpsphereError::Chain(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            rpc_url: config.rpc_url,
            contract_address: config.contract_address,
            sender,
            confirm_timeout: config.confirm_timeout,
            request_id: AtomicU64::new(1),
        })
    }

    /// The derived sender address
    pub fn sender(&self) -> &str {
        &self.sender
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: self.request_id.fetch_add(1, Ordering::SeqCst),
        };

        let response: JsonRpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| IpsphereError::Chain(format!("RPC request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| IpsphereError::Chain(format!("Invalid RPC response: {}", e)))?;

        if let Some(err) = response.error {
            return Err(IpsphereError::Chain(format!(
                "RPC error {}: {}",
                err.code, err.message
            )));
        }

        response
            .result
            .ok_or_else(|| IpsphereError::Chain("RPC response missing result".into()))
    }

    /// Submit a contract call and wait for its receipt
    async fn submit(&self, data: Vec<u8>) -> Result<TxReceipt> {
        let (receipt, _) = self.submit_with_logs(data).await?;
        Ok(receipt)
    }

    /// Submit a contract call and wait for its receipt, keeping the raw
    /// logs for event parsing
    async fn submit_with_logs(&self, data: Vec<u8>) -> Result<(TxReceipt, Vec<RpcLog>)> {
        let tx = json!([{
            "from": self.sender,
            "to": self.contract_address,
            "data": format!("0x{}", hex::encode(&data)),
        }]);

        let hash = self
            .rpc("eth_sendTransaction", tx)
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| IpsphereError::Chain("eth_sendTransaction returned no hash".into()))?;

        debug!("Submitted transaction {}", hash);

        let deadline = tokio::time::Instant::now() + self.confirm_timeout;
        loop {
            let result = self
                .rpc("eth_getTransactionReceipt", json!([&hash]))
                .await?;

            if !result.is_null() {
                let raw: RpcReceipt = serde_json::from_value(result).map_err(|e| {
                    IpsphereError::Chain(format!("Malformed transaction receipt: {}", e))
                })?;
                let receipt = TxReceipt {
                    transaction_hash: raw.transaction_hash.clone(),
                    block_number: parse_hex_u64(&raw.block_number)?,
                    gas_used: parse_hex_u64(&raw.gas_used)?,
                    success: raw.status == "0x1",
                };
                if !receipt.success {
                    warn!("Transaction {} reverted", receipt.transaction_hash);
                }
                return Ok((receipt, raw.logs));
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(IpsphereError::Chain(format!(
                    "Timed out waiting for receipt of {}",
                    hash
                )));
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl IpRegistry for EthRegistry {
    async fn set_ip_details(&self, ip_number: &str, ip_type: &str) -> Result<TxReceipt> {
        let data = encode_call(
            "setIPDetails(bytes32,string)",
            &[
                AbiValue::Bytes32(bytes32_from_str(ip_number)?),
                AbiValue::Str(ip_type.to_string()),
            ],
        );
        self.submit(data).await
    }

    async fn tokenize_ip(&self, ip_number: &str) -> Result<TxReceipt> {
        let data = encode_call(
            "tokenizeIP(bytes32)",
            &[AbiValue::Bytes32(bytes32_from_str(ip_number)?)],
        );
        self.submit(data).await
    }

    async fn update_ip_valuation_details(
        &self,
        ip_number: &str,
        ip_value_wei: u128,
        credit_score: &str,
        max_loan_wei: u128,
    ) -> Result<TxReceipt> {
        let data = encode_call(
            "updateIPValuationDetails(bytes32,uint256,string,uint256)",
            &[
                AbiValue::Bytes32(bytes32_from_str(ip_number)?),
                AbiValue::Uint(ip_value_wei),
                AbiValue::Str(credit_score.to_string()),
                AbiValue::Uint(max_loan_wei),
            ],
        );
        self.submit(data).await
    }

    async fn mint_ip(&self, ip_number: &str) -> Result<MintOutcome> {
        let data = encode_call(
            "mintIP(bytes32)",
            &[AbiValue::Bytes32(bytes32_from_str(ip_number)?)],
        );
        let (receipt, logs) = self.submit_with_logs(data).await?;

        if !receipt.success {
            return Err(IpsphereError::Chain(format!(
                "mintIP reverted in {}",
                receipt.transaction_hash
            )));
        }

        let token_id = token_id_from_logs(&logs).ok_or_else(|| {
            IpsphereError::Chain("mintIP receipt carried no Transfer event".into())
        })?;

        Ok(MintOutcome { receipt, token_id })
    }

    async fn burn_ip(&self, ip_number: &str) -> Result<TxReceipt> {
        let data = encode_call(
            "burnIP(bytes32)",
            &[AbiValue::Bytes32(bytes32_from_str(ip_number)?)],
        );
        self.submit(data).await
    }

    async fn pause(&self) -> Result<TxReceipt> {
        self.submit(encode_call("pause()", &[])).await
    }

    async fn unpause(&self) -> Result<TxReceipt> {
        self.submit(encode_call("unpause()", &[])).await
    }
}

/// Derive the Ethereum address for a hex private key:
/// keccak-256 of the uncompressed public key, last 20 bytes.
pub fn derive_address(private_key: &str) -> Result<String> {
    let trimmed = private_key.trim_start_matches("0x");
    let raw = hex::decode(trimmed)
        .map_err(|e| IpsphereError::Validation(format!("PRIVATE_KEY is not valid hex: {}", e)))?;

    let secret = SecretKey::from_slice(&raw)
        .map_err(|e| IpsphereError::Validation(format!("PRIVATE_KEY is not a valid key: {}", e)))?;

    let secp = Secp256k1::new();
    let public = PublicKey::from_secret_key(&secp, &secret);
    let uncompressed = public.serialize_uncompressed();

    // Skip the 0x04 prefix byte
    let hash = Keccak256::digest(&uncompressed[1..]);
    Ok(format!("0x{}", hex::encode(&hash[12..])))
}

/// ERC-721 Transfer(address,address,uint256): token id is the third
/// indexed topic
fn token_id_from_logs(logs: &[RpcLog]) -> Option<i64> {
    logs.iter()
        .find(|log| log.topics.len() == 4)
        .and_then(|log| parse_hex_u64(&log.topics[3]).ok())
        .map(|id| id as i64)
}

fn parse_hex_u64(value: &str) -> Result<u64> {
    let trimmed = value.trim_start_matches("0x");
    // Topics are 32-byte words; only the low 8 bytes can fit in u64
    let tail = if trimmed.len() > 16 {
        let (head, tail) = trimmed.split_at(trimmed.len() - 16);
        if head.bytes().any(|b| b != b'0') {
            return Err(IpsphereError::Chain(format!(
                "hex value {} exceeds u64 range",
                value
            )));
        }
        tail
    } else {
        trimmed
    };

    u64::from_str_radix(tail, 16)
        .map_err(|e| IpsphereError::Chain(format!("invalid hex value '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_padded_hex() {
        assert_eq!(parse_hex_u64("0x1").unwrap(), 1);
        assert_eq!(parse_hex_u64("0x2a").unwrap(), 42);
        assert_eq!(
            parse_hex_u64("0x0000000000000000000000000000000000000000000000000000000000000007")
                .unwrap(),
            7
        );
        assert!(parse_hex_u64("0xzz").is_err());
        assert!(
            parse_hex_u64("0x1000000000000000000000000000000000000000000000000000000000000000")
                .is_err()
        );
    }

    #[test]
    fn derives_a_checksummed_length_address() {
        // Well-known test key (hardhat account #0)
        let address = derive_address(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);

        // Derivation is deterministic
        let again = derive_address(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(address, again);
    }

    #[test]
    fn rejects_bad_private_keys() {
        assert!(derive_address("not-hex").is_err());
        assert!(derive_address("0x00").is_err());
    }

    #[test]
    fn token_id_comes_from_the_four_topic_log() {
        let logs = vec![
            RpcLog {
                topics: vec!["0xaaaa".into()],
            },
            RpcLog {
                topics: vec![
                    "0xddf2".into(),
                    "0x0".into(),
                    "0x1".into(),
                    "0x000000000000000000000000000000000000000000000000000000000000002a".into(),
                ],
            },
        ];
        assert_eq!(token_id_from_logs(&logs), Some(42));
        assert_eq!(token_id_from_logs(&[]), None);
    }
}
