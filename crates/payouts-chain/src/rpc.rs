//! JSON-RPC client for a chain gateway.
//!
//! The gateway speaks newline-delimited JSON-RPC 2.0 over TCP: one request
//! per line, one response per line. Each call opens a fresh connection and
//! is bounded by the configured timeout. A JSON `null` result means the
//! queried storage entry is absent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use payouts_crypto::Signer;
use payouts_types::{AccountId, EraIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::{
    Call, ChainError, ChainQuery, Exposure, NominatorEntry, Receipt, Result, RewardPoints,
    SignedTransaction, StakeOverview, StakingLedger, SubmitError, TxSubmitter, ValidatorEntry,
};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JSON-RPC request line.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC response line.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ActiveEraInfo {
    index: EraIndex,
}

#[derive(Debug, Deserialize)]
struct Nominations {
    targets: Vec<AccountId>,
}

/// Chain access through a JSON-RPC gateway.
pub struct RpcChain {
    endpoint: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcChain {
    /// Client for the gateway at `endpoint` (`host:port`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            next_id: AtomicU64::new(1),
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issue one request and decode its result.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let mut line = serde_json::to_string(&request)
            .map_err(|e| ChainError::Encoding(format!("request serialization failed: {e}")))?;
        line.push('\n');

        debug!(method, id, endpoint = %self.endpoint, "sending rpc request");

        let response = tokio::time::timeout(self.timeout, self.round_trip(line))
            .await
            .map_err(|_| ChainError::Timeout(self.timeout.as_secs()))??;

        decode_response(&response)
    }

    async fn round_trip(&self, line: String) -> Result<String> {
        let stream = TcpStream::connect(&self.endpoint).await.map_err(|e| {
            ChainError::Transport(format!("failed to connect to {}: {e}", self.endpoint))
        })?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ChainError::Transport(format!("write failed: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| ChainError::Transport(format!("flush failed: {e}")))?;

        let mut response = String::new();
        let bytes_read = reader
            .read_line(&mut response)
            .await
            .map_err(|e| ChainError::Transport(format!("read failed: {e}")))?;
        if bytes_read == 0 {
            return Err(ChainError::Transport(
                "gateway closed the connection".to_string(),
            ));
        }
        Ok(response)
    }
}

/// Decode a response line into the expected result type.
fn decode_response<T: DeserializeOwned>(line: &str) -> Result<T> {
    let response: RpcResponse = serde_json::from_str(line)
        .map_err(|e| ChainError::Decode(format!("malformed response: {e}")))?;
    if let Some(err) = response.error {
        return Err(ChainError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    serde_json::from_value(response.result.unwrap_or(Value::Null))
        .map_err(|e| ChainError::Decode(e.to_string()))
}

#[async_trait]
impl ChainQuery for RpcChain {
    async fn current_era(&self) -> Result<Option<EraIndex>> {
        let info: Option<ActiveEraInfo> = self.call("staking_activeEra", json!([])).await?;
        Ok(info.map(|i| i.index))
    }

    async fn nominations(&self, account: &AccountId) -> Result<Option<Vec<AccountId>>> {
        let noms: Option<Nominations> = self.call("staking_nominators", json!([account])).await?;
        Ok(noms.map(|n| n.targets))
    }

    async fn bonded(&self, stash: &AccountId) -> Result<Option<AccountId>> {
        self.call("staking_bonded", json!([stash])).await
    }

    async fn claimed_rewards(&self, era: EraIndex, validator: &AccountId) -> Result<Vec<u32>> {
        let pages: Option<Vec<u32>> = self
            .call("staking_claimedRewards", json!([era, validator]))
            .await?;
        Ok(pages.unwrap_or_default())
    }

    async fn stakers_overview(
        &self,
        era: EraIndex,
        validator: &AccountId,
    ) -> Result<Option<StakeOverview>> {
        self.call("staking_erasStakersOverview", json!([era, validator]))
            .await
    }

    async fn reward_points(&self, era: EraIndex) -> Result<RewardPoints> {
        let points: Option<RewardPoints> =
            self.call("staking_erasRewardPoints", json!([era])).await?;
        Ok(points.unwrap_or_default())
    }

    async fn nominator_entries(&self) -> Result<Vec<NominatorEntry>> {
        self.call("staking_nominatorsEntries", json!([])).await
    }

    async fn ledger(&self, controller: &AccountId) -> Result<Option<StakingLedger>> {
        self.call("staking_ledger", json!([controller])).await
    }

    async fn validator_entries(&self) -> Result<Vec<ValidatorEntry>> {
        self.call("staking_validatorsEntries", json!([])).await
    }

    async fn eras_stakers(&self, era: EraIndex, validator: &AccountId) -> Result<Exposure> {
        let exposure: Option<Exposure> =
            self.call("staking_erasStakers", json!([era, validator])).await?;
        Ok(exposure.unwrap_or_default())
    }
}

#[async_trait]
impl TxSubmitter for RpcChain {
    async fn next_index(&self, account: &AccountId) -> Result<u64> {
        self.call("system_accountNextIndex", json!([account])).await
    }

    async fn sign_and_submit(
        &self,
        call: &Call,
        signer: &Signer,
        nonce: u64,
    ) -> std::result::Result<Receipt, SubmitError> {
        let tx = SignedTransaction::sign(call.clone(), signer, nonce)?;
        let extrinsic = format!("0x{}", hex::encode(tx.encode()?));
        match self
            .call::<String>("author_submitExtrinsic", json!([extrinsic]))
            .await
        {
            Ok(tx_hash) => Ok(Receipt { tx_hash }),
            Err(ChainError::Rpc { code, message }) => {
                Err(SubmitError::Rejected(format!("{code}: {message}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Serve one connection per canned reply, echoing the request method back
    /// through the returned handle.
    async fn serve(replies: Vec<Value>) -> (String, tokio::task::JoinHandle<Vec<Value>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for reply in replies {
                let (stream, _) = listener.accept().await.expect("accept");
                let (reader, mut writer) = stream.into_split();
                let mut reader = BufReader::new(reader);
                let mut line = String::new();
                reader.read_line(&mut line).await.expect("read");
                let request: Value = serde_json::from_str(&line).expect("request json");
                let mut response = json!({"jsonrpc": "2.0", "id": request["id"].clone()});
                if let Some(err) = reply.get("error") {
                    response["error"] = err.clone();
                } else {
                    response["result"] = reply;
                }
                seen.push(request);
                let mut out = response.to_string();
                out.push('\n');
                writer.write_all(out.as_bytes()).await.expect("write");
            }
            seen
        });
        (addr, handle)
    }

    #[test]
    fn test_decode_null_is_none() {
        let v: Option<u32> =
            decode_response(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).expect("decode");
        assert_eq!(v, None);
    }

    #[test]
    fn test_decode_error_object() {
        let err = decode_response::<u32>(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":1010,"message":"Invalid Transaction"}}"#,
        )
        .expect_err("rpc error");
        assert_eq!(
            err,
            ChainError::Rpc {
                code: 1010,
                message: "Invalid Transaction".into()
            }
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode_response::<u32>("not json"),
            Err(ChainError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_current_era_over_tcp() {
        let (addr, handle) = serve(vec![json!({"index": 100, "start": 1_700_000_000_000u64})]).await;
        let chain = RpcChain::new(addr);
        assert_eq!(chain.current_era().await.expect("era"), Some(100));
        let seen = handle.await.expect("server");
        assert_eq!(seen[0]["method"], "staking_activeEra");
        assert_eq!(seen[0]["jsonrpc"], "2.0");
    }

    #[tokio::test]
    async fn test_claimed_rewards_params_and_null() {
        let v = AccountId::new([5; 32]);
        let (addr, handle) = serve(vec![Value::Null]).await;
        let chain = RpcChain::new(addr);
        assert!(chain.claimed_rewards(99, &v).await.expect("query").is_empty());
        let seen = handle.await.expect("server");
        assert_eq!(seen[0]["params"], json!([99, v.to_string()]));
    }

    #[tokio::test]
    async fn test_submit_rejection_maps_to_rejected() {
        let (addr, _handle) = serve(vec![json!({"error": {"code": 1014, "message": "Priority is too low"}})]).await;
        let chain = RpcChain::new(addr);
        let signer = Signer::from_seed(&[1; 32]);
        let err = chain
            .sign_and_submit(&Call::payout_stakers(AccountId::new([2; 32]), 7), &signer, 3)
            .await
            .expect_err("rejected");
        assert_eq!(err, SubmitError::Rejected("1014: Priority is too low".into()));
    }

    #[tokio::test]
    async fn test_submit_sends_decodable_extrinsic() {
        let (addr, handle) = serve(vec![json!("0xabc")]).await;
        let chain = RpcChain::new(addr);
        let signer = Signer::from_seed(&[1; 32]);
        let call = Call::payout_stakers(AccountId::new([2; 32]), 7);
        let receipt = chain.sign_and_submit(&call, &signer, 3).await.expect("submit");
        assert_eq!(receipt.tx_hash, "0xabc");

        let seen = handle.await.expect("server");
        let hex_tx = seen[0]["params"][0].as_str().expect("hex param");
        let bytes = hex::decode(hex_tx.trim_start_matches("0x")).expect("hex");
        let tx = SignedTransaction::decode(&bytes).expect("decode");
        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.call, call);
        assert!(tx.verify().is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        drop(listener);
        let chain = RpcChain::new(addr);
        assert!(matches!(
            chain.current_era().await,
            Err(ChainError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_silent_gateway_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        let _hold = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });
        let chain = RpcChain::new(addr).with_timeout(Duration::from_millis(100));
        assert!(matches!(
            chain.current_era().await,
            Err(ChainError::Timeout(_))
        ));
    }
}
