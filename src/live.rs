// Live account updates over the Solana WebSocket endpoint

use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio::net::TcpStream;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One lamport-balance change delivered by the subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub address: String,
    pub lamports: u64,
}

/// What one inbound frame decoded to.
#[derive(Debug, Clone, PartialEq)]
enum ServerFrame {
    SubscriptionConfirmed { request_id: u64, subscription: u64 },
    AccountNotification { subscription: u64, lamports: u64 },
    Other,
}

/// Decode a text frame from the Solana pubsub endpoint.
///
/// Confirmations echo our request id with the server-assigned subscription
/// id; notifications carry the subscription id plus the fresh account
/// state. Anything else is ignored rather than treated as an error.
fn parse_frame(text: &str) -> ServerFrame {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return ServerFrame::Other,
    };

    if value.get("method").and_then(|m| m.as_str()) == Some("accountNotification") {
        let subscription = value.pointer("/params/subscription").and_then(|s| s.as_u64());
        let lamports = value
            .pointer("/params/result/value/lamports")
            .and_then(|l| l.as_u64());
        if let (Some(subscription), Some(lamports)) = (subscription, lamports) {
            return ServerFrame::AccountNotification {
                subscription,
                lamports,
            };
        }
        return ServerFrame::Other;
    }

    if let (Some(request_id), Some(subscription)) = (
        value.get("id").and_then(|i| i.as_u64()),
        value.get("result").and_then(|r| r.as_u64()),
    ) {
        return ServerFrame::SubscriptionConfirmed {
            request_id,
            subscription,
        };
    }

    ServerFrame::Other
}

/// WebSocket client for account-change subscriptions.
pub struct LiveUpdateClient {
    /// WebSocket connection (wrapped in Arc<Mutex> for thread-safe access)
    ws: Arc<Mutex<Option<WsStream>>>,
    endpoint: String,
    /// Request id -> address, until the server confirms the subscription
    pending: Arc<Mutex<HashMap<u64, String>>>,
    /// Subscription id -> address
    subscriptions: Arc<Mutex<HashMap<u64, String>>>,
    request_id: Arc<Mutex<u64>>,
}

impl LiveUpdateClient {
    pub fn new(endpoint: String) -> Self {
        LiveUpdateClient {
            ws: Arc::new(Mutex::new(None)),
            endpoint,
            pending: Arc::new(Mutex::new(HashMap::new())),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            request_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Connect to the WebSocket endpoint. A no-op when already connected.
    pub async fn connect(&self) -> Result<(), String> {
        let mut ws_lock = self.ws.lock().await;
        if ws_lock.is_some() {
            return Ok(());
        }

        println!("Connecting to {}", self.endpoint);
        let (ws_stream, response) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| format!("Failed to connect: {}", e))?;
        println!("Live update channel open ({})", response.status());

        *ws_lock = Some(ws_stream);
        Ok(())
    }

    async fn next_request_id(&self) -> u64 {
        let mut id_lock = self.request_id.lock().await;
        let id = *id_lock;
        *id_lock += 1;
        id
    }

    /// Subscribe to account changes for one address.
    pub async fn subscribe_account(&self, address: &str) -> Result<(), String> {
        let request_id = self.next_request_id().await;
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": "accountSubscribe",
            "params": [
                address,
                { "encoding": "jsonParsed", "commitment": "confirmed" }
            ]
        });

        {
            let mut pending = self.pending.lock().await;
            pending.insert(request_id, address.to_string());
        }

        let mut ws_lock = self.ws.lock().await;
        let ws = ws_lock.as_mut().ok_or("Not connected")?;
        ws.send(Message::Text(request.to_string()))
            .await
            .map_err(|e| format!("Failed to send subscribe: {}", e))
    }

    /// Pump the socket until the next balance update.
    ///
    /// Subscription confirmations are resolved internally; `Ok(None)` means
    /// the server closed the connection (or it was never open).
    pub async fn next_update(&self) -> Result<Option<AccountUpdate>, String> {
        loop {
            let mut ws_lock = self.ws.lock().await;
            let ws = match ws_lock.as_mut() {
                Some(ws) => ws,
                None => return Ok(None),
            };

            let msg = match ws.next().await {
                Some(msg) => msg.map_err(|e| format!("Failed to receive: {}", e))?,
                None => return Ok(None),
            };

            match msg {
                Message::Text(text) => match parse_frame(&text) {
                    ServerFrame::SubscriptionConfirmed {
                        request_id,
                        subscription,
                    } => {
                        drop(ws_lock);
                        let address = self.pending.lock().await.remove(&request_id);
                        if let Some(address) = address {
                            println!("Subscription {} confirmed for {}", subscription, address);
                            self.subscriptions.lock().await.insert(subscription, address);
                        }
                    }
                    ServerFrame::AccountNotification {
                        subscription,
                        lamports,
                    } => {
                        drop(ws_lock);
                        let address = self
                            .subscriptions
                            .lock()
                            .await
                            .get(&subscription)
                            .cloned();
                        if let Some(address) = address {
                            return Ok(Some(AccountUpdate { address, lamports }));
                        }
                    }
                    ServerFrame::Other => {}
                },
                Message::Ping(payload) => {
                    ws.send(Message::Pong(payload))
                        .await
                        .map_err(|e| format!("Failed to send pong: {}", e))?;
                }
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
    }

    /// Close the connection and forget all subscriptions. A no-op when
    /// already closed.
    pub async fn close(&self) -> Result<(), String> {
        let mut ws_lock = self.ws.lock().await;
        if let Some(mut ws) = ws_lock.take() {
            ws.close(None)
                .await
                .map_err(|e| format!("Failed to close: {}", e))?;
            println!("Live update channel closed");
        }
        self.pending.lock().await.clear();
        self.subscriptions.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscription_confirmation() {
        let frame = r#"{"jsonrpc":"2.0","result":23784,"id":1}"#;
        assert_eq!(
            parse_frame(frame),
            ServerFrame::SubscriptionConfirmed {
                request_id: 1,
                subscription: 23784
            }
        );
    }

    #[test]
    fn test_parse_account_notification() {
        let frame = r#"{
            "jsonrpc": "2.0",
            "method": "accountNotification",
            "params": {
                "result": {
                    "context": { "slot": 5199307 },
                    "value": {
                        "lamports": 33594,
                        "owner": "11111111111111111111111111111111",
                        "executable": false,
                        "rentEpoch": 635
                    }
                },
                "subscription": 23784
            }
        }"#;
        assert_eq!(
            parse_frame(frame),
            ServerFrame::AccountNotification {
                subscription: 23784,
                lamports: 33594
            }
        );
    }

    #[test]
    fn test_unrelated_frames_are_ignored() {
        assert_eq!(parse_frame("not even json"), ServerFrame::Other);
        assert_eq!(
            parse_frame(r#"{"jsonrpc":"2.0","method":"slotNotification","params":{}}"#),
            ServerFrame::Other
        );
        // An error reply to a subscribe has an id but no numeric result.
        assert_eq!(
            parse_frame(r#"{"jsonrpc":"2.0","error":{"code":-32602},"id":2}"#),
            ServerFrame::Other
        );
    }

    #[tokio::test]
    async fn test_client_starts_disconnected() {
        let client = LiveUpdateClient::new("wss://api.mainnet-beta.solana.com".to_string());
        // next_update on a closed client ends the stream instead of erroring.
        assert_eq!(client.next_update().await, Ok(None));
        // close is idempotent.
        assert!(client.close().await.is_ok());
        assert!(client.close().await.is_ok());
    }
}
