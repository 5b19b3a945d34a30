pub mod tokens;

/// RPC and WebSocket endpoints the store talks to.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub rpc_url: String,
    pub ws_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            ws_url: "wss://api.mainnet-beta.solana.com".to_string(),
        }
    }
}

impl EndpointConfig {
    /// Load endpoint overrides from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rpc_url: std::env::var("SOLFOLIO_RPC_URL").unwrap_or(defaults.rpc_url),
            ws_url: std::env::var("SOLFOLIO_WS_URL").unwrap_or(defaults.ws_url),
        }
    }

    /// Resolve the effective endpoints: a stored custom RPC URL wins over
    /// the environment, which wins over the public mainnet defaults.
    pub fn resolve(custom_rpc: Option<&str>) -> Self {
        let mut config = Self::from_env();
        if let Some(rpc) = custom_rpc {
            config.rpc_url = rpc.to_string();
            config.ws_url = derive_ws_url(rpc);
        }
        config
    }
}

/// Derive the WebSocket endpoint from an HTTP RPC endpoint.
pub fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        rpc_url.to_string()
    }
}
