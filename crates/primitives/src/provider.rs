//! Utils for creating ethers providers

use crate::constants::rpc_headers;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::Chain,
};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

/// Credentials for a first-party RPC endpoint
///
/// Attached as request headers, never as query parameters.
#[derive(Clone, Debug, Default)]
pub struct RpcCredentials {
    /// Secret key used by backend integrations
    pub secret_key: Option<String>,
    /// Client id used by frontend integrations
    pub client_id: Option<String>,
}

impl RpcCredentials {
    fn header_map(&self) -> eyre::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.secret_key {
            headers.insert(rpc_headers::SECRET_KEY, HeaderValue::from_str(key)?);
        }
        if let Some(id) = &self.client_id {
            headers.insert(rpc_headers::CLIENT_ID, HeaderValue::from_str(id)?);
        }
        Ok(headers)
    }
}

/// Creates ethers provider with HTTP connection
pub async fn create_http_provider(addr: &str) -> eyre::Result<Provider<Http>> {
    let provider = Provider::<Http>::try_from(addr)?;

    let chain_id = provider.get_chainid().await?;

    Ok(provider.interval(if chain_id == Chain::Dev.into() {
        Duration::from_millis(5u64)
    } else {
        Duration::from_millis(500u64)
    }))
}

/// Creates ethers provider with HTTP connection, authenticating with the given credentials
pub fn create_http_provider_with_credentials(
    addr: &str,
    credentials: &RpcCredentials,
) -> eyre::Result<Provider<Http>> {
    let url = Url::parse(addr)?;
    let client = reqwest::Client::builder().default_headers(credentials.header_map()?).build()?;
    Ok(Provider::new(Http::new_with_client(url, client)))
}

