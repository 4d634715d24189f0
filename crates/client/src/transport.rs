//! 传输层：带 `Request-Source` 请求头的 HTTP，以及 `dial` 支持的 WebSocket

use ethers::providers::{
    Http, HttpClientError, JsonRpcClient, JsonRpcError, ProviderError, RpcError, Ws,
    WsClientError,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::{DirectRouteError, Result};

/// 每个请求都会带上的自定义请求头，标识客户端实现和版本
pub const REQUEST_SOURCE_HEADER: &str = "Request-Source";

/// 默认的 `Request-Source` 取值
pub const REQUEST_SOURCE: &str = concat!("rust-direct-route/", env!("CARGO_PKG_VERSION"));

/// 默认单次 HTTP 请求超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 建立连接的选项
#[derive(Debug, Clone)]
pub struct DialOptions {
    /// `Request-Source` 请求头，`None` 表示不发送
    pub request_source: Option<String>,
    /// 单次 HTTP 请求超时，`None` 表示不限制
    pub request_timeout: Option<Duration>,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            request_source: Some(REQUEST_SOURCE.to_string()),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// 带 `Request-Source` 请求头和请求统计的 HTTP 传输层
#[derive(Debug, Clone)]
pub struct RequestSourceHttp {
    inner: Http,
    url: Url,
    request_source: Option<String>,
}

impl RequestSourceHttp {
    /// 只做地址和请求头校验，不发起网络请求
    pub fn new(endpoint: &str, options: &DialOptions) -> Result<Self> {
        let url: Url = endpoint
            .parse()
            .map_err(|e| DirectRouteError::connection(endpoint, format!("invalid URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DirectRouteError::connection(
                endpoint,
                format!("unsupported scheme {:?}, only http(s) can be dialled", url.scheme()),
            ));
        }

        let mut headers = HeaderMap::new();
        if let Some(source) = &options.request_source {
            let name = HeaderName::from_bytes(REQUEST_SOURCE_HEADER.as_bytes())
                .map_err(|e| DirectRouteError::connection(endpoint, e))?;
            let value = HeaderValue::from_str(source).map_err(|e| {
                DirectRouteError::connection(
                    endpoint,
                    format!("invalid {} value: {}", REQUEST_SOURCE_HEADER, e),
                )
            })?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DirectRouteError::connection(endpoint, e))?;

        Ok(Self {
            inner: Http::new_with_client(url.clone(), client),
            url,
            request_source: options.request_source.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn request_source(&self) -> Option<&str> {
        self.request_source.as_deref()
    }
}

#[async_trait::async_trait]
impl JsonRpcClient for RequestSourceHttp {
    type Error = <Http as JsonRpcClient>::Error;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        utils::record_rpc_request();
        let result = JsonRpcClient::request(&self.inner, method, params).await;
        if result.is_err() {
            utils::record_rpc_failure();
        }
        result
    }
}

/// `dial` 建立的传输层
///
/// `http`/`https` 走 [`RequestSourceHttp`]；`ws`/`wss` 走 ethers 的 `Ws`，
/// 握手由 ethers 完成，不携带自定义请求头。
#[derive(Debug, Clone)]
pub enum DialedTransport {
    Http(RequestSourceHttp),
    Ws(Ws),
}

impl DialedTransport {
    /// 按地址协议建立连接，WebSocket 会完成握手后才返回
    pub async fn connect(endpoint: &str, options: &DialOptions) -> Result<Self> {
        let url: Url = endpoint
            .parse()
            .map_err(|e| DirectRouteError::connection(endpoint, format!("invalid URL: {}", e)))?;

        match url.scheme() {
            "http" | "https" => Ok(Self::Http(RequestSourceHttp::new(endpoint, options)?)),
            "ws" | "wss" => {
                debug!("WebSocket 握手: {}", endpoint);
                let ws = Ws::connect(url.as_str())
                    .await
                    .map_err(|e| DirectRouteError::connection(endpoint, e))?;
                Ok(Self::Ws(ws))
            }
            other => Err(DirectRouteError::connection(
                endpoint,
                format!("unsupported scheme {:?}, only http(s) and ws(s) can be dialled", other),
            )),
        }
    }

    pub fn is_ws(&self) -> bool {
        matches!(self, Self::Ws(_))
    }
}

/// [`DialedTransport`] 的传输错误
#[derive(Debug, Error)]
pub enum DialedTransportError {
    #[error(transparent)]
    Http(#[from] HttpClientError),
    #[error(transparent)]
    Ws(#[from] WsClientError),
}

impl RpcError for DialedTransportError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            Self::Http(e) => e.as_error_response(),
            Self::Ws(e) => e.as_error_response(),
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            Self::Http(e) => e.as_serde_error(),
            Self::Ws(e) => e.as_serde_error(),
        }
    }
}

impl From<DialedTransportError> for ProviderError {
    fn from(e: DialedTransportError) -> Self {
        ProviderError::JsonRpcClientError(Box::new(e))
    }
}

#[async_trait::async_trait]
impl JsonRpcClient for DialedTransport {
    type Error = DialedTransportError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        match self {
            Self::Http(http) => Ok(http.request(method, params).await?),
            Self::Ws(ws) => {
                utils::record_rpc_request();
                let result = ws.request(method, params).await;
                if result.is_err() {
                    utils::record_rpc_failure();
                }
                Ok(result?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_send_request_source() {
        let options = DialOptions::default();
        assert_eq!(options.request_source.as_deref(), Some(REQUEST_SOURCE));
        assert!(REQUEST_SOURCE.starts_with("rust-direct-route/"));
    }

    #[test]
    fn test_new_accepts_https() {
        let transport =
            RequestSourceHttp::new("https://api.nodereal.io/direct-route", &DialOptions::default())
                .unwrap();
        assert_eq!(transport.url().host_str(), Some("api.nodereal.io"));
        assert_eq!(transport.request_source(), Some(REQUEST_SOURCE));
    }

    #[test]
    fn test_new_rejects_malformed_url() {
        let err = RequestSourceHttp::new("not a url", &DialOptions::default()).unwrap_err();
        assert!(matches!(err, DirectRouteError::Connection { .. }));
    }

    #[test]
    fn test_new_rejects_unsupported_scheme() {
        let err = RequestSourceHttp::new("ftp://example.com", &DialOptions::default()).unwrap_err();
        assert!(matches!(err, DirectRouteError::Connection { .. }));
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[tokio::test]
    async fn test_connect_dispatches_http() {
        let transport = DialedTransport::connect("http://127.0.0.1:8545", &DialOptions::default())
            .await
            .unwrap();
        assert!(!transport.is_ws());
    }

    #[tokio::test]
    async fn test_connect_rejects_unsupported_scheme() {
        let err = DialedTransport::connect("ipc:///tmp/geth.ipc", &DialOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DirectRouteError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_connect_ws_refused() {
        // 先占用再释放端口，保证没有监听者
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = DialedTransport::connect(&format!("ws://{}", addr), &DialOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DirectRouteError::Connection { .. }));
    }

    #[test]
    fn test_new_rejects_invalid_header_value() {
        let options = DialOptions {
            request_source: Some("bad\nvalue".to_string()),
            ..Default::default()
        };
        let err = RequestSourceHttp::new("http://127.0.0.1:8545", &options).unwrap_err();
        assert!(matches!(err, DirectRouteError::Connection { .. }));
    }
}
