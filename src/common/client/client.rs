use reqwest::{
    Client, ClientBuilder, Response,
    header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use serde_json::Value;

use tracing::{debug, warn};

use crate::downloader::models::DEFAULT_USER_AGENT;

// 下载与解析共用的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct MediaClient {
    pub inner: Client,
}

impl MediaClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, reqwest::Error> {
        // 跟随重定向是 reqwest 的默认行为，这里不设置超时
        let inner = ClientBuilder::new()
            .default_headers(Self::get_default_headers(user_agent))
            .build()?;
        Ok(Self { inner })
    }

    pub fn get_default_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        let agent = HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(USER_AGENT, agent);
        headers
    }

    // 原始响应，由调用方处理状态码和响应体
    pub async fn get_raw_response(&self, url: &str) -> Result<Response, reqwest::Error> {
        debug!("GET {}", url);
        self.inner.get(url).send().await
    }

    // HEAD 请求返回 2xx 视为可访问
    pub async fn is_accessible(&self, url: &str) -> bool {
        match self.inner.head(url).send().await {
            Ok(resp) => {
                debug!("HEAD {} -> {}", url, resp.status());
                resp.status().is_success()
            }
            Err(e) => {
                debug!("HEAD {} 失败: {}", url, e);
                false
            }
        }
    }

    // 带额外请求头的 JSON 请求，响应体按不可信的 JSON 处理
    pub async fn get_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<(u16, Option<Value>), reqwest::Error> {
        let mut request = self.inner.get(url);
        for (name, value) in headers {
            match HeaderValue::from_str(value) {
                Ok(value) => request = request.header(HeaderName::from_static(name), value),
                Err(_) => warn!("忽略无效的请求头: {}", name),
            }
        }

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok((status, None));
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(json) => Ok((status, Some(json))),
            Err(e) => {
                warn!("响应不是有效的 JSON: {}", e);
                Ok((status, None))
            }
        }
    }
}
