//! Access to a running gallery server.

use std::future::Future;

use thiserror::Error;

use crate::gallery::{GalleryData, RefreshInfo};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
    #[error("timed out")]
    Timeout,
}

pub trait GalleryApi {
    fn check_for_refresh(&self) -> impl Future<Output = Result<RefreshInfo, ApiError>> + Send;

    fn gallery_data(&self) -> impl Future<Output = Result<GalleryData, ApiError>> + Send;

    /// Load a thumbnail, discarding its bytes.
    fn load_thumbnail(&self, url: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

pub struct HttpGalleryApi {
    base: String,
    http: reqwest::Client,
}

impl HttpGalleryApi {
    pub fn new(base: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let response = self.http.get(format!("{}{path}", self.base)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl GalleryApi for HttpGalleryApi {
    async fn check_for_refresh(&self) -> Result<RefreshInfo, ApiError> {
        Ok(self.get("/check_for_refresh").await?.json().await?)
    }

    async fn gallery_data(&self) -> Result<GalleryData, ApiError> {
        Ok(self.get("/gallery_data").await?.json().await?)
    }

    async fn load_thumbnail(&self, url: &str) -> Result<(), ApiError> {
        self.get(url).await?.bytes().await?;
        Ok(())
    }
}
