//! Tile imagery download and PNG decoding.

use image::ImageFormat;
use thiserror::Error;

use crate::config::MapConfig;

use super::tiles::TileKey;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("tile request failed: {0}")]
    Request(String),

    #[error("tile request timed out")]
    Timeout,

    #[error("tile server returned HTTP {0}")]
    Status(u16),

    #[error("tile image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

impl From<reqwest::Error> for TileError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TileError::Timeout
        } else {
            TileError::Request(e.to_string())
        }
    }
}

/// A decoded tile as straight (unmultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub fn decode_png(bytes: &[u8]) -> Result<TileImage, TileError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
    Ok(TileImage {
        width: img.width(),
        height: img.height(),
        rgba: img.into_raw(),
    })
}

#[derive(Clone)]
pub struct TileFetcher {
    client: reqwest::Client,
    url_template: String,
}

impl TileFetcher {
    pub fn from_config(config: &MapConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url_template: config.tile_url.clone(),
        }
    }

    pub async fn fetch(&self, key: TileKey) -> Result<TileImage, TileError> {
        let url = key.url(&self.url_template);
        log::debug!("map: fetching {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TileError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        decode_png(&bytes)
    }
}
