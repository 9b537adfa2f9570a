//! Avatar uploads to the image host

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio::sync::Mutex;

use crate::config::CloudinaryConfig;
use crate::error::{Error, Result};

/// Side length of the square crop served for avatars
const AVATAR_SIZE: u32 = 250;

/// Stores an image under a stable public id and returns a URL for it
#[async_trait]
pub trait AvatarUploader: Send + Sync {
    async fn upload(&self, image: Vec<u8>, public_id: &str) -> Result<String>;
}

/// Public id avatars are stored under
pub fn avatar_public_id(email: &str) -> String {
    format!("RestApp/{}", email)
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    version: u64,
}

/// Signed uploads through the Cloudinary REST API
pub struct CloudinaryUploader {
    config: CloudinaryConfig,
    client: reqwest::Client,
    api_base: String,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.api_base, self.config.cloud_name)
    }

    /// Delivery URL with a square fill crop
    fn delivery_url(&self, public_id: &str, version: u64) -> String {
        format!(
            "https://res.cloudinary.com/{}/image/upload/c_fill,h_{size},w_{size}/v{}/{}",
            self.config.cloud_name,
            version,
            public_id,
            size = AVATAR_SIZE
        )
    }
}

/// `k1=v1&k2=v2` with keys sorted, the form Cloudinary signs
fn string_to_sign(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    sha1_hex(&format!("{}{}", string_to_sign(params), api_secret))
}

#[async_trait]
impl AvatarUploader for CloudinaryUploader {
    async fn upload(&self, image: Vec<u8>, public_id: &str) -> Result<String> {
        let params = [
            ("overwrite", "true".to_string()),
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .part("file", Part::bytes(image).file_name("avatar"));
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "image host answered {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!("Uploaded avatar {} (v{})", public_id, uploaded.version);
        Ok(self.delivery_url(public_id, uploaded.version))
    }
}

/// Keeps uploads in memory and hands out `memory://` URLs
#[derive(Clone, Default)]
pub struct MemoryUploader {
    uploads: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// (public id, byte count) of every upload so far
    pub async fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl AvatarUploader for MemoryUploader {
    async fn upload(&self, image: Vec<u8>, public_id: &str) -> Result<String> {
        if image.is_empty() {
            return Err(Error::BadRequest("Empty image".to_string()));
        }
        let mut uploads = self.uploads.lock().await;
        uploads.push((public_id.to_string(), image.len()));
        Ok(format!("memory://{}/v{}", public_id, uploads.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader() -> CloudinaryUploader {
        CloudinaryUploader::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
        })
    }

    #[test]
    fn test_string_to_sign_sorts_keys() {
        let params = [
            ("timestamp", "1700000000".to_string()),
            ("public_id", "RestApp/a@x.com".to_string()),
            ("overwrite", "true".to_string()),
        ];
        assert_eq!(
            string_to_sign(&params),
            "overwrite=true&public_id=RestApp/a@x.com&timestamp=1700000000"
        );
    }

    #[test]
    fn test_sha1_hex() {
        assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let params = [("public_id", "x".to_string())];
        assert_ne!(sign(&params, "one"), sign(&params, "two"));
        assert_eq!(sign(&params, "one").len(), 40);
    }

    #[test]
    fn test_delivery_url() {
        assert_eq!(
            uploader().delivery_url("RestApp/a@x.com", 42),
            "https://res.cloudinary.com/demo/image/upload/c_fill,h_250,w_250/v42/RestApp/a@x.com"
        );
        assert_eq!(
            uploader().upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[tokio::test]
    async fn test_memory_uploader() {
        let uploader = MemoryUploader::new();
        let url = uploader
            .upload(vec![1, 2, 3], &avatar_public_id("a@x.com"))
            .await
            .unwrap();
        assert_eq!(url, "memory://RestApp/a@x.com/v1");
        assert_eq!(uploader.uploads().await, vec![("RestApp/a@x.com".to_string(), 3)]);
        assert!(uploader.upload(Vec::new(), "x").await.is_err());
    }
}
