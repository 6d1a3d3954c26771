use std::env;

use log::{error, info};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::utils::error::CustomError;

/// Cloudinary configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: Option<String>,
}

impl CloudinaryConfig {
    /// `None` when credentials are missing; uploads are then refused.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok()?,
            api_key: env::var("CLOUDINARY_API_KEY").ok()?,
            api_secret: env::var("CLOUDINARY_API_SECRET").ok()?,
            upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET").ok(),
        })
    }

    pub fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }

    /// Signature over the sorted, `&`-joined params, as Cloudinary expects.
    pub fn sign(&self, params: &[(&str, String)], timestamp: i64) -> String {
        let mut pairs: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .chain(std::iter::once(format!("timestamp={}", timestamp)))
            .collect();
        pairs.sort();

        let mut hasher = Sha1::new();
        hasher.update(format!("{}{}", pairs.join("&"), self.api_secret).as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorResponse {
    error: CloudinaryError,
}

/// An image received from a client
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: String, data: Vec<u8>) -> Self {
        Self { file_name, data }
    }

    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        Some(ext.to_lowercase())
    }
}

/// Accepted post images
#[derive(Debug, Clone)]
pub struct FileValidator {
    pub allowed_extensions: Vec<&'static str>,
    pub max_file_size: usize,
    pub min_file_size: usize,
}

impl FileValidator {
    pub fn images() -> Self {
        Self {
            allowed_extensions: vec!["jpg", "jpeg", "png", "gif", "webp", "bmp"],
            max_file_size: 10 * 1024 * 1024, // 10MB
            min_file_size: 1024,             // 1KB
        }
    }

    pub fn validate(&self, file: &FileUpload) -> Result<(), CustomError> {
        let extension = file
            .extension()
            .ok_or_else(|| CustomError::ValidationError("File has no extension".into()))?;

        if !self.allowed_extensions.contains(&extension.as_str()) {
            return Err(CustomError::ValidationError(format!(
                "Invalid file type '{}'. Allowed types: {}",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }

        let size = file.data.len();
        if size > self.max_file_size {
            return Err(CustomError::ValidationError(format!(
                "File too large. Maximum size: {} bytes, file size: {} bytes",
                self.max_file_size, size
            )));
        }
        if size < self.min_file_size {
            return Err(CustomError::ValidationError(format!(
                "File too small. Minimum size: {} bytes, file size: {} bytes",
                self.min_file_size, size
            )));
        }

        Ok(())
    }
}

/// Stores post images on Cloudinary
pub struct UploadService {
    config: Option<CloudinaryConfig>,
    client: reqwest::Client,
}

impl UploadService {
    pub fn new(config: Option<CloudinaryConfig>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Validate and upload, returning the image's public URL.
    pub async fn upload_image(&self, file: FileUpload, folder: &str) -> Result<String, CustomError> {
        FileValidator::images().validate(&file)?;

        let config = self.config.as_ref().ok_or_else(|| {
            CustomError::InternalServerError("Image uploads are not configured".into())
        })?;

        let timestamp = chrono::Utc::now().timestamp();
        let mut params = vec![
            ("folder", folder.to_string()),
            ("public_id", Uuid::new_v4().to_string()),
        ];
        if let Some(preset) = &config.upload_preset {
            params.push(("upload_preset", preset.clone()));
        }
        let signature = config.sign(&params, timestamp);

        let file_part = Part::bytes(file.data)
            .file_name(file.file_name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| CustomError::InternalServerError(format!("Failed to create file part: {}", e)))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Image upload request failed: {}", e);
                CustomError::InternalServerError("Failed to send upload request".into())
            })?;

        if response.status().is_success() {
            let uploaded = response
                .json::<CloudinaryUploadResponse>()
                .await
                .map_err(|e| CustomError::InternalServerError(format!("Failed to parse upload response: {}", e)))?;
            info!("Uploaded {} to {}", file.file_name, uploaded.secure_url);
            Ok(uploaded.secure_url)
        } else {
            let message = response
                .json::<CloudinaryErrorResponse>()
                .await
                .map(|r| r.error.message)
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(CustomError::BadRequestError(format!(
                "Image upload failed: {}",
                message
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("photo.JPG", 2048, true)]
    #[case("photo.png", 2048, true)]
    #[case("notes.pdf", 2048, false)]
    #[case("noextension", 2048, false)]
    #[case("tiny.png", 10, false)]
    #[case("huge.png", 11 * 1024 * 1024, false)]
    fn validates_images(#[case] name: &str, #[case] size: usize, #[case] ok: bool) {
        let file = FileUpload::new(name.to_string(), vec![0u8; size]);
        assert_eq!(FileValidator::images().validate(&file).is_ok(), ok);
    }

    #[test]
    fn signature_is_order_independent_sha1_hex() {
        let config = CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "shh".into(),
            upload_preset: None,
        };
        let a = config.sign(&[("folder", "posts".into()), ("upload_preset", "p".into())], 42);
        let b = config.sign(&[("upload_preset", "p".into()), ("folder", "posts".into())], 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert_ne!(a, config.sign(&[("folder", "posts".into())], 42));
    }

    #[actix_web::test]
    async fn refuses_upload_without_credentials() {
        let service = UploadService::new(None);
        let file = FileUpload::new("photo.png".into(), vec![0u8; 2048]);
        assert!(matches!(
            service.upload_image(file, "posts").await,
            Err(CustomError::InternalServerError(_))
        ));
    }
}
