use crate::domain::ports::{ConfigProvider, ObjectStore};
use crate::utils::error::{MarketError, Result};
use std::path::Path;
use uuid::Uuid;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
/// 簽名網址有效期：一年
pub const DEFAULT_SIGNED_URL_TTL_SECONDS: u64 = 60 * 60 * 24 * 365;
pub const DEFAULT_MAX_IMAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Reads a local file, guessing its MIME type from the extension.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        Ok(Self::new(name, content_type, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_size_bytes: u64,
    pub signed_url_ttl_seconds: u64,
    pub max_images: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            signed_url_ttl_seconds: DEFAULT_SIGNED_URL_TTL_SECONDS,
            max_images: DEFAULT_MAX_IMAGES,
        }
    }
}

impl UploadPolicy {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes(),
            signed_url_ttl_seconds: config.signed_url_ttl_seconds(),
            max_images: config.max_images(),
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadBatch {
    /// Existing image URLs followed by the newly uploaded ones.
    pub images: Vec<String>,
    pub uploaded: Vec<UploadedMedia>,
    pub rejected: Vec<(String, MarketError)>,
}

pub struct MediaUploader<O: ObjectStore> {
    store: O,
    policy: UploadPolicy,
}

impl<O: ObjectStore> MediaUploader<O> {
    pub fn new(store: O, policy: UploadPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Client-side checks; never touches the network.
    pub fn validate(&self, file: &MediaFile) -> Result<()> {
        if file.data.is_empty() {
            return Err(MarketError::EmptyFile {
                file_name: file.name.clone(),
            });
        }

        if !file.content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(MarketError::UnsupportedMediaType {
                file_name: file.name.clone(),
                content_type: file.content_type.clone(),
            });
        }

        if file.size() > self.policy.max_file_size_bytes {
            return Err(MarketError::FileTooLarge {
                file_name: file.name.clone(),
                size: file.size(),
                max: self.policy.max_file_size_bytes,
            });
        }

        Ok(())
    }

    pub async fn upload(&self, file: MediaFile) -> Result<UploadedMedia> {
        self.validate(&file)?;

        let path = object_name(&file);
        tracing::debug!(file = %file.name, path = %path, size = file.size(), "uploading media");

        self.store
            .put_object(&path, &file.content_type, file.data)
            .await?;
        let url = self
            .store
            .create_signed_url(&path, self.policy.signed_url_ttl_seconds)
            .await?;

        tracing::info!("📤 Uploaded {} as {}", file.name, path);
        Ok(UploadedMedia { path, url })
    }

    /// 整批超過張數上限時直接拒絕；個別檔案失敗不影響其他檔案
    pub async fn upload_batch(&self, existing: &[String], files: Vec<MediaFile>) -> Result<UploadBatch> {
        let requested = existing.len() + files.len();
        if requested > self.policy.max_images {
            return Err(MarketError::TooManyImages {
                max: self.policy.max_images,
                requested,
            });
        }

        let mut batch = UploadBatch {
            images: existing.to_vec(),
            ..UploadBatch::default()
        };

        for file in files {
            let name = file.name.clone();
            match self.upload(file).await {
                Ok(uploaded) => {
                    batch.images.push(uploaded.url.clone());
                    batch.uploaded.push(uploaded);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Skipping {}: {}", name, e);
                    batch.rejected.push((name, e));
                }
            }
        }

        Ok(batch)
    }
}

fn object_name(file: &MediaFile) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match file.extension() {
        Some(ext) => format!("{}.{}", id, ext),
        None => id,
    }
}
