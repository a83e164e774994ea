use crate::utils::error::{ProjectError, Result};
use crate::utils::validation::validate_url;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of `kaggle.json`.
#[derive(Clone, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

impl std::fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"***")
            .finish()
    }
}

impl KaggleCredentials {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| ProjectError::CredentialsError {
            path: path.display().to_string(),
            message: "Kaggle API token not found".to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ProjectError::CredentialsError {
            path: path.display().to_string(),
            message: format!("malformed kaggle.json: {}", e),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSlug {
    pub owner: String,
    pub name: String,
}

impl std::str::FromStr for DatasetSlug {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProjectError::InvalidConfigValueError {
            field: "dataset".to_string(),
            value: s.to_string(),
            reason: "expected <owner>/<dataset>".to_string(),
        };

        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

pub struct KaggleClient {
    client: Client,
    base_url: String,
    credentials: KaggleCredentials,
}

impl KaggleClient {
    pub fn new(base_url: &str, credentials: KaggleCredentials) -> Result<Self> {
        validate_url("kaggle.base_url", base_url)?;
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn download_url(&self, slug: &DatasetSlug) -> String {
        format!(
            "{}/datasets/download/{}/{}",
            self.base_url, slug.owner, slug.name
        )
    }

    /// Fetches the dataset archive into `dest`. With `unzip` the archive is
    /// extracted and the extracted paths are returned; otherwise the archive
    /// itself is saved as `<dataset>.zip`.
    pub async fn download_dataset(&self, dataset: &str, dest: &Path, unzip: bool) -> Result<Vec<PathBuf>> {
        let slug: DatasetSlug = dataset.parse()?;
        let url = self.download_url(&slug);

        tokio::fs::create_dir_all(dest).await?;
        tracing::info!(
            "Downloading {} to {} (unzip={})...",
            dataset,
            dest.display(),
            unzip
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.key))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Download response status: {}", status);
        if !status.is_success() {
            return Err(ProjectError::DownloadError {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!("Received {} bytes", bytes.len());

        if !unzip {
            let path = dest.join(format!("{}.zip", slug.name));
            tokio::fs::write(&path, &bytes).await?;
            return Ok(vec![path]);
        }

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec()))?;
        let extracted: Vec<PathBuf> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(|name| dest.join(name))
            .collect();
        archive.extract(dest)?;

        tracing::info!("Extracted {} files", extracted.len());
        Ok(extracted)
    }
}
