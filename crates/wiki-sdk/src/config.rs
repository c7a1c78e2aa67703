use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wiki_tags::TagIndexOptions;
use wiki_types::BlobKey;

use crate::error::{SdkError, SdkResult};
use crate::search::SearchOptions;

/// Everything needed to open a [`Wiki`](crate::Wiki). Every field has a
/// default, so an empty TOML file is a valid configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    pub storage: StorageConfig,
    pub containers: ContainerConfig,
    pub tags: TagConfig,
    pub search: SearchOptions,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One directory per container under [`StorageConfig::root`].
    #[default]
    Filesystem,
    /// Process-local; contents vanish on exit.
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: PathBuf::from("wiki-data"),
        }
    }
}

/// Container (bucket) names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub pages: String,
    pub images: String,
    pub accounts: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            pages: "wiki_content_p1".into(),
            images: "developer_images".into(),
            accounts: "users_passwords_p1".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Key of the tag document inside the page container.
    pub document: String,
    #[serde(flatten)]
    pub index: TagIndexOptions,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            document: "tags.csv".into(),
            index: TagIndexOptions::default(),
        }
    }
}

impl WikiConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SdkError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// A configuration backed by in-memory containers.
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    /// The tag document key.
    pub fn tag_document(&self) -> SdkResult<BlobKey> {
        BlobKey::new(self.tags.document.as_str())
            .map_err(|e| SdkError::Config(format!("tags.document: {e}")))
    }

    pub fn validate(&self) -> SdkResult<()> {
        let containers = [
            ("containers.pages", &self.containers.pages),
            ("containers.images", &self.containers.images),
            ("containers.accounts", &self.containers.accounts),
        ];
        for (field, name) in containers {
            if name.contains('/') {
                return Err(SdkError::Config(format!("{field}: {name:?} must be a single name")));
            }
            BlobKey::new(name.as_str()).map_err(|e| SdkError::Config(format!("{field}: {e}")))?;
        }
        for (i, (field, name)) in containers.iter().enumerate() {
            if let Some((other, _)) = containers[..i].iter().find(|(_, n)| n == name) {
                return Err(SdkError::Config(format!(
                    "{field}: {name:?} is already used by {other}"
                )));
            }
        }
        self.tag_document()?;
        if self.tags.index.max_attempts == 0 {
            return Err(SdkError::Config("tags.max_attempts must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.search.cutoff) {
            return Err(SdkError::Config(format!(
                "search.cutoff must be within [0, 1], got {}",
                self.search.cutoff
            )));
        }
        Ok(())
    }
}
