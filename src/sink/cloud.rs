//! Cloud storage destinations (S3, R2, GCS, Azure, local)

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode};
use std::sync::Arc;

/// Object storage location parsed from a URL
#[derive(Debug, Clone)]
pub struct CloudDestination {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
}

impl CloudDestination {
    /// Parse a destination URL and create appropriate object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `memory://` - In-process store
    /// - `/local/path/` or `./path/` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else if url.starts_with("memory://") {
            Ok(Self::in_memory())
        } else {
            Self::parse_local(url)
        }
    }

    /// In-process object store, mostly useful in tests
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            prefix: String::new(),
            scheme: "memory".to_string(),
        }
    }

    /// Split `bucket/some/prefix` into bucket and prefix
    fn split_bucket(without_scheme: &str) -> (&str, String) {
        match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].trim_end_matches('/').to_string(),
            ),
            None => (without_scheme, String::new()),
        }
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let without_scheme = url
            .strip_prefix(&format!("{scheme}://"))
            .ok_or_else(|| Error::config(format!("Invalid {scheme} URL: {url}")))?;

        let (bucket, prefix) = Self::split_bucket(without_scheme);

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // AWS_ENDPOINT is read by from_env(); R2 may override it
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("gs://")
            .ok_or_else(|| Error::config(format!("Invalid GCS URL: {url}")))?;

        let (bucket, prefix) = Self::split_bucket(without_scheme);

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("az://")
            .ok_or_else(|| Error::config(format!("Invalid Azure URL: {url}")))?;

        let (container, prefix) = Self::split_bucket(without_scheme);

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
        })
    }

    /// Check if this is a cloud destination (not local)
    pub fn is_cloud(&self) -> bool {
        !matches!(self.scheme.as_str(), "file" | "memory")
    }

    /// Get the scheme (s3, r2, gs, az, memory, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn object_path(&self, relative: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(relative)
        } else {
            ObjectPath::from(format!("{}/{relative}", self.prefix))
        }
    }

    fn display_path(&self, path: &ObjectPath) -> String {
        format!("{}://{path}", self.scheme)
    }

    /// Write bytes, failing with [`Error::ObjectExists`] if the object is
    /// already there. Returns the full path for logging.
    pub async fn create(&self, relative: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(relative);

        self.store
            .put_opts(&path, data.into(), PutMode::Create.into())
            .await
            .map_err(|e| match e {
                object_store::Error::AlreadyExists { .. } => Error::ObjectExists {
                    path: path.to_string(),
                },
                other => Error::sink(format!("Failed to write {path}: {other}")),
            })?;

        Ok(self.display_path(&path))
    }

    /// Read an object, returning `None` if it does not exist
    pub async fn read(&self, relative: &str) -> Result<Option<Bytes>> {
        let path = self.object_path(relative);
        match self.store.get(&path).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List object paths (relative to this destination) under a directory
    pub async fn list(&self, relative_dir: &str) -> Result<Vec<String>> {
        let dir = self.object_path(relative_dir);
        let objects: Vec<_> = self.store.list(Some(&dir)).try_collect().await?;

        let strip = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };

        let mut paths: Vec<String> = objects
            .into_iter()
            .map(|meta| {
                let full = meta.location.to_string();
                full.strip_prefix(&strip).unwrap_or(&full).to_string()
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        let dest = CloudDestination::parse(path).unwrap();
        assert_eq!(dest.scheme(), "file");
        assert!(!dest.is_cloud());
    }

    #[test]
    fn test_parse_memory() {
        let dest = CloudDestination::parse("memory://").unwrap();
        assert_eq!(dest.scheme(), "memory");
        assert!(!dest.is_cloud());
    }

    #[test]
    fn test_split_bucket() {
        let (bucket, prefix) = CloudDestination::split_bucket("bucket/a/b/");
        assert_eq!(bucket, "bucket");
        assert_eq!(prefix, "a/b");

        let (bucket, prefix) = CloudDestination::split_bucket("bucket");
        assert_eq!(bucket, "bucket");
        assert_eq!(prefix, "");
    }

    #[tokio::test]
    async fn test_create_read_list() {
        let dest = CloudDestination::in_memory();
        dest.create("p/d/t/a.bin", Bytes::from_static(b"one"))
            .await
            .unwrap();
        dest.create("p/d/t/b.bin", Bytes::from_static(b"two"))
            .await
            .unwrap();

        assert_eq!(
            dest.read("p/d/t/a.bin").await.unwrap(),
            Some(Bytes::from_static(b"one"))
        );
        assert_eq!(dest.read("p/d/t/missing").await.unwrap(), None);
        assert_eq!(
            dest.list("p/d/t").await.unwrap(),
            vec!["p/d/t/a.bin".to_string(), "p/d/t/b.bin".to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_refuses_overwrite() {
        let dest = CloudDestination::in_memory();
        dest.create("x", Bytes::from_static(b"1")).await.unwrap();
        match dest.create("x", Bytes::from_static(b"2")).await {
            Err(Error::ObjectExists { path }) => assert_eq!(path, "x"),
            other => panic!("Expected ObjectExists, got {other:?}"),
        }
        assert_eq!(dest.read("x").await.unwrap(), Some(Bytes::from_static(b"1")));
    }
}
