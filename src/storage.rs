use std::path::PathBuf;

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;

/// Flat store for uploaded images: save, list and delete by name.
/// Names are single path segments; callers sanitize before handing them in.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, name: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<String>>;
    /// Deleting a missing file is not an error.
    async fn delete(&self, name: &str) -> anyhow::Result<()>;
}

/// Directory-backed store, the default backend.
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl FileStore for LocalFiles {
    async fn save(&self, name: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        let path = self.root.join(name);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .context("read upload dir")?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> anyhow::Result<()> {
        let path = self.root.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

/// MinIO/S3-backed store.
#[derive(Clone)]
pub struct S3Files {
    client: Client,
    bucket: String,
}

impl S3Files {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        // MinIO serves buckets by path, not by subdomain.
        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl FileStore for S3Files {
    async fn save(&self, name: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .context("s3 list_objects_v2")?;
            for object in resp.contents() {
                if let Some(key) = object.key() {
                    names.push(key.to_string());
                }
            }
            match resp.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_store_saves_lists_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFiles::new(dir.path()).await.unwrap();

        store
            .save("b.png", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .unwrap();
        store
            .save("a.jpg", Bytes::from_static(b"jpg-bytes"), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a.jpg", "b.png"]);

        store.delete("a.jpg").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["b.png"]);
    }

    #[tokio::test]
    async fn local_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFiles::new(dir.path()).await.unwrap();
        store.delete("never-existed.png").await.unwrap();
    }

    #[tokio::test]
    async fn new_creates_the_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("public").join("images");
        let store = LocalFiles::new(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(store.list().await.unwrap().is_empty());
    }
}
