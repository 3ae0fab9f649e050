use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// SMTP settings; absent when SMTP_HOST is not set, in which case outgoing
/// mail is logged instead of sent.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Backend for uploaded avatars. Local disk is the default; MinIO/S3 is
/// selected by setting MINIO_ENDPOINT.
#[derive(Debug, Clone, Deserialize)]
pub enum UploadsConfig {
    Local {
        dir: PathBuf,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// External origin used when building links placed in emails.
    pub public_base_url: String,
    pub jwt: JwtConfig,
    pub smtp: Option<SmtpConfig>,
    pub uploads: UploadsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
        };

        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => {
                let username =
                    std::env::var("SMTP_USERNAME").context("SMTP_USERNAME is not set")?;
                Some(SmtpConfig {
                    port: std::env::var("SMTP_PORT")
                        .ok()
                        .and_then(|v| v.parse::<u16>().ok())
                        .unwrap_or(587),
                    password: std::env::var("SMTP_PASSWORD")
                        .context("SMTP_PASSWORD is not set")?,
                    from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| username.clone()),
                    host,
                    username,
                })
            }
            Err(_) => None,
        };

        let uploads = match std::env::var("MINIO_ENDPOINT") {
            Ok(endpoint) => UploadsConfig::S3 {
                endpoint,
                bucket: std::env::var("MINIO_BUCKET").context("MINIO_BUCKET is not set")?,
                access_key: std::env::var("MINIO_ACCESS_KEY")
                    .context("MINIO_ACCESS_KEY is not set")?,
                secret_key: std::env::var("MINIO_SECRET_KEY")
                    .context("MINIO_SECRET_KEY is not set")?,
            },
            Err(_) => UploadsConfig::Local {
                dir: std::env::var("UPLOAD_DIR")
                    .unwrap_or_else(|_| "public/images".into())
                    .into(),
            },
        };

        Ok(Self {
            database_url,
            public_base_url,
            jwt,
            smtp,
            uploads,
        })
    }
}
