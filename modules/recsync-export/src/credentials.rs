//! Download protection for an export directory.
//!
//! Protected exports get a `.htpasswd`-style file next to their chunks with a
//! single `login:$sha256$<salt>$<digest>` line. The same login and password
//! travel to the recommendation service inside the FULL events.

use std::path::{Path, PathBuf};

use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::info;

use recommendation_client::DownloadCredentials;
use recsync_common::ExportAuthMethod;

use crate::error::ExportError;

pub const CREDENTIALS_FILE: &str = ".htpasswd";
const SCHEME: &str = "sha256";
const PASSWORD_LEN: usize = 10;

/// Credentials for this run, or `None` when downloads are public.
pub fn resolve_credentials(
    auth: &ExportAuthMethod,
    customer_id: &str,
) -> Option<DownloadCredentials> {
    match auth {
        ExportAuthMethod::None => None,
        ExportAuthMethod::Basic => Some(DownloadCredentials {
            login: customer_id.to_string(),
            password: generate_password(),
        }),
        ExportAuthMethod::User { login, password } => Some(DownloadCredentials {
            login: login.clone(),
            password: password.clone(),
        }),
    }
}

pub fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_password(password: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!(
        "${SCHEME}${}${}",
        hex::encode(salt),
        hex::encode(hasher.finalize())
    )
}

fn matches_hash(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(""), Some(SCHEME), Some(salt), Some(_), None) => match hex::decode(salt) {
            Ok(salt) => hash_password(password, &salt) == stored,
            Err(_) => false,
        },
        _ => false,
    }
}

/// Write the credentials file into `dir`, replacing any previous one.
pub async fn write_credentials_file(
    dir: &Path,
    credentials: &DownloadCredentials,
) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ExportError::io(dir, e))?;

    let salt: [u8; 16] = rand::rng().random();
    let line = format!(
        "{}:{}\n",
        credentials.login,
        hash_password(&credentials.password, &salt)
    );
    let path = dir.join(CREDENTIALS_FILE);
    fs::write(&path, line)
        .await
        .map_err(|e| ExportError::io(&path, e))?;

    info!(path = %path.display(), login = %credentials.login, "Export directory secured");
    Ok(path)
}

/// Check a login/password pair against the credentials file in `dir`.
/// A directory without the file is unprotected and accepts anyone.
pub async fn verify_credentials(
    dir: &Path,
    login: &str,
    password: &str,
) -> Result<bool, ExportError> {
    let path = dir.join(CREDENTIALS_FILE);
    let contents = match fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(ExportError::io(path, e)),
    };

    Ok(contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .any(|(user, stored)| user == login && matches_hash(password, stored)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_passwords_are_alphanumeric_and_distinct() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), PASSWORD_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn basic_auth_uses_customer_id_as_login() {
        let creds = resolve_credentials(&ExportAuthMethod::Basic, "12345").unwrap();
        assert_eq!(creds.login, "12345");
        assert!(resolve_credentials(&ExportAuthMethod::None, "12345").is_none());
    }

    #[test]
    fn hash_is_salted() {
        assert_ne!(hash_password("pw", b"aa"), hash_password("pw", b"bb"));
        assert!(matches_hash("pw", &hash_password("pw", b"aa")));
        assert!(!matches_hash("other", &hash_password("pw", b"aa")));
        assert!(!matches_hash("pw", "$md5$00$00"));
    }

    #[tokio::test]
    async fn written_file_verifies_only_the_right_pair() {
        let dir = tempfile::tempdir().unwrap();
        let creds = DownloadCredentials {
            login: "reco".into(),
            password: "s3cret".into(),
        };
        write_credentials_file(dir.path(), &creds).await.unwrap();

        let stored = std::fs::read_to_string(dir.path().join(CREDENTIALS_FILE)).unwrap();
        assert!(stored.starts_with("reco:$sha256$"));
        assert!(!stored.contains("s3cret"));

        assert!(verify_credentials(dir.path(), "reco", "s3cret").await.unwrap());
        assert!(!verify_credentials(dir.path(), "reco", "wrong").await.unwrap());
        assert!(!verify_credentials(dir.path(), "other", "s3cret").await.unwrap());
    }

    #[tokio::test]
    async fn directory_without_file_is_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(verify_credentials(dir.path(), "x", "y").await.unwrap());
    }
}
