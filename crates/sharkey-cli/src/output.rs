//! Recovered keypair artifact: an age identity file
//!
//! ```text
//! # created: 2023-11-14T22:13:20.000Z
//! # public key: age1…
//! AGE-SECRET-KEY-1…
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

use sharkey_crypto::AgeIdentity;

/// ISO-8601, UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(at: SystemTime) -> String {
    DateTime::<Utc>::from(at).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render the identity file contents, trailing newline included.
pub fn render_key_file(created_at: SystemTime, identity: &AgeIdentity) -> SecretString {
    SecretString::from(format!(
        "# created: {}\n# public key: {}\n{}\n",
        format_timestamp(created_at),
        identity.public_key(),
        identity.secret_key().expose_secret(),
    ))
}

/// Write the identity file. Fails if `path` exists unless `force`, in which
/// case the file is truncated. New files are mode 0600 on unix.
pub async fn write_key_file(path: &Path, contents: &SecretString, force: bool) -> Result<()> {
    let mut opts = tokio::fs::OpenOptions::new();
    opts.write(true);
    if force {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }
    #[cfg(unix)]
    opts.mode(0o600);

    let mut file = opts.open(path).await.with_context(|| {
        if !force && path.exists() {
            format!("{} already exists (use --force to overwrite)", path.display())
        } else {
            format!("opening {}", path.display())
        }
    })?;
    file.write_all(contents.expose_secret().as_bytes())
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    file.flush().await?;

    tracing::info!(path = %path.display(), "identity written");
    Ok(())
}
