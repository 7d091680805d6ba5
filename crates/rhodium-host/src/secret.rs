//! The installation's session secret, kept in a single owner-only file.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

const SECRET_BYTES: usize = 32;
pub const SECRET_HEX_LEN: usize = SECRET_BYTES * 2;

pub type SecretResult<T> = Result<T, SecretError>;

/// All variants are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("failed to write secret file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read secret file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "secret file {path:?} is corrupt: expected {SECRET_HEX_LEN} lowercase hex characters, \
         found {len} characters; delete the file and restart to generate a new secret"
    )]
    Corrupt { path: PathBuf, len: usize },
    #[error("failed to gather entropy: {0}")]
    Entropy(getrandom::Error),
}

/// 64 lowercase hex characters. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct SecretManager {
    path: PathBuf,
}

impl SecretManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the secret, creating it when the file does not exist yet.
    ///
    /// An existing file is validated and never replaced unless `force_regenerate` is set.
    pub fn get_secret(&self, force_regenerate: bool) -> SecretResult<Secret> {
        if force_regenerate {
            warn!(path = %self.path.display(), "regenerating secret");
            return self.generate();
        }
        match fs::read_to_string(&self.path) {
            Ok(raw) => self.validate(&raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => self.generate(),
            Err(source) => Err(SecretError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn validate(&self, raw: &str) -> SecretResult<Secret> {
        let trimmed = raw.trim();
        if is_secret_hex(trimmed) {
            Ok(Secret(trimmed.to_string()))
        } else {
            Err(SecretError::Corrupt {
                path: self.path.clone(),
                len: trimmed.chars().count(),
            })
        }
    }

    fn generate(&self) -> SecretResult<Secret> {
        let mut bytes = [0u8; SECRET_BYTES];
        getrandom::getrandom(&mut bytes).map_err(SecretError::Entropy)?;
        let secret = Secret(hex::encode(bytes));
        write_owner_only(&self.path, secret.as_str()).map_err(|source| SecretError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "secret provisioned");
        Ok(secret)
    }
}

fn is_secret_hex(s: &str) -> bool {
    s.len() == SECRET_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Write through a sibling temp file so the target is either the old secret or the new one.
fn write_owner_only(path: &Path, contents: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut file = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
