//! File-backed credential store.
//!
//! Layout under the wallet directory:
//!
//!   <user>          JSON user context: name, MSP id, enrollment flag, public key
//!   <public>-priv   hex private key, mode 0600
//!
//! A user is usable only once enrolled and only if the stored private key
//! derives the recorded public key.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use boxoffice_core::crypto::Keypair;

use crate::error::GatewayError;
use crate::platform::Creator;

/// Persisted user context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub name: String,
    #[serde(rename = "mspid")]
    pub msp_id: String,
    pub enrolled: bool,
    /// Hex-encoded public key.
    pub public_key: String,
}

/// A resolved, enrolled identity able to create proposals.
#[derive(Clone)]
pub struct Identity {
    name: String,
    msp_id: String,
    keypair: Arc<Keypair>,
}

impl Identity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.keypair.public
    }

    pub fn creator(&self) -> Creator {
        Creator {
            name: self.name.clone(),
            msp_id: self.msp_id.clone(),
            public_key: self.keypair.public,
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.name)
            .field("msp_id", &self.msp_id)
            .field("public_key", &self.keypair.public_hex())
            .finish()
    }
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Open (creating if needed) the wallet directory at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GatewayError> {
        let path = path.into();
        std::fs::create_dir_all(&path).map_err(|e| GatewayError::store(&path, e))?;
        std::fs::read_dir(&path).map_err(|e| GatewayError::store(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored context for `user`, if any.
    pub fn user_context(&self, user: &str) -> Result<Option<UserContext>, GatewayError> {
        let file = self.user_file(user)?;
        let text = match std::fs::read_to_string(&file) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(GatewayError::store(file, e)),
        };
        let context = serde_json::from_str(&text)
            .map_err(|e| GatewayError::identity(user, format!("corrupt user context: {e}")))?;
        Ok(Some(context))
    }

    /// Resolve `user` into a signing identity.
    pub fn resolve_identity(&self, user: &str) -> Result<Identity, GatewayError> {
        let context = self
            .user_context(user)?
            .ok_or_else(|| GatewayError::identity(user, "not found in credential store"))?;
        if !context.enrolled {
            return Err(GatewayError::identity(user, "not enrolled"));
        }

        let key_file = self.key_file(&context.public_key)?;
        let key_hex = match std::fs::read_to_string(&key_file) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatewayError::identity(user, "private key missing"));
            }
            Err(e) => return Err(GatewayError::store(key_file, e)),
        };
        let keypair = Keypair::from_private_hex(&key_hex)
            .map_err(|e| GatewayError::identity(user, format!("unreadable private key: {e}")))?;
        if keypair.public_hex() != context.public_key {
            return Err(GatewayError::identity(
                user,
                "private key does not match enrolled public key",
            ));
        }

        Ok(Identity {
            name: context.name,
            msp_id: context.msp_id,
            keypair: Arc::new(keypair),
        })
    }

    /// Enroll `user` under `msp_id` with a fresh keypair, replacing any
    /// earlier enrollment.
    pub fn enroll(&self, user: &str, msp_id: &str) -> Result<Identity, GatewayError> {
        let keypair = Keypair::generate();
        let context = UserContext {
            name: user.to_string(),
            msp_id: msp_id.to_string(),
            enrolled: true,
            public_key: keypair.public_hex(),
        };

        let key_file = self.key_file(&context.public_key)?;
        let key_hex = hex::encode(*keypair.private_bytes());
        write_private(&key_file, &key_hex).map_err(|e| GatewayError::store(&key_file, e))?;

        let user_file = self.user_file(user)?;
        let json = serde_json::to_string_pretty(&context)
            .map_err(|e| GatewayError::identity(user, format!("cannot encode user context: {e}")))?;
        std::fs::write(&user_file, json).map_err(|e| GatewayError::store(&user_file, e))?;

        tracing::info!(
            user,
            msp_id,
            public_key = %context.public_key,
            wallet = %self.path.display(),
            "enrolled identity"
        );

        Ok(Identity {
            name: context.name,
            msp_id: context.msp_id,
            keypair: Arc::new(keypair),
        })
    }

    fn user_file(&self, user: &str) -> Result<PathBuf, GatewayError> {
        if user.is_empty()
            || user.starts_with('.')
            || user.ends_with("-priv")
            || user.contains(['/', '\\'])
        {
            return Err(GatewayError::identity(user, "invalid user name"));
        }
        Ok(self.path.join(user))
    }

    fn key_file(&self, public_hex: &str) -> Result<PathBuf, GatewayError> {
        if public_hex.len() != 64 || !public_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GatewayError::Identity {
                user: String::new(),
                reason: format!("malformed public key {public_hex:?}"),
            });
        }
        Ok(self.path.join(format!("{public_hex}-priv")))
    }
}

fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
