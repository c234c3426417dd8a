//! User Store - File-backed authentication for the deployment pilot
//!
//! JSON file, SHA-256 password hashes, explicit read/write — deliberately not
//! hardened (the pilot runs inside the alcaldía network; real credential
//! handling is out of scope). What matters is the explicit store interface:
//! no ambient globals, fully testable against a temp directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub password_hash: String,
    pub nombre: String,
    pub rol: String,
    pub activo: bool,
    pub fecha_creacion: String,
}

/// Outcome of a credential check. Rejections carry a human-readable reason
/// so the UI can surface it directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LoginOutcome {
    Aceptado { nombre: String, rol: String },
    Rechazado { motivo: String },
}

pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the backing file with the two pilot accounts if it does not
    /// exist yet.
    pub fn ensure_defaults(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let now = Local::now().to_rfc3339();
        let mut usuarios = HashMap::new();
        usuarios.insert(
            "admin@alcaldia.mx".to_string(),
            UserEntry {
                password_hash: hash_password("admin123"),
                nombre: "Admin PAPE".to_string(),
                rol: "administrador".to_string(),
                activo: true,
                fecha_creacion: now.clone(),
            },
        );
        usuarios.insert(
            "funcionario@alcaldia.mx".to_string(),
            UserEntry {
                password_hash: hash_password("func123"),
                nombre: "Funcionario Test".to_string(),
                rol: "analista".to_string(),
                activo: true,
                fecha_creacion: now,
            },
        );
        self.write(&usuarios)?;
        info!(path = %self.path.display(), "user store initialized with default accounts");
        Ok(())
    }

    pub fn validar_credenciales(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let usuarios = self.read()?;
        let usuario = match usuarios.get(email) {
            Some(u) => u,
            None => {
                return Ok(LoginOutcome::Rechazado {
                    motivo: "Credenciales inválidas".to_string(),
                })
            }
        };
        if !usuario.activo {
            return Ok(LoginOutcome::Rechazado {
                motivo: "Usuario desactivado".to_string(),
            });
        }
        if usuario.password_hash != hash_password(password) {
            return Ok(LoginOutcome::Rechazado {
                motivo: "Contraseña incorrecta".to_string(),
            });
        }
        Ok(LoginOutcome::Aceptado {
            nombre: usuario.nombre.clone(),
            rol: usuario.rol.clone(),
        })
    }

    /// Register a new account. Fails on a duplicate email.
    pub fn registrar_usuario(
        &self,
        email: &str,
        password: &str,
        nombre: &str,
        rol: &str,
    ) -> Result<()> {
        let mut usuarios = self.read()?;
        if usuarios.contains_key(email) {
            return Err(EngineError::store(
                format!("Email ya registrado: {}", email),
                Some(&self.path),
            ));
        }
        usuarios.insert(
            email.to_string(),
            UserEntry {
                password_hash: hash_password(password),
                nombre: nombre.to_string(),
                rol: rol.to_string(),
                activo: true,
                fecha_creacion: Local::now().to_rfc3339(),
            },
        );
        self.write(&usuarios)
    }

    /// Whether an account exists and is active.
    pub fn es_activo(&self, email: &str) -> Result<bool> {
        let usuarios = self.read()?;
        Ok(usuarios.get(email).map(|u| u.activo).unwrap_or(false))
    }

    fn read(&self) -> Result<HashMap<String, UserEntry>> {
        let contenido = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contenido)?)
    }

    fn write(&self, usuarios: &HashMap<String, UserEntry>) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(usuarios)?)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, UserStore) {
        let dir = tempdir().unwrap();
        let store = UserStore::new(dir.path().join("usuarios.json"));
        store.ensure_defaults().unwrap();
        (dir, store)
    }

    #[test]
    fn default_accounts_can_log_in() {
        let (_dir, store) = store();
        match store.validar_credenciales("admin@alcaldia.mx", "admin123").unwrap() {
            LoginOutcome::Aceptado { rol, .. } => assert_eq!(rol, "administrador"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn wrong_password_and_unknown_user_are_rejected() {
        let (_dir, store) = store();
        assert_eq!(
            store.validar_credenciales("admin@alcaldia.mx", "nope").unwrap(),
            LoginOutcome::Rechazado {
                motivo: "Contraseña incorrecta".to_string()
            }
        );
        assert_eq!(
            store.validar_credenciales("nadie@alcaldia.mx", "x").unwrap(),
            LoginOutcome::Rechazado {
                motivo: "Credenciales inválidas".to_string()
            }
        );
    }

    #[test]
    fn registration_rejects_duplicates() {
        let (_dir, store) = store();
        store
            .registrar_usuario("nueva@alcaldia.mx", "clave", "Nueva", "analista")
            .unwrap();
        assert!(store.es_activo("nueva@alcaldia.mx").unwrap());
        assert!(store
            .registrar_usuario("nueva@alcaldia.mx", "otra", "Nueva", "analista")
            .is_err());
    }

    #[test]
    fn hashes_are_stable_sha256_hex() {
        assert_eq!(
            hash_password("admin123"),
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
    }
}
