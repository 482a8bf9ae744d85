use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::{fs, sync::Mutex};
use tracing::info;
use uuid::Uuid;

use super::{IdentityError, IdentityResult, IdentityStore, SignupOutcome, User};

/// Identity store persisted as a single JSON document on disk.
#[derive(Clone)]
pub struct FileIdentityStore {
    path: Arc<PathBuf>,
    gate: Arc<Mutex<()>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IdentityDocument {
    #[serde(default)]
    users: Vec<StoredUser>,
    #[serde(default)]
    session: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    identifier: String,
    display_name: String,
    salt: String,
    digest: String,
}

impl StoredUser {
    fn matches(&self, secret: &str) -> bool {
        digest(&self.salt, secret) == self.digest
    }

    fn user(&self) -> User {
        User {
            identifier: self.identifier.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

fn digest(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Display name used when a user registered without one.
fn default_display_name(identifier: &str) -> String {
    identifier
        .split('@')
        .next()
        .unwrap_or(identifier)
        .to_owned()
}

impl FileIdentityStore {
    /// Store backed by `path`; the file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            gate: Arc::new(Mutex::new(())),
        }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> IdentityResult<IdentityDocument> {
        match fs::read_to_string(self.path.as_ref()).await {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| IdentityError::Corrupt {
                    path: self.display_path(),
                    source,
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(IdentityDocument::default()),
            Err(source) => Err(IdentityError::Read {
                path: self.display_path(),
                source,
            }),
        }
    }

    async fn write(&self, document: &IdentityDocument) -> IdentityResult<()> {
        let write_err = |source| IdentityError::Write {
            path: self.display_path(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let contents = serde_json::to_vec_pretty(document).map_err(|source| {
            IdentityError::Corrupt {
                path: self.display_path(),
                source,
            }
        })?;
        fs::write(self.path.as_ref(), contents)
            .await
            .map_err(write_err)
    }

    async fn login_inner(
        &self,
        identifier: String,
        secret: String,
    ) -> IdentityResult<Option<User>> {
        let _guard = self.gate.lock().await;
        let mut document = self.read().await?;
        let Some(user) = document
            .users
            .iter()
            .find(|user| user.identifier == identifier && user.matches(&secret))
            .map(StoredUser::user)
        else {
            return Ok(None);
        };
        document.session = Some(user.clone());
        self.write(&document).await?;
        info!(identifier = %user.identifier, "user signed in");
        Ok(Some(user))
    }

    async fn signup_inner(
        &self,
        identifier: String,
        secret: String,
        display_name: String,
    ) -> IdentityResult<SignupOutcome> {
        let _guard = self.gate.lock().await;
        let mut document = self.read().await?;
        let display_name = match display_name.trim() {
            "" => default_display_name(&identifier),
            name => name.to_owned(),
        };

        if document.users.iter().any(|u| u.identifier == identifier) {
            return Ok(SignupOutcome::IdentifierTaken);
        }
        if document.users.iter().any(|u| u.display_name == display_name) {
            return Ok(SignupOutcome::DisplayNameTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        document.users.push(StoredUser {
            digest: digest(&salt, &secret),
            identifier,
            display_name,
            salt,
        });
        self.write(&document).await?;
        Ok(SignupOutcome::Success)
    }

    async fn logout_inner(&self) -> IdentityResult<()> {
        let _guard = self.gate.lock().await;
        let mut document = self.read().await?;
        if document.session.take().is_some() {
            self.write(&document).await?;
        }
        Ok(())
    }
}

impl IdentityStore for FileIdentityStore {
    fn login(
        &self,
        identifier: String,
        secret: String,
    ) -> BoxFuture<'static, IdentityResult<Option<User>>> {
        let store = self.clone();
        Box::pin(async move { store.login_inner(identifier, secret).await })
    }

    fn signup(
        &self,
        identifier: String,
        secret: String,
        display_name: String,
    ) -> BoxFuture<'static, IdentityResult<SignupOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.signup_inner(identifier, secret, display_name).await })
    }

    fn current_user(&self) -> BoxFuture<'static, IdentityResult<Option<User>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.read().await?.session) })
    }

    fn logout(&self) -> BoxFuture<'static, IdentityResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.logout_inner().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileIdentityStore {
        let path = std::env::temp_dir()
            .join(format!("sharq-gharb-identity-{}", Uuid::new_v4()))
            .join("identity.json");
        FileIdentityStore::new(path)
    }

    #[tokio::test]
    async fn signup_then_login_persists_the_session() {
        let store = temp_store();
        assert_eq!(store.current_user().await.unwrap(), None);

        let outcome = store
            .signup("sami@example.com".into(), "hunter2".into(), "Sami".into())
            .await
            .unwrap();
        assert_eq!(outcome, SignupOutcome::Success);
        assert_eq!(store.current_user().await.unwrap(), None);

        let user = store
            .login("sami@example.com".into(), "hunter2".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.display_name, "Sami");
        assert_eq!(store.current_user().await.unwrap(), Some(user));

        store.logout().await.unwrap();
        assert_eq!(store.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn wrong_secret_is_refused() {
        let store = temp_store();
        store
            .signup("noor@example.com".into(), "right".into(), "Noor".into())
            .await
            .unwrap();
        let user = store
            .login("noor@example.com".into(), "wrong".into())
            .await
            .unwrap();
        assert_eq!(user, None);
    }

    #[tokio::test]
    async fn duplicate_identifier_and_display_name_are_reported() {
        let store = temp_store();
        store
            .signup("a@example.com".into(), "x".into(), "Layla".into())
            .await
            .unwrap();
        assert_eq!(
            store
                .signup("a@example.com".into(), "y".into(), "Other".into())
                .await
                .unwrap(),
            SignupOutcome::IdentifierTaken
        );
        assert_eq!(
            store
                .signup("b@example.com".into(), "y".into(), "Layla".into())
                .await
                .unwrap(),
            SignupOutcome::DisplayNameTaken
        );
    }

    #[test]
    fn display_name_defaults_to_identifier_local_part() {
        assert_eq!(default_display_name("omar@example.com"), "omar");
        assert_eq!(default_display_name("omar"), "omar");
    }

    #[test]
    fn secrets_are_salted() {
        assert_ne!(digest("salt-a", "secret"), digest("salt-b", "secret"));
        assert_eq!(digest("salt-a", "secret").len(), 64);
    }
}
