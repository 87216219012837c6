//! Domain operations over user accounts.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;

use crate::auth::{password, Authenticator};
use crate::error::{Error, Result};
use crate::repository::UserRepository;
use crate::user::User;

/// User-management operations, shared by the RPC service handlers.
pub struct UserUsecase {
    repo: Arc<dyn UserRepository>,
    authenticator: Authenticator,
}

impl UserUsecase {
    /// Creates the usecase over a repository and an authenticator.
    pub fn new(repo: Arc<dyn UserRepository>, authenticator: Authenticator) -> Self {
        Self {
            repo,
            authenticator,
        }
    }

    /// Registers a new user: validates the payload, replaces the raw
    /// password with its hash, and persists the record.
    pub async fn register(&self, mut user: User) -> Result<User> {
        let started = Instant::now();

        user.validate()?;
        user.password = password::hash(&user.password)?;

        let inserted = self.repo.insert(user).await?;

        histogram!("usergate.register.duration_ms")
            .record(started.elapsed().as_secs_f64() * 1000.0);

        Ok(inserted)
    }

    /// Authenticates by name or email plus password and issues an
    /// access/refresh token pair.
    ///
    /// An unknown account is reported as [`Error::CredentialMismatch`], the
    /// same as a wrong password, so login responses do not reveal whether an
    /// account exists.
    pub async fn authenticate(&self, credentials: User) -> Result<(String, String)> {
        let lookup = if !credentials.name.is_empty() {
            self.repo.get_by_name(&credentials.name).await
        } else if !credentials.email.is_empty() {
            self.repo.get_by_email(&credentials.email).await
        } else {
            return Err(Error::Validation("name or email required".to_string()));
        };

        let stored = match lookup {
            Err(Error::NotFound) => return Err(Error::CredentialMismatch),
            other => other?,
        };

        password::verify(&stored.password, &credentials.password)?;

        let access = self.authenticator.issue_access(stored.id)?;
        let refresh = self.authenticator.issue_refresh(stored.id)?;
        Ok((access, refresh))
    }

    /// Mints a new access token from a valid refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<String> {
        let subject = self.authenticator.verify_refresh(refresh_token)?;
        self.authenticator.issue_access(subject)
    }

    /// Verifies an access token and returns the subject it was issued to.
    pub async fn validate_token(&self, token: &str) -> Result<i64> {
        self.authenticator.verify_access(token)
    }

    /// Updates the non-empty fields of a user record. A new password is
    /// hashed before it reaches the repository.
    pub async fn update(&self, mut user: User) -> Result<i64> {
        if user.id == 0 {
            return Err(Error::Validation("missing user id".to_string()));
        }

        if !user.password.is_empty() {
            user.password = password::hash(&user.password)?;
        }

        self.repo.update(user).await
    }

    /// Deletes a user by id.
    pub async fn remove(&self, id: i64) -> Result<i64> {
        self.repo.remove(id).await
    }

    /// Fetches a user by id, name, or email, whichever is present.
    pub async fn get(&self, user: User) -> Result<User> {
        if user.id != 0 {
            return self.repo.get_by_id(user.id).await;
        }

        if !user.name.is_empty() {
            return self.repo.get_by_name(&user.name).await;
        }

        if !user.email.is_empty() {
            return self.repo.get_by_email(&user.email).await;
        }

        Err(Error::Validation("id, name, or email required".to_string()))
    }

    /// Lists all users.
    pub async fn list(&self) -> Result<Vec<User>> {
        self.repo.list().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::TokenConfig;
    use crate::repository::MemoryUserRepository;

    fn usecase() -> UserUsecase {
        let authenticator = Authenticator::new(TokenConfig {
            access_secret: b"usecase-access-secret".to_vec(),
            refresh_secret: b"usecase-refresh-secret".to_vec(),
            access_ttl: Duration::from_secs(60),
            refresh_ttl: Duration::from_secs(3600),
        });
        UserUsecase::new(Arc::new(MemoryUserRepository::new()), authenticator)
    }

    fn registration(name: &str) -> User {
        User {
            id: 0,
            name: name.to_string(),
            email: format!("{name}@example.com"),
            password: "swordfish".to_string(),
        }
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let uc = usecase();

        let registered = uc.register(registration("alice")).await.unwrap();

        assert_ne!(registered.password, "swordfish");
        assert!(password::verify(&registered.password, "swordfish").is_ok());
    }

    #[tokio::test]
    async fn register_rejects_incomplete_payloads() {
        let uc = usecase();

        let mut incomplete = registration("bob");
        incomplete.email.clear();

        assert!(matches!(
            uc.register(incomplete).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_issues_tokens_for_valid_credentials() {
        let uc = usecase();
        let registered = uc.register(registration("carol")).await.unwrap();

        let (access, refresh) = uc
            .authenticate(User {
                name: "carol".to_string(),
                password: "swordfish".to_string(),
                ..User::default()
            })
            .await
            .unwrap();

        assert_eq!(uc.validate_token(&access).await.unwrap(), registered.id);
        assert_ne!(access, refresh);
    }

    #[tokio::test]
    async fn authenticate_by_email_works() {
        let uc = usecase();
        uc.register(registration("dave")).await.unwrap();

        let result = uc
            .authenticate(User {
                email: "dave@example.com".to_string(),
                password: "swordfish".to_string(),
                ..User::default()
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_is_a_credential_mismatch() {
        let uc = usecase();
        uc.register(registration("erin")).await.unwrap();

        let result = uc
            .authenticate(User {
                name: "erin".to_string(),
                password: "guess".to_string(),
                ..User::default()
            })
            .await;

        assert!(matches!(result, Err(Error::CredentialMismatch)));
    }

    #[tokio::test]
    async fn unknown_account_reads_like_a_credential_mismatch() {
        let uc = usecase();

        let result = uc
            .authenticate(User {
                name: "nobody".to_string(),
                password: "anything".to_string(),
                ..User::default()
            })
            .await;

        assert!(matches!(result, Err(Error::CredentialMismatch)));
    }

    #[tokio::test]
    async fn refresh_mints_a_usable_access_token() {
        let uc = usecase();
        let registered = uc.register(registration("frank")).await.unwrap();

        let (_, refresh) = uc
            .authenticate(User {
                name: "frank".to_string(),
                password: "swordfish".to_string(),
                ..User::default()
            })
            .await
            .unwrap();

        let access = uc.refresh_token(&refresh).await.unwrap();
        assert_eq!(uc.validate_token(&access).await.unwrap(), registered.id);
    }

    #[tokio::test]
    async fn access_token_is_not_a_refresh_token() {
        let uc = usecase();
        uc.register(registration("grace")).await.unwrap();

        let (access, _) = uc
            .authenticate(User {
                name: "grace".to_string(),
                password: "swordfish".to_string(),
                ..User::default()
            })
            .await
            .unwrap();

        assert!(matches!(
            uc.refresh_token(&access).await,
            Err(Error::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn update_hashes_replacement_passwords() {
        let uc = usecase();
        let registered = uc.register(registration("heidi")).await.unwrap();

        let affected = uc
            .update(User {
                id: registered.id,
                password: "new-password".to_string(),
                ..User::default()
            })
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let stored = uc.get(User { id: registered.id, ..User::default() }).await.unwrap();
        assert!(password::verify(&stored.password, "new-password").is_ok());
    }

    #[tokio::test]
    async fn update_without_id_is_invalid() {
        let uc = usecase();
        assert!(matches!(
            uc.update(User::default()).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn get_requires_some_lookup_key() {
        let uc = usecase();
        assert!(matches!(
            uc.get(User::default()).await,
            Err(Error::Validation(_))
        ));
    }
}
