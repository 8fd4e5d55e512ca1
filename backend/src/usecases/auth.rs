use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    entities::users::{InsertUserEntity, UserEntity},
    errors::{CoreError, ErrorKind},
    repositories::users::UserRepository,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::{TokenKind, TokenManager, TokenPair, hash_password, verify_password};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginModel {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshModel {
    pub refresh_token: String,
}

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupModel {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignupModel {
    fn validate(&self) -> Result<(String, String), AuthUseCaseError> {
        let email = self.email.trim().to_lowercase();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(AuthUseCaseError::Invalid("email is invalid".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthUseCaseError::Invalid(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let name = self.name.trim().to_string();
        if name.chars().count() < 2 {
            return Err(AuthUseCaseError::Invalid(
                "name must be at least 2 characters".to_string(),
            ));
        }
        Ok((email, name))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub user: UserEntity,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Error)]
pub enum AuthUseCaseError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid or expired refresh token")]
    InvalidRefreshToken,
    #[error("email already registered")]
    EmailTaken,
    #[error("{0}")]
    Invalid(String),
    #[error("user not found")]
    UserNotFound,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthUseCaseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthUseCaseError::InvalidCredentials | AuthUseCaseError::InvalidRefreshToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthUseCaseError::EmailTaken => StatusCode::CONFLICT,
            AuthUseCaseError::Invalid(_) => StatusCode::BAD_REQUEST,
            AuthUseCaseError::UserNotFound => StatusCode::NOT_FOUND,
            AuthUseCaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for AuthUseCaseError {
    fn from(err: CoreError) -> Self {
        AuthUseCaseError::Internal(err.into())
    }
}

pub struct AuthUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    tokens: Arc<TokenManager>,
}

impl<U> AuthUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenManager>) -> Self {
        Self { user_repo, tokens }
    }

    /// Registers a club owner and signs them in.
    pub async fn signup(&self, model: SignupModel) -> Result<SignupResponse, AuthUseCaseError> {
        let (email, name) = model.validate()?;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            warn!("auth: signup for a registered email");
            return Err(AuthUseCaseError::EmailTaken);
        }

        let password_hash = hash_password(&model.password)?;
        let user = match self
            .user_repo
            .create(InsertUserEntity {
                email,
                password_hash,
                name,
                role: "owner".to_string(),
            })
            .await
        {
            Ok(user) => user,
            Err(err) if err.is(ErrorKind::Conflict) => return Err(AuthUseCaseError::EmailTaken),
            Err(err) => {
                error!(db_error = ?err, "auth: failed to create user");
                return Err(err.into());
            }
        };

        let tokens = self
            .tokens
            .issue_pair(user.id)
            .map_err(|err| AuthUseCaseError::Internal(anyhow::anyhow!("{}", err)))?;
        info!(user_id = %user.id, "auth: user signed up");
        Ok(SignupResponse { user, tokens })
    }

    pub async fn me(&self, user_id: uuid::Uuid) -> Result<UserEntity, AuthUseCaseError> {
        match self.user_repo.find_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(err) if err.is(ErrorKind::NotFound) => Err(AuthUseCaseError::UserNotFound),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn login(&self, model: LoginModel) -> Result<TokenPair, AuthUseCaseError> {
        let email = model.email.trim().to_lowercase();
        let user = self.user_repo.find_by_email(&email).await.map_err(|err| {
            error!(db_error = ?err, "auth: failed to load user by email");
            AuthUseCaseError::from(err)
        })?;

        let Some(user) = user else {
            warn!("auth: login for unknown email");
            return Err(AuthUseCaseError::InvalidCredentials);
        };
        if !verify_password(&model.password, &user.password_hash) {
            warn!(user_id = %user.id, "auth: wrong password");
            return Err(AuthUseCaseError::InvalidCredentials);
        }

        let pair = self
            .tokens
            .issue_pair(user.id)
            .map_err(|err| AuthUseCaseError::Internal(anyhow::anyhow!("{}", err)))?;
        info!(user_id = %user.id, "auth: user logged in");
        Ok(pair)
    }

    pub async fn refresh(&self, model: RefreshModel) -> Result<TokenPair, AuthUseCaseError> {
        let user_id = self
            .tokens
            .user_id(&model.refresh_token, TokenKind::Refresh)
            .map_err(|err| {
                warn!(error = %err, "auth: refresh token rejected");
                AuthUseCaseError::InvalidRefreshToken
            })?;

        let user = match self.user_repo.find_by_id(user_id).await {
            Ok(user) => user,
            Err(err) if err.is(ErrorKind::NotFound) => {
                warn!(%user_id, "auth: refresh for a deleted user");
                return Err(AuthUseCaseError::InvalidRefreshToken);
            }
            Err(err) => return Err(err.into()),
        };

        let pair = self
            .tokens
            .issue_pair(user.id)
            .map_err(|err| AuthUseCaseError::Internal(anyhow::anyhow!("{}", err)))?;
        info!(user_id = %user.id, "auth: tokens refreshed");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
    use chrono::Utc;
    use crates::domain::{entities::users::UserEntity, repositories::users::MockUserRepository};
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn user(password: &str) -> UserEntity {
        let salt = SaltString::from_b64("c29tZXNhbHRmb3J0ZXN0cw").unwrap();
        UserEntity {
            id: Uuid::new_v4(),
            email: "owner@club.example".to_string(),
            password_hash: Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .unwrap()
                .to_string(),
            name: "Owner".to_string(),
            role: "owner".to_string(),
            created_at: Utc::now(),
        }
    }

    fn tokens() -> Arc<TokenManager> {
        Arc::new(TokenManager::new("auth-usecase-test-secret", 900, 3600))
    }

    #[tokio::test]
    async fn login_normalises_email_and_issues_tokens() {
        let stored = user("hunter22");
        let user_id = stored.id;
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .with(eq("owner@club.example"))
            .returning(move |_| Ok(Some(stored.clone())));

        let tokens = tokens();
        let usecase = AuthUseCase::new(Arc::new(user_repo), Arc::clone(&tokens));
        let pair = usecase
            .login(LoginModel {
                email: "  Owner@Club.Example ".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(tokens.user_id(&pair.access_token, TokenKind::Access).unwrap(), user_id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let stored = user("hunter22");
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(move |email| {
            Ok((email == "owner@club.example").then(|| stored.clone()))
        });
        let usecase = AuthUseCase::new(Arc::new(user_repo), tokens());

        let wrong = usecase
            .login(LoginModel {
                email: "owner@club.example".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = usecase
            .login(LoginModel {
                email: "nobody@club.example".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_requires_a_refresh_token() {
        let stored = user("hunter22");
        let user_id = stored.id;
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| Ok(stored.clone()));

        let tokens = tokens();
        let pair = tokens.issue_pair(user_id).unwrap();
        let usecase = AuthUseCase::new(Arc::new(user_repo), Arc::clone(&tokens));

        let refreshed = usecase
            .refresh(RefreshModel {
                refresh_token: pair.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(
            tokens.user_id(&refreshed.refresh_token, TokenKind::Refresh).unwrap(),
            user_id
        );

        let err = usecase
            .refresh(RefreshModel {
                refresh_token: pair.access_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthUseCaseError::InvalidRefreshToken));
    }

    fn signup(email: &str, password: &str) -> SignupModel {
        SignupModel {
            email: email.to_string(),
            password: password.to_string(),
            name: "Dana".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_hashes_password_and_issues_tokens() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .with(eq("dana@club.example"))
            .returning(|_| Ok(None));
        user_repo
            .expect_create()
            .times(1)
            .withf(|row| {
                row.email == "dana@club.example"
                    && row.role == "owner"
                    && row.password_hash != "correct horse"
                    && verify_password("correct horse", &row.password_hash)
            })
            .returning(|row| {
                Ok(UserEntity {
                    id: Uuid::new_v4(),
                    email: row.email,
                    password_hash: row.password_hash,
                    name: row.name,
                    role: row.role,
                    created_at: Utc::now(),
                })
            });

        let tokens = tokens();
        let usecase = AuthUseCase::new(Arc::new(user_repo), Arc::clone(&tokens));
        let response = usecase
            .signup(signup(" Dana@Club.Example ", "correct horse"))
            .await
            .unwrap();

        assert_eq!(
            tokens.user_id(&response.tokens.access_token, TokenKind::Access).unwrap(),
            response.user.id
        );
        let body = serde_json::to_value(&response).unwrap();
        assert!(body["user"].get("password_hash").is_none());
        assert!(body["access_token"].is_string());
    }

    #[tokio::test]
    async fn signup_rejects_taken_email_and_weak_input() {
        let stored = user("hunter22");
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(stored.clone())));
        user_repo.expect_create().never();
        let usecase = AuthUseCase::new(Arc::new(user_repo), tokens());

        let err = usecase
            .signup(signup("owner@club.example", "long enough"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = usecase.signup(signup("owner@club.example", "short")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = usecase.signup(signup("not-an-email", "long enough")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_returns_the_current_user() {
        let stored = user("hunter22");
        let user_id = stored.id;
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(move |id| {
            if id == user_id {
                Ok(stored.clone())
            } else {
                Err(CoreError::NotFound("user"))
            }
        });
        let usecase = AuthUseCase::new(Arc::new(user_repo), tokens());

        assert_eq!(usecase.me(user_id).await.unwrap().id, user_id);
        let err = usecase.me(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AuthUseCaseError::UserNotFound));
    }
}
