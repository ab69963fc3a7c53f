use std::sync::Arc;

use cats_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User};
use crate::repository::{RepoError, Store, UserRepository};
use crate::services::{auth_service, token_service};

pub struct UserService<S: Store> {
    store: Arc<S>,
    jwt_secret: String,
    access_ttl: i64,
}

impl<S: Store> UserService<S> {
    pub fn new(store: Arc<S>, jwt_secret: impl Into<String>, access_ttl: i64) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
            access_ttl,
        }
    }

    pub fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        let email = req.email.trim().to_lowercase();
        let password_hash = auth_service::hash_password(&req.password)?;

        let user = self.store.transaction(|tx| {
            let users = self.store.users();
            if users.email_exists(tx, &email)? {
                return Err(email_taken());
            }

            let new_user = NewUser {
                email: email.clone(),
                name: req.name.clone(),
                password_hash,
            };
            users.create_user(tx, &new_user).map_err(|e| match e {
                // Lost a race with a concurrent registration.
                RepoError::Conflict(_) => email_taken(),
                other => other.into(),
            })
        })?;

        tracing::info!(user_id = %user.id, email = %user.email, "user registered");
        self.auth_response(user)
    }

    pub fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let email = req.email.trim().to_lowercase();

        let user = self
            .store
            .read_only(|tx| Ok(self.store.users().find_by_email(tx, &email)?))?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user is not found"))?;

        if !auth_service::verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::new(ErrorCode::WrongPassword, "wrong password"));
        }

        tracing::info!(user_id = %user.id, "user logged in");
        self.auth_response(user)
    }

    fn auth_response(&self, user: User) -> AppResult<AuthResponse> {
        let access_token =
            token_service::create_access_token(user.id, &user.name, &self.jwt_secret, self.access_ttl)?;
        Ok(AuthResponse {
            email: user.email,
            name: user.name,
            access_token,
        })
    }
}

fn email_taken() -> AppError {
    AppError::new(ErrorCode::EmailAlreadyExists, "email already registered")
}
