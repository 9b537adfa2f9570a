//! Account lifecycle: signup, login, email confirmation, password reset, avatar

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::models::{
    LoginRequest, MeResponse, NewUser, ResetPassword, Role, SignupRequest, TokenResponse, User,
};
use crate::auth::{PasswordHasher, SessionCache, TokenService};
use crate::db::UserStore;
use crate::error::{Error, Result};
use crate::mail::{self, EmailMessage, Mailer};
use crate::upload::{avatar_public_id, AvatarUploader};

pub const RESET_REQUESTED: &str = "If the email exists, a reset link was sent";

/// Plain `{ "message": ... }` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything that reads or writes user accounts outside of authentication
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    cache: SessionCache,
    tokens: TokenService,
    hasher: PasswordHasher,
    mailer: Arc<dyn Mailer>,
    uploader: Option<Arc<dyn AvatarUploader>>,
    public_url: String,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        cache: SessionCache,
        tokens: TokenService,
        hasher: PasswordHasher,
        mailer: Arc<dyn Mailer>,
        public_url: impl Into<String>,
    ) -> Self {
        let mut public_url = public_url.into();
        if !public_url.ends_with('/') {
            public_url.push('/');
        }
        Self {
            users,
            cache,
            tokens,
            hasher,
            mailer,
            uploader: None,
            public_url,
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn AvatarUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Register a new, unconfirmed user and mail them a confirmation link
    pub async fn signup(&self, request: SignupRequest) -> Result<User> {
        request.validate()?;
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(Error::Conflict("Account already exists".to_string()));
        }

        let user = self
            .users
            .insert(NewUser {
                email: request.email,
                password: self.hasher.hash(&request.password)?,
                first_name: request.first_name,
                last_name: request.last_name,
                role: Role::User,
            })
            .await?;
        tracing::info!("New account {} (id {})", user.email, user.id);

        let token = self.tokens.issue_action_token(&user.email)?;
        let message =
            EmailMessage::verify_email(&user.email, user.display_name(), &self.public_url, &token)?;
        mail::dispatch(self.mailer.clone(), message);

        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| Error::InvalidCredentials("Invalid email".to_string()))?;

        if !self.hasher.verify(&request.password, &user.password) {
            tracing::debug!("Wrong password for {}", user.email);
            return Err(Error::InvalidCredentials("Invalid password".to_string()));
        }
        if !user.confirmed {
            return Err(Error::InvalidCredentials("Email not confirmed".to_string()));
        }

        let token = self.tokens.issue_access_token(&user.email, user.role)?;
        Ok(TokenResponse::bearer(token))
    }

    pub async fn confirm_email(&self, token: &str) -> Result<MessageResponse> {
        let claims = self.tokens.verify_action(token).map_err(|e| {
            tracing::debug!("Rejected email verification token: {}", e);
            Error::InvalidActionToken("Invalid token for email verification".to_string())
        })?;

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| Error::BadRequest("Verification error".to_string()))?;
        if user.confirmed {
            return Ok(MessageResponse::new("Your email is already confirmed"));
        }

        self.users.confirm(&user.email).await?;
        self.cache.invalidate(&user.email).await;
        tracing::info!("Confirmed email {}", user.email);
        Ok(MessageResponse::new("Email confirmed"))
    }

    /// Mail a reset link if the account exists. The answer never tells
    /// whether it does.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse> {
        match self.users.find_by_email(email).await? {
            Some(user) => {
                let token = self.tokens.issue_action_token(&user.email)?;
                let message = EmailMessage::reset_password(&user.email, &self.public_url, &token)?;
                mail::dispatch(self.mailer.clone(), message);
            }
            None => tracing::debug!("Password reset requested for unknown {}", email),
        }
        Ok(MessageResponse::new(RESET_REQUESTED))
    }

    pub async fn reset_password(
        &self,
        token: &str,
        request: ResetPassword,
    ) -> Result<MessageResponse> {
        let claims = self
            .tokens
            .verify_action(token)
            .map_err(|_| Error::InvalidActionToken("Invalid token".to_string()))?;
        request.validate()?;

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| Error::BadRequest("Invalid token or user not found".to_string()))?;

        let digest = self.hasher.hash(&request.password)?;
        self.users.set_password(&user.email, &digest).await?;
        self.cache.invalidate(&user.email).await;
        tracing::info!("Password reset for {}", user.email);
        Ok(MessageResponse::new("Password has been reset successfully"))
    }

    /// Upload `image` as the avatar of `user` and store its URL
    pub async fn update_avatar(&self, user: &User, image: Vec<u8>) -> Result<User> {
        let uploader = self
            .uploader
            .as_ref()
            .ok_or_else(|| Error::ServiceUnavailable("Avatar uploads are not configured".to_string()))?;
        if image.is_empty() {
            return Err(Error::BadRequest("Empty file".to_string()));
        }

        let url = uploader.upload(image, &avatar_public_id(&user.email)).await?;

        let updated = self.users.set_avatar(&user.email, &url).await?;
        self.cache.invalidate(&updated.email).await;
        Ok(updated)
    }

    pub fn me(&self, user: &User) -> MeResponse {
        MeResponse::from(user)
    }
}
