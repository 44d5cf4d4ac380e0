//! The signed-in user and profile updates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use auravo_core::config::AccountConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AccountError;
use crate::upload::MediaUploader;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Fields written by [`AuthProvider::update_profile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// The profile form as submitted.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    /// Raw avatar image; `None` or empty keeps the current photo.
    pub avatar: Option<Vec<u8>>,
}

/// Identity boundary.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, or `None` without a session.
    async fn current_user(&self) -> Result<Option<UserProfile>, AccountError>;

    async fn update_profile(
        &self,
        user: &UserProfile,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AccountError>;
}

/// Session kept as `<data_dir>/profile.json`. No file means signed out.
#[derive(Debug, Clone)]
pub struct LocalAuthProvider {
    path: PathBuf,
}

impl LocalAuthProvider {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("profile.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the session from config when none exists yet.
    ///
    /// An empty email in config leaves the user signed out.
    pub async fn seed(&self, config: &AccountConfig) -> Result<(), AccountError> {
        if config.email.trim().is_empty() || tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        let profile = UserProfile {
            display_name: config.display_name.trim().to_string(),
            email: config.email.trim().to_string(),
            photo_url: Some(config.photo_url.trim().to_string()).filter(|u| !u.is_empty()),
        };
        self.write(&profile).await?;
        info!(email = %profile.email, "Local session created");
        Ok(())
    }

    async fn write(&self, profile: &UserProfile) -> Result<(), AccountError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(profile)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn current_user(&self) -> Result<Option<UserProfile>, AccountError> {
        match tokio::fs::read(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No local session");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(
        &self,
        user: &UserProfile,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AccountError> {
        match self.current_user().await? {
            Some(current) if current.email == user.email => {}
            _ => return Err(AccountError::NotLoggedIn),
        }
        let updated = UserProfile {
            display_name: update.display_name,
            email: user.email.clone(),
            photo_url: update.photo_url,
        };
        self.write(&updated).await?;
        Ok(updated)
    }
}

/// Applies profile form submissions.
#[derive(Clone)]
pub struct ProfileService {
    auth: Arc<dyn AuthProvider>,
    uploader: Arc<dyn MediaUploader>,
}

impl ProfileService {
    pub fn new(auth: Arc<dyn AuthProvider>, uploader: Arc<dyn MediaUploader>) -> Self {
        Self { auth, uploader }
    }

    /// Rename the signed-in user and optionally replace their avatar.
    ///
    /// A failed avatar upload keeps the existing photo and still applies the
    /// new name.
    pub async fn update_user_profile(
        &self,
        form: ProfileForm,
    ) -> Result<UserProfile, AccountError> {
        let user = self
            .auth
            .current_user()
            .await?
            .ok_or(AccountError::NotLoggedIn)?;

        let name = form.name.trim();
        if name.is_empty() {
            return Err(AccountError::InvalidForm("name is required".to_string()));
        }

        let mut photo_url = user.photo_url.clone();
        if let Some(avatar) = form.avatar.as_deref().filter(|a| !a.is_empty()) {
            match self.uploader.upload(avatar).await {
                Ok(url) => photo_url = Some(url),
                Err(e) => warn!(error = %e, "Avatar upload failed, keeping current photo"),
            }
        }

        let updated = self
            .auth
            .update_profile(
                &user,
                ProfileUpdate {
                    display_name: name.to_string(),
                    photo_url,
                },
            )
            .await?;
        info!(email = %updated.email, "Profile updated");
        Ok(updated)
    }
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
