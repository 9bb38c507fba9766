use crate::application::ports::object_storage::ObjectStorage;
use crate::application::ports::preferences::PreferenceStore;
use crate::application::ports::repositories::ProfileRepository;
use crate::domain::entities::Profile;
use crate::domain::value_objects::RecordId;
use crate::shared::config::StorageConfig;
use crate::shared::error::AppError;
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

const NOTIFICATIONS_KEY: &str = "settings.notifications_enabled";

pub struct SettingsService {
    profiles: Arc<dyn ProfileRepository>,
    storage: Arc<dyn ObjectStorage>,
    preferences: Arc<dyn PreferenceStore>,
    config: StorageConfig,
}

impl SettingsService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        storage: Arc<dyn ObjectStorage>,
        preferences: Arc<dyn PreferenceStore>,
        config: StorageConfig,
    ) -> Self {
        Self {
            profiles,
            storage,
            preferences,
            config,
        }
    }

    /// A user without a saved profile gets empty defaults, not an error.
    pub async fn load_profile(&self, user_id: &RecordId) -> Result<Profile, AppError> {
        Ok(self
            .profiles
            .get(user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id.clone())))
    }

    pub async fn save_profile(
        &self,
        user_id: &RecordId,
        full_name: &str,
    ) -> Result<Profile, AppError> {
        let mut profile = self.load_profile(user_id).await?;
        profile.full_name = full_name.trim().to_string();
        profile.updated_at = Utc::now();
        let saved = self.profiles.upsert(&profile).await?;
        info!(user_id = %user_id, "profile saved");
        Ok(saved)
    }

    /// Uploads a new avatar image and points the profile at it. Returns the
    /// public URL of the stored object.
    ///
    /// Objects land under `profile/{user_id}/{millis}.{ext}`, so re-uploads
    /// get fresh paths and stale browser caches cannot pin an old image.
    pub async fn upload_avatar(
        &self,
        user_id: &RecordId,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<String, AppError> {
        if bytes.len() > self.config.avatar_max_bytes {
            let cap_mb = self.config.avatar_max_bytes / (1024 * 1024);
            return Err(AppError::Validation(format!(
                "Image size should be less than {cap_mb}MB"
            )));
        }

        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("File name has no extension: {file_name}"))
            })?;

        let path = format!("profile/{user_id}/{}.{ext}", Utc::now().timestamp_millis());
        self.storage
            .upload(&self.config.avatar_bucket, &path, bytes, true)
            .await?;
        let url = self.storage.public_url(&self.config.avatar_bucket, &path);

        let mut profile = self.load_profile(user_id).await?;
        profile.avatar_url = Some(url.clone());
        profile.updated_at = Utc::now();
        self.profiles.upsert(&profile).await?;

        info!(user_id = %user_id, %path, "avatar uploaded");
        Ok(url)
    }

    /// Notifications default to on until the user turns them off.
    pub async fn notifications_enabled(&self) -> Result<bool, AppError> {
        Ok(self
            .preferences
            .get(NOTIFICATIONS_KEY)
            .await?
            .map(|value| value != "false")
            .unwrap_or(true))
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) -> Result<(), AppError> {
        self.preferences
            .set(NOTIFICATIONS_KEY, if enabled { "true" } else { "false" })
            .await
    }
}
