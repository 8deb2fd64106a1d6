//! Governor policy form and URL list.
//!
//! The editor holds one [`PolicyConfig`] as the source of truth for the
//! form. Successful loads and saves replace it wholesale. URL edits are
//! applied locally first and then persisted; when the persist fails the
//! local edit stays, the server copy is re-read into `remote`, and
//! [`PolicyEditor::is_diverged`] reports the difference until the next
//! successful load or save.

use tracing::{info, warn};

use crate::api::SharedGovernorApi;
use crate::data::policy::validate_url;
use crate::data::{PolicyConfig, PolicyField};
use crate::error::{ApiError, PolicyError, ValidationError};

pub struct PolicyEditor {
    api: SharedGovernorApi,
    model: PolicyConfig,
    /// Last copy known to be stored on the server, if any.
    remote: Option<PolicyConfig>,
}

impl PolicyEditor {
    pub fn new(api: SharedGovernorApi) -> Self {
        Self {
            api,
            model: PolicyConfig::default(),
            remote: None,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.model
    }

    pub fn urls(&self) -> &[String] {
        &self.model.urls
    }

    /// True when the local URL list differs from the last server copy.
    pub fn is_diverged(&self) -> bool {
        match &self.remote {
            Some(remote) => remote.urls != self.model.urls,
            None => false,
        }
    }

    /// Fetch the stored policy. On failure the current model is kept.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let config = self.api.load_config().await?.normalized();
        info!(urls = config.urls.len(), "policy loaded");
        self.remote = Some(config.clone());
        self.model = config;
        Ok(())
    }

    /// Validate and store a full policy, then adopt it as the model.
    pub async fn save(&mut self, config: PolicyConfig) -> Result<(), PolicyError> {
        config.validate()?;
        // validated urls are unique once trimmed, so this only trims
        let config = config.normalized();
        self.api.save_config(&config).await?;
        info!("policy saved");
        self.remote = Some(config.clone());
        self.model = config;
        Ok(())
    }

    /// Edit one scalar field from text.
    pub async fn set_field(&mut self, field: PolicyField, text: &str) -> Result<(), PolicyError> {
        let next = self.model.with_field(field, text)?;
        self.save(next).await
    }

    /// Set a fixed daily quota (minimum and maximum both `gb`).
    pub async fn update_daily_quota(&mut self, gb: f64) -> Result<(), PolicyError> {
        if !(gb.is_finite() && gb > 0.0) {
            return Err(ValidationError::NonPositiveQuota.into());
        }
        let mut next = self.model.clone();
        next.daily_quota_min_gb = gb;
        next.daily_quota_max_gb = gb;
        self.save(next).await
    }

    /// Restore server defaults and reload them.
    pub async fn reset_to_default(&mut self) -> Result<(), PolicyError> {
        self.api.reset_config().await?;
        info!("policy reset to defaults");
        self.load().await?;
        Ok(())
    }

    /// Append a URL and persist. A successful persist is confirmed by
    /// re-reading the stored policy.
    pub async fn add_url(&mut self, url: &str) -> Result<(), PolicyError> {
        let url = validate_url(url)?;
        if self.model.urls.contains(&url) {
            return Err(ValidationError::DuplicateUrl(url).into());
        }
        self.model.urls.push(url);
        self.persist_urls().await?;
        if let Err(e) = self.load().await {
            warn!("reload after adding URL failed: {e}");
        }
        Ok(())
    }

    /// Remove the URL at `index` and persist.
    pub async fn remove_url(&mut self, index: usize) -> Result<String, PolicyError> {
        let len = self.model.urls.len();
        if index >= len {
            return Err(ValidationError::IndexOutOfRange { index, len }.into());
        }
        let removed = self.model.urls.remove(index);
        self.persist_urls().await?;
        Ok(removed)
    }

    async fn persist_urls(&mut self) -> Result<(), PolicyError> {
        match self.api.save_config(&self.model).await {
            Ok(()) => {
                self.remote = Some(self.model.clone());
                Ok(())
            }
            Err(source) => {
                warn!("persisting URL list failed, keeping local change: {source}");
                match self.api.load_config().await {
                    Ok(remote) => self.remote = Some(remote.normalized()),
                    Err(e) => warn!("reconciling re-fetch failed: {e}"),
                }
                Err(PolicyError::PersistFailed { source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use std::sync::Arc;

    fn editor(api: &FakeApi) -> PolicyEditor {
        PolicyEditor::new(Arc::new(api.clone()))
    }

    #[tokio::test]
    async fn test_load_normalizes_and_replaces() {
        let api = FakeApi::new();
        api.set_config(PolicyConfig {
            speed_limit_mbps: 42.0,
            urls: vec!["https://a.test".into(), " ".into(), "https://a.test".into()],
            ..Default::default()
        });
        let mut editor = editor(&api);
        editor.load().await.unwrap();

        assert_eq!(editor.config().speed_limit_mbps, 42.0);
        assert_eq!(editor.urls(), ["https://a.test"]);
        assert!(!editor.is_diverged());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_model() {
        let api = FakeApi::new();
        api.fail_load(Some(ApiError::Timeout));
        let mut editor = editor(&api);

        assert_eq!(editor.load().await, Err(ApiError::Timeout));
        assert_eq!(editor.config(), &PolicyConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let api = FakeApi::new();
        let mut editor = editor(&api);
        let config = PolicyConfig {
            speed_limit_mbps: 25.5,
            daily_quota_min_gb: 50.0,
            daily_quota_max_gb: 75.0,
            schedule_start: "08:00".into(),
            schedule_end: "18:30".into(),
            sleep_min_minutes: 5.0,
            sleep_max_minutes: 15.0,
            urls: vec!["https://a.test/x.iso".into()],
        };

        editor.save(config.clone()).await.unwrap();
        editor.load().await.unwrap();
        assert_eq!(editor.config(), &config);
    }

    #[tokio::test]
    async fn test_save_trims_and_rejects_padded_duplicates() {
        let api = FakeApi::new();
        let mut editor = editor(&api);

        let padded = PolicyConfig {
            urls: vec!["https://a.test".into(), " https://a.test ".into()],
            ..Default::default()
        };
        assert_eq!(
            editor.save(padded).await,
            Err(ValidationError::DuplicateUrl("https://a.test".into()).into())
        );
        assert!(api.server_config().urls.is_empty());

        let config = PolicyConfig {
            urls: vec![" https://b.test/f.bin ".into()],
            ..Default::default()
        };
        editor.save(config).await.unwrap();
        assert_eq!(api.server_config().urls, ["https://b.test/f.bin"]);
        assert_eq!(editor.urls(), ["https://b.test/f.bin"]);

        let saved = editor.config().clone();
        editor.load().await.unwrap();
        assert_eq!(editor.config(), &saved);
    }

    #[tokio::test]
    async fn test_invalid_save_never_reaches_server() {
        let api = FakeApi::new();
        let mut editor = editor(&api);
        let config = PolicyConfig {
            daily_quota_min_gb: 500.0,
            ..Default::default()
        };

        let err = editor.save(config).await.unwrap_err();
        assert!(matches!(
            err,
            PolicyError::Validation(ValidationError::QuotaRange { .. })
        ));
        assert_eq!(api.calls("save_config"), 0);
    }

    #[tokio::test]
    async fn test_add_url_rejections() {
        let api = FakeApi::new();
        let mut editor = editor(&api);

        let err = editor.add_url("not-a-url").await.unwrap_err();
        assert!(matches!(
            err,
            PolicyError::Validation(ValidationError::MalformedUrl { .. })
        ));
        assert!(editor.urls().is_empty());
        assert_eq!(
            editor.add_url("   ").await,
            Err(ValidationError::EmptyUrl.into())
        );

        editor.add_url("https://x.test").await.unwrap();
        assert_eq!(
            editor.add_url("https://x.test").await,
            Err(ValidationError::DuplicateUrl("https://x.test".into()).into())
        );
        assert_eq!(editor.urls(), ["https://x.test"]);
        assert_eq!(api.server_config().urls, vec!["https://x.test"]);
        // persisted once, confirmed by a reload
        assert_eq!(api.calls("save_config"), 1);
        assert_eq!(api.calls("load_config"), 1);
    }

    #[tokio::test]
    async fn test_remove_url() {
        let api = FakeApi::new();
        api.set_config(PolicyConfig {
            urls: vec!["https://a.test".into(), "https://b.test".into()],
            ..Default::default()
        });
        let mut editor = editor(&api);
        editor.load().await.unwrap();

        assert_eq!(
            editor.remove_url(2).await,
            Err(ValidationError::IndexOutOfRange { index: 2, len: 2 }.into())
        );
        assert_eq!(editor.remove_url(0).await.unwrap(), "https://a.test");
        assert_eq!(editor.urls(), ["https://b.test"]);
        assert_eq!(api.server_config().urls, vec!["https://b.test"]);
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_optimistic_change() {
        let api = FakeApi::new();
        let mut editor = editor(&api);
        editor.load().await.unwrap();

        api.fail_save(Some(ApiError::Status { code: 500 }));
        let err = editor.add_url("https://x.test").await.unwrap_err();
        assert_eq!(
            err,
            PolicyError::PersistFailed {
                source: ApiError::Status { code: 500 }
            }
        );
        assert_eq!(editor.urls(), ["https://x.test"]);
        assert!(api.server_config().urls.is_empty());
        assert!(editor.is_diverged());

        // the next successful save settles it
        api.fail_save(None);
        editor.save(editor.config().clone()).await.unwrap();
        assert!(!editor.is_diverged());
        assert_eq!(api.server_config().urls, vec!["https://x.test"]);
    }

    #[tokio::test]
    async fn test_set_field_and_daily_quota() {
        let api = FakeApi::new();
        let mut editor = editor(&api);

        editor.set_field(PolicyField::ScheduleStart, "06:30").await.unwrap();
        assert_eq!(api.server_config().schedule_start, "06:30");

        let err = editor.set_field(PolicyField::SpeedLimit, "fast").await.unwrap_err();
        assert!(matches!(
            err,
            PolicyError::Validation(ValidationError::InvalidNumber { .. })
        ));

        assert_eq!(
            editor.update_daily_quota(0.0).await,
            Err(ValidationError::NonPositiveQuota.into())
        );
        editor.update_daily_quota(80.0).await.unwrap();
        assert_eq!(editor.config().daily_quota_min_gb, 80.0);
        assert_eq!(editor.config().daily_quota_max_gb, 80.0);
    }

    #[tokio::test]
    async fn test_reset_to_default() {
        let api = FakeApi::new();
        api.set_config(PolicyConfig {
            speed_limit_mbps: 99.0,
            urls: vec!["https://a.test".into()],
            ..Default::default()
        });
        let mut editor = editor(&api);
        editor.load().await.unwrap();

        editor.reset_to_default().await.unwrap();
        assert_eq!(editor.config(), &PolicyConfig::default());
        assert_eq!(api.calls("reset_config"), 1);
    }
}
