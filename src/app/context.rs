use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiClient, Endpoints};
use crate::app::error::{IslanderError, Result};
use crate::app::Session;
use crate::config::Config;
use crate::domain::{ForumGroup, Identity};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::ContentNormalizer;
use crate::store::{IdentityStore, SqliteIdentityStore};
use crate::timeline::{LoadMoreFailure, TimelineController};

pub struct AppContext {
    pub session: Arc<Session>,
    pub store: Arc<SqliteIdentityStore>,
    pub fetcher: Arc<HttpFetcher>,
    pub api: Arc<ApiClient>,
    pub normalizer: ContentNormalizer,
    load_more_failure: LoadMoreFailure,
}

/// What `bootstrap` managed to resolve. Each part fails on its own.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub identity: Option<String>,
    pub cdn_base: Option<String>,
    pub forum_groups: Vec<ForumGroup>,
    pub errors: Vec<String>,
}

impl AppContext {
    pub fn new(config: &Config) -> Result<Self> {
        let db_path = match &config.storage.db_path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };

        let store = SqliteIdentityStore::new(&db_path)?;
        Self::build(config, store)
    }

    pub fn in_memory(config: &Config) -> Result<Self> {
        Self::build(config, SqliteIdentityStore::in_memory()?)
    }

    fn build(config: &Config, store: SqliteIdentityStore) -> Result<Self> {
        let session = Arc::new(Session::new());
        let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
        let api = Arc::new(ApiClient::new(
            fetcher.clone() as Arc<dyn Fetcher + Send + Sync>,
            Endpoints::new(&config.api.base_url),
            session.clone(),
        ));

        Ok(Self {
            session,
            store: Arc::new(store),
            fetcher,
            api,
            normalizer: ContentNormalizer::new(),
            load_more_failure: config.timeline.load_more_failure,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| IslanderError::Config("Could not find data directory".into()))?;
        let islander_dir = data_dir.join("islander");
        std::fs::create_dir_all(&islander_dir)?;
        Ok(islander_dir.join("islander.db"))
    }

    /// Restore the selected identity, then resolve the CDN and forum list
    /// concurrently.
    pub async fn bootstrap(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        match self.store.get_current() {
            Ok(identity) => {
                report.identity = identity.as_ref().map(|i| i.name.clone());
                self.session.set_identity(identity);
            }
            Err(e) => {
                tracing::warn!("Failed to load current cookie: {}", e);
                report.errors.push(format!("cookie: {}", e));
            }
        }

        let (cdn, forums) = futures::future::join(
            self.api.get_cdn_endpoints(),
            self.api.load_forum_groups(),
        )
        .await;

        match cdn {
            Ok(endpoints) => match self.session.select_cdn(&endpoints) {
                Some(base) => {
                    tracing::info!("Using CDN {}", base);
                    report.cdn_base = Some(base.to_string());
                }
                None => {
                    tracing::warn!("CDN list was empty");
                    report.errors.push("cdn: no endpoints available".into());
                }
            },
            Err(e) => {
                tracing::warn!("Failed to load CDN list: {}", e);
                report.errors.push(format!("cdn: {}", e));
            }
        }

        match forums {
            Ok(groups) => {
                tracing::info!("Loaded {} forum groups", groups.len());
                self.session.set_forums(&groups);
                report.forum_groups = groups;
            }
            Err(e) => {
                tracing::warn!("Failed to load forum list: {}", e);
                report.errors.push(format!("forums: {}", e));
            }
        }

        report
    }

    pub fn timeline_controller(&self) -> TimelineController {
        TimelineController::new(
            self.api.clone(),
            self.normalizer.clone(),
            self.load_more_failure,
        )
    }

    /// Make `name` the identity used for authenticated requests.
    pub fn use_identity(&self, name: &str) -> Result<Identity> {
        self.store.set_current(name)?;
        let identity = self
            .store
            .find_by_name(name)?
            .ok_or_else(|| IslanderError::IdentityNotFound(name.to_string()))?;
        self.session.set_identity(Some(identity.clone()));
        Ok(identity)
    }

    pub fn clear_identity(&self) -> Result<()> {
        self.store.clear_current()?;
        self.session.set_identity(None);
        Ok(())
    }

    pub fn remove_identity(&self, name: &str) -> Result<()> {
        self.store.remove(name)?;
        if self
            .session
            .current_identity()
            .is_some_and(|current| current.name == name)
        {
            self.session.set_identity(None);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AppContext {
        AppContext::in_memory(&Config::default()).unwrap()
    }

    #[test]
    fn test_use_identity_updates_session() {
        let ctx = context();
        ctx.store.add(&Identity::new("main", "tok")).unwrap();

        ctx.use_identity("main").unwrap();
        assert_eq!(ctx.session.current_identity().unwrap().name, "main");
        assert_eq!(ctx.store.get_current().unwrap().unwrap().name, "main");

        ctx.clear_identity().unwrap();
        assert!(ctx.session.current_identity().is_none());
        assert!(ctx.store.get_current().unwrap().is_none());
    }

    #[test]
    fn test_use_unknown_identity() {
        let ctx = context();
        assert!(matches!(
            ctx.use_identity("ghost").unwrap_err(),
            IslanderError::IdentityNotFound(_)
        ));
        assert!(ctx.session.current_identity().is_none());
    }

    #[test]
    fn test_removing_current_identity_clears_session() {
        let ctx = context();
        ctx.store.add(&Identity::new("main", "tok")).unwrap();
        ctx.use_identity("main").unwrap();

        ctx.remove_identity("main").unwrap();
        assert!(ctx.session.current_identity().is_none());
    }
}
