use std::sync::Arc;

use classifier::Classifier;
use common::storage::FileStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::oauth::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub store: Arc<dyn FileStore>,
    pub oauth: Arc<dyn IdentityProvider>,
    /// `None` when classification is disabled.
    pub classifier: Option<Arc<Classifier>>,
}
