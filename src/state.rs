use std::sync::Arc;

use tracing::warn;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, BackupCoordinator, LedgerService, NameImporter, RateLimiter, SeaOrmAuthService,
    SeaOrmLedgerService, TokenSigner, token,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub ledger: Arc<dyn LedgerService>,

    pub importer: Arc<NameImporter>,

    pub backup: Arc<BackupCoordinator>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let secret = config.security.token_secret.clone().unwrap_or_else(|| {
            // Ephemeral secret: every restart invalidates outstanding
            // tokens. Fine for evaluation, noisy on purpose for ops.
            warn!(
                "No token secret configured, generated an ephemeral one; \
                 sessions will not survive a restart"
            );
            token::generate_secret()
        });

        let signer = Arc::new(TokenSigner::new(
            &secret,
            config.security.token_ttl_minutes,
        ));

        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        let auth = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            signer,
            limiter.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let backup = Arc::new(BackupCoordinator::new(
            store.clone(),
            config.general.backup_path.clone(),
        ));

        let ledger = Arc::new(SeaOrmLedgerService::new(
            store.clone(),
            backup.clone(),
            limiter.clone(),
        )) as Arc<dyn LedgerService>;

        let importer = Arc::new(NameImporter::new(store.clone(), limiter));

        Ok(Self {
            config: Arc::new(config),
            store,
            auth,
            ledger,
            importer,
            backup,
        })
    }
}
