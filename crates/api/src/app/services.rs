use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use alliances_infra::{
    AccessEngine, InMemoryPortalStore, PortalStore, PostgresPortalStore,
    seed::{self, DemoAccounts},
};

use crate::config::ApiConfig;

pub type PortalEngine = AccessEngine<Arc<dyn PortalStore>>;

pub struct AppServices {
    pub engine: PortalEngine,
}

impl AppServices {
    pub fn new(store: Arc<dyn PortalStore>, config: &ApiConfig) -> Self {
        Self {
            engine: AccessEngine::new(store).with_expiry_policy(config.expiry_policy),
        }
    }
}

/// Pick the store from configuration and wrap it in the access engine.
///
/// Without `DATABASE_URL` the in-memory store is seeded with the standard
/// catalog (and demo members unless disabled).
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn PortalStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresPortalStore::connect(url)
                .await
                .context("connect to DATABASE_URL")?;
            info!("using postgres portal store");
            Arc::new(store) as Arc<dyn PortalStore>
        }
        None => {
            let store = Arc::new(InMemoryPortalStore::new());
            seed::seed_catalog(&store).await.context("seed access catalog")?;
            if config.seed_demo {
                let accounts = seed::seed_demo_members(&store)
                    .await
                    .context("seed demo members")?;
                log_demo_accounts(&accounts);
            }
            info!("using in-memory portal store");
            store as Arc<dyn PortalStore>
        }
    };

    Ok(AppServices::new(store, config))
}

fn log_demo_accounts(accounts: &DemoAccounts) {
    info!(user_id = %accounts.admin, "demo admin");
    for (tier, user_id) in &accounts.members {
        info!(user_id = %user_id, tier = %tier, "demo member");
    }
}
