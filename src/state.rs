use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::stripe::{StripeClient, StripeConfig};
use crate::config::Config;
use crate::db::Store;
use crate::services::{PaymentService, UploadService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across HTTP-based services to enable connection pooling.
fn build_shared_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent("Vendora/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub stripe: Option<Arc<StripeClient>>,

    pub payment_service: Arc<PaymentService>,

    pub upload_service: Arc<UploadService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client()?;

        let stripe = if config.stripe.enabled {
            let stripe_config = StripeConfig {
                secret_key: config.stripe.secret_key.clone(),
                publishable_key: config.stripe.publishable_key.clone(),
                webhook_secret: config.stripe.webhook_secret.clone(),
            };
            Some(Arc::new(StripeClient::with_shared_client(
                http_client,
                stripe_config,
            )))
        } else {
            None
        };

        let payment_service = Arc::new(PaymentService::new(
            store.clone(),
            stripe.clone(),
            config.stripe.currency.clone(),
        ));

        let upload_service = Arc::new(UploadService::new(config.uploads.clone()));

        let config = Arc::new(RwLock::new(config));

        Ok(Self {
            config,
            store,
            stripe,
            payment_service,
            upload_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
