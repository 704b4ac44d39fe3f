use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::auth::{CredentialVerifier, FileCredentials};
use crate::config::HubConfig;
use crate::market::coingecko::CoinGeckoClient;
use crate::market::{MarketDataSource, MarketService};
use crate::session::SessionStore;
use crate::speech::{Speaker, SpeechConfig};

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub config: HubConfig,
    pub market: MarketService,
    pub sessions: Arc<SessionStore>,
    pub speaker: Speaker,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Production wiring: CoinGecko upstream, flat-file credentials.
    pub fn new(config: HubConfig) -> Result<Arc<Self>> {
        let source = Arc::new(CoinGeckoClient::new(
            &config.api_base,
            Duration::from_secs(config.fetch_timeout_secs),
        )?);
        Ok(Self::with_source(config, source))
    }

    /// Wire the state around an arbitrary market data source.  Tests use
    /// this to substitute a canned upstream.
    pub fn with_source(config: HubConfig, source: Arc<dyn MarketDataSource>) -> Arc<Self> {
        let market = MarketService::new(
            source,
            Duration::from_secs(config.quote_ttl_secs),
            Duration::from_secs(config.history_ttl_secs),
        );
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(config.session_ttl_secs)));
        let speaker = Speaker::new(SpeechConfig {
            bin: config.tts_bin.clone(),
            voice: config.tts_voice.clone(),
            wpm: config.tts_wpm,
        });
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(FileCredentials::new(
            config.credentials_path.clone().unwrap_or_default(),
        ));

        Arc::new(Self {
            config,
            market,
            sessions,
            speaker,
            verifier,
        })
    }

    /// True when a credential file is configured, which switches the login
    /// gate on.
    pub fn auth_required(&self) -> bool {
        self.config.credentials_path.is_some()
    }
}
