use std::env;
use std::path::PathBuf;

/// Hub configuration derived from environment variables.
///
/// Every knob has a sensible default so `crypto-reports-hub` starts with no
/// environment at all; set `CRYPTO_REPORTS_CREDENTIALS` to turn the login
/// gate on.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub bind: String,
    pub port: u16,

    // ── Upstream market data ───────────────────────────────────────
    pub api_base: String,
    pub fetch_timeout_secs: u64,
    pub quote_ttl_secs: u64,
    pub history_ttl_secs: u64,
    pub history_window_days: u32,

    // ── Presentation ───────────────────────────────────────────────
    /// Default chart style: "line" or "updown".
    pub chart_mode: String,
    /// Zone used when a session never reported one.
    pub fallback_zone: String,
    pub static_dir: PathBuf,

    // ── Speech engine ──────────────────────────────────────────────
    pub tts_bin: String,
    pub tts_voice: String,
    pub tts_wpm: u16,

    // ── Access gate ────────────────────────────────────────────────
    /// Flat JSON file of `{"user": "password"}` pairs.  Unset ⇒ gate disabled.
    pub credentials_path: Option<PathBuf>,
    /// Sessions idle for longer than this are dropped.
    pub session_ttl_secs: u64,
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

impl HubConfig {
    pub fn from_env() -> Self {
        Self {
            bind: env_str("CRYPTO_REPORTS_BIND", "127.0.0.1"),
            port: env_u16("CRYPTO_REPORTS_PORT", 8601),
            api_base: env_str("CRYPTO_REPORTS_API_BASE", "https://api.coingecko.com/api/v3"),
            fetch_timeout_secs: env_u64("CRYPTO_REPORTS_FETCH_TIMEOUT_S", 10),
            quote_ttl_secs: env_u64("CRYPTO_REPORTS_QUOTE_TTL_S", 60),
            history_ttl_secs: env_u64("CRYPTO_REPORTS_HISTORY_TTL_S", 300),
            history_window_days: env_u32("CRYPTO_REPORTS_HISTORY_DAYS", 1).clamp(1, 365),
            chart_mode: env_str("CRYPTO_REPORTS_CHART_MODE", "updown"),
            fallback_zone: env_str("CRYPTO_REPORTS_FALLBACK_ZONE", "UTC"),
            static_dir: PathBuf::from(env_str("CRYPTO_REPORTS_STATIC_DIR", "static")),
            tts_bin: env_str("CRYPTO_REPORTS_TTS_BIN", "espeak-ng"),
            tts_voice: env_str("CRYPTO_REPORTS_TTS_VOICE", "en"),
            tts_wpm: env_u16("CRYPTO_REPORTS_TTS_WPM", 165),
            credentials_path: env_opt_path("CRYPTO_REPORTS_CREDENTIALS"),
            session_ttl_secs: env_u64("CRYPTO_REPORTS_SESSION_TTL_S", 86_400),
        }
    }
}
