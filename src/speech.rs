use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// Speech engine settings.  The engine is any espeak-compatible CLI: it must
/// accept `-v <voice> -s <wpm>` and, for clip synthesis, `-w <file>`.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub bin: String,
    pub voice: String,
    pub wpm: u16,
}

/// Why a speech request was refused.
#[derive(Debug)]
pub enum SpeechError {
    /// An utterance is already in progress; stop it first.
    AlreadySpeaking,
    Engine(String),
}

impl std::fmt::Display for SpeechError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySpeaking => write!(f, "already speaking"),
            Self::Engine(msg) => write!(f, "engine: {msg}"),
        }
    }
}

impl std::error::Error for SpeechError {}

enum EngineState {
    Idle,
    Speaking { child: Child },
}

/// Local text-to-speech playback with an explicit two-state lifecycle.
///
/// `start` moves Idle → Speaking by spawning the engine against the host
/// audio device; a second `start` while Speaking is refused rather than
/// queued or mixed.  `stop` kills the utterance and always lands in Idle.
/// A finished child is reaped lazily the next time the state is inspected.
pub struct Speaker {
    cfg: SpeechConfig,
    engine: Mutex<EngineState>,
}

impl Speaker {
    pub fn new(cfg: SpeechConfig) -> Self {
        Self {
            cfg,
            engine: Mutex::new(EngineState::Idle),
        }
    }

    fn base_cmd(&self) -> Command {
        let mut cmd = Command::new(&self.cfg.bin);
        cmd.arg("-v")
            .arg(&self.cfg.voice)
            .arg("-s")
            .arg(self.cfg.wpm.to_string());
        cmd
    }

    /// Synthesize `text` to WAV bytes via a transient temp file.
    ///
    /// The engine writes the file, we read it back and delete it before
    /// returning; nothing persists between calls.
    pub async fn synthesize_clip(&self, text: &str) -> Result<Vec<u8>> {
        let path = std::env::temp_dir().join(format!("crypto-report-{}.wav", uuid::Uuid::new_v4()));

        let mut cmd = self.base_cmd();
        cmd.arg("-w").arg(&path).arg(text);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to run speech engine `{}`", self.cfg.bin))?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&path).await;
            bail!(
                "speech engine exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let bytes = tokio::fs::read(&path)
            .await
            .context("read synthesized audio")?;
        let _ = tokio::fs::remove_file(&path).await;
        Ok(bytes)
    }

    /// Begin speaking `text` on the host audio device.
    pub async fn start(&self, text: &str) -> Result<(), SpeechError> {
        let mut engine = self.engine.lock().await;

        if let EngineState::Speaking { child } = &mut *engine {
            // A child that already exited frees the slot.
            match child.try_wait() {
                Ok(Some(_)) => *engine = EngineState::Idle,
                Ok(None) => return Err(SpeechError::AlreadySpeaking),
                Err(e) => {
                    tracing::warn!("speech child poll failed, resetting: {e}");
                    *engine = EngineState::Idle;
                }
            }
        }

        let mut cmd = self.base_cmd();
        cmd.arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| SpeechError::Engine(format!("spawn `{}` failed: {e}", self.cfg.bin)))?;

        *engine = EngineState::Speaking { child };
        Ok(())
    }

    /// Kill any in-flight utterance.  Idempotent; always ends Idle.
    pub async fn stop(&self) {
        let mut engine = self.engine.lock().await;
        if let EngineState::Speaking { child } = &mut *engine {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        *engine = EngineState::Idle;
    }

    pub async fn is_speaking(&self) -> bool {
        let mut engine = self.engine.lock().await;
        match &mut *engine {
            EngineState::Idle => false,
            EngineState::Speaking { child } => match child.try_wait() {
                Ok(None) => true,
                _ => {
                    *engine = EngineState::Idle;
                    false
                }
            },
        }
    }

    #[cfg(test)]
    async fn force_speaking(&self, child: Child) {
        *self.engine.lock().await = EngineState::Speaking { child };
    }
}
