//! GUI state persisted as JSON next to the app config

use anyhow::{Context, Result};
use glucowatch_core::{GuiState, GuiStateRepository, Units};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// [`GuiStateRepository`] backed by a JSON file.
///
/// Every write is flushed to disk immediately; failures are logged and the
/// in-memory state stays authoritative for the session.
pub struct JsonGuiStateRepository {
    path: PathBuf,
    state: Mutex<GuiState>,
}

impl JsonGuiStateRepository {
    /// Open the repository, starting from defaults when the file is missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read GUI state {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid GUI state {}", path.display()))?
        } else {
            GuiState::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> GuiState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, state: &GuiState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn update(&self, update_fn: impl FnOnce(&mut GuiState)) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        update_fn(&mut state);
        if let Err(e) = self.save(&state) {
            log::warn!("Failed to persist GUI state to {}: {:#}", self.path.display(), e);
        }
    }
}

impl GuiStateRepository for JsonGuiStateRepository {
    fn load_screenlock_state(&self) -> bool {
        self.snapshot().screenlock_enabled
    }

    fn store_screenlock_state(&self, enabled: bool) {
        self.update(|s| s.screenlock_enabled = enabled);
    }

    fn screenlock_message_shown(&self) -> bool {
        self.snapshot().screenlock_message_shown
    }

    fn mark_screenlock_message_shown(&self) {
        self.update(|s| s.screenlock_message_shown = true);
    }

    fn show_raw_bg(&self) -> bool {
        self.snapshot().show_raw_bg
    }

    fn max_bg_displayed(&self) -> f64 {
        self.snapshot().max_bg_displayed
    }

    fn units(&self) -> Units {
        self.snapshot().units
    }
}
