//! Settings persisted in the browser's localStorage.

use serde::{Deserialize, Serialize};
use krishi_types::{config::ClientConfig, wire::FarmContext};

const SETTINGS_STORAGE_KEY: &str = "krishi:settings";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredSettings {
    pub config: ClientConfig,
    #[serde(default)]
    pub farm: FarmContext,
}

impl StoredSettings {
    /// Saved settings, or defaults. A missing user id is generated once.
    pub fn load() -> Self {
        let mut settings = read().unwrap_or_default();
        // The endpoint is fixed at build time, not a user setting
        settings.config.api_base = ClientConfig::default().api_base;
        if settings.config.user_id.is_empty() {
            settings.config.user_id = format!("farmer-{}", uuid::Uuid::new_v4());
            log::info!("Generated user id {}", settings.config.user_id);
            settings.save();
        }
        settings
    }

    pub fn save(&self) {
        let Some(storage) = local_storage() else {
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(SETTINGS_STORAGE_KEY, &json).is_err() {
                    log::warn!("Could not write settings to localStorage");
                }
            }
            Err(e) => log::warn!("Could not serialize settings: {}", e),
        }
    }
}

fn read() -> Option<StoredSettings> {
    let json = local_storage()?.get_item(SETTINGS_STORAGE_KEY).ok()??;
    match serde_json::from_str(&json) {
        Ok(settings) => {
            log::info!("Settings restored from localStorage");
            Some(settings)
        }
        Err(e) => {
            log::warn!("Ignoring stored settings: {}", e);
            None
        }
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    gloo_utils::window().local_storage().ok().flatten()
}
