// Settings persistence
use anyhow::{Context, Result};
use bzclient_core::ClientInfo;
use bzclient_render::gl::ShadowSettings;
use bzclient_render::pass::{ScreenConfig, WindowGeometry, DEFAULT_MAX_ATTRIB_DEPTH};
use bzclient_render::RenderContext;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub max_attrib_depth: i32,
    pub screen: ScreenConfig,
    pub window: WindowGeometry,
    pub shadows: ShadowSettings,
    pub scripts: Vec<ScriptEntry>,
}

/// A script to load at startup, with the registration it gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub path: PathBuf,
    pub name: String,
    pub script_id: i32,
    #[serde(default)]
    pub game_state_order: Option<i32>,
    #[serde(default)]
    pub draw_world_order: Option<i32>,
    #[serde(default)]
    pub draw_screen_order: Option<i32>,
    #[serde(default)]
    pub full_read: bool,
    #[serde(default)]
    pub game_ctrl: bool,
    #[serde(default)]
    pub input_ctrl: bool,
}

impl ScriptEntry {
    /// Orders left out of the config fall back to the script id.
    pub fn client_info(&self) -> ClientInfo {
        let mut info = ClientInfo::new(self.name.clone(), self.script_id);
        if let Some(order) = self.game_state_order {
            info.game_state_order = order;
        }
        if let Some(order) = self.draw_world_order {
            info.draw_world_order = order;
        }
        if let Some(order) = self.draw_screen_order {
            info.draw_screen_order = order;
        }
        info.full_read = self.full_read;
        info.game_ctrl = self.game_ctrl;
        info.input_ctrl = self.input_ctrl;
        info
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attrib_depth: DEFAULT_MAX_ATTRIB_DEPTH,
            screen: ScreenConfig::default(),
            window: WindowGeometry::default(),
            shadows: ShadowSettings::default(),
            scripts: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("bzclient");
        path.push("config.json");
        path
    }

    /// Load from the user config directory, or defaults when there is no file.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ClientConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Push the pass limits and view setup into a render context.
    pub fn apply(&self, render: &RenderContext) {
        let pass = render.pass();
        pass.set_max_attrib_depth(self.max_attrib_depth);
        pass.config_screen(self.screen.width, self.screen.distance);
        pass.set_window(self.window);
        pass.set_shadow_settings(self.shadows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{
            "max_attrib_depth": 4,
            "scripts": [
                { "path": "radar.lua", "name": "radar", "script_id": 300,
                  "draw_screen_order": 10, "input_ctrl": true }
            ]
        }"#;
        let config: ClientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_attrib_depth, 4);
        assert_eq!(config.screen, ScreenConfig::default());
        assert_eq!(config.shadows, ShadowSettings::default());

        let info = config.scripts[0].client_info();
        assert_eq!(info.name, "radar");
        assert_eq!(info.game_state_order, 300);
        assert_eq!(info.draw_world_order, 300);
        assert_eq!(info.draw_screen_order, 10);
        assert!(info.input_ctrl);
        assert!(!info.full_read);
    }
}
