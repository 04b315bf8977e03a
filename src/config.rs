use crate::layout::clamp_ratio;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use x11rb::protocol::xproto::ModMask;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModKey {
    Super,
    Alt,
}

impl ModKey {
    pub fn mask(self) -> u16 {
        match self {
            ModKey::Super => u16::from(ModMask::M4),
            ModKey::Alt => u16::from(ModMask::M1),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub gap: u16,
    pub master_ratio: f32,
    pub master_ratio_step: f32,
    pub terminal: String,
    pub launcher: String,
    pub mod_key: ModKey,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gap: 10,
            master_ratio: 0.6,
            master_ratio_step: 0.05,
            terminal: "kitty".to_string(),
            launcher: "dmenu_run".to_string(),
            mod_key: ModKey::Super,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = dirs::config_dir()
            .map(|p| p.join("xwm").join("xwm.toml"))
            .unwrap_or_else(|| PathBuf::from("xwm.toml"));

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).unwrap_or_default();
            match Self::parse(&content) {
                Ok(cfg) => {
                    log::info!("Loaded config from {:?}", config_path);
                    cfg
                }
                Err(e) => {
                    log::error!("Failed to parse config: {}", e);
                    Self::default()
                }
            }
        } else {
            log::info!("Config not found at {:?}, using defaults", config_path);
            Self::default()
        };

        if std::env::var("XWM_MOD").unwrap_or_default().to_lowercase() == "alt" {
            config.mod_key = ModKey::Alt;
        }
        config
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        let clamped = clamp_ratio(config.master_ratio);
        if clamped != config.master_ratio {
            log::warn!(
                "master_ratio {} out of range, using {}",
                config.master_ratio,
                clamped
            );
            config.master_ratio = clamped;
        }
        Ok(config)
    }
}
