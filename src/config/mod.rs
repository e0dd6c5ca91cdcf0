//! Display settings
//!
//! Loads TOML configuration files and provides display setup parameters.
//! Default config path: ~/.config/eglboot/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::path::PathBuf;
use std::ptr::NonNull;

use crate::constants::{GB, KB, MB};
use crate::error::Error;

/// Which setup path to run before EGL initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Plain EGL bound to a host window
    Desktop,
    /// Piglet runtime: module load, compositor budget, shader compiler patch
    Orbis,
}

impl Default for PlatformKind {
    fn default() -> Self {
        if cfg!(feature = "orbis") {
            Self::Orbis
        } else {
            Self::Desktop
        }
    }
}

/// Memory budget handed to the compositor and Piglet (bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryBudget {
    /// System shared memory
    #[serde(deserialize_with = "deserialize_size")]
    pub system_shared: u64,
    /// Video shared memory
    #[serde(deserialize_with = "deserialize_size")]
    pub video_shared: u64,
    /// Maximum mapped flexible memory
    #[serde(deserialize_with = "deserialize_size")]
    pub flexible: u64,
    /// Video private memory (0 = leave the compositor alone)
    #[serde(deserialize_with = "deserialize_size")]
    pub video_private: u64,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self {
            system_shared: 2 * MB,
            video_shared: 36 * MB,
            flexible: 170 * MB,
            video_private: 0,
        }
    }
}

/// Display setup parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Setup path
    pub platform: PlatformKind,
    /// Host window handle (desktop only, never serialized)
    #[serde(skip)]
    pub window: Option<NonNull<c_void>>,
    /// Rendering width
    pub width: u32,
    /// Rendering height
    pub height: u32,
    /// When false, the shader compiler only loads on already privileged processes.
    /// When true, the process is elevated to patch the compiler in.
    pub force_shader_compiler: bool,
    /// Memory budget (Orbis only)
    pub memory: MemoryBudget,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            platform: PlatformKind::default(),
            window: None,
            width: 1920,
            height: 1080,
            memory: MemoryBudget::default(),
            force_shader_compiler: false,
        }
    }
}

/// Size deserializer: accepts a byte count or a string like "256MB"
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct SizeVisitor;

    impl<'de> Visitor<'de> for SizeVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a byte count or a size string such as \"256MB\"")
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(value).map_err(|_| E::custom("size must not be negative"))
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_size(value).ok_or_else(|| E::custom(format!("invalid size: {:?}", value)))
        }
    }

    deserializer.deserialize_any(SizeVisitor)
}

/// Parse "512", "64KB", "256MB", "1GB" (case-insensitive, optional space)
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits.parse().ok()?;
    let scale = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => KB,
        "M" | "MB" => MB,
        "G" | "GB" => GB,
        _ => return None,
    };
    value.checked_mul(scale)
}

impl DisplaySettings {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/eglboot/config.toml";

    /// Settings for a host window (desktop)
    pub fn for_window(window: NonNull<c_void>, width: u32, height: u32) -> Self {
        Self {
            platform: PlatformKind::Desktop,
            window: Some(window),
            width,
            height,
            ..Self::default()
        }
    }

    /// Settings for the Piglet runtime
    pub fn for_orbis(width: u32, height: u32, memory: MemoryBudget) -> Self {
        Self {
            platform: PlatformKind::Orbis,
            window: None,
            width,
            height,
            memory,
            force_shader_compiler: false,
        }
    }

    /// Reject sizes EGL cannot create a surface for
    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Candidate config files, highest priority first
    fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = std::env::var_os("EGLBOOT_CONFIG")
            .map(PathBuf::from)
            .into_iter()
            .collect();
        candidates.extend(dirs::config_dir().map(|dir| dir.join("eglboot").join("config.toml")));
        candidates.push(PathBuf::from(Self::SYSTEM_CONFIG_PATH));
        candidates
    }

    /// First existing candidate; None means built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        Self::candidate_paths().into_iter().find(|path| path.exists())
    }

    /// Load from the first existing of `EGLBOOT_CONFIG`,
    /// ~/.config/eglboot/config.toml and /etc/eglboot/config.toml.
    /// A file that fails to parse falls back to the built-in defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            info!("No config file, using built-in defaults");
            return Self::default();
        };
        Self::load_from_file(&path)
            .map(|settings| {
                info!("Loaded config: {}", path.display());
                settings
            })
            .unwrap_or_else(|e| {
                warn!("Failed to load config {}: {:#}, using built-in defaults", path.display(), e);
                Self::default()
            })
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: DisplaySettings = toml::from_str(content)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512"), Some(512));
        assert_eq!(parse_size("64KB"), Some(64 * KB));
        assert_eq!(parse_size("256MB"), Some(256 * MB));
        assert_eq!(parse_size("256 mb"), Some(256 * MB));
        assert_eq!(parse_size("1G"), Some(GB));
        assert_eq!(parse_size("12TB"), None);
        assert_eq!(parse_size("MB"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn test_from_toml() {
        let settings = DisplaySettings::from_toml(
            r#"
            platform = "orbis"
            width = 1280
            height = 720
            force_shader_compiler = true

            [memory]
            video_shared = "100MB"
            video_private = 52428800
            "#,
        )
        .unwrap();

        assert_eq!(settings.platform, PlatformKind::Orbis);
        assert_eq!((settings.width, settings.height), (1280, 720));
        assert!(settings.force_shader_compiler);
        assert_eq!(settings.memory.video_shared, 100 * MB);
        assert_eq!(settings.memory.video_private, 50 * MB);
        // untouched fields keep their defaults
        assert_eq!(settings.memory.system_shared, 2 * MB);
        assert!(settings.window.is_none());
    }

    #[test]
    fn test_bad_size_rejected() {
        assert!(DisplaySettings::from_toml("[memory]\nflexible = \"lots\"").is_err());
        assert!(DisplaySettings::from_toml("[memory]\nflexible = -1").is_err());
    }

    #[test]
    fn test_candidate_order() {
        let candidates = DisplaySettings::candidate_paths();
        assert_eq!(
            candidates.last().map(PathBuf::as_path),
            Some(std::path::Path::new("/etc/eglboot/config.toml"))
        );
        if let Some(user) = dirs::config_dir() {
            assert!(candidates.contains(&user.join("eglboot").join("config.toml")));
        }
    }

    #[test]
    fn test_validate() {
        assert!(DisplaySettings::default().validate().is_ok());
        let settings = DisplaySettings::for_orbis(0, 720, MemoryBudget::default());
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidSize { width: 0, height: 720 })
        ));
    }
}
