//! Trusted rendering defaults.
//!
//! The defaults balance scan reliability with room for a centered logo:
//!
//! - ECC `H` when overlaying logos.
//! - A border of 3–4 modules gives scanners enough quiet zone; 5 is the default.
//! - PNG scale of 12 or more is safe for print.
//! - A logo fraction of 0.18–0.25 of the QR width is generally safe.
//!
//! A JSON file may override any subset of fields. The configuration is read
//! once at startup and passed by reference afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::geometry::{checked_image_side, MAX_IMAGE_SIDE_PX};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "BRANDQR_CONFIG";

/// Config file looked up in the working directory when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "brandqr.json";

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EccLevel {
    #[serde(alias = "l")]
    L,
    #[serde(alias = "m")]
    M,
    #[serde(alias = "q")]
    Q,
    #[serde(alias = "h")]
    H,
}

impl FromStr for EccLevel {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" => Ok(EccLevel::L),
            "m" => Ok(EccLevel::M),
            "q" => Ok(EccLevel::Q),
            "h" => Ok(EccLevel::H),
            other => Err(RenderError::InvalidInput(format!(
                "ecc must be one of l, m, q, h (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for EccLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EccLevel::L => "L",
            EccLevel::M => "M",
            EccLevel::Q => "Q",
            EccLevel::H => "H",
        };
        f.write_str(s)
    }
}

/// Rendering defaults plus the input/output directory conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ecc: EccLevel,
    /// Quiet zone width in modules.
    pub border: u32,
    /// Pixels per module.
    pub scale: u32,
    /// Logo width as a fraction of the image width. `0` disables the logo.
    pub logo_frac: f64,
    /// Draw a white rounded pad behind the logo for contrast.
    pub pad_logo: bool,
    pub pad_radius: u32,
    pub pad_margin_px: u32,
    /// Directory the shell lists logo candidates from.
    pub data_dir: PathBuf,
    /// Directory generated images are written to.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ecc: EccLevel::H,
            border: 5,
            scale: 14,
            logo_frac: 0.22,
            pad_logo: true,
            pad_radius: 18,
            pad_margin_px: 10,
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Config {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| RenderError::InvalidInput(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| RenderError::filesystem(path, e))?;
        Self::from_json(&json)
    }

    /// Loads the config named by `BRANDQR_CONFIG`, else `brandqr.json` if it
    /// exists, else the defaults. An empty `BRANDQR_CONFIG` counts as unset.
    pub fn load() -> Result<Self> {
        match config_path(std::env::var(CONFIG_ENV).ok(), Path::new(DEFAULT_CONFIG_FILE)) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(RenderError::InvalidInput("scale must be greater than 0".into()));
        }
        if checked_image_side(21, self.border, self.scale).is_none() {
            return Err(RenderError::InvalidInput(format!(
                "border {} and scale {} exceed {MAX_IMAGE_SIDE_PX}px",
                self.border, self.scale
            )));
        }
        if self.pad_margin_px > MAX_IMAGE_SIDE_PX {
            return Err(RenderError::InvalidInput(format!(
                "pad_margin_px must be at most {MAX_IMAGE_SIDE_PX} (got {})",
                self.pad_margin_px
            )));
        }
        if !(0.0..1.0).contains(&self.logo_frac) {
            return Err(RenderError::InvalidInput(format!(
                "logo_frac must be in [0, 1) (got {})",
                self.logo_frac
            )));
        }
        Ok(())
    }
}

/// Picks the config file: a non-blank env value wins, then `local` if it is a
/// file.
fn config_path(env_value: Option<String>, local: &Path) -> Option<PathBuf> {
    match env_value {
        Some(v) if !v.trim().is_empty() => Some(PathBuf::from(v)),
        _ => local.is_file().then(|| local.to_path_buf()),
    }
}
