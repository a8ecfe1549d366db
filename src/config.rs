//! Configuration management for PDF Compress Server

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default upload ceiling: 20MB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Default bound on a single Ghostscript run
pub const DEFAULT_COMPRESSOR_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub compressor: CompressorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for the companion upload page
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Scratch directory for incoming uploads and compressed output
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompressorConfig {
    /// Ghostscript executable, either a bare name resolved via PATH or a full path
    pub binary: PathBuf,
    pub preset: PdfPreset,
    pub compatibility_level: String,
    pub timeout_secs: u64,
}

impl CompressorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Ghostscript `-dPDFSETTINGS` presets, trading size against fidelity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfPreset {
    /// 72 dpi images, smallest output
    Screen,
    /// 150 dpi images, medium quality
    Ebook,
    /// 300 dpi images
    Printer,
    /// Color-preserving 300 dpi
    Prepress,
    Default,
}

impl PdfPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfPreset::Screen => "screen",
            PdfPreset::Ebook => "ebook",
            PdfPreset::Printer => "printer",
            PdfPreset::Prepress => "prepress",
            PdfPreset::Default => "default",
        }
    }
}

impl fmt::Display for PdfPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PdfPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('/').to_ascii_lowercase().as_str() {
            "screen" => Ok(PdfPreset::Screen),
            "ebook" => Ok(PdfPreset::Ebook),
            "printer" => Ok(PdfPreset::Printer),
            "prepress" => Ok(PdfPreset::Prepress),
            "default" => Ok(PdfPreset::Default),
            _ => Err(ConfigError::Invalid {
                key: "GS_PDF_SETTINGS",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

fn default_binary() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("gswin64c")
    } else {
        PathBuf::from("gs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                static_dir: PathBuf::from("public"),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            compressor: CompressorConfig {
                binary: default_binary(),
                preset: PdfPreset::Ebook,
                compatibility_level: "1.4".to_string(),
                timeout_secs: DEFAULT_COMPRESSOR_TIMEOUT_SECS,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults
    /// for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let port = match lookup("SERVER_PORT").or_else(|| lookup("PORT")) {
            Some(value) => parse_number("SERVER_PORT", &value)?,
            None => defaults.server.port,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(value) => parse_number("MAX_UPLOAD_BYTES", &value)?,
            None => defaults.storage.max_upload_bytes,
        };

        let timeout_secs = match lookup("GS_TIMEOUT_SECS") {
            Some(value) => match parse_number::<u64>("GS_TIMEOUT_SECS", &value)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        key: "GS_TIMEOUT_SECS",
                        value,
                    })
                }
                secs => secs,
            },
            None => defaults.compressor.timeout_secs,
        };

        let preset = match lookup("GS_PDF_SETTINGS") {
            Some(value) => value.parse()?,
            None => defaults.compressor.preset,
        };

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
                static_dir: lookup("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.server.static_dir),
            },
            storage: StorageConfig {
                upload_dir: lookup("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                max_upload_bytes,
            },
            compressor: CompressorConfig {
                binary: lookup("GS_BINARY")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.compressor.binary),
                preset,
                compatibility_level: lookup("GS_COMPATIBILITY_LEVEL")
                    .unwrap_or(defaults.compressor.compatibility_level),
                timeout_secs,
            },
        })
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
