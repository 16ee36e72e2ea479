//! Persisted plot settings.
//!
//! Stored as YAML with the keys `XAxisLabel`, `YAxisLabel`, `TitleLabel` and
//! `AutoMinMax` (0/1). Missing files and missing keys fall back to defaults.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTINGS_FILE: &str = "histplot_settings.yaml";

pub const KEYS: [&str; 4] = ["XAxisLabel", "YAxisLabel", "TitleLabel", "AutoMinMax"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "XAxisLabel")]
    pub x_axis_label: String,
    #[serde(rename = "YAxisLabel")]
    pub y_axis_label: String,
    #[serde(rename = "TitleLabel")]
    pub title_label: String,
    #[serde(rename = "AutoMinMax", with = "flag")]
    pub auto_min_max: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            x_axis_label: "X Label".to_string(),
            y_axis_label: "Y Label".to_string(),
            title_label: "Weighted Plot".to_string(),
            auto_min_max: true,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening settings file {path:?}"))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing settings file {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing settings")?;
        fs::write(path, serialized).with_context(|| format!("Writing settings file {path:?}"))
    }

    /// Applies a `Key=Value` assignment using the persisted key names.
    pub fn assign(&mut self, assignment: &str) -> Result<()> {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("Expected Key=Value, got '{assignment}'");
        };
        let value = value.trim();
        match key.trim() {
            "XAxisLabel" => self.x_axis_label = value.to_string(),
            "YAxisLabel" => self.y_axis_label = value.to_string(),
            "TitleLabel" => self.title_label = value.to_string(),
            "AutoMinMax" => self.auto_min_max = flag::parse(value)?,
            other => bail!(
                "Unknown setting '{other}' (expected one of {})",
                KEYS.join(", ")
            ),
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("XAxisLabel", self.x_axis_label.clone()),
            ("YAxisLabel", self.y_axis_label.clone()),
            ("TitleLabel", self.title_label.clone()),
            ("AutoMinMax", u8::from(self.auto_min_max).to_string()),
        ]
    }
}

mod flag {
    use anyhow::{Result, bail};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn parse(value: &str) -> Result<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => bail!("Expected 0 or 1 for AutoMinMax, got '{other}'"),
        }
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Bool(bool),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Ok(value != 0),
            Raw::Bool(value) => Ok(value),
            Raw::Text(text) => parse(&text).map_err(D::Error::custom),
        }
    }
}
