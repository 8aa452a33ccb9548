// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Processing configuration.
//!
//! All tunable parameters of the pipeline live here and are threaded
//! explicitly into the components that use them; nothing reads settings
//! ambiently from inside the merge or combine engines.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunable parameters for stem-to-MIDI processing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProcessingConfig {
    /// Maximum gap in seconds between same-pitch notes for them to be
    /// merged into one sustained note
    #[serde(default = "default_merge_note_gap")]
    pub merge_note_gap_seconds: f64,
    /// Velocity applied uniformly to every note after merging (0-127)
    #[serde(default = "default_uniform_velocity")]
    pub uniform_velocity: u8,
    /// General MIDI program applied uniformly to every track (0-127,
    /// 0 = Acoustic Grand Piano)
    #[serde(default = "default_uniform_instrument")]
    pub uniform_instrument: u8,
}

fn default_merge_note_gap() -> f64 {
    0.08
}
fn default_uniform_velocity() -> u8 {
    80
}
fn default_uniform_instrument() -> u8 {
    0
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            merge_note_gap_seconds: default_merge_note_gap(),
            uniform_velocity: default_uniform_velocity(),
            uniform_instrument: default_uniform_instrument(),
        }
    }
}

impl ProcessingConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !self.merge_note_gap_seconds.is_finite() || self.merge_note_gap_seconds < 0.0 {
            anyhow::bail!(
                "merge_note_gap_seconds must be finite and >= 0, got {}",
                self.merge_note_gap_seconds
            );
        }
        if self.uniform_velocity > 127 {
            anyhow::bail!(
                "uniform_velocity must be 0-127, got {}",
                self.uniform_velocity
            );
        }
        if self.uniform_instrument > 127 {
            anyhow::bail!(
                "uniform_instrument must be 0-127, got {}",
                self.uniform_instrument
            );
        }
        Ok(())
    }
}
