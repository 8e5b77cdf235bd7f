//! Particle system configuration files.
//!
//! A [`ParticleSystemConfig`] is saved either as pretty JSON through serde,
//! or as a binary data block through [`DataBlockSerializable`]. JSON keeps
//! every operand of every parameter; the binary form keeps only the operands
//! each parameter's mode uses.

use crate::data_block::DataBlock;
use crate::error::ConfigError;
use crate::main_module::MainModule;
use crate::particles::Particles;
use crate::seeds::ParticleSeeds;
use crate::serialization::DataBlockSerializable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_duration() -> f32 {
    5.0
}

fn default_looped() -> bool {
    true
}

/// Complete particle system configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParticleSystemConfig {
    pub name: String,
    /// Length of one emitter cycle in seconds. Spawn parameters are sampled
    /// at the elapsed fraction of this cycle.
    #[serde(default = "default_duration")]
    pub duration: f32,
    #[serde(default = "default_looped")]
    pub looped: bool,
    /// Hard cap on alive particles, enforced by the pool from
    /// [`ParticleSystemConfig::particles`].
    pub max_particles: u32,
    /// Seed of the per-particle random table.
    #[serde(default)]
    pub seed: u32,
    #[serde(default)]
    pub main: MainModule,
}

impl Default for ParticleSystemConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".into(),
            duration: default_duration(),
            looped: default_looped(),
            max_particles: 1000,
            seed: 0,
            main: MainModule::default(),
        }
    }
}

impl ParticleSystemConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Save the configuration as a binary data block file.
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let mut block = DataBlock::new();
        self.to_data_block(&mut block);
        fs::write(path, block.to_bytes()?)?;
        Ok(())
    }

    /// Load a configuration from a binary data block file.
    pub fn load_binary(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let block = DataBlock::from_bytes(&bytes)?;
        let mut config = Self::default();
        config.load_from_data_block(&block);
        log::debug!("Loaded particle system '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Random table for this system's particles.
    pub fn seeds(&self) -> ParticleSeeds {
        ParticleSeeds::new(u64::from(self.seed))
    }

    /// Empty particle pool capped at `max_particles`.
    pub fn particles(&self) -> Particles {
        Particles::with_max_count(self.max_particles as usize)
    }

    /// Normalized emitter time for `elapsed` seconds, wrapping when looped.
    ///
    /// A non-looped system saturates at 1.
    pub fn emitter_time_percent(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        if self.looped {
            elapsed.rem_euclid(self.duration) / self.duration
        } else {
            (elapsed / self.duration).min(1.0)
        }
    }
}

impl DataBlockSerializable for ParticleSystemConfig {
    fn load_from_data_block(&mut self, block: &DataBlock) -> bool {
        self.name = block.get_string("name").to_owned();
        self.duration = block.get_f32_or("duration", default_duration());
        self.looped = block.get_bool_or("looped", default_looped());
        self.max_particles = block.get_u32("maxParticles");
        self.seed = block.get_u32("seed");
        if let Some(main) = block.get_data_block("main") {
            self.main.load_from_data_block(main);
        }
        true
    }

    fn to_data_block(&self, block: &mut DataBlock) {
        block.set_string("name", self.name.as_str());
        block.set_f32("duration", self.duration);
        block.set_bool("looped", self.looped);
        block.set_u32("maxParticles", self.max_particles);
        block.set_u32("seed", self.seed);
        self.main.to_data_block(block.data_block_mut("main"));
    }
}
