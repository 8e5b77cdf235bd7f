//! # Particle Params - sampled particle system parameters
//!
//! Tunable particle values (lifetimes, sizes, speeds, colors) that are
//! produced under a selectable sampling mode, persisted to JSON and to a
//! compact binary block format, and sampled on demand.
//!
//! ## Quick Start
//!
//! ```
//! use particle_params::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//!
//! // Size shrinks from 1 to 0 over the particle's life
//! let size = ParameterF32::curve(AnimationCurve::linear10());
//! assert_eq!(size.sample(0.25, &mut rng), 0.75);
//!
//! // Each particle fades between two random tints
//! let color = ParameterColor::random_between_colors(Vec4::new(1.0, 0.5, 0.0, 1.0), Vec4::ONE);
//! let tint = color.sample(0.0, &mut rng);
//! assert!(tint.y >= 0.5 && tint.y <= 1.0);
//! ```
//!
//! ## Core Concepts
//!
//! ### Sampling modes
//!
//! | Scalar | Color | Sample at time `t` |
//! |--------|-------|--------------------|
//! | `None` | `None` | `0.0` / transparent black |
//! | `Constant` | `Color` | operand 0 |
//! | `Curve` | `Gradient` | track 0 at `t` |
//! | `RandomBetweenConstants` | `RandomBetweenColors` | random blend of operands 0 and 1 |
//! | `RandomBetweenCurves` | `RandomBetweenGradients` | random blend of both tracks at `t` |
//!
//! Tracks are [`AnimationCurve`]s for scalars and [`ColorGradient`]s for
//! colors. Switching modes never discards operands.
//!
//! ### Randomness
//!
//! [`Parameter::sample`] draws a new fraction from any [`rand::Rng`] per
//! call. [`Parameter::sample_seeded`] reads a stable fraction from a
//! [`ParticleSeeds`] table instead, so a particle's random blend stays the
//! same over its lifetime.
//!
//! ### Persistence
//!
//! | Format | Trait | Writes |
//! |--------|-------|--------|
//! | JSON | [`JsonValueSerializable`], serde | every field |
//! | Binary data block | [`DataBlockSerializable`] | mode plus the operands it uses |
//!
//! ### Particles
//!
//! [`MainModule`] drives a struct-of-arrays [`Particles`] pool from these
//! parameters: spawn values, over-lifetime modules and the emission rate.

pub mod config;
pub mod curve;
pub mod data_block;
pub mod error;
pub mod gradient;
pub mod main_module;
pub mod parameter;
pub mod particles;
pub mod seeds;
pub mod serialization;

pub use config::ParticleSystemConfig;
pub use curve::AnimationCurve;
pub use data_block::DataBlock;
pub use error::{ConfigError, DataBlockError};
pub use glam::{Vec3, Vec4};
pub use gradient::ColorGradient;
pub use main_module::{EmissionState, MainModule};
pub use parameter::{
    ColorSamplingMode, F32SamplingMode, Parameter, ParameterColor, ParameterF32, SamplingMode,
    SamplingPolicy,
};
pub use particles::Particles;
pub use seeds::ParticleSeeds;
pub use serialization::{DataBlockSerializable, JsonValueSerializable};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```
/// use particle_params::prelude::*;
/// ```
///
/// This imports:
/// - [`ParameterF32`], [`ParameterColor`] and their sampling modes
/// - [`AnimationCurve`], [`ColorGradient`] - the tracks
/// - [`DataBlock`] and the two persistence traits
/// - [`MainModule`], [`Particles`], [`ParticleSeeds`] - the particle consumer
/// - [`Vec3`], [`Vec4`] - glam vector types
pub mod prelude {
    pub use crate::config::ParticleSystemConfig;
    pub use crate::curve::AnimationCurve;
    pub use crate::data_block::DataBlock;
    pub use crate::gradient::ColorGradient;
    pub use crate::main_module::{
        EmissionState, MainModule, OverLifetimeModule, VelocityOverLifetimeModule,
    };
    pub use crate::parameter::{ColorSamplingMode, F32SamplingMode, ParameterColor, ParameterF32};
    pub use crate::particles::Particles;
    pub use crate::seeds::ParticleSeeds;
    pub use crate::serialization::{DataBlockSerializable, JsonValueSerializable};
    pub use crate::{Vec3, Vec4};
}
