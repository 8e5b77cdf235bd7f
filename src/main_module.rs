//! Main particle module: spawn values, over-lifetime modules and emission.
//!
//! [`MainModule`] is the CPU-side consumer of [`ParameterF32`] and
//! [`ParameterColor`]. Spawn values are sampled at the emitter's normalized
//! time, over-lifetime modules at each particle's normalized age.
//!
//! All sampling goes through [`ParticleSeeds`], so a particle's random blend
//! is stable over its lifetime. Each parameter channel offsets the particle
//! seed by its own salt, otherwise every random parameter of one particle
//! would land on the same fraction (big particles always long-lived, etc).
//!
//! # Example
//!
//! ```
//! use particle_params::config::ParticleSystemConfig;
//! use particle_params::main_module::EmissionState;
//! use particle_params::parameter::ParameterF32;
//! use rand::SeedableRng;
//!
//! let mut config = ParticleSystemConfig {
//!     max_particles: 4,
//!     ..Default::default()
//! };
//! config.main.emission.emission_per_second = ParameterF32::constant(10.0);
//! config.main.lifetime = ParameterF32::constant(2.0);
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(3);
//! let seeds = config.seeds();
//! let mut particles = config.particles();
//! let mut state = EmissionState::default();
//!
//! // 5 are due after half a second, the pool holds 4
//! let emitted = config.main.step(&mut particles, &mut state, &mut rng, &seeds, 0.0, 0.5);
//! assert_eq!(emitted, 4);
//! assert_eq!(particles.life()[0].current, 1.5);
//! ```

use crate::data_block::DataBlock;
use crate::parameter::{ParameterColor, ParameterF32};
use crate::particles::Particles;
use crate::seeds::ParticleSeeds;
use crate::serialization::DataBlockSerializable;
use glam::{Vec3, Vec4};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

// Seed salts, one per sampled channel.
const SALT_LIFETIME: u32 = 0;
const SALT_SIZE: u32 = 101;
const SALT_ROTATION: u32 = 211;
const SALT_COLOR: u32 = 307;
const SALT_SPEED: u32 = 401;
const SALT_GRAVITY: u32 = 503;
const SALT_EMISSION: u32 = 601;
const SALT_SIZE_OVER_LIFETIME: u32 = 701;
const SALT_VELOCITY_X: u32 = 809;
const SALT_VELOCITY_Y: u32 = 907;
const SALT_VELOCITY_Z: u32 = 1009;
const SALT_VELOCITY_LIMIT: u32 = 1103;
const SALT_ROTATION_OVER_LIFETIME: u32 = 1201;
const SALT_COLOR_OVER_LIFETIME: u32 = 1301;

#[inline]
fn salted(seed: u32, salt: u32) -> u32 {
    seed.wrapping_add(salt)
}

/// Continuous emission settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionModule {
    pub enabled: bool,
    /// Particles per second, sampled at the emitter's normalized time.
    pub emission_per_second: ParameterF32,
}

impl Default for EmissionModule {
    fn default() -> Self {
        Self {
            enabled: true,
            emission_per_second: ParameterF32::constant(10.0),
        }
    }
}

/// An optional module driven by one parameter over the particle's age.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverLifetimeModule<P: Default> {
    pub enabled: bool,
    pub parameter: P,
}

impl<P: Default> OverLifetimeModule<P> {
    pub fn enabled(parameter: P) -> Self {
        Self { enabled: true, parameter }
    }
}

/// Linear velocity added over the particle's age, one parameter per axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityOverLifetimeModule {
    pub enabled: bool,
    pub linear_x: ParameterF32,
    pub linear_y: ParameterF32,
    pub linear_z: ParameterF32,
}

/// Carry-over between emission steps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmissionState {
    /// Time not yet converted into particles, in seconds.
    pub accumulated_time: f32,
}

/// Spawn parameters plus the over-lifetime modules of a particle system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainModule {
    pub lifetime: ParameterF32,
    pub size: ParameterF32,
    pub rotation: ParameterF32,
    pub color: ParameterColor,
    pub speed: ParameterF32,
    pub gravity: ParameterF32,
    /// Direction the sampled gravity scales.
    pub gravity_axis: Vec3,
    pub emission: EmissionModule,
    pub size_over_lifetime: OverLifetimeModule<ParameterF32>,
    pub velocity_over_lifetime: VelocityOverLifetimeModule,
    pub velocity_limit_over_lifetime: OverLifetimeModule<ParameterF32>,
    pub rotation_over_lifetime: OverLifetimeModule<ParameterF32>,
    pub color_over_lifetime: OverLifetimeModule<ParameterColor>,
}

impl Default for MainModule {
    fn default() -> Self {
        Self {
            lifetime: ParameterF32::constant(5.0),
            size: ParameterF32::constant(1.0),
            rotation: ParameterF32::constant(0.0),
            color: ParameterColor::color(Vec4::ONE),
            speed: ParameterF32::constant(5.0),
            gravity: ParameterF32::constant(0.0),
            gravity_axis: Vec3::Y,
            emission: EmissionModule::default(),
            size_over_lifetime: OverLifetimeModule::default(),
            velocity_over_lifetime: VelocityOverLifetimeModule::default(),
            velocity_limit_over_lifetime: OverLifetimeModule::default(),
            rotation_over_lifetime: OverLifetimeModule::default(),
            color_over_lifetime: OverLifetimeModule::default(),
        }
    }
}

impl MainModule {
    /// Sample spawn values for the particles in `range`.
    ///
    /// Velocity is the particle's direction scaled by the sampled speed.
    pub fn update_initial(
        &self,
        particles: &mut Particles,
        range: Range<usize>,
        emitter_time_percent: f32,
        seeds: &ParticleSeeds,
    ) {
        let t = emitter_time_percent;

        for i in range.clone() {
            let seed = particles.seeds()[i];
            let value = self.lifetime.sample_seeded(salted(seed, SALT_LIFETIME), t, seeds);
            let life = &mut particles.life_mut()[i];
            life.initial = value;
            life.current = value;
            life.scalar = 0.0;
        }

        for i in range.clone() {
            let seed = particles.seeds()[i];
            let value = self.size.sample_seeded(salted(seed, SALT_SIZE), t, seeds);
            let size = &mut particles.size_mut()[i];
            size.initial = value;
            size.current = value;
        }

        for i in range.clone() {
            let seed = particles.seeds()[i];
            let value = self.rotation.sample_seeded(salted(seed, SALT_ROTATION), t, seeds);
            let rotation = &mut particles.rotation_mut()[i];
            rotation.initial = value;
            rotation.current = value;
        }

        for i in range.clone() {
            let seed = particles.seeds()[i];
            let value = self.color.sample_seeded(salted(seed, SALT_COLOR), t, seeds);
            particles.color_initial_mut()[i] = value;
            particles.color_current_mut()[i] = value;
        }

        for i in range {
            let seed = particles.seeds()[i];
            let speed = self.speed.sample_seeded(salted(seed, SALT_SPEED), t, seeds);
            let gravity = self.gravity.sample_seeded(salted(seed, SALT_GRAVITY), t, seeds);
            let direction = particles.direction()[i];
            let movement = &mut particles.movement_mut()[i];
            movement.velocity = direction * speed;
            movement.acceleration = self.gravity_axis * gravity;
        }
    }

    /// Advance the particles in `range` by `dt` seconds.
    ///
    /// Ages the particles, applies the enabled over-lifetime modules and
    /// integrates motion. Dead particles are left in place for
    /// [`Particles::kill_dead`].
    pub fn update_lifetime(
        &self,
        particles: &mut Particles,
        range: Range<usize>,
        dt: f32,
        seeds: &ParticleSeeds,
    ) {
        for life in &mut particles.life_mut()[range.clone()] {
            life.current -= dt;
            life.scalar = if life.initial > 0.0 {
                (1.0 - life.current / life.initial).clamp(0.0, 1.0)
            } else {
                1.0
            };
        }

        if self.size_over_lifetime.enabled {
            let parameter = &self.size_over_lifetime.parameter;
            for i in range.clone() {
                let seed = particles.seeds()[i];
                let t = particles.life()[i].scalar;
                let seed = salted(seed, SALT_SIZE_OVER_LIFETIME);
                let value = parameter.sample_seeded(seed, t, seeds);
                let size = &mut particles.size_mut()[i];
                size.current = size.initial * value;
            }
        }

        if self.velocity_over_lifetime.enabled {
            let module = &self.velocity_over_lifetime;
            for i in range.clone() {
                let seed = particles.seeds()[i];
                let t = particles.life()[i].scalar;
                let value = Vec3::new(
                    module.linear_x.sample_seeded(salted(seed, SALT_VELOCITY_X), t, seeds),
                    module.linear_y.sample_seeded(salted(seed, SALT_VELOCITY_Y), t, seeds),
                    module.linear_z.sample_seeded(salted(seed, SALT_VELOCITY_Z), t, seeds),
                );
                particles.movement_mut()[i].velocity += value * dt;
            }
        }

        if self.velocity_limit_over_lifetime.enabled {
            let parameter = &self.velocity_limit_over_lifetime.parameter;
            for i in range.clone() {
                let seed = particles.seeds()[i];
                let t = particles.life()[i].scalar;
                let limit = parameter.sample_seeded(salted(seed, SALT_VELOCITY_LIMIT), t, seeds);
                let movement = &mut particles.movement_mut()[i];
                let speed = movement.velocity.length();
                if speed > limit && speed > 0.0 {
                    movement.velocity *= limit.max(0.0) / speed;
                }
            }
        }

        if self.rotation_over_lifetime.enabled {
            let parameter = &self.rotation_over_lifetime.parameter;
            for i in range.clone() {
                let seed = particles.seeds()[i];
                let t = particles.life()[i].scalar;
                let seed = salted(seed, SALT_ROTATION_OVER_LIFETIME);
                let value = parameter.sample_seeded(seed, t, seeds);
                particles.rotation_mut()[i].current += value * dt;
            }
        }

        if self.color_over_lifetime.enabled {
            let parameter = &self.color_over_lifetime.parameter;
            for i in range.clone() {
                let seed = particles.seeds()[i];
                let t = particles.life()[i].scalar;
                let seed = salted(seed, SALT_COLOR_OVER_LIFETIME);
                let value = parameter.sample_seeded(seed, t, seeds);
                let initial = particles.color_initial()[i];
                particles.color_current_mut()[i] = initial * value;
            }
        }

        for i in range {
            let movement = &mut particles.movement_mut()[i];
            movement.velocity += movement.acceleration * dt;
            let velocity = movement.velocity;
            particles.position_mut()[i] += velocity * dt;
        }
    }

    /// Number of particles to emit this step, at most `max_count`.
    ///
    /// `dt` is added to the carried time, which is then converted into whole
    /// particles at the sampled rate. A zero rate drops the carried time; a
    /// negative time percent (emitter in its start delay) emits nothing.
    pub fn emission_count(
        &self,
        state: &mut EmissionState,
        seed: u32,
        emitter_time_percent: f32,
        dt: f32,
        max_count: usize,
        seeds: &ParticleSeeds,
    ) -> usize {
        if !self.emission.enabled || emitter_time_percent < 0.0 {
            return 0;
        }

        state.accumulated_time += dt;
        let rate = self
            .emission
            .emission_per_second
            .sample_seeded(salted(seed, SALT_EMISSION), emitter_time_percent, seeds);

        if rate > 0.0 {
            let count = ((state.accumulated_time * rate).floor() as usize).min(max_count);
            state.accumulated_time = (state.accumulated_time - count as f32 / rate).max(0.0);
            count
        } else {
            if rate == 0.0 {
                state.accumulated_time = 0.0;
            }
            0
        }
    }

    /// One simulation step: emit, initialize, age, then drop dead particles.
    ///
    /// Returns how many particles were emitted.
    pub fn step<R: Rng + ?Sized>(
        &self,
        particles: &mut Particles,
        state: &mut EmissionState,
        rng: &mut R,
        seeds: &ParticleSeeds,
        emitter_time_percent: f32,
        dt: f32,
    ) -> usize {
        let alive = 0..particles.len();
        self.update_lifetime(particles, alive, dt, seeds);
        particles.kill_dead();

        let seed = seeds.random_seed(rng);
        let max_count = particles.remaining();
        let count = self.emission_count(state, seed, emitter_time_percent, dt, max_count, seeds);
        let spawned = particles.emit(count, rng, seeds);
        let emitted = spawned.len();
        self.update_initial(particles, spawned.clone(), emitter_time_percent, seeds);
        self.update_lifetime(particles, spawned, dt, seeds);
        log::trace!("Emitted {} particles, {} alive", emitted, particles.len());
        emitted
    }
}

fn load_parameter<P: DataBlockSerializable>(block: &DataBlock, key: &str, parameter: &mut P) {
    if let Some(child) = block.get_data_block(key) {
        parameter.load_from_data_block(child);
    }
}

fn load_over_lifetime<P: Default + DataBlockSerializable>(
    block: &DataBlock,
    key: &str,
    module: &mut OverLifetimeModule<P>,
) {
    if let Some(child) = block.get_data_block(key) {
        module.enabled = child.get_bool("enabled");
        load_parameter(child, "parameter", &mut module.parameter);
    }
}

fn save_over_lifetime<P: Default + DataBlockSerializable>(
    block: &mut DataBlock,
    key: &str,
    module: &OverLifetimeModule<P>,
) {
    let child = block.data_block_mut(key);
    child.set_bool("enabled", module.enabled);
    module.parameter.to_data_block(child.data_block_mut("parameter"));
}

impl DataBlockSerializable for MainModule {
    fn load_from_data_block(&mut self, block: &DataBlock) -> bool {
        load_parameter(block, "lifetime", &mut self.lifetime);
        load_parameter(block, "size", &mut self.size);
        load_parameter(block, "rotation", &mut self.rotation);
        load_parameter(block, "color", &mut self.color);
        load_parameter(block, "speed", &mut self.speed);
        load_parameter(block, "gravity", &mut self.gravity);
        self.gravity_axis = block.get_vec3f_or("gravityAxis", Vec3::Y);

        if let Some(emission) = block.get_data_block("emission") {
            self.emission.enabled = emission.get_bool_or("enabled", true);
            load_parameter(emission, "emissionPerSecond", &mut self.emission.emission_per_second);
        }

        load_over_lifetime(block, "sizeOverLifetime", &mut self.size_over_lifetime);

        if let Some(velocity) = block.get_data_block("velocityOverLifetime") {
            let module = &mut self.velocity_over_lifetime;
            module.enabled = velocity.get_bool("enabled");
            load_parameter(velocity, "linearX", &mut module.linear_x);
            load_parameter(velocity, "linearY", &mut module.linear_y);
            load_parameter(velocity, "linearZ", &mut module.linear_z);
        }

        load_over_lifetime(
            block,
            "velocityLimitOverLifetime",
            &mut self.velocity_limit_over_lifetime,
        );
        load_over_lifetime(block, "rotationOverLifetime", &mut self.rotation_over_lifetime);
        load_over_lifetime(block, "colorOverLifetime", &mut self.color_over_lifetime);
        true
    }

    fn to_data_block(&self, block: &mut DataBlock) {
        self.lifetime.to_data_block(block.data_block_mut("lifetime"));
        self.size.to_data_block(block.data_block_mut("size"));
        self.rotation.to_data_block(block.data_block_mut("rotation"));
        self.color.to_data_block(block.data_block_mut("color"));
        self.speed.to_data_block(block.data_block_mut("speed"));
        self.gravity.to_data_block(block.data_block_mut("gravity"));
        block.set_vec3f("gravityAxis", self.gravity_axis);

        let emission = block.data_block_mut("emission");
        emission.set_bool("enabled", self.emission.enabled);
        self.emission
            .emission_per_second
            .to_data_block(emission.data_block_mut("emissionPerSecond"));

        save_over_lifetime(block, "sizeOverLifetime", &self.size_over_lifetime);

        let velocity = block.data_block_mut("velocityOverLifetime");
        let module = &self.velocity_over_lifetime;
        velocity.set_bool("enabled", module.enabled);
        module.linear_x.to_data_block(velocity.data_block_mut("linearX"));
        module.linear_y.to_data_block(velocity.data_block_mut("linearY"));
        module.linear_z.to_data_block(velocity.data_block_mut("linearZ"));

        save_over_lifetime(block, "velocityLimitOverLifetime", &self.velocity_limit_over_lifetime);
        save_over_lifetime(block, "rotationOverLifetime", &self.rotation_over_lifetime);
        save_over_lifetime(block, "colorOverLifetime", &self.color_over_lifetime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::AnimationCurve;
    use crate::gradient::ColorGradient;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spawn(module: &MainModule, count: usize) -> (Particles, ParticleSeeds) {
        let mut rng = StdRng::seed_from_u64(21);
        let seeds = ParticleSeeds::new(21);
        let mut particles = Particles::new();
        let range = particles.emit(count, &mut rng, &seeds);
        module.update_initial(&mut particles, range, 0.0, &seeds);
        (particles, seeds)
    }

    #[test]
    fn test_update_initial_samples_spawn_values() {
        let mut module = MainModule::default();
        module.lifetime = ParameterF32::constant(2.0);
        module.size = ParameterF32::constant(0.5);
        module.speed = ParameterF32::constant(3.0);
        module.gravity = ParameterF32::constant(-9.0);
        module.color = ParameterColor::color(Vec4::new(1.0, 0.0, 0.0, 1.0));

        let (particles, _) = spawn(&module, 2);
        for i in 0..2 {
            assert_eq!(particles.life()[i].initial, 2.0);
            assert_eq!(particles.life()[i].current, 2.0);
            assert_eq!(particles.size()[i].current, 0.5);
            assert_eq!(particles.color_current()[i], Vec4::new(1.0, 0.0, 0.0, 1.0));
            assert_eq!(particles.movement()[i].velocity, Vec3::new(0.0, 3.0, 0.0));
            assert_eq!(particles.movement()[i].acceleration, Vec3::new(0.0, -9.0, 0.0));
        }
    }

    #[test]
    fn test_random_spawn_values_are_stable_per_seed() {
        let mut module = MainModule::default();
        module.lifetime = ParameterF32::random_between_constants(1.0, 3.0);

        let (a, _) = spawn(&module, 16);
        let (b, _) = spawn(&module, 16);
        assert_eq!(a.life(), b.life());
        assert!(a.life().iter().all(|life| (1.0..=3.0).contains(&life.initial)));
    }

    #[test]
    fn test_update_lifetime_ages_and_integrates() {
        let mut module = MainModule::default();
        module.lifetime = ParameterF32::constant(2.0);
        module.speed = ParameterF32::constant(1.0);
        module.gravity = ParameterF32::constant(0.0);

        let (mut particles, seeds) = spawn(&module, 1);
        module.update_lifetime(&mut particles, 0..1, 0.5, &seeds);
        assert_eq!(particles.life()[0].current, 1.5);
        assert_eq!(particles.life()[0].scalar, 0.25);
        assert_eq!(particles.position()[0], Vec3::new(0.0, 0.5, 0.0));

        module.update_lifetime(&mut particles, 0..1, 5.0, &seeds);
        assert_eq!(particles.life()[0].scalar, 1.0);
        assert_eq!(particles.kill_dead(), 1);
    }

    #[test]
    fn test_over_lifetime_modules() {
        let mut module = MainModule::default();
        module.lifetime = ParameterF32::constant(1.0);
        module.size = ParameterF32::constant(2.0);
        module.speed = ParameterF32::constant(10.0);
        module.color = ParameterColor::color(Vec4::ONE);
        module.size_over_lifetime =
            OverLifetimeModule::enabled(ParameterF32::curve(AnimationCurve::linear10()));
        module.velocity_limit_over_lifetime =
            OverLifetimeModule::enabled(ParameterF32::constant(4.0));
        module.rotation_over_lifetime = OverLifetimeModule::enabled(ParameterF32::constant(2.0));
        let fade = ColorGradient::two_colors(Vec4::ONE, Vec4::ZERO);
        module.color_over_lifetime = OverLifetimeModule::enabled(ParameterColor::gradient(fade));

        let (mut particles, seeds) = spawn(&module, 1);
        module.update_lifetime(&mut particles, 0..1, 0.5, &seeds);

        assert_eq!(particles.size()[0].current, 1.0);
        assert_eq!(particles.movement()[0].velocity, Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(particles.rotation()[0].current, 1.0);
        assert_eq!(particles.color_current()[0], Vec4::splat(0.5));
    }

    #[test]
    fn test_velocity_over_lifetime_adds_per_axis() {
        let mut module = MainModule::default();
        module.speed = ParameterF32::constant(0.0);
        module.velocity_over_lifetime = VelocityOverLifetimeModule {
            enabled: true,
            linear_x: ParameterF32::constant(2.0),
            linear_y: ParameterF32::new(),
            linear_z: ParameterF32::constant(-4.0),
        };

        let (mut particles, seeds) = spawn(&module, 1);
        module.update_lifetime(&mut particles, 0..1, 0.5, &seeds);
        assert_eq!(particles.movement()[0].velocity, Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn test_emission_count_accumulates() {
        let mut module = MainModule::default();
        module.emission.emission_per_second = ParameterF32::constant(4.0);
        let seeds = ParticleSeeds::new(0);
        let mut state = EmissionState::default();

        assert_eq!(module.emission_count(&mut state, 0, 0.0, 0.125, 100, &seeds), 0);
        assert_eq!(state.accumulated_time, 0.125);
        assert_eq!(module.emission_count(&mut state, 0, 0.0, 0.125, 100, &seeds), 1);
        assert_eq!(state.accumulated_time, 0.0);
        assert_eq!(module.emission_count(&mut state, 0, 0.0, 1.0, 2, &seeds), 2);
        assert_eq!(state.accumulated_time, 0.5);
    }

    #[test]
    fn test_emission_count_edge_cases() {
        let mut module = MainModule::default();
        let seeds = ParticleSeeds::new(0);
        let mut state = EmissionState { accumulated_time: 3.0 };

        assert_eq!(module.emission_count(&mut state, 0, -0.5, 1.0, 100, &seeds), 0);
        assert_eq!(state.accumulated_time, 3.0);

        module.emission.emission_per_second = ParameterF32::constant(0.0);
        assert_eq!(module.emission_count(&mut state, 0, 0.0, 1.0, 100, &seeds), 0);
        assert_eq!(state.accumulated_time, 0.0);

        module.emission.enabled = false;
        module.emission.emission_per_second = ParameterF32::constant(100.0);
        assert_eq!(module.emission_count(&mut state, 0, 0.0, 1.0, 100, &seeds), 0);
    }

    #[test]
    fn test_data_block_round_trip() {
        let mut module = MainModule::default();
        module.lifetime = ParameterF32::random_between_constants(1.0, 2.0);
        module.gravity_axis = Vec3::NEG_Y;
        module.emission.enabled = false;
        module.size_over_lifetime =
            OverLifetimeModule::enabled(ParameterF32::curve(AnimationCurve::smooth10()));
        module.velocity_over_lifetime.enabled = true;
        module.velocity_over_lifetime.linear_z = ParameterF32::constant(3.0);
        let tint = ColorGradient::solid(Vec4::new(0.5, 0.5, 1.0, 1.0));
        module.color_over_lifetime = OverLifetimeModule::enabled(ParameterColor::gradient(tint));

        let mut block = DataBlock::new();
        module.to_data_block(&mut block);

        let mut loaded = MainModule::default();
        assert!(loaded.load_from_data_block(&block));
        assert_eq!(loaded, module);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut module = MainModule::default();
        module.rotation_over_lifetime = OverLifetimeModule::enabled(ParameterF32::constant(1.5));
        let text = serde_json::to_string(&module).unwrap();
        let loaded: MainModule = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, module);
    }
}
