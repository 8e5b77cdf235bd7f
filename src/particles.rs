//! Struct-of-arrays particle pool.
//!
//! Each particle attribute lives in its own vector so the update loops in
//! [`MainModule`](crate::main_module::MainModule) walk one attribute at a
//! time. Index `i` in every vector belongs to the same particle.
//!
//! # Example
//!
//! ```
//! use particle_params::particles::Particles;
//! use particle_params::seeds::ParticleSeeds;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let seeds = ParticleSeeds::new(1);
//! let mut particles = Particles::with_max_count(8);
//!
//! let spawned = particles.emit(10, &mut rng, &seeds);
//! assert_eq!(spawned, 0..8);
//! assert_eq!(particles.len(), 8);
//!
//! // Freshly emitted particles have no life left until a module samples one
//! assert_eq!(particles.kill_dead(), 8);
//! assert!(particles.is_empty());
//! ```

use crate::seeds::ParticleSeeds;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use rand::Rng;
use std::ops::Range;

/// Remaining and initial lifetime of a particle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleLife {
    /// Lifetime in seconds at spawn.
    pub initial: f32,
    /// Seconds left. The particle is dead at or below zero.
    pub current: f32,
    /// Normalized age in `[0, 1]`, the `t` of over-lifetime parameters.
    pub scalar: f32,
}

/// A scalar attribute with its spawn value.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleScalar {
    pub initial: f32,
    pub current: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleMovement {
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

/// Particle pool with an optional hard cap.
#[derive(Clone, Debug, Default)]
pub struct Particles {
    max_count: Option<usize>,
    seeds: Vec<u32>,
    life: Vec<ParticleLife>,
    size: Vec<ParticleScalar>,
    rotation: Vec<ParticleScalar>,
    color_initial: Vec<Vec4>,
    color_current: Vec<Vec4>,
    movement: Vec<ParticleMovement>,
    direction: Vec<Vec3>,
    position: Vec<Vec3>,
}

macro_rules! attribute_slices {
    ($($field:ident, $field_mut:ident: $ty:ty;)*) => {
        $(
            #[inline]
            pub fn $field(&self) -> &[$ty] {
                &self.$field
            }

            #[inline]
            pub fn $field_mut(&mut self) -> &mut [$ty] {
                &mut self.$field
            }
        )*
    };
}

impl Particles {
    /// Unbounded pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool that never holds more than `max_count` particles.
    pub fn with_max_count(max_count: usize) -> Self {
        Self {
            max_count: Some(max_count),
            ..Self::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    #[inline]
    pub fn max_count(&self) -> Option<usize> {
        self.max_count
    }

    /// How many more particles fit.
    pub fn remaining(&self) -> usize {
        match self.max_count {
            Some(max) => max.saturating_sub(self.len()),
            None => usize::MAX,
        }
    }

    attribute_slices! {
        seeds, seeds_mut: u32;
        life, life_mut: ParticleLife;
        size, size_mut: ParticleScalar;
        rotation, rotation_mut: ParticleScalar;
        color_initial, color_initial_mut: Vec4;
        color_current, color_current_mut: Vec4;
        movement, movement_mut: ParticleMovement;
        direction, direction_mut: Vec3;
        position, position_mut: Vec3;
    }

    /// Append up to `count` zeroed particles with fresh seeds.
    ///
    /// Directions start along +Y. Returns the index range of the new
    /// particles, which may be shorter than `count` when the pool is capped.
    pub fn emit<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
        seeds: &ParticleSeeds,
    ) -> Range<usize> {
        let first = self.len();
        let count = count.min(self.remaining());
        for _ in 0..count {
            self.seeds.push(seeds.random_seed(rng));
            self.life.push(ParticleLife::zeroed());
            self.size.push(ParticleScalar::zeroed());
            self.rotation.push(ParticleScalar::zeroed());
            self.color_initial.push(Vec4::ZERO);
            self.color_current.push(Vec4::ZERO);
            self.movement.push(ParticleMovement::zeroed());
            self.direction.push(Vec3::Y);
            self.position.push(Vec3::ZERO);
        }
        first..first + count
    }

    /// Remove every particle whose remaining life is at or below zero.
    ///
    /// Uses swap removal, so survivors may change index. Returns how many
    /// particles were removed.
    pub fn kill_dead(&mut self) -> usize {
        let before = self.len();
        let mut i = 0;
        while i < self.len() {
            if self.life[i].current <= 0.0 {
                self.swap_remove(i);
            } else {
                i += 1;
            }
        }
        before - self.len()
    }

    pub fn clear(&mut self) {
        self.seeds.clear();
        self.life.clear();
        self.size.clear();
        self.rotation.clear();
        self.color_initial.clear();
        self.color_current.clear();
        self.movement.clear();
        self.direction.clear();
        self.position.clear();
    }

    fn swap_remove(&mut self, index: usize) {
        self.seeds.swap_remove(index);
        self.life.swap_remove(index);
        self.size.swap_remove(index);
        self.rotation.swap_remove(index);
        self.color_initial.swap_remove(index);
        self.color_current.swap_remove(index);
        self.movement.swap_remove(index);
        self.direction.swap_remove(index);
        self.position.swap_remove(index);
    }

    /// Raw bytes of the position stream, ready for a vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.position)
    }

    /// Raw bytes of the current color stream.
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.color_current)
    }
}
