//! Sampled particle system parameters.
//!
//! A [`Parameter`] is a tunable value, such as an emission rate or a color
//! over lifetime, that is produced under one of several sampling modes:
//!
//! | Policy | Scalar mode | Color mode | Sample |
//! |--------|-------------|------------|--------|
//! | none | `None` | `None` | neutral value (`0.0` / transparent black) |
//! | constant | `Constant` | `Color` | operand 0 |
//! | track | `Curve` | `Gradient` | track 0 at `t` |
//! | random constants | `RandomBetweenConstants` | `RandomBetweenColors` | lerp of operands |
//! | random tracks | `RandomBetweenCurves` | `RandomBetweenGradients` | lerp of tracks at `t` |
//!
//! The random modes blend by a fraction in 0..1 drawn per sample or per seed.
//!
//! Both constants and both tracks are always stored, whatever the mode, so an
//! editor can switch modes back and forth without losing values.
//!
//! # Persistence
//!
//! The two formats are intentionally asymmetric:
//!
//! - **JSON** always writes the mode, both constants and both tracks. It is
//!   lossless across mode switches.
//! - **Data blocks** write the mode and only the operands the mode uses.
//!   Reading is generic: both constants are read (missing ones become zero)
//!   and each track is read only if its sub-block exists (otherwise the track
//!   keeps its current value). Operands the mode did not use are therefore
//!   not preserved by a data block round trip. This keeps the compact form
//!   small and must not be "fixed" into a symmetric encoding.
//!
//! Unknown mode integers, from newer files or direct conversion, resolve to
//! `None` instead of failing.
//!
//! # Example
//!
//! ```
//! use particle_params::parameter::{F32SamplingMode, ParameterF32};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mut speed = ParameterF32::random_between_constants(2.0, 4.0);
//! let value = speed.sample(0.0, &mut rng);
//! assert!((2.0..=4.0).contains(&value));
//!
//! speed.set_sampling_mode(F32SamplingMode::from(999));
//! assert_eq!(speed.sample(0.0, &mut rng), 0.0);
//! ```

mod color;
mod scalar;

pub use color::{Color, ColorSamplingMode, ParameterColor};
pub use scalar::{F32SamplingMode, ParameterF32, Scalar};

use crate::data_block::DataBlock;
use crate::seeds::ParticleSeeds;
use crate::serialization::{json_i32, DataBlockSerializable, JsonValueSerializable};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// What a sampling mode does, independent of the value kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplingPolicy {
    None,
    Constant,
    Track,
    RandomBetweenConstants,
    RandomBetweenTracks,
}

impl SamplingPolicy {
    /// True for the modes that consume a random fraction.
    #[inline]
    pub fn is_random(self) -> bool {
        matches!(
            self,
            SamplingPolicy::RandomBetweenConstants | SamplingPolicy::RandomBetweenTracks
        )
    }

    /// Constant slots the policy reads.
    pub fn constant_slots(self) -> usize {
        match self {
            SamplingPolicy::Constant => 1,
            SamplingPolicy::RandomBetweenConstants => 2,
            _ => 0,
        }
    }

    /// Track slots the policy reads.
    pub fn track_slots(self) -> usize {
        match self {
            SamplingPolicy::Track => 1,
            SamplingPolicy::RandomBetweenTracks => 2,
            _ => 0,
        }
    }
}

/// A per-kind sampling mode enum.
///
/// Integer conversion is total: values outside the known range map to the
/// `None` mode.
pub trait SamplingMode:
    Copy + Eq + Debug + Default + From<i32> + Into<i32> + Send + Sync + 'static
{
    fn policy(self) -> SamplingPolicy;

    fn from_policy(policy: SamplingPolicy) -> Self;
}

/// The value kind a [`Parameter`] samples: its value, track type and encodings.
pub trait ParameterKind: Clone + Debug + Send + Sync + 'static {
    type Value: Copy + PartialEq + Debug + Send + Sync;
    type Track: Clone
        + PartialEq
        + Debug
        + Default
        + JsonValueSerializable
        + DataBlockSerializable
        + Send
        + Sync;
    type Mode: SamplingMode;

    /// Sample of the `None` mode, also the default constant.
    const NEUTRAL: Self::Value;

    /// Data block keys of the two constants.
    const CONSTANT_KEYS: [&'static str; 2];

    /// JSON and data block keys of the two tracks.
    const TRACK_KEYS: [&'static str; 2];

    fn evaluate(track: &Self::Track, t: f32) -> Self::Value;

    fn lerp(a: Self::Value, b: Self::Value, fraction: f32) -> Self::Value;

    fn constant_to_json(value: Self::Value, slot: usize, out: &mut Map<String, Value>);

    fn constant_from_json(json: &Value, slot: usize) -> Self::Value;

    fn constant_to_data_block(value: Self::Value, key: &str, block: &mut DataBlock);

    /// Missing constants read as the kind's zero.
    fn constant_from_data_block(block: &DataBlock, key: &str) -> Self::Value;
}

/// A value sampled under a selectable mode from two constants and two tracks.
#[derive(Clone, Debug)]
pub struct Parameter<K: ParameterKind> {
    mode: K::Mode,
    constants: [K::Value; 2],
    tracks: [K::Track; 2],
}

impl<K: ParameterKind> Default for Parameter<K> {
    fn default() -> Self {
        Self {
            mode: K::Mode::default(),
            constants: [K::NEUTRAL; 2],
            tracks: [K::Track::default(), K::Track::default()],
        }
    }
}

impl<K: ParameterKind> Parameter<K> {
    /// Parameter in `None` mode with neutral operands.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn sampling_mode(&self) -> K::Mode {
        self.mode
    }

    /// Select the sampling mode. Operands are left untouched.
    #[inline]
    pub fn set_sampling_mode(&mut self, mode: K::Mode) {
        self.mode = mode;
    }

    #[inline]
    pub fn policy(&self) -> SamplingPolicy {
        self.mode.policy()
    }

    /// Constant operand `slot`, `None` past the second slot.
    #[inline]
    pub fn constant_at(&self, slot: usize) -> Option<K::Value> {
        self.constants.get(slot).copied()
    }

    #[inline]
    pub fn constant_at_mut(&mut self, slot: usize) -> Option<&mut K::Value> {
        self.constants.get_mut(slot)
    }

    /// Track operand `slot`, `None` past the second slot.
    #[inline]
    pub fn track_at(&self, slot: usize) -> Option<&K::Track> {
        self.tracks.get(slot)
    }

    #[inline]
    pub fn track_at_mut(&mut self, slot: usize) -> Option<&mut K::Track> {
        self.tracks.get_mut(slot)
    }

    /// Store operand 0 and switch to the constant mode.
    pub fn set_single_constant(&mut self, value: K::Value) {
        self.constants[0] = value;
        self.mode = K::Mode::from_policy(SamplingPolicy::Constant);
    }

    /// Store both constants and switch to the random-between-constants mode.
    pub fn set_constant_range(&mut self, value0: K::Value, value1: K::Value) {
        self.constants = [value0, value1];
        self.mode = K::Mode::from_policy(SamplingPolicy::RandomBetweenConstants);
    }

    /// Store track 0 and switch to the track mode.
    pub fn set_single_track(&mut self, track: K::Track) {
        self.tracks[0] = track;
        self.mode = K::Mode::from_policy(SamplingPolicy::Track);
    }

    /// Store both tracks and switch to the random-between-tracks mode.
    pub fn set_track_range(&mut self, track0: K::Track, track1: K::Track) {
        self.tracks = [track0, track1];
        self.mode = K::Mode::from_policy(SamplingPolicy::RandomBetweenTracks);
    }

    /// Sample at normalized time `t`, drawing a fresh random fraction from
    /// `rng` on every call for the random modes.
    pub fn sample<R: Rng + ?Sized>(&self, t: f32, rng: &mut R) -> K::Value {
        let fraction = if self.mode.policy().is_random() {
            rng.gen::<f32>()
        } else {
            0.0
        };
        self.sample_with_fraction(t, fraction)
    }

    /// Sample with a stable per-particle fraction taken from `seeds`.
    ///
    /// The same seed gives the same blend for the whole particle lifetime.
    #[inline]
    pub fn sample_seeded(&self, seed: u32, t: f32, seeds: &ParticleSeeds) -> K::Value {
        self.sample_with_fraction(t, seeds.fraction(seed))
    }

    /// Sample with an explicit random fraction in 0..1.
    ///
    /// Reads only the operands the current mode uses.
    pub fn sample_with_fraction(&self, t: f32, fraction: f32) -> K::Value {
        match self.mode.policy() {
            SamplingPolicy::None => K::NEUTRAL,
            SamplingPolicy::Constant => self.constants[0],
            SamplingPolicy::Track => K::evaluate(&self.tracks[0], t),
            SamplingPolicy::RandomBetweenConstants => {
                K::lerp(self.constants[0], self.constants[1], fraction)
            }
            SamplingPolicy::RandomBetweenTracks => K::lerp(
                K::evaluate(&self.tracks[0], t),
                K::evaluate(&self.tracks[1], t),
                fraction,
            ),
        }
    }

    fn load_mode(&mut self, raw: i32) {
        let mode = K::Mode::from(raw);
        let known: i32 = mode.into();
        if known != raw {
            log::warn!("Unknown sampling mode {}, falling back to {:?}", raw, mode);
        }
        self.mode = mode;
    }
}

/// Equal when the modes match and the operands the mode uses match.
impl<K: ParameterKind> PartialEq for Parameter<K> {
    fn eq(&self, other: &Self) -> bool {
        if self.mode != other.mode {
            return false;
        }
        let policy = self.mode.policy();
        let constants = policy.constant_slots();
        let tracks = policy.track_slots();
        self.constants[..constants] == other.constants[..constants]
            && self.tracks[..tracks] == other.tracks[..tracks]
    }
}

impl<K: ParameterKind> JsonValueSerializable for Parameter<K> {
    fn load_from_json_value(&mut self, value: &Value) {
        self.load_mode(json_i32(value, "mode"));
        for slot in 0..2 {
            self.constants[slot] = K::constant_from_json(value, slot);
            match value.get(K::TRACK_KEYS[slot]) {
                Some(track) => self.tracks[slot].load_from_json_value(track),
                None => self.tracks[slot] = K::Track::default(),
            }
        }
    }

    fn to_json_value(&self) -> Value {
        let mut map = Map::new();
        let mode: i32 = self.mode.into();
        map.insert("mode".to_owned(), mode.into());
        for slot in 0..2 {
            K::constant_to_json(self.constants[slot], slot, &mut map);
        }
        for slot in 0..2 {
            map.insert(K::TRACK_KEYS[slot].to_owned(), self.tracks[slot].to_json_value());
        }
        Value::Object(map)
    }
}

impl<K: ParameterKind> DataBlockSerializable for Parameter<K> {
    fn load_from_data_block(&mut self, block: &DataBlock) -> bool {
        self.load_mode(block.get_s32("mode"));
        for slot in 0..2 {
            self.constants[slot] = K::constant_from_data_block(block, K::CONSTANT_KEYS[slot]);
            if let Some(track) = block.get_data_block(K::TRACK_KEYS[slot]) {
                self.tracks[slot].load_from_data_block(track);
            }
        }
        true
    }

    fn to_data_block(&self, block: &mut DataBlock) {
        block.set_s32("mode", self.mode.into());
        let policy = self.mode.policy();
        for slot in 0..policy.constant_slots() {
            K::constant_to_data_block(self.constants[slot], K::CONSTANT_KEYS[slot], block);
        }
        for slot in 0..policy.track_slots() {
            self.tracks[slot].to_data_block(block.data_block_mut(K::TRACK_KEYS[slot]));
        }
    }
}

impl<K: ParameterKind> Serialize for Parameter<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl<'de, K: ParameterKind> Deserialize<'de> for Parameter<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let mut parameter = Self::new();
        parameter.load_from_json_value(&value);
        Ok(parameter)
    }
}
