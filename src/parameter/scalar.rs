//! Scalar parameters sampled from constants or [`AnimationCurve`]s.

use super::{Parameter, ParameterKind, SamplingMode, SamplingPolicy};
use crate::curve::AnimationCurve;
use crate::data_block::DataBlock;
use crate::serialization::json_f32;
use serde_json::{Map, Value};

/// Sampling modes of a [`ParameterF32`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum F32SamplingMode {
    #[default]
    None,
    Constant,
    Curve,
    RandomBetweenConstants,
    RandomBetweenCurves,
}

impl From<i32> for F32SamplingMode {
    fn from(value: i32) -> Self {
        match value {
            1 => F32SamplingMode::Constant,
            2 => F32SamplingMode::Curve,
            3 => F32SamplingMode::RandomBetweenConstants,
            4 => F32SamplingMode::RandomBetweenCurves,
            _ => F32SamplingMode::None,
        }
    }
}

impl From<F32SamplingMode> for i32 {
    fn from(mode: F32SamplingMode) -> Self {
        match mode {
            F32SamplingMode::None => 0,
            F32SamplingMode::Constant => 1,
            F32SamplingMode::Curve => 2,
            F32SamplingMode::RandomBetweenConstants => 3,
            F32SamplingMode::RandomBetweenCurves => 4,
        }
    }
}

impl SamplingMode for F32SamplingMode {
    fn policy(self) -> SamplingPolicy {
        match self {
            F32SamplingMode::None => SamplingPolicy::None,
            F32SamplingMode::Constant => SamplingPolicy::Constant,
            F32SamplingMode::Curve => SamplingPolicy::Track,
            F32SamplingMode::RandomBetweenConstants => SamplingPolicy::RandomBetweenConstants,
            F32SamplingMode::RandomBetweenCurves => SamplingPolicy::RandomBetweenTracks,
        }
    }

    fn from_policy(policy: SamplingPolicy) -> Self {
        match policy {
            SamplingPolicy::None => F32SamplingMode::None,
            SamplingPolicy::Constant => F32SamplingMode::Constant,
            SamplingPolicy::Track => F32SamplingMode::Curve,
            SamplingPolicy::RandomBetweenConstants => F32SamplingMode::RandomBetweenConstants,
            SamplingPolicy::RandomBetweenTracks => F32SamplingMode::RandomBetweenCurves,
        }
    }
}

/// Scalar value kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scalar;

const JSON_CONSTANT_KEYS: [&str; 2] = ["c0", "c1"];

impl ParameterKind for Scalar {
    type Value = f32;
    type Track = AnimationCurve;
    type Mode = F32SamplingMode;

    const NEUTRAL: f32 = 0.0;
    const CONSTANT_KEYS: [&'static str; 2] = ["const0", "const1"];
    const TRACK_KEYS: [&'static str; 2] = ["curve0", "curve1"];

    #[inline]
    fn evaluate(track: &AnimationCurve, t: f32) -> f32 {
        track.evaluate(t)
    }

    #[inline]
    fn lerp(a: f32, b: f32, fraction: f32) -> f32 {
        a + (b - a) * fraction
    }

    fn constant_to_json(value: f32, slot: usize, out: &mut Map<String, Value>) {
        out.insert(JSON_CONSTANT_KEYS[slot].to_owned(), value.into());
    }

    fn constant_from_json(json: &Value, slot: usize) -> f32 {
        json_f32(json, JSON_CONSTANT_KEYS[slot])
    }

    fn constant_to_data_block(value: f32, key: &str, block: &mut DataBlock) {
        block.set_f32(key, value);
    }

    fn constant_from_data_block(block: &DataBlock, key: &str) -> f32 {
        block.get_f32(key)
    }
}

/// Scalar parameter: lifetimes, sizes, speeds, emission rates.
pub type ParameterF32 = Parameter<Scalar>;

impl Parameter<Scalar> {
    pub fn constant(value: f32) -> Self {
        let mut parameter = Self::new();
        parameter.set_constant(value);
        parameter
    }

    pub fn random_between_constants(value0: f32, value1: f32) -> Self {
        let mut parameter = Self::new();
        parameter.set_random_between_constants(value0, value1);
        parameter
    }

    pub fn curve(curve: AnimationCurve) -> Self {
        let mut parameter = Self::new();
        parameter.set_curve(curve);
        parameter
    }

    pub fn random_between_curves(curve0: AnimationCurve, curve1: AnimationCurve) -> Self {
        let mut parameter = Self::new();
        parameter.set_random_between_curves(curve0, curve1);
        parameter
    }

    #[inline]
    pub fn set_constant(&mut self, value: f32) {
        self.set_single_constant(value);
    }

    #[inline]
    pub fn set_random_between_constants(&mut self, value0: f32, value1: f32) {
        self.set_constant_range(value0, value1);
    }

    #[inline]
    pub fn set_curve(&mut self, curve: AnimationCurve) {
        self.set_single_track(curve);
    }

    #[inline]
    pub fn set_random_between_curves(&mut self, curve0: AnimationCurve, curve1: AnimationCurve) {
        self.set_track_range(curve0, curve1);
    }

    #[inline]
    pub fn const0(&self) -> f32 {
        self.constants[0]
    }

    #[inline]
    pub fn const1(&self) -> f32 {
        self.constants[1]
    }

    #[inline]
    pub fn curve0(&self) -> &AnimationCurve {
        &self.tracks[0]
    }

    #[inline]
    pub fn curve1(&self) -> &AnimationCurve {
        &self.tracks[1]
    }

    #[inline]
    pub fn curve0_mut(&mut self) -> &mut AnimationCurve {
        &mut self.tracks[0]
    }

    #[inline]
    pub fn curve1_mut(&mut self) -> &mut AnimationCurve {
        &mut self.tracks[1]
    }

    /// Scale both constants and both curves, e.g. for a degrees/radians switch.
    pub fn multiply_values(&mut self, factor: f32) {
        for constant in &mut self.constants {
            *constant *= factor;
        }
        for curve in &mut self.tracks {
            curve.multiply_values(factor);
        }
    }
}
