//! Keyframed scalar curves.
//!
//! An [`AnimationCurve`] maps a time (usually a 0..1 lifetime fraction) to a
//! scalar. Keys are kept sorted by time. Between two keys the curve is
//! stepped, linear or a cubic Hermite spline depending on [`EvaluateMode`];
//! outside the key range it holds the first or last value.
//!
//! # Example
//!
//! ```
//! use particle_params::curve::AnimationCurve;
//!
//! let mut curve = AnimationCurve::new();
//! curve.add_key(0.0, 0.0);
//! curve.add_key(1.0, 10.0);
//!
//! assert_eq!(curve.evaluate(0.5), 5.0);
//! assert_eq!(curve.evaluate(2.0), 10.0);
//! ```

use crate::data_block::DataBlock;
use crate::serialization::{
    json_array, json_f32, json_i32, json_object, DataBlockSerializable, JsonValueSerializable,
};
use serde_json::Value;

/// A single curve key.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key.
    pub in_tangent: f32,
    /// Slope leaving this key.
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    fn load_from_json_value(value: &Value) -> Self {
        Self {
            time: json_f32(value, "t"),
            value: json_f32(value, "v"),
            in_tangent: json_f32(value, "it"),
            out_tangent: json_f32(value, "ot"),
        }
    }

    fn to_json_value(self) -> Value {
        json_object([
            ("t", self.time.into()),
            ("v", self.value.into()),
            ("it", self.in_tangent.into()),
            ("ot", self.out_tangent.into()),
        ])
    }

    fn load_from_data_block(block: &DataBlock) -> Self {
        Self {
            time: block.get_f32("time"),
            value: block.get_f32("value"),
            in_tangent: block.get_f32("inTangent"),
            out_tangent: block.get_f32("outTangent"),
        }
    }

    fn to_data_block(self, block: &mut DataBlock) {
        block.set_f32("time", self.time);
        block.set_f32("value", self.value);
        block.set_f32("inTangent", self.in_tangent);
        block.set_f32("outTangent", self.out_tangent);
    }
}

/// How the curve interpolates between keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvaluateMode {
    /// Hold the value of the earlier key.
    Fixed,
    #[default]
    Linear,
    /// Cubic Hermite using key tangents.
    Smooth,
}

impl From<i32> for EvaluateMode {
    fn from(value: i32) -> Self {
        match value {
            0 => EvaluateMode::Fixed,
            2 => EvaluateMode::Smooth,
            _ => EvaluateMode::Linear,
        }
    }
}

impl From<EvaluateMode> for i32 {
    fn from(mode: EvaluateMode) -> Self {
        match mode {
            EvaluateMode::Fixed => 0,
            EvaluateMode::Linear => 1,
            EvaluateMode::Smooth => 2,
        }
    }
}

/// Value range an editor should offer for the keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MinMaxMode {
    /// Keys in 0..1.
    #[default]
    NormalizedPositive,
    /// Keys in -1..1.
    Normalized,
}

impl From<i32> for MinMaxMode {
    fn from(value: i32) -> Self {
        match value {
            1 => MinMaxMode::Normalized,
            _ => MinMaxMode::NormalizedPositive,
        }
    }
}

impl From<MinMaxMode> for i32 {
    fn from(mode: MinMaxMode) -> Self {
        match mode {
            MinMaxMode::NormalizedPositive => 0,
            MinMaxMode::Normalized => 1,
        }
    }
}

/// Keyframed scalar curve with a global multiplier.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationCurve {
    keys: Vec<Keyframe>,
    scalar: f32,
    mode: EvaluateMode,
    min_max_mode: MinMaxMode,
}

impl Default for AnimationCurve {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationCurve {
    /// Empty linear curve with a scalar of 1. Evaluates to 0.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            scalar: 1.0,
            mode: EvaluateMode::Linear,
            min_max_mode: MinMaxMode::NormalizedPositive,
        }
    }

    /// Curve through the given `(time, value)` points.
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        let mut curve = Self::new();
        for &(time, value) in points {
            curve.keys.push(Keyframe::new(time, value));
        }
        curve.sort_keys();
        curve
    }

    /// Straight line from 0 to 1.
    pub fn linear01() -> Self {
        Self::from_points(&[(0.0, 0.0), (1.0, 1.0)])
    }

    /// Straight line from 1 to 0.
    pub fn linear10() -> Self {
        Self::from_points(&[(0.0, 1.0), (1.0, 0.0)])
    }

    /// Quadratic ease-in from 0 to 1.
    pub fn sqr01() -> Self {
        let mut curve = Self::new();
        curve.keys.push(Keyframe::with_tangents(0.0, 0.0, 0.0, 0.0));
        curve.keys.push(Keyframe::with_tangents(1.0, 1.0, 2.0, 2.0));
        curve.mode = EvaluateMode::Smooth;
        curve
    }

    /// Smoothstep from 0 to 1.
    pub fn smooth01() -> Self {
        let mut curve = Self::from_points(&[(0.0, 0.0), (1.0, 1.0)]);
        curve.mode = EvaluateMode::Smooth;
        curve
    }

    /// Smoothstep from 1 to 0.
    pub fn smooth10() -> Self {
        let mut curve = Self::from_points(&[(0.0, 1.0), (1.0, 0.0)]);
        curve.mode = EvaluateMode::Smooth;
        curve
    }

    #[inline]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn add_keyframe(&mut self, keyframe: Keyframe) {
        self.keys.push(keyframe);
        self.sort_keys();
    }

    pub fn add_key(&mut self, time: f32, value: f32) {
        self.add_keyframe(Keyframe::new(time, value));
    }

    /// Add a key with the same in and out tangent.
    pub fn add_key_with_tangent(&mut self, time: f32, value: f32, tangent: f32) {
        self.add_keyframe(Keyframe::with_tangents(time, value, tangent, tangent));
    }

    pub fn set_key(&mut self, index: usize, value: f32) {
        if let Some(key) = self.keys.get_mut(index) {
            key.value = value;
        }
    }

    /// Move a key in time. Keys are re-sorted, so the key's index may change.
    pub fn set_key_time(&mut self, index: usize, time: f32) {
        if let Some(key) = self.keys.get_mut(index) {
            key.time = time;
            self.sort_keys();
        }
    }

    pub fn set_key_in_tangent(&mut self, index: usize, tangent: f32) {
        if let Some(key) = self.keys.get_mut(index) {
            key.in_tangent = tangent;
        }
    }

    pub fn set_key_out_tangent(&mut self, index: usize, tangent: f32) {
        if let Some(key) = self.keys.get_mut(index) {
            key.out_tangent = tangent;
        }
    }

    pub fn set_key_tangent(&mut self, index: usize, tangent: f32) {
        self.set_key_in_tangent(index, tangent);
        self.set_key_out_tangent(index, tangent);
    }

    pub fn remove_key(&mut self, index: usize) -> Option<Keyframe> {
        (index < self.keys.len()).then(|| self.keys.remove(index))
    }

    pub fn clear_keys(&mut self) {
        self.keys.clear();
    }

    /// Index a new key at `time` would be inserted at.
    pub fn insertion_index(&self, time: f32) -> usize {
        self.keys.partition_point(|key| key.time < time)
    }

    pub fn has_key_time(&self, time: f32) -> bool {
        self.keys.iter().any(|key| key.time == time)
    }

    #[inline]
    pub fn scalar(&self) -> f32 {
        self.scalar
    }

    #[inline]
    pub fn set_scalar(&mut self, scalar: f32) {
        self.scalar = scalar;
    }

    #[inline]
    pub fn mode(&self) -> EvaluateMode {
        self.mode
    }

    #[inline]
    pub fn set_mode(&mut self, mode: EvaluateMode) {
        self.mode = mode;
    }

    #[inline]
    pub fn min_max_mode(&self) -> MinMaxMode {
        self.min_max_mode
    }

    #[inline]
    pub fn set_min_max_mode(&mut self, mode: MinMaxMode) {
        self.min_max_mode = mode;
    }

    /// Scale every key value and tangent by `factor`.
    pub fn multiply_values(&mut self, factor: f32) {
        for key in &mut self.keys {
            key.value *= factor;
            key.in_tangent *= factor;
            key.out_tangent *= factor;
        }
    }

    /// Rescale keys into -1..1 and move the magnitude into the scalar.
    ///
    /// [`evaluate`](Self::evaluate) is unchanged by this.
    pub fn normalize(&mut self) {
        let max = self.keys.iter().fold(0.0f32, |max, key| max.max(key.value.abs()));
        if max <= 0.0 {
            return;
        }
        self.multiply_values(1.0 / max);
        self.scalar *= max;
    }

    pub fn normalized(&self) -> Self {
        let mut curve = self.clone();
        curve.normalize();
        curve
    }

    /// Time of the first key, 0 when empty.
    pub fn start_time(&self) -> f32 {
        self.keys.first().map_or(0.0, |key| key.time)
    }

    /// Time of the last key, 1 when empty.
    pub fn end_time(&self) -> f32 {
        self.keys.last().map_or(1.0, |key| key.time)
    }

    pub fn duration(&self) -> f32 {
        self.end_time() - self.start_time()
    }

    /// Curve value at `time`, multiplied by the scalar.
    #[inline]
    pub fn evaluate(&self, time: f32) -> f32 {
        self.evaluate_unscaled(time) * self.scalar
    }

    /// Curve value at `time` ignoring the scalar.
    pub fn evaluate_unscaled(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        // NaN holds the first key
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // first.time < time < last.time, so 1 <= index < len
        let index = self.keys.partition_point(|key| key.time <= time);
        let k0 = &self.keys[index - 1];
        let k1 = &self.keys[index];

        match self.mode {
            EvaluateMode::Fixed => k0.value,
            EvaluateMode::Linear => {
                let span = k1.time - k0.time;
                if span <= 0.0 {
                    return k1.value;
                }
                let t = (time - k0.time) / span;
                k0.value + (k1.value - k0.value) * t
            }
            EvaluateMode::Smooth => {
                let span = k1.time - k0.time;
                if span <= 0.0 {
                    return k1.value;
                }
                let t = (time - k0.time) / span;
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * k0.value
                    + h10 * span * k0.out_tangent
                    + h01 * k1.value
                    + h11 * span * k1.in_tangent
            }
        }
    }

    fn sort_keys(&mut self) {
        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

impl JsonValueSerializable for AnimationCurve {
    fn load_from_json_value(&mut self, value: &Value) {
        if !value.is_object() {
            *self = Self::new();
            return;
        }

        self.keys = json_array(value, "keys").map(Keyframe::load_from_json_value).collect();
        self.sort_keys();
        self.scalar = match value.get("s") {
            Some(_) => json_f32(value, "s"),
            None => 1.0,
        };
        self.mode = EvaluateMode::from(json_i32(value, "em"));
        self.min_max_mode = MinMaxMode::from(json_i32(value, "mm"));
    }

    fn to_json_value(&self) -> Value {
        json_object([
            ("keys", Value::Array(self.keys.iter().map(|key| key.to_json_value()).collect())),
            ("s", self.scalar.into()),
            ("em", i32::from(self.mode).into()),
            ("mm", i32::from(self.min_max_mode).into()),
        ])
    }
}

impl DataBlockSerializable for AnimationCurve {
    fn load_from_data_block(&mut self, block: &DataBlock) -> bool {
        self.keys.clear();
        if let Some(keyframes) = block.get_data_block("keyframes") {
            self.keys = keyframes
                .data_blocks_named("keyframe")
                .map(Keyframe::load_from_data_block)
                .collect();
            self.sort_keys();
        }
        self.scalar = block.get_f32_or("scalar", 1.0);
        self.mode = EvaluateMode::from(block.get_s32_or("mode", 1));
        self.min_max_mode = MinMaxMode::from(block.get_s32("minMaxMode"));
        true
    }

    fn to_data_block(&self, block: &mut DataBlock) {
        let keyframes = block.data_block_mut("keyframes");
        keyframes.clear();
        for key in &self.keys {
            key.to_data_block(keyframes.add_data_block("keyframe"));
        }
        block.set_f32("scalar", self.scalar);
        block.set_s32("mode", self.mode.into());
        block.set_s32("minMaxMode", self.min_max_mode.into());
    }
}
