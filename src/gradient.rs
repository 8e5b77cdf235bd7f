//! Color gradients with separate RGB and alpha key tracks.
//!
//! A [`ColorGradient`] evaluates to an RGBA [`Vec4`]. Color and alpha keys
//! live on independent tracks so transparency can be shaped without touching
//! hue. An empty track evaluates to white (RGB) or fully opaque (alpha), so
//! the default gradient is a multiplicative identity.

use crate::data_block::DataBlock;
use crate::serialization::{
    json_array, json_f32, json_i32, json_object, DataBlockSerializable, JsonValueSerializable,
};
use glam::{Vec3, Vec4};
use serde_json::Value;

/// Key on the RGB track.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyframeRgb {
    pub time: f32,
    pub value: Vec3,
}

impl KeyframeRgb {
    pub fn new(time: f32, value: Vec3) -> Self {
        Self { time, value }
    }
}

/// Key on the alpha track.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyframeAlpha {
    pub time: f32,
    pub value: f32,
}

impl KeyframeAlpha {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// How the gradient interpolates between keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvaluateMode {
    Fixed,
    #[default]
    Linear,
}

impl From<i32> for EvaluateMode {
    fn from(value: i32) -> Self {
        match value {
            0 => EvaluateMode::Fixed,
            _ => EvaluateMode::Linear,
        }
    }
}

impl From<EvaluateMode> for i32 {
    fn from(mode: EvaluateMode) -> Self {
        match mode {
            EvaluateMode::Fixed => 0,
            EvaluateMode::Linear => 1,
        }
    }
}

/// Two-track RGBA gradient.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorGradient {
    rgb: Vec<KeyframeRgb>,
    alpha: Vec<KeyframeAlpha>,
    mode: EvaluateMode,
}

/// Key times closer than this are treated as the same time by
/// [`ColorGradient::to_raw_colors`].
const TIME_EPSILON: f32 = 0.00001;

impl ColorGradient {
    /// Empty linear gradient. Evaluates to opaque white.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gradient holding one color everywhere.
    pub fn solid(color: Vec4) -> Self {
        let mut gradient = Self::new();
        gradient.add_key(0.0, color);
        gradient
    }

    /// Gradient from `start` at time 0 to `end` at time 1.
    pub fn two_colors(start: Vec4, end: Vec4) -> Self {
        let mut gradient = Self::new();
        gradient.add_key(0.0, start);
        gradient.add_key(1.0, end);
        gradient
    }

    #[inline]
    pub fn keys_rgb(&self) -> &[KeyframeRgb] {
        &self.rgb
    }

    #[inline]
    pub fn keys_alpha(&self) -> &[KeyframeAlpha] {
        &self.alpha
    }

    /// Add an RGBA key, splitting it across both tracks.
    pub fn add_key(&mut self, time: f32, color: Vec4) {
        self.add_key_rgb(time, color.truncate());
        self.add_key_alpha(time, color.w);
    }

    pub fn add_key_rgb(&mut self, time: f32, value: Vec3) {
        self.rgb.push(KeyframeRgb::new(time, value));
        self.sort_rgb();
    }

    pub fn add_key_alpha(&mut self, time: f32, value: f32) {
        self.alpha.push(KeyframeAlpha::new(time, value));
        self.sort_alpha();
    }

    pub fn set_key_rgb(&mut self, index: usize, value: Vec3) {
        if let Some(key) = self.rgb.get_mut(index) {
            key.value = value;
        }
    }

    pub fn set_key_rgb_time(&mut self, index: usize, time: f32) {
        if let Some(key) = self.rgb.get_mut(index) {
            key.time = time;
            self.sort_rgb();
        }
    }

    pub fn set_key_alpha(&mut self, index: usize, value: f32) {
        if let Some(key) = self.alpha.get_mut(index) {
            key.value = value;
        }
    }

    pub fn set_key_alpha_time(&mut self, index: usize, time: f32) {
        if let Some(key) = self.alpha.get_mut(index) {
            key.time = time;
            self.sort_alpha();
        }
    }

    pub fn remove_key_rgb(&mut self, index: usize) -> Option<KeyframeRgb> {
        (index < self.rgb.len()).then(|| self.rgb.remove(index))
    }

    pub fn remove_key_alpha(&mut self, index: usize) -> Option<KeyframeAlpha> {
        (index < self.alpha.len()).then(|| self.alpha.remove(index))
    }

    pub fn clear_keys_rgb(&mut self) {
        self.rgb.clear();
    }

    pub fn clear_keys_alpha(&mut self) {
        self.alpha.clear();
    }

    pub fn clear(&mut self) {
        self.rgb.clear();
        self.alpha.clear();
        self.mode = EvaluateMode::Linear;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rgb.is_empty() && self.alpha.is_empty()
    }

    pub fn insertion_index_rgb(&self, time: f32) -> usize {
        self.rgb.partition_point(|key| key.time < time)
    }

    pub fn insertion_index_alpha(&self, time: f32) -> usize {
        self.alpha.partition_point(|key| key.time < time)
    }

    #[inline]
    pub fn mode(&self) -> EvaluateMode {
        self.mode
    }

    #[inline]
    pub fn set_mode(&mut self, mode: EvaluateMode) {
        self.mode = mode;
    }

    pub fn evaluate_rgb(&self, time: f32) -> Vec3 {
        let (first, last) = match (self.rgb.first(), self.rgb.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Vec3::ONE,
        };
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let index = self.rgb.partition_point(|key| key.time <= time);
        let (k0, k1) = (&self.rgb[index - 1], &self.rgb[index]);
        match self.mode {
            EvaluateMode::Fixed => k0.value,
            EvaluateMode::Linear => {
                k0.value.lerp(k1.value, segment_fraction(k0.time, k1.time, time))
            }
        }
    }

    pub fn evaluate_alpha(&self, time: f32) -> f32 {
        let (first, last) = match (self.alpha.first(), self.alpha.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 1.0,
        };
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let index = self.alpha.partition_point(|key| key.time <= time);
        let (k0, k1) = (&self.alpha[index - 1], &self.alpha[index]);
        match self.mode {
            EvaluateMode::Fixed => k0.value,
            EvaluateMode::Linear => {
                let t = segment_fraction(k0.time, k1.time, time);
                k0.value + (k1.value - k0.value) * t
            }
        }
    }

    /// RGBA color at `time`.
    #[inline]
    pub fn evaluate(&self, time: f32) -> Vec4 {
        self.evaluate_rgb(time).extend(self.evaluate_alpha(time))
    }

    /// Every distinct key time on either track with the evaluated color there,
    /// sorted by time.
    pub fn to_raw_colors(&self) -> Vec<(f32, Vec4)> {
        let mut result: Vec<(f32, Vec4)> = Vec::new();
        let times = self
            .rgb
            .iter()
            .map(|key| key.time)
            .chain(self.alpha.iter().map(|key| key.time));
        for time in times {
            if result.iter().any(|(t, _)| (t - time).abs() <= TIME_EPSILON) {
                continue;
            }
            result.push((time, self.evaluate(time)));
        }
        result.sort_by(|a, b| a.0.total_cmp(&b.0));
        result
    }

    /// Earliest key time on either track, 0 when empty.
    pub fn start_time(&self) -> f32 {
        match (self.rgb.first(), self.alpha.first()) {
            (Some(rgb), Some(alpha)) => rgb.time.min(alpha.time),
            (Some(rgb), None) => rgb.time,
            (None, Some(alpha)) => alpha.time,
            (None, None) => 0.0,
        }
    }

    /// Latest key time on either track, 1 when empty.
    pub fn end_time(&self) -> f32 {
        match (self.rgb.last(), self.alpha.last()) {
            (Some(rgb), Some(alpha)) => rgb.time.max(alpha.time),
            (Some(rgb), None) => rgb.time,
            (None, Some(alpha)) => alpha.time,
            (None, None) => 1.0,
        }
    }

    pub fn duration(&self) -> f32 {
        self.end_time() - self.start_time()
    }

    /// Drop keys outside the 0..1 range.
    pub fn clamp01(&mut self) {
        self.rgb.retain(|key| (0.0..=1.0).contains(&key.time));
        self.alpha.retain(|key| (0.0..=1.0).contains(&key.time));
    }

    fn sort_rgb(&mut self) {
        self.rgb.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    fn sort_alpha(&mut self) {
        self.alpha.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

#[inline]
fn segment_fraction(t0: f32, t1: f32, time: f32) -> f32 {
    let span = t1 - t0;
    if span <= 0.0 {
        1.0
    } else {
        (time - t0) / span
    }
}

impl JsonValueSerializable for ColorGradient {
    fn load_from_json_value(&mut self, value: &Value) {
        if !value.is_object() {
            self.clear();
            return;
        }

        self.rgb = json_array(value, "rgb")
            .map(|key| {
                KeyframeRgb::new(
                    json_f32(key, "t"),
                    Vec3::new(json_f32(key, "r"), json_f32(key, "g"), json_f32(key, "b")),
                )
            })
            .collect();
        self.sort_rgb();

        self.alpha = json_array(value, "a")
            .map(|key| KeyframeAlpha::new(json_f32(key, "t"), json_f32(key, "a")))
            .collect();
        self.sort_alpha();

        self.mode = EvaluateMode::from(json_i32(value, "em"));
    }

    fn to_json_value(&self) -> Value {
        let rgb = self
            .rgb
            .iter()
            .map(|key| {
                json_object([
                    ("t", key.time.into()),
                    ("r", key.value.x.into()),
                    ("g", key.value.y.into()),
                    ("b", key.value.z.into()),
                ])
            })
            .collect();
        let alpha = self
            .alpha
            .iter()
            .map(|key| json_object([("t", key.time.into()), ("a", key.value.into())]))
            .collect();

        json_object([
            ("rgb", Value::Array(rgb)),
            ("a", Value::Array(alpha)),
            ("em", i32::from(self.mode).into()),
        ])
    }
}

impl DataBlockSerializable for ColorGradient {
    fn load_from_data_block(&mut self, block: &DataBlock) -> bool {
        self.rgb.clear();
        if let Some(keys) = block.get_data_block("keyframesRGB") {
            self.rgb = keys
                .data_blocks_named("keyframe")
                .map(|key| KeyframeRgb::new(key.get_f32("time"), key.get_vec3f("value")))
                .collect();
            self.sort_rgb();
        }

        self.alpha.clear();
        if let Some(keys) = block.get_data_block("keyframesAlpha") {
            self.alpha = keys
                .data_blocks_named("keyframe")
                .map(|key| KeyframeAlpha::new(key.get_f32("time"), key.get_f32("value")))
                .collect();
            self.sort_alpha();
        }

        self.mode = EvaluateMode::from(block.get_s32_or("mode", 1));
        true
    }

    fn to_data_block(&self, block: &mut DataBlock) {
        let keys = block.data_block_mut("keyframesRGB");
        keys.clear();
        for key in &self.rgb {
            let entry = keys.add_data_block("keyframe");
            entry.set_f32("time", key.time);
            entry.set_vec3f("value", key.value);
        }

        let keys = block.data_block_mut("keyframesAlpha");
        keys.clear();
        for key in &self.alpha {
            let entry = keys.add_data_block("keyframe");
            entry.set_f32("time", key.time);
            entry.set_f32("value", key.value);
        }

        block.set_s32("mode", self.mode.into());
    }
}
