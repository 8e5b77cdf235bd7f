//! Color parameters sampled from RGBA constants or [`ColorGradient`]s.

use super::{Parameter, ParameterKind, SamplingMode, SamplingPolicy};
use crate::data_block::DataBlock;
use crate::gradient::ColorGradient;
use crate::serialization::json_f32;
use glam::Vec4;
use serde_json::{Map, Value};

/// Sampling modes of a [`ParameterColor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSamplingMode {
    #[default]
    None,
    Color,
    Gradient,
    RandomBetweenColors,
    RandomBetweenGradients,
}

impl From<i32> for ColorSamplingMode {
    fn from(value: i32) -> Self {
        match value {
            1 => ColorSamplingMode::Color,
            2 => ColorSamplingMode::Gradient,
            3 => ColorSamplingMode::RandomBetweenColors,
            4 => ColorSamplingMode::RandomBetweenGradients,
            _ => ColorSamplingMode::None,
        }
    }
}

impl From<ColorSamplingMode> for i32 {
    fn from(mode: ColorSamplingMode) -> Self {
        match mode {
            ColorSamplingMode::None => 0,
            ColorSamplingMode::Color => 1,
            ColorSamplingMode::Gradient => 2,
            ColorSamplingMode::RandomBetweenColors => 3,
            ColorSamplingMode::RandomBetweenGradients => 4,
        }
    }
}

impl SamplingMode for ColorSamplingMode {
    fn policy(self) -> SamplingPolicy {
        match self {
            ColorSamplingMode::None => SamplingPolicy::None,
            ColorSamplingMode::Color => SamplingPolicy::Constant,
            ColorSamplingMode::Gradient => SamplingPolicy::Track,
            ColorSamplingMode::RandomBetweenColors => SamplingPolicy::RandomBetweenConstants,
            ColorSamplingMode::RandomBetweenGradients => SamplingPolicy::RandomBetweenTracks,
        }
    }

    fn from_policy(policy: SamplingPolicy) -> Self {
        match policy {
            SamplingPolicy::None => ColorSamplingMode::None,
            SamplingPolicy::Constant => ColorSamplingMode::Color,
            SamplingPolicy::Track => ColorSamplingMode::Gradient,
            SamplingPolicy::RandomBetweenConstants => ColorSamplingMode::RandomBetweenColors,
            SamplingPolicy::RandomBetweenTracks => ColorSamplingMode::RandomBetweenGradients,
        }
    }
}

/// RGBA color kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color;

// Per-channel JSON keys, indexed by slot.
const JSON_CHANNEL_KEYS: [[&str; 4]; 2] = [["r0", "g0", "b0", "a0"], ["r1", "g1", "b1", "a1"]];

impl ParameterKind for Color {
    type Value = Vec4;
    type Track = ColorGradient;
    type Mode = ColorSamplingMode;

    const NEUTRAL: Vec4 = Vec4::ZERO;
    const CONSTANT_KEYS: [&'static str; 2] = ["color0", "color1"];
    const TRACK_KEYS: [&'static str; 2] = ["gradient0", "gradient1"];

    #[inline]
    fn evaluate(track: &ColorGradient, t: f32) -> Vec4 {
        track.evaluate(t)
    }

    #[inline]
    fn lerp(a: Vec4, b: Vec4, fraction: f32) -> Vec4 {
        a.lerp(b, fraction)
    }

    fn constant_to_json(value: Vec4, slot: usize, out: &mut Map<String, Value>) {
        for (key, channel) in JSON_CHANNEL_KEYS[slot].iter().zip(value.to_array()) {
            out.insert((*key).to_owned(), channel.into());
        }
    }

    fn constant_from_json(json: &Value, slot: usize) -> Vec4 {
        let [r, g, b, a] = JSON_CHANNEL_KEYS[slot];
        Vec4::new(json_f32(json, r), json_f32(json, g), json_f32(json, b), json_f32(json, a))
    }

    fn constant_to_data_block(value: Vec4, key: &str, block: &mut DataBlock) {
        block.set_vec4f(key, value);
    }

    fn constant_from_data_block(block: &DataBlock, key: &str) -> Vec4 {
        block.get_vec4f(key)
    }
}

/// RGBA parameter: start colors, color over lifetime.
pub type ParameterColor = Parameter<Color>;

impl Parameter<Color> {
    pub fn color(value: Vec4) -> Self {
        let mut parameter = Self::new();
        parameter.set_color(value);
        parameter
    }

    pub fn random_between_colors(value0: Vec4, value1: Vec4) -> Self {
        let mut parameter = Self::new();
        parameter.set_random_between_colors(value0, value1);
        parameter
    }

    pub fn gradient(gradient: ColorGradient) -> Self {
        let mut parameter = Self::new();
        parameter.set_gradient(gradient);
        parameter
    }

    pub fn random_between_gradients(gradient0: ColorGradient, gradient1: ColorGradient) -> Self {
        let mut parameter = Self::new();
        parameter.set_random_between_gradients(gradient0, gradient1);
        parameter
    }

    #[inline]
    pub fn set_color(&mut self, value: Vec4) {
        self.set_single_constant(value);
    }

    #[inline]
    pub fn set_random_between_colors(&mut self, value0: Vec4, value1: Vec4) {
        self.set_constant_range(value0, value1);
    }

    #[inline]
    pub fn set_gradient(&mut self, gradient: ColorGradient) {
        self.set_single_track(gradient);
    }

    #[inline]
    pub fn set_random_between_gradients(
        &mut self,
        gradient0: ColorGradient,
        gradient1: ColorGradient,
    ) {
        self.set_track_range(gradient0, gradient1);
    }

    #[inline]
    pub fn color0(&self) -> Vec4 {
        self.constants[0]
    }

    #[inline]
    pub fn color1(&self) -> Vec4 {
        self.constants[1]
    }

    #[inline]
    pub fn gradient0(&self) -> &ColorGradient {
        &self.tracks[0]
    }

    #[inline]
    pub fn gradient1(&self) -> &ColorGradient {
        &self.tracks[1]
    }

    #[inline]
    pub fn gradient0_mut(&mut self) -> &mut ColorGradient {
        &mut self.tracks[0]
    }

    #[inline]
    pub fn gradient1_mut(&mut self) -> &mut ColorGradient {
        &mut self.tracks[1]
    }
}
