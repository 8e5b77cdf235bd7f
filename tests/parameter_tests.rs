//! Integration tests for sampled parameters.
//!
//! These exercise the public API the way a particle system uses it: mode
//! selection, sampling, and both persistence formats.

use glam::Vec4;
use particle_params::prelude::*;
use particle_params::serialization::JsonValueSerializable;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

fn nan_curve() -> AnimationCurve {
    AnimationCurve::from_points(&[(0.0, f32::NAN), (1.0, f32::NAN)])
}

fn nan_gradient() -> ColorGradient {
    ColorGradient::solid(Vec4::splat(f32::NAN))
}

/// Scalar parameter whose every operand is poisoned with NaN.
fn poisoned_f32() -> ParameterF32 {
    let mut parameter = ParameterF32::random_between_constants(f32::NAN, f32::NAN);
    parameter.set_random_between_curves(nan_curve(), nan_curve());
    parameter
}

fn poisoned_color() -> ParameterColor {
    let mut parameter =
        ParameterColor::random_between_colors(Vec4::splat(f32::NAN), Vec4::splat(f32::NAN));
    parameter.set_random_between_gradients(nan_gradient(), nan_gradient());
    parameter
}

// ============================================================================
// Operand isolation
// ============================================================================

#[test]
fn test_scalar_modes_read_only_their_operands() {
    let mut rng = rng();

    let mut parameter = poisoned_f32();
    parameter.set_sampling_mode(F32SamplingMode::None);
    assert_eq!(parameter.sample(0.5, &mut rng), 0.0);

    let mut parameter = poisoned_f32();
    parameter.set_constant(2.0);
    assert_eq!(parameter.sample(0.5, &mut rng), 2.0);

    let mut parameter = poisoned_f32();
    parameter.set_curve(AnimationCurve::linear01());
    assert_eq!(parameter.sample(0.5, &mut rng), 0.5);

    let mut parameter = poisoned_f32();
    parameter.set_random_between_constants(1.0, 2.0);
    assert!(parameter.sample(0.5, &mut rng).is_finite());

    let mut parameter = poisoned_f32();
    parameter.set_random_between_curves(AnimationCurve::linear01(), AnimationCurve::linear10());
    assert!(parameter.sample(0.5, &mut rng).is_finite());
}

#[test]
fn test_color_modes_read_only_their_operands() {
    let mut rng = rng();
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);

    let mut parameter = poisoned_color();
    parameter.set_sampling_mode(ColorSamplingMode::None);
    assert_eq!(parameter.sample(0.5, &mut rng), Vec4::ZERO);

    let mut parameter = poisoned_color();
    parameter.set_color(red);
    assert_eq!(parameter.sample(0.5, &mut rng), red);

    let mut parameter = poisoned_color();
    parameter.set_gradient(ColorGradient::solid(red));
    assert_eq!(parameter.sample(0.5, &mut rng), red);

    let mut parameter = poisoned_color();
    parameter.set_random_between_colors(red, Vec4::ONE);
    assert!(parameter.sample(0.5, &mut rng).is_finite());

    let mut parameter = poisoned_color();
    parameter.set_random_between_gradients(ColorGradient::solid(red), ColorGradient::new());
    assert!(parameter.sample(0.5, &mut rng).is_finite());
}

// ============================================================================
// Out-of-range time
// ============================================================================

#[test]
fn test_track_modes_sample_nan_time_as_first_key() {
    let mut rng = rng();
    let rising = AnimationCurve::from_points(&[(0.0, 3.0), (0.5, 4.0), (1.0, 5.0)]);
    let falling = AnimationCurve::from_points(&[(0.0, 3.0), (1.0, -1.0)]);

    let parameter = ParameterF32::curve(rising.clone());
    assert_eq!(parameter.sample(f32::NAN, &mut rng), 3.0);
    let parameter = ParameterF32::random_between_curves(rising, falling);
    assert_eq!(parameter.sample(f32::NAN, &mut rng), 3.0);

    let start = Vec4::new(1.0, 0.5, 0.25, 1.0);
    let parameter = ParameterColor::gradient(ColorGradient::two_colors(start, Vec4::ZERO));
    assert_eq!(parameter.sample(f32::NAN, &mut rng), start);
    let parameter = ParameterColor::random_between_gradients(
        ColorGradient::two_colors(start, Vec4::ONE),
        ColorGradient::two_colors(start, Vec4::ZERO),
    );
    let blended = parameter.sample(f32::NAN, &mut rng);
    assert!((blended - start).abs().max_element() < 1e-6, "{:?}", blended);
    assert_eq!(parameter.sample_with_fraction(f32::NAN, 0.0), start);

    let seeds = ParticleSeeds::new(1);
    let blended = parameter.sample_seeded(7, f32::NAN, &seeds);
    assert!((blended - start).abs().max_element() < 1e-6, "{:?}", blended);
}

#[test]
fn test_track_modes_clamp_out_of_range_time() {
    let mut rng = rng();
    let parameter = ParameterF32::curve(AnimationCurve::linear01());
    assert_eq!(parameter.sample(-2.0, &mut rng), 0.0);
    assert_eq!(parameter.sample(f32::INFINITY, &mut rng), 1.0);
    assert_eq!(parameter.sample(f32::NEG_INFINITY, &mut rng), 0.0);
}

// ============================================================================
// JSON round trip
// ============================================================================

#[test]
fn test_scalar_json_round_trip_keeps_every_operand() {
    let mut smooth = AnimationCurve::smooth01();
    smooth.set_scalar(3.0);

    for raw in 0..5 {
        let mut parameter = ParameterF32::random_between_constants(-1.5, 4.25);
        parameter.set_random_between_curves(AnimationCurve::sqr01(), smooth.clone());
        parameter.set_sampling_mode(F32SamplingMode::from(raw));

        let mut loaded = ParameterF32::new();
        loaded.load_from_json_str(&parameter.to_json_string()).unwrap();

        assert_eq!(loaded.sampling_mode(), parameter.sampling_mode());
        assert_eq!(loaded.const0(), -1.5);
        assert_eq!(loaded.const1(), 4.25);
        assert_eq!(loaded.curve0(), &AnimationCurve::sqr01());
        assert_eq!(loaded.curve1(), &smooth);
    }
}

#[test]
fn test_json_text_round_trip_is_bit_exact() {
    let third = 1.0f32 / 3.0;
    let mut curve = AnimationCurve::new();
    curve.add_key_with_tangent(0.1, 0.7, -0.3);
    curve.add_key_with_tangent(0.9, third, 2.0 / 3.0);
    curve.set_scalar(0.1);

    let mut parameter = ParameterF32::random_between_constants(0.1, third);
    parameter.set_random_between_curves(curve.clone(), AnimationCurve::linear10());
    parameter.set_sampling_mode(F32SamplingMode::Constant);

    let mut loaded = ParameterF32::new();
    loaded.load_from_json_str(&parameter.to_json_string()).unwrap();
    assert_eq!(loaded.const0().to_bits(), 0.1f32.to_bits());
    assert_eq!(loaded.const1().to_bits(), third.to_bits());
    assert_eq!(loaded.curve0(), &curve);
    assert_eq!(loaded.curve0().scalar().to_bits(), 0.1f32.to_bits());

    let tint = Vec4::new(0.1, third, 0.7, 0.9);
    let parameter = ParameterColor::random_between_colors(tint, Vec4::splat(third));
    let mut loaded = ParameterColor::new();
    loaded.load_from_json_str(&parameter.to_json_string()).unwrap();
    assert_eq!(loaded.color0().to_array().map(f32::to_bits), tint.to_array().map(f32::to_bits));
    assert_eq!(loaded.color1(), Vec4::splat(third));
}

#[test]
fn test_color_json_round_trip_keeps_every_operand() {
    let color0 = Vec4::new(0.1, 0.2, 0.3, 0.4);
    let color1 = Vec4::new(0.9, 0.8, 0.7, 0.6);
    let gradient0 = ColorGradient::two_colors(color0, color1);
    let gradient1 = ColorGradient::solid(color1);

    for raw in 0..5 {
        let mut parameter = ParameterColor::random_between_colors(color0, color1);
        parameter.set_random_between_gradients(gradient0.clone(), gradient1.clone());
        parameter.set_sampling_mode(ColorSamplingMode::from(raw));

        let mut loaded = ParameterColor::new();
        loaded.load_from_json_value(&parameter.to_json_value());

        assert_eq!(loaded.sampling_mode(), parameter.sampling_mode());
        assert_eq!(loaded.color0(), color0);
        assert_eq!(loaded.color1(), color1);
        assert_eq!(loaded.gradient0(), &gradient0);
        assert_eq!(loaded.gradient1(), &gradient1);
    }
}

#[test]
fn test_json_missing_fields_read_as_zero() {
    let mut parameter = ParameterF32::random_between_constants(5.0, 6.0);
    parameter.load_from_json_str(r#"{ "mode": 1 }"#).unwrap();
    assert_eq!(parameter.sampling_mode(), F32SamplingMode::Constant);
    assert_eq!(parameter.const0(), 0.0);
    assert_eq!(parameter.const1(), 0.0);
    assert!(parameter.curve0().is_empty());
}

#[test]
fn test_json_parse_error_leaves_parameter_untouched() {
    let mut parameter = ParameterF32::constant(5.0);
    assert!(parameter.load_from_json_str("{ broken").is_err());
    assert_eq!(parameter, ParameterF32::constant(5.0));
}

// ============================================================================
// Data block round trip
// ============================================================================

#[test]
fn test_data_block_color_mode_keeps_color0() {
    let color0 = Vec4::new(0.25, 0.5, 0.75, 1.0);
    let mut parameter = ParameterColor::random_between_colors(color0, Vec4::ONE);
    let white = ColorGradient::solid(Vec4::ONE);
    parameter.set_random_between_gradients(white.clone(), white);
    parameter.set_sampling_mode(ColorSamplingMode::Color);

    let mut block = DataBlock::new();
    parameter.to_data_block(&mut block);
    assert!(block.is_param_exists("color0"));
    assert!(!block.is_param_exists("color1"));
    assert!(block.get_data_block("gradient0").is_none());

    let mut loaded = ParameterColor::new();
    assert!(loaded.load_from_data_block(&block));
    assert_eq!(loaded.sampling_mode(), ColorSamplingMode::Color);
    assert_eq!(loaded.color0(), color0);
}

#[test]
fn test_data_block_random_gradients_keeps_both_gradients() {
    let gradient0 =
        ColorGradient::two_colors(Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 0.5));
    let mut gradient1 = ColorGradient::solid(Vec4::new(0.0, 0.0, 1.0, 1.0));
    gradient1.add_key_alpha(1.0, 0.0);
    let parameter = ParameterColor::random_between_gradients(gradient0.clone(), gradient1.clone());

    let mut block = DataBlock::new();
    parameter.to_data_block(&mut block);
    assert!(!block.is_param_exists("color0"));

    let bytes = block.to_bytes().unwrap();
    let decoded = DataBlock::from_bytes(&bytes).unwrap();

    let mut loaded = ParameterColor::new();
    assert!(loaded.load_from_data_block(&decoded));
    assert_eq!(loaded.sampling_mode(), ColorSamplingMode::RandomBetweenGradients);
    assert_eq!(loaded.gradient0(), &gradient0);
    assert_eq!(loaded.gradient1(), &gradient1);
    assert_eq!(loaded, parameter);
}

#[test]
fn test_data_block_scalar_writes_used_operands_only() {
    let mut parameter = ParameterF32::random_between_constants(1.0, 2.0);
    parameter.set_curve(AnimationCurve::linear01());

    let mut block = DataBlock::new();
    parameter.to_data_block(&mut block);
    assert_eq!(block.get_s32("mode"), 2);
    assert!(!block.is_param_exists("const0"));
    assert!(block.get_data_block("curve0").is_some());
    assert!(block.get_data_block("curve1").is_none());

    // Constants not in the block read as zero, absent tracks keep their value
    let mut loaded = ParameterF32::random_between_constants(7.0, 8.0);
    loaded.set_random_between_curves(AnimationCurve::sqr01(), AnimationCurve::smooth10());
    loaded.load_from_data_block(&block);
    assert_eq!(loaded.sampling_mode(), F32SamplingMode::Curve);
    assert_eq!(loaded.const0(), 0.0);
    assert_eq!(loaded.const1(), 0.0);
    assert_eq!(loaded.curve0(), &AnimationCurve::linear01());
    assert_eq!(loaded.curve1(), &AnimationCurve::smooth10());
}

#[test]
fn test_empty_data_block_loads_as_none() {
    let mut parameter = ParameterF32::constant(3.0);
    assert!(parameter.load_from_data_block(&DataBlock::new()));
    assert_eq!(parameter.sampling_mode(), F32SamplingMode::None);
    assert_eq!(parameter.sample(0.0, &mut rng()), 0.0);
}

// ============================================================================
// Unknown modes
// ============================================================================

#[test]
fn test_unknown_mode_samples_neutral() {
    let mut rng = rng();

    let mut scalar = ParameterF32::random_between_constants(1.0, 2.0);
    scalar.set_sampling_mode(F32SamplingMode::from(999));
    assert_eq!(scalar.sample(0.5, &mut rng), 0.0);

    let mut color = ParameterColor::color(Vec4::ONE);
    color.set_sampling_mode(ColorSamplingMode::from(999));
    assert_eq!(color.sample(0.5, &mut rng), Vec4::ZERO);
}

#[test]
fn test_unknown_mode_from_files_loads_as_none() {
    let mut scalar = ParameterF32::constant(1.0);
    scalar.load_from_json_str(r#"{ "mode": 999, "c0": 4.0 }"#).unwrap();
    assert_eq!(scalar.sampling_mode(), F32SamplingMode::None);
    assert_eq!(scalar.const0(), 4.0);

    let mut block = DataBlock::new();
    block.set_s32("mode", -7);
    let mut color = ParameterColor::color(Vec4::ONE);
    color.load_from_data_block(&block);
    assert_eq!(color.sampling_mode(), ColorSamplingMode::None);
}

// ============================================================================
// Scaling and randomness
// ============================================================================

#[test]
fn test_multiply_values_doubles_random_range() {
    let mut parameter = ParameterF32::random_between_constants(1.0, 3.0);
    parameter.multiply_values(2.0);
    assert_eq!(parameter.const0(), 2.0);
    assert_eq!(parameter.const1(), 6.0);

    let mut rng = rng();
    for _ in 0..200 {
        let value = parameter.sample(0.0, &mut rng);
        assert!((2.0..=6.0).contains(&value), "{} outside doubled range", value);
    }
}

#[test]
fn test_random_constants_span_range() {
    let parameter = ParameterF32::random_between_constants(10.0, 20.0);
    let mut rng = rng();
    let samples: Vec<f32> = (0..1000).map(|_| parameter.sample(0.0, &mut rng)).collect();

    let min = samples.iter().copied().fold(f32::INFINITY, f32::min);
    let max = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    assert!(min >= 10.0 && max <= 20.0);
    assert!(min < 11.0, "min {} does not reach low end", min);
    assert!(max > 19.0, "max {} does not reach high end", max);
}

#[test]
fn test_random_gradients_span_range() {
    let parameter = ParameterColor::random_between_gradients(
        ColorGradient::solid(Vec4::ZERO),
        ColorGradient::solid(Vec4::ONE),
    );
    let mut rng = rng();
    let reds: Vec<f32> = (0..1000).map(|_| parameter.sample(0.3, &mut rng).x).collect();

    let min = reds.iter().copied().fold(f32::INFINITY, f32::min);
    let max = reds.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    assert!(min < 0.1 && max > 0.9);
}

#[test]
fn test_seeded_sampling_is_stable_per_seed() {
    let seeds = ParticleSeeds::new(9);
    let parameter =
        ParameterF32::random_between_curves(AnimationCurve::linear01(), AnimationCurve::linear10());

    for seed in 0..64 {
        let first = parameter.sample_seeded(seed, 0.2, &seeds);
        let second = parameter.sample_seeded(seed, 0.2, &seeds);
        assert_eq!(first, second);
    }

    let distinct: Vec<f32> =
        (0..64).map(|seed| parameter.sample_seeded(seed, 0.0, &seeds)).collect();
    assert!(distinct.iter().any(|&v| v != distinct[0]));
}
