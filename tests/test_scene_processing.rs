use approx::assert_relative_eq;
use asterl1t::core::{calibration, earth_sun_distance};
use asterl1t::types::{
    BandId, DestinationGrid, GeoTransform, ProcessingMode, ReferenceSystem, ResamplingMethod, SkipReason,
};
use asterl1t::{AffineResampler, MemoryScene, ProcessingParams, SceneProcessor};
use ndarray::{array, Array2};
use std::f64::consts::PI;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scene whose source grid coincides with `destination()`
fn base_scene() -> MemoryScene {
    MemoryScene::new("AST_L1T_00306152017133701_test.hdf")
        .with_metadata("SOLARDIRECTION", "38.512, 60.0")
        .with_metadata("UPPERLEFT", "-20.0, -50.0")
        .with_metadata("LOWERRIGHT", "-20.02, -49.97")
        .with_metadata("CALENDARDATE", "20170615")
        .with_metadata("GAIN.1", "01, HGH")
        .with_metadata("GAIN.2", "02, NOR")
        .with_metadata("GAIN.3", "3N, NOR")
        .with_metadata("GAIN.4", "3B, NOR")
        .with_metadata("GAIN.5", "04, NOR")
        .with_metadata("GAIN.6", "05, NOR")
        .with_metadata("GAIN.7", "06, NOR")
        .with_metadata("GAIN.8", "07, NOR")
        .with_metadata("GAIN.9", "08, NOR")
        .with_metadata("GAIN.10", "09, NOR")
}

fn destination(fill: f32) -> DestinationGrid {
    DestinationGrid::filled(
        2,
        3,
        fill,
        GeoTransform::from_array([-50.0, 0.01, 0.0, -20.0, 0.0, -0.01]),
        ReferenceSystem::Epsg(4326),
    )
}

fn params(mode: ProcessingMode, parallel: bool) -> ProcessingParams {
    ProcessingParams {
        mode,
        resampling: ResamplingMethod::Nearest,
        parallel,
    }
}

fn full_scene() -> MemoryScene {
    let mut scene = base_scene();
    for (i, band) in BandId::ALL.iter().enumerate() {
        let dn = Array2::from_shape_fn((2, 3), |(r, c)| (10 * i + 3 * r + c + 2) as f32);
        scene = scene.with_band(*band, dn);
    }
    scene
}

#[test]
fn test_band_one_end_to_end() {
    init_logging();
    let scene = base_scene().with_band(BandId::B1, array![[101.0, 101.0, 101.0], [101.0, 0.0, 101.0]]);
    let resampler = AffineResampler::new();

    let radiance = SceneProcessor::new(&resampler, params(ProcessingMode::Radiance, false))
        .process(&scene, &destination(-9999.0))
        .expect("radiance run failed");
    let l = radiance.band(BandId::B1).unwrap();
    assert_relative_eq!(l[[0, 0]], 67.6, epsilon = 1e-4);
    assert!(l[[1, 1]].is_nan(), "zero DN must become NaN");

    let reflectance = SceneProcessor::new(&resampler, params(ProcessingMode::Reflectance, false))
        .process(&scene, &destination(-9999.0))
        .expect("reflectance run failed");
    let d = earth_sun_distance(166);
    let expected = PI * 67.6 * d * d / (1848.99 * 60f64.to_radians().sin());
    let rho = reflectance.band(BandId::B1).unwrap();
    assert_relative_eq!(rho[[0, 0]] as f64, expected, max_relative = 1e-5);
    assert!(rho[[1, 1]].is_nan());
}

#[test]
fn test_radiance_covers_all_fifteen_bands() {
    init_logging();
    let resampler = AffineResampler::new();
    let product = SceneProcessor::new(&resampler, params(ProcessingMode::Radiance, false))
        .process(&full_scene(), &destination(0.0))
        .unwrap();

    assert_eq!(product.data.dim(), (2, 3, 15));
    assert_eq!(product.bands_written, BandId::ALL.to_vec());
    assert!(product.diagnostics.is_empty());

    // TIR bands use the normal gain although the metadata never reports it
    let coefficient = calibration::coefficient(BandId::B10, asterl1t::GainSetting::Normal).unwrap();
    let b10 = product.band(BandId::B10).unwrap();
    assert_eq!(b10[[0, 0]], (102.0f32 - 1.0) * coefficient);
}

#[test]
fn test_reflectance_leaves_fill_for_non_reflective_bands() {
    init_logging();
    let resampler = AffineResampler::new();
    let product = SceneProcessor::new(&resampler, params(ProcessingMode::Reflectance, false))
        .process(&full_scene(), &destination(-42.0))
        .unwrap();

    assert_eq!(product.data.dim(), (2, 3, 10));
    assert_eq!(product.bands_written.len(), 9);
    assert!(product.band(BandId::B3B).unwrap().iter().all(|v| *v == -42.0));
    for band in [BandId::B10, BandId::B11, BandId::B12, BandId::B13, BandId::B14] {
        assert!(product.band(band).is_none());
        assert!(product
            .diagnostics
            .iter()
            .any(|d| d.band == band && d.reason == SkipReason::NoOutputSlot));
    }
    assert!(product
        .diagnostics
        .iter()
        .any(|d| d.band == BandId::B3B && d.reason == SkipReason::NoIrradiance));
    assert!(product.band(BandId::B9).unwrap().iter().all(|v| v.is_finite() && *v > 0.0));
}

#[test]
fn test_parallel_matches_sequential() {
    init_logging();
    let resampler = AffineResampler::new();
    let scene = full_scene();
    for mode in [ProcessingMode::Radiance, ProcessingMode::Reflectance] {
        let sequential = SceneProcessor::new(&resampler, params(mode, false))
            .process(&scene, &destination(1.0))
            .unwrap();
        let parallel = SceneProcessor::new(&resampler, params(mode, true))
            .process(&scene, &destination(1.0))
            .unwrap();
        assert_eq!(sequential.bands_written, parallel.bands_written);
        for (a, b) in sequential.data.iter().zip(parallel.data.iter()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}

#[test]
fn test_uncovered_destination_pixels() {
    init_logging();
    // destination extends one column east of the scene
    let grid = DestinationGrid::filled(
        2,
        4,
        5.0,
        GeoTransform::from_array([-50.0, 0.01, 0.0, -20.0, 0.0, -0.01]),
        ReferenceSystem::Epsg(4326),
    );
    let scene = base_scene().with_band(BandId::B2, Array2::from_elem((2, 3), 3.0));
    let resampler = AffineResampler::new();
    let product = SceneProcessor::new(&resampler, params(ProcessingMode::Radiance, false))
        .process(&scene, &grid)
        .unwrap();

    let b2 = product.band(BandId::B2).unwrap();
    assert_eq!(b2[[0, 0]], 2.0 * 1.415f32);
    // the fill value passes through calibration like any other DN
    assert_eq!(b2[[0, 3]], 4.0 * 1.415f32);
}

#[test]
fn test_destination_validation_is_fatal() {
    let resampler = AffineResampler::new();
    let grid = DestinationGrid::filled(
        2,
        2,
        0.0,
        GeoTransform::from_array([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ReferenceSystem::Epsg(4326),
    );
    let result = SceneProcessor::new(&resampler, params(ProcessingMode::Radiance, false)).process(&full_scene(), &grid);
    assert!(matches!(result, Err(asterl1t::AsterError::InvalidGeometry(_))));
}

#[test]
fn test_uncalibrated_band_is_nan_not_fill() {
    init_logging();
    // band 2 has no coefficient at LG2
    let scene = base_scene()
        .with_metadata("GAIN.2", "02, LG2")
        .with_band(BandId::B1, Array2::from_elem((2, 3), 5.0))
        .with_band(BandId::B2, Array2::from_elem((2, 3), 5.0));
    let resampler = AffineResampler::new();
    let product = SceneProcessor::new(&resampler, params(ProcessingMode::Radiance, false))
        .process(&scene, &destination(0.0))
        .unwrap();

    assert_eq!(product.bands_written, vec![BandId::B1]);
    assert_eq!(product.diagnostics.len(), 1);
    assert_eq!(product.diagnostics[0].band, BandId::B2);
    assert!(matches!(product.diagnostics[0].reason, SkipReason::MissingCoefficient(_)));
    assert!(product.band(BandId::B2).unwrap().iter().all(|v| v.is_nan()));
    assert!(product.band(BandId::B3N).unwrap().iter().all(|v| *v == 0.0));
}
