use asterl1t::io::{band_rasters, HdfScene, SceneMetadata, SceneReader};
use asterl1t::types::{DestinationGrid, GeoTransform, ProcessingMode, ReferenceSystem, ResamplingMethod};
use asterl1t::ProcessingParams;
use std::path::PathBuf;

/// Real ASTER L1T granule, e.g. AST_L1T_00306152017133701_20170616100209_12345.hdf
fn test_data_path() -> Option<PathBuf> {
    std::env::var("ASTER_L1T_TEST_FILE").ok().map(PathBuf::from).filter(|p| p.exists())
}

#[test]
fn test_hdf_scene_with_real_data() {
    let Some(path) = test_data_path() else {
        println!("Test data not found, skipping test");
        return;
    };
    let _ = env_logger::builder().is_test(true).try_init();

    let scene = HdfScene::open(&path).expect("Failed to open ASTER scene");
    let metadata = SceneMetadata::extract(&scene).expect("Failed to extract metadata");
    println!("Scene: {}", scene.scene_id());
    println!("  Date: {}", metadata.calendar_date);
    println!("  Sun: {:?}", metadata.solar);
    println!("  UL: {:?}  LR: {:?}", metadata.upper_left, metadata.lower_right);

    let rasters = band_rasters(&scene).expect("Failed to enumerate bands");
    assert!(!rasters.is_empty(), "No ImageData sub-datasets found");
    for raster in &rasters {
        println!("  {} -> {}", raster.band, raster.name);
    }

    let (ul, lr) = (metadata.upper_left, metadata.lower_right);
    let rows = 50;
    let cols = 50;
    let transform = GeoTransform::from_array([
        ul.lon,
        (lr.lon - ul.lon) / cols as f64,
        0.0,
        ul.lat,
        0.0,
        (lr.lat - ul.lat) / rows as f64,
    ]);
    let grid = DestinationGrid::filled(rows, cols, 0.0, transform, ReferenceSystem::Epsg(4326));
    let params = ProcessingParams {
        mode: ProcessingMode::Reflectance,
        resampling: ResamplingMethod::Average,
        parallel: true,
    };
    let product = asterl1t::process_aster_file(&path, &grid, params).expect("Scene conversion failed");
    assert_eq!(product.data.dim(), (rows, cols, 10));
    println!("  Bands written: {:?}", product.bands_written);
    println!("  Diagnostics: {:?}", product.diagnostics);
}

#[test]
fn test_hdf_scene_error_handling() {
    let result = HdfScene::open("nonexistent_AST_L1T.hdf");
    assert!(matches!(result, Err(asterl1t::AsterError::Io(_))));
}
