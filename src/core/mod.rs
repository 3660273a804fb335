//! Core ASTER processing modules

pub mod calibration;
pub mod radiometry;
pub mod reproject;
pub mod scene;
pub mod warp;

// Re-export main types
pub use calibration::{band_index, coefficient, irradiance, resolution, Subsystem};
pub use radiometry::{day_of_year, earth_sun_distance, RadiometricConverter, SceneConstants};
pub use reproject::{source_transform, AffineResampler, BandReprojector, Resampler};
pub use scene::{ProcessingParams, SceneProcessor};
pub use warp::GdalWarper;
