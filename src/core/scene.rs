use crate::core::calibration;
use crate::core::radiometry::{RadiometricConverter, SceneConstants};
use crate::core::reproject::{source_transform, BandReprojector, Resampler};
use crate::io::metadata::{band_rasters, BandRaster, SceneMetadata, SceneReader};
use crate::types::{
    AsterError, AsterImage, AsterProduct, AsterReal, AsterResult, BandDiagnostic, BandId, DestinationGrid,
    ProcessingMode, ResamplingMethod, SkipReason,
};
use chrono::Datelike;
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

/// Scene conversion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingParams {
    /// Radiance (15 slots) or reflectance (10 slots)
    pub mode: ProcessingMode,
    /// Resampling used when reprojecting each band
    pub resampling: ResamplingMethod,
    /// Process bands concurrently (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Reflectance,
            resampling: ResamplingMethod::Bilinear,
            parallel: true,
        }
    }
}

/// Outcome of one band
enum BandOutcome {
    Converted(BandId, AsterImage),
    Skipped(BandDiagnostic),
    /// No coefficient for the gain: the slot is NaN, not fill
    Uncalibrated(BandDiagnostic),
}

/// Converts a whole scene onto a destination grid
pub struct SceneProcessor<'r> {
    resampler: &'r dyn Resampler,
    params: ProcessingParams,
}

impl<'r> SceneProcessor<'r> {
    pub fn new(resampler: &'r dyn Resampler, params: ProcessingParams) -> Self {
        Self { resampler, params }
    }

    pub fn params(&self) -> &ProcessingParams {
        &self.params
    }

    /// Convert every band of `scene` and stack the results.
    ///
    /// Metadata and geometry problems abort the scene. A band with no
    /// coefficient for its gain is written as NaN; bands with no slot or no
    /// irradiance keep the destination fill. Both are listed in the product's
    /// diagnostics.
    pub fn process(&self, scene: &dyn SceneReader, destination: &DestinationGrid) -> AsterResult<AsterProduct> {
        let mode = self.params.mode;
        log::info!(
            "Processing ASTER scene {} ({:?}, {:?} resampling)",
            scene.scene_id(),
            mode,
            self.params.resampling
        );

        destination.validate()?;
        let metadata = SceneMetadata::extract(scene)?;
        let rasters = band_rasters(scene)?;

        // corner check once per scene, before any band is read
        source_transform(metadata.upper_left, metadata.lower_right, (1, 1)).map_err(|e| AsterError::Metadata {
            scene: scene.scene_id().to_string(),
            field: "UPPERLEFT/LOWERRIGHT".to_string(),
            reason: e.to_string(),
        })?;

        let constants = SceneConstants::new(metadata.acquisition_date.ordinal(), metadata.solar.elevation);
        log::debug!(
            "Day of year {}, Earth-Sun distance {:.6} AU, solar elevation {:.3} deg",
            constants.day_of_year,
            constants.earth_sun_distance,
            constants.solar_elevation
        );

        let (rows, cols) = destination.shape();
        let band_count = mode.band_count();
        let mut data = Array3::from_shape_fn((rows, cols, band_count), |(r, c, _)| destination.fill[[r, c]]);

        let converter = RadiometricConverter::new(constants);
        let outcomes = self.run_bands(&rasters, scene, &metadata, &converter, destination)?;

        let mut bands_written = Vec::new();
        let mut diagnostics = Vec::new();
        for outcome in outcomes {
            match outcome {
                BandOutcome::Converted(band, image) => {
                    data.index_axis_mut(Axis(2), calibration::band_index(band)).assign(&image);
                    bands_written.push(band);
                }
                BandOutcome::Uncalibrated(diagnostic) => {
                    log::warn!(
                        "Scene {}: band {} not calibrated: {}",
                        scene.scene_id(),
                        diagnostic.band,
                        diagnostic.reason
                    );
                    data.index_axis_mut(Axis(2), calibration::band_index(diagnostic.band))
                        .fill(AsterReal::NAN);
                    diagnostics.push(diagnostic);
                }
                BandOutcome::Skipped(diagnostic) => {
                    log::warn!(
                        "Scene {}: band {} skipped: {}",
                        scene.scene_id(),
                        diagnostic.band,
                        diagnostic.reason
                    );
                    diagnostics.push(diagnostic);
                }
            }
        }
        bands_written.sort();

        log::info!(
            "Scene {} done: {} of {} bands written, {} skipped",
            scene.scene_id(),
            bands_written.len(),
            rasters.len(),
            diagnostics.len()
        );

        Ok(AsterProduct {
            scene_id: scene.scene_id().to_string(),
            mode,
            data,
            bands_written,
            diagnostics,
        })
    }

    #[cfg(feature = "parallel")]
    fn run_bands(
        &self,
        rasters: &[BandRaster],
        scene: &dyn SceneReader,
        metadata: &SceneMetadata,
        converter: &RadiometricConverter,
        destination: &DestinationGrid,
    ) -> AsterResult<Vec<BandOutcome>> {
        use rayon::prelude::*;

        if self.params.parallel {
            rasters
                .par_iter()
                .map(|raster| self.process_band(raster, scene, metadata, converter, destination))
                .collect()
        } else {
            rasters
                .iter()
                .map(|raster| self.process_band(raster, scene, metadata, converter, destination))
                .collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_bands(
        &self,
        rasters: &[BandRaster],
        scene: &dyn SceneReader,
        metadata: &SceneMetadata,
        converter: &RadiometricConverter,
        destination: &DestinationGrid,
    ) -> AsterResult<Vec<BandOutcome>> {
        rasters
            .iter()
            .map(|raster| self.process_band(raster, scene, metadata, converter, destination))
            .collect()
    }

    /// Read, reproject and convert a single band
    fn process_band(
        &self,
        raster: &BandRaster,
        scene: &dyn SceneReader,
        metadata: &SceneMetadata,
        converter: &RadiometricConverter,
        destination: &DestinationGrid,
    ) -> AsterResult<BandOutcome> {
        let band = raster.band;
        let skipped = |reason| Ok(BandOutcome::Skipped(BandDiagnostic { band, reason }));
        let reflectance = self.params.mode == ProcessingMode::Reflectance;

        if calibration::band_index(band) >= self.params.mode.band_count() {
            return skipped(SkipReason::NoOutputSlot);
        }
        if reflectance && calibration::irradiance(band).is_none() {
            return skipped(SkipReason::NoIrradiance);
        }
        let gain = metadata.gain(band)?;
        if calibration::coefficient(band, gain).is_none() {
            let reason = SkipReason::MissingCoefficient(gain);
            return Ok(BandOutcome::Uncalibrated(BandDiagnostic { band, reason }));
        }

        log::info!(
            "Scene {} - band {} (gain {}, {:.0} m)",
            scene.scene_id(),
            band,
            gain,
            calibration::resolution(band)
        );
        let source = scene.read_raster(&raster.name)?;
        let reprojected = BandReprojector::new(self.resampler, self.params.resampling).reproject(
            &source,
            metadata.upper_left,
            metadata.lower_right,
            destination,
        )?;

        match converter.convert(&reprojected, band, gain, reflectance) {
            Ok(image) => Ok(BandOutcome::Converted(band, image)),
            Err(reason @ SkipReason::MissingCoefficient(_)) => {
                Ok(BandOutcome::Uncalibrated(BandDiagnostic { band, reason }))
            }
            Err(reason) => skipped(reason),
        }
    }
}
