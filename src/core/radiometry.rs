use crate::core::calibration;
use crate::types::{AsterError, AsterImage, AsterReal, AsterResult, BandId, GainSetting, SkipReason};
use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Parse a YYYYMMDD calendar date
pub fn parse_calendar_date(date: &str) -> AsterResult<NaiveDate> {
    let date = date.trim();
    if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return Err(AsterError::InvalidFormat(format!(
            "Calendar date must be 8 digits (YYYYMMDD), got '{}'",
            date
        )));
    }
    let field = |range: std::ops::Range<usize>| date[range].parse::<u32>().unwrap_or(0);
    NaiveDate::from_ymd_opt(field(0..4) as i32, field(4..6), field(6..8))
        .ok_or_else(|| AsterError::InvalidFormat(format!("Invalid calendar date '{}'", date)))
}

/// Day of year in [1, 366] for a YYYYMMDD date
pub fn day_of_year(date: &str) -> AsterResult<u32> {
    Ok(parse_calendar_date(date)?.ordinal())
}

/// Earth-Sun distance in astronomical units from the mean orbital eccentricity
pub fn earth_sun_distance(day_of_year: u32) -> f64 {
    1.0 - 0.01672 * (0.9856 * (day_of_year as f64 - 4.0)).to_radians().cos()
}

/// Per-scene constants shared by every band
#[derive(Debug, Clone, Copy)]
pub struct SceneConstants {
    pub day_of_year: u32,
    pub earth_sun_distance: f64,
    pub solar_elevation: f64,
}

impl SceneConstants {
    pub fn new(day_of_year: u32, solar_elevation: f64) -> Self {
        Self {
            day_of_year,
            earth_sun_distance: earth_sun_distance(day_of_year),
            solar_elevation,
        }
    }
}

/// Converts reprojected digital numbers to radiance and reflectance
pub struct RadiometricConverter {
    constants: SceneConstants,
}

impl RadiometricConverter {
    pub fn new(constants: SceneConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &SceneConstants {
        &self.constants
    }

    /// Replace exact-zero pixels with NaN. Must run before scaling.
    pub fn mask_no_data(dn: &AsterImage) -> AsterImage {
        dn.mapv(|v| if v == 0.0 { AsterReal::NAN } else { v })
    }

    /// radiance = (DN - 1) * coefficient(band, gain), zero DN becomes NaN
    pub fn to_radiance(&self, dn: &AsterImage, band: BandId, gain: GainSetting) -> Result<AsterImage, SkipReason> {
        let coefficient = calibration::coefficient(band, gain).ok_or(SkipReason::MissingCoefficient(gain))?;
        let mut radiance = Self::mask_no_data(dn);
        radiance.mapv_inplace(|v| (v - 1.0) * coefficient);
        Ok(radiance)
    }

    /// Multiplier turning radiance into reflectance for one band
    ///
    /// pi * d^2 / (E_sun * sin(elevation)); a sun at the horizon gives an
    /// infinite factor which is left to propagate.
    pub fn reflectance_factor(&self, band: BandId) -> Result<f64, SkipReason> {
        let irradiance = calibration::irradiance(band).ok_or(SkipReason::NoIrradiance)?;
        let d = self.constants.earth_sun_distance;
        let sun = self.constants.solar_elevation.to_radians().sin();
        Ok((PI * d * d) / (irradiance as f64 * sun))
    }

    pub fn to_reflectance(&self, radiance: &AsterImage, band: BandId) -> Result<AsterImage, SkipReason> {
        let factor = self.reflectance_factor(band)?;
        Ok(radiance.mapv(|l| (l as f64 * factor) as AsterReal))
    }

    /// Radiance, then reflectance when requested
    pub fn convert(
        &self,
        dn: &AsterImage,
        band: BandId,
        gain: GainSetting,
        reflectance: bool,
    ) -> Result<AsterImage, SkipReason> {
        // checked first so no work is spent on bands that end up skipped
        if reflectance {
            calibration::irradiance(band).ok_or(SkipReason::NoIrradiance)?;
        }
        let radiance = self.to_radiance(dn, band, gain)?;
        if reflectance {
            self.to_reflectance(&radiance, band)
        } else {
            Ok(radiance)
        }
    }
}
