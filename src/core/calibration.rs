//! Fixed ASTER radiometric tables.
//!
//! Unit conversion coefficients (W m-2 sr-1 um-1 per DN) and solar exo-atmospheric
//! irradiance (W m-2 um-1) after Finn, Reed and Yamamoto (2012), "A straight forward
//! guide for processing radiance and reflectance for EO-1 ALI, Landsat 5 TM,
//! Landsat 7 ETM+, and ASTER", USGS CEGIS.

use crate::types::{BandId, GainSetting};

/// Unit conversion coefficients, rows by band index, columns HGH/NOR/LG1/LG2
const UNIT_CONVERSION: [[Option<f32>; 4]; 15] = [
    [Some(0.676), Some(1.688), Some(2.25), None],
    [Some(0.708), Some(1.415), Some(1.89), None],
    [Some(0.423), Some(0.862), Some(1.15), None],
    [Some(0.423), Some(0.862), Some(1.15), None],
    [Some(0.1087), Some(0.2174), Some(0.2900), Some(0.2900)],
    [Some(0.0348), Some(0.0696), Some(0.0925), Some(0.4090)],
    [Some(0.0313), Some(0.0625), Some(0.0830), Some(0.3900)],
    [Some(0.0299), Some(0.0597), Some(0.0795), Some(0.3320)],
    [Some(0.0209), Some(0.0417), Some(0.0556), Some(0.2450)],
    [Some(0.0159), Some(0.0318), Some(0.0424), Some(0.2650)],
    [None, Some(0.006822), None, None],
    [None, Some(0.006780), None, None],
    [None, Some(0.006590), None, None],
    [None, Some(0.005693), None, None],
    [None, Some(0.005225), None, None],
];

/// Solar irradiance, defined for the reflective bands only
const IRRADIANCE: [Option<f32>; 15] = [
    Some(1848.99),
    Some(1555.74),
    None,
    Some(1119.47),
    Some(231.25),
    Some(79.81),
    Some(74.99),
    Some(68.66),
    Some(59.74),
    Some(56.92),
    None,
    None,
    None,
    None,
    None,
];

/// Ground sample distance in meters
const RESOLUTION_M: [f64; 15] = [
    15.0, 15.0, 15.0, 15.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 90.0, 90.0, 90.0, 90.0, 90.0,
];

/// Position of the band on the output band axis
///
/// | index | 0 | 1 | 2  | 3  | 4 | 5 | 6 | 7 | 8 | 9 | 10 | 11 | 12 | 13 | 14 |
/// |-------|---|---|----|----|---|---|---|---|---|---|----|----|----|----|----|
/// | band  | 1 | 2 | 3B | 3N | 4 | 5 | 6 | 7 | 8 | 9 | 10 | 11 | 12 | 13 | 14 |
pub fn band_index(band: BandId) -> usize {
    band as usize
}

/// Unit conversion coefficient, `None` where the instrument has no such mode
pub fn coefficient(band: BandId, gain: GainSetting) -> Option<f32> {
    UNIT_CONVERSION[band_index(band)][gain.column()]
}

pub fn resolution(band: BandId) -> f64 {
    RESOLUTION_M[band_index(band)]
}

/// Solar exo-atmospheric irradiance, `None` for bands without reflectance
pub fn irradiance(band: BandId) -> Option<f32> {
    IRRADIANCE[band_index(band)]
}

/// Instrument subsystem a band belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Vnir,
    Swir,
    Tir,
}

pub fn subsystem(band: BandId) -> Subsystem {
    match band_index(band) {
        0..=3 => Subsystem::Vnir,
        4..=9 => Subsystem::Swir,
        _ => Subsystem::Tir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_index_is_table_order() {
        for (i, band) in BandId::ALL.iter().enumerate() {
            assert_eq!(band_index(*band), i);
        }
        assert_eq!(band_index(BandId::B3N), 3);
        assert_eq!(band_index(BandId::B14), 14);
    }

    #[test]
    fn test_coefficient_lookup() {
        assert_eq!(coefficient(BandId::B1, GainSetting::High), Some(0.676));
        assert_eq!(coefficient(BandId::B3N, GainSetting::Normal), Some(0.862));
        assert_eq!(coefficient(BandId::B9, GainSetting::LowGain2), Some(0.2650));
        assert_eq!(coefficient(BandId::B14, GainSetting::Normal), Some(0.005225));
    }

    #[test]
    fn test_undefined_coefficients_are_absent() {
        for band in [BandId::B1, BandId::B2, BandId::B3B, BandId::B3N] {
            assert_eq!(coefficient(band, GainSetting::LowGain2), None);
        }
        for band in &BandId::ALL[10..] {
            assert_eq!(coefficient(*band, GainSetting::High), None);
            assert_eq!(coefficient(*band, GainSetting::LowGain1), None);
            assert_eq!(coefficient(*band, GainSetting::LowGain2), None);
            assert!(coefficient(*band, GainSetting::Normal).is_some());
        }
    }

    #[test]
    fn test_irradiance_defined_for_nine_bands() {
        let defined: Vec<BandId> = BandId::ALL.iter().copied().filter(|b| irradiance(*b).is_some()).collect();
        assert_eq!(defined.len(), 9);
        assert!(!defined.contains(&BandId::B3B));
        assert!(defined.iter().all(|b| band_index(*b) < 10));
        assert_eq!(irradiance(BandId::B1), Some(1848.99));
    }

    #[test]
    fn test_resolution_tiers() {
        assert_eq!(resolution(BandId::B3B), 15.0);
        assert_eq!(resolution(BandId::B4), 30.0);
        assert_eq!(resolution(BandId::B10), 90.0);
        assert_eq!(subsystem(BandId::B3N), Subsystem::Vnir);
        assert_eq!(subsystem(BandId::B9), Subsystem::Swir);
        assert_eq!(subsystem(BandId::B13), Subsystem::Tir);
    }
}
