//! Constants for astronomical calculations

use std::f64::consts::PI;

// Astronomical distances
/// Astronomical Unit in meters (per IAU 2012 Resolution B2)
pub const AU_M: f64 = 149_597_870_700.0;
/// Astronomical Unit in kilometers
pub const AU_KM: f64 = 149_597_870.700;
/// Light-year in kilometers
pub const LY_KM: f64 = 9_460_730_472_580.8;

// Time constants
/// Seconds in a day
pub const DAY_S: f64 = 86_400.0;
/// J2000.0 epoch as Julian date
pub const J2000: f64 = 2_451_545.0;

// Angles
/// Degrees to radians conversion factor
pub const DEG2RAD: f64 = PI / 180.0;
/// Radians to degrees conversion factor
pub const RAD2DEG: f64 = 180.0 / PI;
/// Tau (2*PI) for full circle
pub const TAU: f64 = 2.0 * PI;
/// Mean obliquity of the ecliptic at J2000.0, in degrees (IAU 1976)
pub const J2000_OBLIQUITY_DEG: f64 = 23.439_291_1;

// Photometry
/// Total power output of the Sun in Watts
pub const SOLAR_POWER_W: f64 = 3.828e26;
/// Absolute magnitude of the Sun
pub const SOLAR_ABS_MAG: f64 = 4.83;
/// Luminosity ratio corresponding to a difference of one magnitude
pub const LUM_RATIO_PER_MAG: f64 = 2.511_886_431_509_58;

/// Convert astronomical units to kilometers
pub fn au_to_km(au: f64) -> f64 {
    au * AU_KM
}

/// Convert kilometers to astronomical units
pub fn km_to_au(km: f64) -> f64 {
    km / AU_KM
}

/// Convert kilometers to light-years
pub fn km_to_ly(km: f64) -> f64 {
    km / LY_KM
}

/// Convert light-years to kilometers
pub fn ly_to_km(ly: f64) -> f64 {
    ly * LY_KM
}

/// Convert a luminosity (in solar units) to an absolute magnitude
pub fn lum_to_abs_mag(lum: f64) -> f64 {
    SOLAR_ABS_MAG - lum.log(LUM_RATIO_PER_MAG)
}

/// Convert a luminosity (in solar units) to an apparent magnitude at a
/// distance given in light-years. A zero or negative distance returns 0 by
/// policy rather than propagating a non-finite magnitude.
pub fn lum_to_app_mag(lum: f64, dist_ly: f64) -> f64 {
    if dist_ly <= 0.0 || lum <= 0.0 {
        return 0.0;
    }
    let parsecs = dist_ly / 3.261_563_777;
    lum_to_abs_mag(lum) + 5.0 * (parsecs / 10.0).log10()
}

/// Surface area of a sphere of the given radius
pub fn sphere_area(r: f64) -> f64 {
    4.0 * PI * r * r
}

/// Area of a circle of the given radius
pub fn circle_area(r: f64) -> f64 {
    PI * r * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_conversions() {
        assert_relative_eq!(au_to_km(1.0), AU_KM);
        assert_relative_eq!(km_to_au(AU_KM), 1.0);
        assert_relative_eq!(ly_to_km(km_to_ly(1.0e13)), 1.0e13, epsilon = 1e-3);
    }

    #[test]
    fn test_sun_abs_mag() {
        assert_relative_eq!(lum_to_abs_mag(1.0), SOLAR_ABS_MAG, epsilon = 1e-9);
    }

    #[test]
    fn test_app_mag_degenerate_inputs() {
        assert_eq!(lum_to_app_mag(1.0, 0.0), 0.0);
        assert_eq!(lum_to_app_mag(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_app_mag_at_ten_parsecs() {
        // At exactly 10 pc the apparent magnitude equals the absolute one.
        let ten_pc_ly = 32.615_637_77;
        assert_relative_eq!(lum_to_app_mag(1.0, ten_pc_ly), SOLAR_ABS_MAG, epsilon = 1e-6);
    }
}
