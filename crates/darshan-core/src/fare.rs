//! Cab fare estimation
//!
//! Fares are a flat base plus a per-kilometre rate, rounded to the nearest
//! rupee. Driving distances normally come from the client's maps provider;
//! when only coordinates are known the great-circle distance is used.

use crate::config::FareConfig;
use crate::{DarshanError, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Tariff applied to a trip distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareTariff {
    pub base_fare: f64,
    pub per_km: f64,
}

impl Default for FareTariff {
    fn default() -> Self {
        Self::from(&FareConfig::default())
    }
}

impl From<&FareConfig> for FareTariff {
    fn from(config: &FareConfig) -> Self {
        Self {
            base_fare: config.base_fare,
            per_km: config.per_km,
        }
    }
}

/// Result of a fare calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareEstimate {
    pub distance_km: f64,
    /// Whole rupees
    pub fare: i64,
    pub currency: String,
    /// True when the distance is a straight-line approximation
    pub approximate: bool,
}

impl FareTariff {
    /// Estimate the fare for a driving distance in kilometres
    pub fn estimate(&self, distance_km: f64) -> Result<FareEstimate> {
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(DarshanError::ValidationError(
                "Distance must be a non-negative number".to_string(),
            ));
        }

        Ok(FareEstimate {
            distance_km,
            fare: (self.base_fare + distance_km * self.per_km).round() as i64,
            currency: "INR".to_string(),
            approximate: false,
        })
    }

    /// Estimate the fare between two points using great-circle distance
    pub fn estimate_between(&self, from: (f64, f64), to: (f64, f64)) -> Result<FareEstimate> {
        crate::validate_coordinates(Some(from.0), Some(from.1))?;
        crate::validate_coordinates(Some(to.0), Some(to.1))?;

        let mut estimate = self.estimate(haversine_km(from, to))?;
        estimate.approximate = true;
        Ok(estimate)
    }
}

/// Great-circle distance between two `(lat, lng)` points in kilometres
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
