//! City/country to coordinate resolution.
//!
//! The geocoding provider is an external collaborator: one request, one
//! answer, no caching or retry beyond what the provider does itself. The
//! `Geocoder` trait is the seam probe selection depends on; `GoogleGeocoder`
//! is the production implementation.

mod google;

pub use google::GoogleGeocoder;

use serde::{Deserialize, Serialize};

use crate::error_handling::AtlasError;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Resolves a city/country pair to coordinates.
#[allow(async_fn_in_trait)] // only used through generics, never as a trait object
pub trait Geocoder {
    /// Returns the coordinates of `city` in `country`.
    ///
    /// # Errors
    ///
    /// `AtlasError::GeocodeFailure` when the provider has no match or reports
    /// an error; `AtlasError::Network` when the provider cannot be reached.
    async fn resolve(&self, city: &str, country: &str) -> Result<Coordinates, AtlasError>;
}

impl<G: Geocoder> Geocoder for std::sync::Arc<G> {
    async fn resolve(&self, city: &str, country: &str) -> Result<Coordinates, AtlasError> {
        (**self).resolve(city, country).await
    }
}
