use std::fmt;

/// A geographic coordinate in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside [-90, 90] x [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Parse "lat,lng" as typed on the command line
    pub fn parse(s: &str) -> Option<Self> {
        let (lat, lng) = s.split_once(',')?;
        let point = Self::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
        point.is_valid().then_some(point)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.lat.abs(),
            if self.lat >= 0.0 { "N" } else { "S" },
            self.lng.abs(),
            if self.lng >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Wrap longitude back into [-180, 180)
#[inline(always)]
pub fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// Web Mercator can't represent the poles
#[inline(always)]
pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-85.0511, 85.0511)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(LatLng::parse("-34.6, -58.38"), Some(LatLng::new(-34.6, -58.38)));
        assert_eq!(LatLng::parse("91,0"), None);
        assert_eq!(LatLng::parse("nope"), None);
    }

    #[test]
    fn test_validity() {
        assert!(LatLng::new(0.0, 180.0).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
        assert!(!LatLng::new(0.0, 200.0).is_valid());
    }

    #[test]
    fn test_wrap_lng() {
        assert!((wrap_lng(190.0) - -170.0).abs() < 1e-9);
        assert!((wrap_lng(-190.0) - 170.0).abs() < 1e-9);
    }
}
