//! Geometric primitives for territory matching.

use crate::address::Coordinates;

/// Mean Earth radius in miles, matching the radius-rule contract.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Great-circle distance between two points in miles (haversine).
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Ray-casting point-in-polygon over an ordered vertex list.
///
/// Fewer than 3 vertices is not a polygon and never matches.
pub fn point_in_polygon(latitude: f64, longitude: f64, vertices: &[Coordinates]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (lat_i, lng_i) = (vertices[i].latitude, vertices[i].longitude);
        let (lat_j, lng_j) = (vertices[j].latitude, vertices[j].longitude);

        if (lat_i > latitude) != (lat_j > latitude) {
            let crossing = (lng_j - lng_i) * (latitude - lat_i) / (lat_j - lat_i) + lng_i;
            if longitude < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Matches a resolved ZIP against one configured pattern.
///
/// Supported forms: exact ("20815"), trailing-wildcard prefix ("208*"), and
/// a 5-digit pattern against a longer ZIP+4 ("20815" vs "20815-1234").
pub fn zip_matches(pattern: &str, zip: &str) -> bool {
    let pattern = pattern.trim();
    let zip = zip.trim();
    if pattern.is_empty() || zip.is_empty() {
        return false;
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return zip.starts_with(prefix);
    }

    let zip5 = zip.split('-').next().unwrap_or(zip);
    pattern == zip || pattern == zip5
}

/// Rectangular lat/lng bounding box.
#[derive(Debug, Clone, Copy)]
pub struct StateBounds {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl StateBounds {
    /// True when the point lies inside this box (edges inclusive).
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lng
            && longitude <= self.max_lng
    }
}

const fn bounds(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> StateBounds {
    StateBounds {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    }
}

// Approximate bounding boxes for the 50 states plus DC. These are rough
// rectangles, accepted as imprecise near borders.
const STATE_BOUNDS: &[(&str, StateBounds)] = &[
    ("AL", bounds(30.22, 35.01, -88.47, -84.89)),
    ("AK", bounds(51.21, 71.37, -179.15, -129.98)),
    ("AZ", bounds(31.33, 37.00, -114.82, -109.05)),
    ("AR", bounds(33.00, 36.50, -94.62, -89.64)),
    ("CA", bounds(32.53, 42.01, -124.41, -114.13)),
    ("CO", bounds(36.99, 41.00, -109.05, -102.04)),
    ("CT", bounds(40.98, 42.05, -73.73, -71.79)),
    ("DE", bounds(38.45, 39.84, -75.79, -75.05)),
    ("DC", bounds(38.79, 38.99, -77.12, -76.91)),
    ("FL", bounds(24.52, 31.00, -87.63, -80.03)),
    ("GA", bounds(30.36, 35.00, -85.61, -80.84)),
    ("HI", bounds(18.91, 22.24, -160.25, -154.81)),
    ("ID", bounds(41.99, 49.00, -117.24, -111.04)),
    ("IL", bounds(36.97, 42.51, -91.51, -87.02)),
    ("IN", bounds(37.77, 41.76, -88.10, -84.78)),
    ("IA", bounds(40.38, 43.50, -96.64, -90.14)),
    ("KS", bounds(36.99, 40.00, -102.05, -94.59)),
    ("KY", bounds(36.50, 39.15, -89.57, -81.96)),
    ("LA", bounds(28.93, 33.02, -94.04, -88.82)),
    ("ME", bounds(43.06, 47.46, -71.08, -66.95)),
    ("MD", bounds(37.91, 39.72, -79.49, -75.05)),
    ("MA", bounds(41.24, 42.89, -73.51, -69.93)),
    ("MI", bounds(41.70, 48.26, -90.42, -82.41)),
    ("MN", bounds(43.50, 49.38, -97.24, -89.49)),
    ("MS", bounds(30.17, 35.00, -91.66, -88.10)),
    ("MO", bounds(35.99, 40.61, -95.77, -89.10)),
    ("MT", bounds(44.36, 49.00, -116.05, -104.04)),
    ("NE", bounds(39.99, 43.00, -104.05, -95.31)),
    ("NV", bounds(35.00, 42.00, -120.01, -114.04)),
    ("NH", bounds(42.70, 45.31, -72.56, -70.60)),
    ("NJ", bounds(38.93, 41.36, -75.56, -73.89)),
    ("NM", bounds(31.33, 37.00, -109.05, -103.00)),
    ("NY", bounds(40.50, 45.02, -79.76, -71.86)),
    ("NC", bounds(33.84, 36.59, -84.32, -75.46)),
    ("ND", bounds(45.94, 49.00, -104.05, -96.55)),
    ("OH", bounds(38.40, 41.98, -84.82, -80.52)),
    ("OK", bounds(33.62, 37.00, -103.00, -94.43)),
    ("OR", bounds(41.99, 46.29, -124.57, -116.46)),
    ("PA", bounds(39.72, 42.27, -80.52, -74.69)),
    ("RI", bounds(41.15, 42.02, -71.86, -71.12)),
    ("SC", bounds(32.03, 35.22, -83.35, -78.54)),
    ("SD", bounds(42.48, 45.95, -104.06, -96.44)),
    ("TN", bounds(34.98, 36.68, -90.31, -81.65)),
    ("TX", bounds(25.84, 36.50, -106.65, -93.51)),
    ("UT", bounds(36.99, 42.00, -114.05, -109.04)),
    ("VT", bounds(42.73, 45.02, -73.44, -71.46)),
    ("VA", bounds(36.54, 39.47, -83.68, -75.24)),
    ("WA", bounds(45.54, 49.00, -124.85, -116.92)),
    ("WV", bounds(37.20, 40.64, -82.64, -77.72)),
    ("WI", bounds(42.49, 47.08, -92.89, -86.81)),
    ("WY", bounds(40.99, 45.01, -111.06, -104.05)),
];

/// Bounding box for a two-letter state code, case-insensitive.
pub fn state_bounds(code: &str) -> Option<StateBounds> {
    let code = code.trim();
    STATE_BOUNDS
        .iter()
        .find(|(state, _)| state.eq_ignore_ascii_case(code))
        .map(|(_, bounds)| *bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WASHINGTON_DC: Coordinates = Coordinates {
        latitude: 38.9072,
        longitude: -77.0369,
    };
    const BALTIMORE: Coordinates = Coordinates {
        latitude: 39.2904,
        longitude: -76.6122,
    };

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine_miles(WASHINGTON_DC, WASHINGTON_DC), 0.0);
    }

    #[test]
    fn test_haversine_dc_to_baltimore() {
        let distance = haversine_miles(WASHINGTON_DC, BALTIMORE);
        assert!(
            (30.0..40.0).contains(&distance),
            "DC to Baltimore should be roughly 35 miles, got {}",
            distance
        );
        // Symmetric
        let reverse = haversine_miles(BALTIMORE, WASHINGTON_DC);
        assert!((distance - reverse).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_square() {
        let square = [
            Coordinates { latitude: 0.0, longitude: 0.0 },
            Coordinates { latitude: 0.0, longitude: 10.0 },
            Coordinates { latitude: 10.0, longitude: 10.0 },
            Coordinates { latitude: 10.0, longitude: 0.0 },
        ];
        assert!(point_in_polygon(5.0, 5.0, &square));
        assert!(!point_in_polygon(20.0, 20.0, &square));
        assert!(!point_in_polygon(-1.0, 5.0, &square));
    }

    #[test]
    fn test_two_vertices_never_match() {
        let segment = [
            Coordinates { latitude: 0.0, longitude: 0.0 },
            Coordinates { latitude: 10.0, longitude: 10.0 },
        ];
        assert!(!point_in_polygon(5.0, 5.0, &segment));
        assert!(!point_in_polygon(0.0, 0.0, &segment));
    }

    #[test]
    fn test_concave_polygon() {
        // L-shape: the notch at (7, 7) is outside
        let l_shape = [
            Coordinates { latitude: 0.0, longitude: 0.0 },
            Coordinates { latitude: 0.0, longitude: 10.0 },
            Coordinates { latitude: 5.0, longitude: 10.0 },
            Coordinates { latitude: 5.0, longitude: 5.0 },
            Coordinates { latitude: 10.0, longitude: 5.0 },
            Coordinates { latitude: 10.0, longitude: 0.0 },
        ];
        assert!(point_in_polygon(2.0, 2.0, &l_shape));
        assert!(point_in_polygon(7.0, 2.0, &l_shape));
        assert!(!point_in_polygon(7.0, 7.0, &l_shape));
    }

    #[test]
    fn test_zip_wildcard_patterns() {
        assert!(zip_matches("208*", "20815"));
        assert!(zip_matches("208*", "20852"));
        assert!(!zip_matches("208*", "19810"));
    }

    #[test]
    fn test_zip_exact_and_plus4() {
        assert!(zip_matches("20815", "20815"));
        assert!(zip_matches("20815", "20815-1234"));
        assert!(!zip_matches("20815", "20816"));
        assert!(!zip_matches("20815", "2081"));
    }

    #[test]
    fn test_zip_empty_inputs_never_match() {
        assert!(!zip_matches("", "20815"));
        assert!(!zip_matches("208*", ""));
    }

    #[test]
    fn test_state_bounds_lookup() {
        let dc = state_bounds("DC").expect("DC bounds");
        assert!(dc.contains(38.9072, -77.0369));
        assert!(!dc.contains(39.2904, -76.6122)); // Baltimore is not in DC

        let md = state_bounds("md").expect("case-insensitive lookup");
        assert!(md.contains(39.2904, -76.6122));

        assert!(state_bounds("ZZ").is_none());
    }

    #[test]
    fn test_every_state_has_sane_bounds() {
        for (code, bounds) in STATE_BOUNDS {
            assert!(bounds.min_lat < bounds.max_lat, "{} latitude order", code);
            assert!(bounds.min_lng < bounds.max_lng, "{} longitude order", code);
        }
        assert_eq!(STATE_BOUNDS.len(), 51);
    }
}
