//! Longitude arithmetic.

/// Wraps a longitude into [-180, 180).
pub fn constrain_lon_180(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Returns `lon`, `lon + 360` or `lon - 360`, whichever is closest to
/// `reference`.
///
/// Used to make the corners of a cell numerically contiguous before
/// averaging or polygon tests, so that a cell straddling the antimeridian
/// is not stretched across the whole globe.
pub fn harmonize_longitudes(reference: f64, lon: f64) -> f64 {
    let diff = lon - reference;
    if diff > 180.0 {
        lon - 360.0
    } else if diff < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
