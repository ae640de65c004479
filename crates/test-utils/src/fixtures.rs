//! Common test fixtures.

/// Common bounding boxes `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Covers [`crate::sheared_4x3`] with a margin.
    pub const SHEARED_4X3: (f64, f64, f64, f64) = (8.0, 38.0, 18.5, 45.0);

    /// Far away from every synthetic grid.
    pub const SOUTH_ATLANTIC: (f64, f64, f64, f64) = (-30.0, -40.0, -20.0, -30.0);
}

/// Converts a fixture tuple into a [`grid_geometry::LonLatRect`].
pub fn rect(bbox: (f64, f64, f64, f64)) -> grid_geometry::LonLatRect {
    grid_geometry::LonLatRect::new(bbox.0, bbox.1, bbox.2, bbox.3)
}
