//! Shared test utilities for the grid extraction workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic curvilinear grid generators
//! - Predictable value fields
//! - Common bounding box fixtures
//! - Approximate equality assertions, longitude-wrap aware for positions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{sheared_4x3, assert_approx_eq, assert_lon_lat_approx_eq};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Assert two floating-point values differ by at most `epsilon`.
///
/// An optional trailing format string and arguments describe the failing
/// case, as with `assert_eq!`.
///
/// ```
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(0.1_f64 + 0.2, 0.3, 1e-12);
/// assert_approx_eq!(107.5_f32, 107.5, 1e-6, "converted value");
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $epsilon, "values differ")
    };
    ($left:expr, $right:expr, $epsilon:expr, $($context:tt)+) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= epsilon,
            "{}: left {left:?}, right {right:?}, diff {diff:?} > {epsilon:?}",
            format_args!($($context)+)
        );
    }};
}

/// Assert two `(lon, lat)` positions agree within `epsilon` degrees,
/// treating longitudes that differ by a multiple of 360° as equal.
///
/// ```
/// use test_utils::assert_lon_lat_approx_eq;
///
/// assert_lon_lat_approx_eq!((-180.0, 1.0), (180.0, 1.0), 1e-9);
/// assert_lon_lat_approx_eq!((359.5, -2.0), (-0.5, -2.0), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_lon_lat_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {{
        let (left, right): ((f64, f64), (f64, f64)) = ($left, $right);
        let dlon = (left.0 - right.0 + 180.0).rem_euclid(360.0) - 180.0;
        $crate::assert_approx_eq!(dlon, 0.0, $epsilon, "longitude {} vs {}", left.0, right.0);
        $crate::assert_approx_eq!(left.1, right.1, $epsilon, "latitude {} vs {}", left.1, right.1);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001, "case {}", 3);
    }

    #[test]
    #[should_panic(expected = "case 7: left 1.1")]
    fn test_assert_approx_eq_reports_context() {
        assert_approx_eq!(1.1, 1.0, 0.001, "case {}", 7);
    }

    #[test]
    fn test_lon_lat_wraps_longitude() {
        assert_lon_lat_approx_eq!((179.9999, 10.0), (-180.0, 10.0), 0.001);
    }

    #[test]
    #[should_panic(expected = "latitude")]
    fn test_lon_lat_checks_latitude() {
        assert_lon_lat_approx_eq!((0.0, 10.0), (0.0, 10.5), 0.001);
    }
}
