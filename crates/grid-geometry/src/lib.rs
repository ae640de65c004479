//! Horizontal grid geometry for gridded geophysical data.
//!
//! Two kinds of source grid are modelled:
//!
//! - **Curvilinear** grids, where every node carries its own (lon, lat) and
//!   the cell owned by a node is the quadrilateral bounded by the midpoints
//!   to its neighbours.
//! - **Regular** lon/lat grids described by two evenly spaced axes.
//! - **Rectilinear** lon/lat grids whose two axes are arbitrarily spaced
//!   but monotonic, located by binary search.
//!
//! ```text
//!   node (i, j+1) ─────────── node (i+1, j+1)
//!        │     corner ─── corner     │
//!        │       │  node (i,j)│      │
//!        │     corner ─── corner     │
//!   node (i, j)   ... cell boundary = mean of 4 surrounding nodes
//! ```
//!
//! Cells that straddle the antimeridian are recognised (wrapped corner
//! span > 180°) and expose the ±360° shift spatial indexes need to store a
//! duplicate of them.
//!
//! # Example
//!
//! ```
//! use grid_geometry::CurvilinearGrid;
//!
//! let lon = vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
//! let lat = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
//! let grid = CurvilinearGrid::new(3, 2, lon, lat).unwrap();
//! assert!(grid.cell(1, 0).contains(1.2, 0.3));
//! ```

pub mod coords;
pub mod curvilinear;
pub mod error;
pub mod longitude;
pub mod rect;
pub mod rectilinear;
pub mod regular;

pub use coords::GridCoordinates;
pub use curvilinear::{point_in_polygon, Cell, CurvilinearGrid, EDGE_EPSILON};
pub use error::{GeometryError, Result};
pub use longitude::{constrain_lon_180, harmonize_longitudes};
pub use rect::LonLatRect;
pub use rectilinear::{CoordinateAxis, RectilinearGrid, ReferenceableAxis};
pub use regular::{RegularAxis, RegularGrid};
