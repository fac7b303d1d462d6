//! # hs-core
//!
//! One-dimensional histogram value object for binned physics data.
//!
//! A [`Histogram1D`] holds bin edges, bin values, and per-bin standard
//! deviations. Arithmetic between histograms propagates uncorrelated
//! statistical errors, and foreign histogram objects are imported and
//! exported through the [`ExternalHistogram`] adapter trait.
//!
//! ## Example
//!
//! ```
//! use hs_core::Histogram1D;
//!
//! let a = Histogram1D::new(vec![0.0, 1.0], vec![4.0], vec![2.0]).unwrap();
//! let b = Histogram1D::new(vec![0.0, 1.0], vec![9.0], vec![3.0]).unwrap();
//! let c = (&a + &b).unwrap();
//! assert!((c.errors()[0] - 13f64.sqrt()).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod external;
pub mod histogram;
pub mod interval;
pub mod ops;
pub mod options;

pub use error::{Error, Result};
pub use external::{BinArrays, ContentLayout, ExternalHistogram, FlowBin};
pub use histogram::Histogram1D;
pub use interval::Bound;
pub use ops::ZERO_DIVISION_SENTINEL;
pub use options::{ErrorConvention, ExportOptions, FlowPolicy, ImportOptions, Tolerance};
