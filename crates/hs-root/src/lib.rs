//! # hs-root
//!
//! ROOT `TH1D`/`TH1F` adapter for [`hs_core::Histogram1D`].
//!
//! [`RootHistogram`] mirrors ROOT's packed storage (flow cells interleaved
//! with the regular bins, optional `fSumw2`) and implements
//! [`hs_core::ExternalHistogram`]. The `objects` module streams it to and
//! from the object payload bytes found inside a ROOT file key.
//!
//! ## Example
//!
//! ```
//! use hs_core::{ExportOptions, Histogram1D, ImportOptions};
//! use hs_root::RootHistogram;
//!
//! let h = Histogram1D::from_variances(vec![0.0, 1.0, 2.0], vec![3.0, 4.0], vec![3.0, 4.0]).unwrap();
//! let root: RootHistogram = h.to_external(&ExportOptions::default()).unwrap();
//! let payload = root.to_bytes();
//!
//! let decoded = RootHistogram::from_bytes(&payload, "TH1D").unwrap();
//! let back = Histogram1D::from_external(&decoded, &ImportOptions::variance()).unwrap();
//! assert_eq!(back, h);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod histogram;
pub mod objects;
pub mod rbuffer;

pub use error::{Result, RootError};
pub use histogram::{RootHistogram, Th1Kind};
pub use objects::{read_histogram, write_histogram};
