//! Import/export boundary for externally defined binned histograms.
//!
//! An adapter for a foreign histogram object implements [`ExternalHistogram`]:
//! it decodes itself into plain [`BinArrays`] and can be rebuilt from them.
//! [`Histogram1D`](crate::Histogram1D) only ever sees the arrays.

use crate::error::{Error, Result};

/// Storage layout of the content (and uncertainty) columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentLayout {
    /// One entry per bin.
    #[default]
    PerBin,
    /// Running sums: entry `i` holds the total of bins `0..=i`.
    Cumulative,
}

/// Content and uncertainty of a single under/overflow bin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowBin {
    /// Bin content.
    pub content: f64,
    /// Uncertainty, in the same convention as [`BinArrays::uncertainties`].
    pub uncertainty: f64,
}

/// Plain-array view of a binned histogram exchanged with adapters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinArrays {
    /// Bin edges, ascending, excluding any flow sentinels (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins).
    pub contents: Vec<f64>,
    /// Per-bin uncertainty column; variance or standard deviation depending
    /// on the [`ErrorConvention`](crate::ErrorConvention) selected by the caller.
    pub uncertainties: Vec<f64>,
    /// Layout of `contents` and `uncertainties`.
    pub layout: ContentLayout,
    /// Underflow bin, if the source keeps one.
    pub underflow: Option<FlowBin>,
    /// Overflow bin, if the source keeps one.
    pub overflow: Option<FlowBin>,
}

impl BinArrays {
    /// Number of regular bins described by the edges.
    pub fn n_bins(&self) -> usize {
        self.bin_edges.len().saturating_sub(1)
    }

    /// Convert a cumulative layout into per-bin columns.
    ///
    /// Uncertainties are differenced as well, which is only meaningful for
    /// variances; callers decoding a cumulative standard-deviation column must
    /// square it first. A decreasing cumulative variance is rejected.
    pub fn into_per_bin(mut self) -> Result<Self> {
        if self.layout == ContentLayout::PerBin {
            return Ok(self);
        }
        self.contents = successive_differences(&self.contents);
        self.uncertainties = successive_differences(&self.uncertainties);
        if let Some((i, v)) = self.uncertainties.iter().enumerate().find(|(_, v)| **v < 0.0) {
            return Err(Error::Validation(format!(
                "cumulative uncertainty decreases at bin {}: {}",
                i, v
            )));
        }
        self.layout = ContentLayout::PerBin;
        Ok(self)
    }
}

fn successive_differences(cumulative: &[f64]) -> Vec<f64> {
    let mut prev = 0.0;
    cumulative
        .iter()
        .map(|&c| {
            let d = c - prev;
            prev = c;
            d
        })
        .collect()
}

/// Narrow adapter interface over a foreign binned-histogram object.
pub trait ExternalHistogram: Sized {
    /// Decode this object into plain arrays. Must not mutate the source.
    fn decode(&self) -> Result<BinArrays>;

    /// Build an object of this type from plain arrays.
    fn encode(arrays: BinArrays) -> Result<Self>;
}

/// The plain arrays are themselves an external representation.
impl ExternalHistogram for BinArrays {
    fn decode(&self) -> Result<BinArrays> {
        Ok(self.clone())
    }

    fn encode(arrays: BinArrays) -> Result<Self> {
        Ok(arrays)
    }
}
