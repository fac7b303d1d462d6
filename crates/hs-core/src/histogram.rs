//! The `Histogram1D` value object.

use std::sync::Arc;

use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::external::{BinArrays, ContentLayout, ExternalHistogram};
use crate::options::{ErrorConvention, ExportOptions, FlowPolicy, ImportOptions, Tolerance};

/// A 1D histogram: bin edges, per-bin values, and per-bin standard deviations.
///
/// Bins are half-open `[edge[i], edge[i+1])` except the last one, which is
/// closed on both ends. The edges are immutable and shared between a
/// histogram and everything derived from it by arithmetic; values and
/// errors can be replaced as a whole via [`Histogram1D::replace_contents`].
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HistogramRepr")]
pub struct Histogram1D {
    pub(crate) bin_edges: Arc<[f64]>,
    pub(crate) values: Vec<f64>,
    pub(crate) errors: Vec<f64>,
}

/// Serialized form. Deserialization goes through [`Histogram1D::new`].
#[derive(Deserialize)]
struct HistogramRepr {
    bin_edges: Vec<f64>,
    bin_values: Vec<f64>,
    bin_errors: Vec<f64>,
}

#[derive(Serialize)]
struct HistogramReprRef<'a> {
    bin_edges: &'a [f64],
    bin_values: &'a [f64],
    bin_errors: &'a [f64],
}

impl TryFrom<HistogramRepr> for Histogram1D {
    type Error = Error;

    fn try_from(repr: HistogramRepr) -> Result<Self> {
        Histogram1D::new(repr.bin_edges, repr.bin_values, repr.bin_errors)
    }
}

impl Serialize for Histogram1D {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        HistogramReprRef {
            bin_edges: &self.bin_edges,
            bin_values: &self.values,
            bin_errors: &self.errors,
        }
        .serialize(serializer)
    }
}

impl Histogram1D {
    /// Build a histogram from edges, values, and standard deviations.
    ///
    /// Accepts anything convertible into shared edge storage (`Vec<f64>`,
    /// `&[f64]`, or an existing `Arc<[f64]>`, which is then shared).
    pub fn new(
        bin_edges: impl Into<Arc<[f64]>>,
        values: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self> {
        let bin_edges = bin_edges.into();
        validate_edges(&bin_edges)?;
        validate_contents(bin_edges.len() - 1, &values, &errors)?;
        Ok(Self { bin_edges, values, errors })
    }

    /// Build a histogram from edges, values, and variances (squared errors).
    pub fn from_variances(
        bin_edges: impl Into<Arc<[f64]>>,
        values: Vec<f64>,
        variances: Vec<f64>,
    ) -> Result<Self> {
        check_non_negative("variance", &variances)?;
        let errors = variances.into_iter().map(f64::sqrt).collect();
        Self::new(bin_edges, values, errors)
    }

    /// An empty histogram on the given binning (additive identity).
    pub fn zeros(bin_edges: impl Into<Arc<[f64]>>) -> Result<Self> {
        let bin_edges = bin_edges.into();
        validate_edges(&bin_edges)?;
        let n = bin_edges.len() - 1;
        Ok(Self { bin_edges, values: vec![0.0; n], errors: vec![0.0; n] })
    }

    /// Assemble from already validated parts sharing `bin_edges`.
    pub(crate) fn from_parts(bin_edges: Arc<[f64]>, values: Vec<f64>, errors: Vec<f64>) -> Self {
        debug_assert_eq!(values.len() + 1, bin_edges.len());
        debug_assert_eq!(errors.len() + 1, bin_edges.len());
        Self { bin_edges, values, errors }
    }

    /// Import from an external histogram object.
    ///
    /// The uncertainty column is interpreted according to `options.convention`,
    /// cumulative layouts are differenced, and flow bins are dropped or folded
    /// per `options.flow`. The result is fully validated.
    pub fn from_external<S: ExternalHistogram>(source: &S, options: &ImportOptions) -> Result<Self> {
        let mut arrays = source.decode()?;
        log::debug!(
            "importing histogram: {} edges, {} contents, convention={:?}, layout={:?}",
            arrays.bin_edges.len(),
            arrays.contents.len(),
            options.convention,
            arrays.layout,
        );

        check_non_negative("uncertainty", &arrays.uncertainties)?;
        for flow in arrays.underflow.iter().chain(arrays.overflow.iter()) {
            check_non_negative("flow uncertainty", &[flow.uncertainty])?;
        }

        // Everything below works on variances.
        if options.convention == ErrorConvention::StdDev {
            square_in_place(&mut arrays.uncertainties);
            for flow in arrays.underflow.iter_mut().chain(arrays.overflow.iter_mut()) {
                flow.uncertainty *= flow.uncertainty;
            }
        }
        let BinArrays { bin_edges, mut contents, uncertainties: mut variances, underflow, overflow, .. } =
            arrays.into_per_bin()?;

        validate_edges(&bin_edges)?;
        validate_contents(bin_edges.len() - 1, &contents, &variances)?;

        match options.flow {
            FlowPolicy::Fold => {
                let last = contents.len() - 1;
                if let Some(uf) = underflow {
                    contents[0] += uf.content;
                    variances[0] += uf.uncertainty;
                }
                if let Some(of) = overflow {
                    contents[last] += of.content;
                    variances[last] += of.uncertainty;
                }
            }
            FlowPolicy::Drop => {
                let dropped: f64 =
                    underflow.iter().chain(overflow.iter()).map(|f| f.content).sum();
                if dropped != 0.0 {
                    log::debug!("dropping {} entries of under/overflow content", dropped);
                }
            }
        }

        Self::from_variances(bin_edges, contents, variances)
    }

    /// Export into an external histogram object.
    ///
    /// The uncertainty column is written as variances or standard deviations
    /// according to `options.convention`. No flow bins are provided.
    pub fn to_external<T: ExternalHistogram>(&self, options: &ExportOptions) -> Result<T> {
        let uncertainties = match options.convention {
            ErrorConvention::Variance => self.errors_squared(),
            ErrorConvention::StdDev => self.errors.clone(),
        };
        T::encode(BinArrays {
            bin_edges: self.bin_edges.to_vec(),
            contents: self.values.clone(),
            uncertainties,
            layout: ContentLayout::PerBin,
            underflow: None,
            overflow: None,
        })
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize (and validate) from a JSON string.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    // ── accessors ───────────────────────────────────────────────

    /// Number of bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.values.len()
    }

    /// Bin edges (length = n_bins + 1).
    #[inline]
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Shared handle to the edge storage.
    #[inline]
    pub fn shared_edges(&self) -> &Arc<[f64]> {
        &self.bin_edges
    }

    /// Bin values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Alias of [`Histogram1D::values`].
    #[inline]
    pub fn y(&self) -> &[f64] {
        &self.values
    }

    /// Bin errors (standard deviations).
    #[inline]
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Replace values and errors, keeping the binning.
    pub fn replace_contents(&mut self, values: Vec<f64>, errors: Vec<f64>) -> Result<()> {
        validate_contents(self.n_bins(), &values, &errors)?;
        self.values = values;
        self.errors = errors;
        Ok(())
    }

    /// Consume into `(edges, values, errors)`.
    pub fn into_parts(self) -> (Arc<[f64]>, Vec<f64>, Vec<f64>) {
        (self.bin_edges, self.values, self.errors)
    }

    /// Whether `other` has exactly the same bin edges.
    pub fn same_binning(&self, other: &Histogram1D) -> bool {
        Arc::ptr_eq(&self.bin_edges, &other.bin_edges) || self.bin_edges[..] == other.bin_edges[..]
    }

    // ── derived quantities ─────────────────────────────────────

    /// Per-bin variances.
    pub fn errors_squared(&self) -> Vec<f64> {
        self.errors.iter().map(|e| e * e).collect()
    }

    /// Midpoint of each bin.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Alias of [`Histogram1D::bin_centers`].
    pub fn x(&self) -> Vec<f64> {
        self.bin_centers()
    }

    /// Width of each bin.
    pub fn bin_widths(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Sum of all bin values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Sum of `value * width` over all bins.
    pub fn total_width_weighted(&self) -> f64 {
        self.values.iter().zip(self.bin_edges.windows(2)).map(|(v, w)| v * (w[1] - w[0])).sum()
    }

    // ── comparison ─────────────────────────────────────────────

    /// Element-wise comparison of edges, values, and errors within `tol`.
    pub fn approx_eq(&self, other: &Histogram1D, tol: Tolerance) -> bool {
        tol.all_close(&self.bin_edges, &other.bin_edges)
            && tol.all_close(&self.values, &other.values)
            && tol.all_close(&self.errors, &other.errors)
    }

    fn columns(&self) -> [&[f64]; 3] {
        [&self.bin_edges, &self.values, &self.errors]
    }
}

/// Compares within [`Tolerance::default`].
impl PartialEq for Histogram1D {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, Tolerance::default())
    }
}

impl AbsDiffEq for Histogram1D {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.columns().iter().zip(other.columns().iter()).all(|(a, b)| {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff_eq(y, epsilon))
        })
    }
}

impl RelativeEq for Histogram1D {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.columns().iter().zip(other.columns().iter()).all(|(a, b)| {
            a.len() == b.len()
                && a.iter().zip(b.iter()).all(|(x, y)| x.relative_eq(y, epsilon, max_relative))
        })
    }
}

// ── validation ─────────────────────────────────────────────────

fn validate_edges(edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::Validation(format!(
            "need at least 2 bin edges, got {}",
            edges.len()
        )));
    }
    if let Some(e) = edges.iter().find(|e| !e.is_finite()) {
        return Err(Error::Validation(format!("bin edge {} is not finite", e)));
    }
    if let Some(i) = edges.windows(2).position(|w| w[1] <= w[0]) {
        return Err(Error::Validation(format!(
            "bin edges must be strictly increasing: edge[{}] = {} >= edge[{}] = {}",
            i,
            edges[i],
            i + 1,
            edges[i + 1]
        )));
    }
    Ok(())
}

fn validate_contents(n_bins: usize, values: &[f64], errors: &[f64]) -> Result<()> {
    if values.len() != n_bins || errors.len() != n_bins {
        return Err(Error::Validation(format!(
            "{} bins from edges, but {} values and {} errors",
            n_bins,
            values.len(),
            errors.len()
        )));
    }
    check_non_negative("error", errors)
}

fn check_non_negative(what: &str, xs: &[f64]) -> Result<()> {
    match xs.iter().enumerate().find(|(_, x)| x.is_nan() || **x < 0.0) {
        Some((i, x)) => Err(Error::Validation(format!("{} at bin {} is {}", what, i, x))),
        None => Ok(()),
    }
}

fn square_in_place(xs: &mut [f64]) {
    for x in xs {
        *x *= *x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::FlowBin;
    use approx::assert_relative_eq;

    fn basic() -> Histogram1D {
        // First bin filled once with weight 2, the rest filled normally.
        Histogram1D::from_variances(
            vec![0.0, 1.0, 2.0, 3.0, 5.0],
            vec![2.0, 2.0, 3.0, 0.0],
            vec![4.0, 2.0, 3.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = Histogram1D::new(vec![0.0, 1.0, 2.0], vec![5.0], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_non_monotonic_edges_rejected() {
        assert!(Histogram1D::new(vec![0.0, 2.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]).is_err());
        assert!(Histogram1D::new(vec![0.0, 1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]).is_err());
        assert!(Histogram1D::new(vec![0.0, f64::INFINITY], vec![1.0], vec![1.0]).is_err());
        assert!(Histogram1D::new(vec![0.0], vec![], vec![]).is_err());
    }

    #[test]
    fn test_negative_error_rejected() {
        assert!(Histogram1D::new(vec![0.0, 1.0], vec![1.0], vec![-0.5]).is_err());
        assert!(Histogram1D::new(vec![0.0, 1.0], vec![1.0], vec![f64::NAN]).is_err());
        assert!(Histogram1D::from_variances(vec![0.0, 1.0], vec![1.0], vec![-1.0]).is_err());
    }

    #[test]
    fn test_derived_quantities() {
        let h = basic();
        assert_eq!(h.n_bins(), 4);
        assert_eq!(h.bin_centers(), vec![0.5, 1.5, 2.5, 4.0]);
        assert_eq!(h.x(), h.bin_centers());
        assert_eq!(h.y(), h.values());
        assert_eq!(h.bin_widths(), vec![1.0, 1.0, 1.0, 2.0]);
        assert_relative_eq!(h.errors()[0], 2.0);
        assert_relative_eq!(h.errors_squared()[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(h.total(), 7.0);
        assert_relative_eq!(h.total_width_weighted(), 7.0);
    }

    #[test]
    fn test_derived_quantities_follow_replaced_contents() {
        let mut h = basic();
        h.replace_contents(vec![1.0; 4], vec![0.0; 4]).unwrap();
        assert_relative_eq!(h.total(), 4.0);
        assert_relative_eq!(h.total_width_weighted(), 5.0);
        assert!(h.replace_contents(vec![1.0; 3], vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_equality_with_tolerance() {
        let h1 = basic();
        let mut h2 = basic();
        h2.replace_contents(vec![2.0 + 1e-10, 2.0, 3.0, 0.0], h1.errors().to_vec()).unwrap();
        assert_eq!(h1, h2);
        assert!(!h1.approx_eq(&h2, Tolerance::EXACT));

        let shifted =
            Histogram1D::new(vec![5.0, 6.0, 7.0, 8.0, 9.0], h1.values().to_vec(), h1.errors().to_vec())
                .unwrap();
        assert_ne!(h1, shifted);
        assert_relative_eq!(h1, h2, max_relative = 1e-9);
    }

    #[test]
    fn test_json_round_trip() {
        let h = basic();
        let s = h.to_json().unwrap();
        let back = Histogram1D::from_json(&s).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn test_json_validates() {
        let bad = r#"{"bin_edges":[0,1,2],"bin_values":[5],"bin_errors":[1,1]}"#;
        assert!(Histogram1D::from_json(bad).is_err());
    }

    #[test]
    fn test_import_std_dev_and_variance() {
        let arrays = BinArrays {
            bin_edges: vec![0.0, 1.0, 2.0],
            contents: vec![4.0, 9.0],
            uncertainties: vec![4.0, 9.0],
            ..Default::default()
        };
        let as_var = Histogram1D::from_external(&arrays, &ImportOptions::variance()).unwrap();
        assert_eq!(as_var.errors(), &[2.0, 3.0]);
        let as_sd = Histogram1D::from_external(&arrays, &ImportOptions::std_dev()).unwrap();
        assert_eq!(as_sd.errors(), &[4.0, 9.0]);
    }

    #[test]
    fn test_import_fold_flows() {
        let arrays = BinArrays {
            bin_edges: vec![0.0, 1.0, 2.0],
            contents: vec![1.0, 1.0],
            uncertainties: vec![1.0, 1.0],
            underflow: Some(FlowBin { content: 2.0, uncertainty: 3.0 }),
            overflow: Some(FlowBin { content: 5.0, uncertainty: 8.0 }),
            ..Default::default()
        };
        let dropped = Histogram1D::from_external(&arrays, &ImportOptions::variance()).unwrap();
        assert_eq!(dropped.values(), &[1.0, 1.0]);

        let folded = Histogram1D::from_external(
            &arrays,
            &ImportOptions::variance().with_flow(FlowPolicy::Fold),
        )
        .unwrap();
        assert_eq!(folded.values(), &[3.0, 6.0]);
        assert_eq!(folded.errors(), &[2.0, 3.0]);
    }

    #[test]
    fn test_import_cumulative_std_dev() {
        // Per-bin errors of [3, 4] accumulate to variances [9, 25], i.e. errors [3, 5].
        let arrays = BinArrays {
            bin_edges: vec![0.0, 1.0, 2.0],
            contents: vec![10.0, 30.0],
            uncertainties: vec![3.0, 5.0],
            layout: ContentLayout::Cumulative,
            ..Default::default()
        };
        let h = Histogram1D::from_external(&arrays, &ImportOptions::std_dev()).unwrap();
        assert_eq!(h.values(), &[10.0, 20.0]);
        assert_relative_eq!(h.errors()[0], 3.0);
        assert_relative_eq!(h.errors()[1], 4.0);
    }

    #[test]
    fn test_import_rejects_negative_std_dev() {
        let arrays = BinArrays {
            bin_edges: vec![0.0, 1.0],
            contents: vec![1.0],
            uncertainties: vec![-1.0],
            ..Default::default()
        };
        // Squaring would hide the sign; it must be caught first.
        assert!(Histogram1D::from_external(&arrays, &ImportOptions::std_dev()).is_err());
    }

    #[test]
    fn test_import_shape_mismatch() {
        let arrays = BinArrays {
            bin_edges: vec![0.0, 1.0, 2.0],
            contents: vec![1.0],
            uncertainties: vec![1.0],
            ..Default::default()
        };
        let opts = ImportOptions::variance().with_flow(FlowPolicy::Fold);
        assert!(matches!(Histogram1D::from_external(&arrays, &opts), Err(Error::Validation(_))));
    }

    #[test]
    fn test_export_conventions() {
        let h = basic();
        let var: BinArrays = h.to_external(&ExportOptions::default()).unwrap();
        assert_relative_eq!(var.uncertainties[0], 4.0, epsilon = 1e-12);
        let sd: BinArrays =
            h.to_external(&ExportOptions { convention: ErrorConvention::StdDev }).unwrap();
        assert_relative_eq!(sd.uncertainties[0], 2.0, epsilon = 1e-12);
        assert_eq!(sd.bin_edges, h.bin_edges());
        assert!(sd.underflow.is_none());
    }

    #[test]
    fn test_edges_shared_by_arc() {
        let edges: Arc<[f64]> = Arc::from(vec![0.0, 1.0, 2.0]);
        let a = Histogram1D::zeros(edges.clone()).unwrap();
        let b = Histogram1D::new(edges.clone(), vec![1.0, 2.0], vec![0.0, 0.0]).unwrap();
        assert!(Arc::ptr_eq(a.shared_edges(), b.shared_edges()));
        assert!(a.same_binning(&b));
    }
}
