//! Import/export configuration.
//!
//! Every option here is explicit. In particular the meaning of the
//! per-bin uncertainty column handed over by an external source is chosen
//! by [`ErrorConvention`] and never guessed from the data.

use serde::{Deserialize, Serialize};

/// How the uncertainty column of an external histogram is to be read (or written).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorConvention {
    /// Column holds standard deviations.
    StdDev,
    /// Column holds variances (ROOT `fSumw2`); a square root is taken on import.
    Variance,
}

/// Under/overflow handling on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPolicy {
    /// Discard underflow/overflow content.
    #[default]
    Drop,
    /// Add underflow to the first bin and overflow to the last bin.
    Fold,
}

/// Options for [`Histogram1D::from_external`](crate::Histogram1D::from_external).
///
/// The default reads variances and drops flow bins, matching how ROOT
/// stores `TH1` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Semantics of the source uncertainty column.
    pub convention: ErrorConvention,
    /// Under/overflow handling.
    pub flow: FlowPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { convention: ErrorConvention::Variance, flow: FlowPolicy::Drop }
    }
}

impl ImportOptions {
    /// Read uncertainties as variances.
    pub fn variance() -> Self {
        Self { convention: ErrorConvention::Variance, ..Self::default() }
    }

    /// Read uncertainties as standard deviations.
    pub fn std_dev() -> Self {
        Self { convention: ErrorConvention::StdDev, ..Self::default() }
    }

    /// Set the flow policy.
    pub fn with_flow(mut self, flow: FlowPolicy) -> Self {
        self.flow = flow;
        self
    }

    /// Parse options from a JSON document. Missing fields take their defaults.
    pub fn from_json(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Options for [`Histogram1D::to_external`](crate::Histogram1D::to_external).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Semantics of the uncertainty column written to the sink.
    pub convention: ErrorConvention,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { convention: ErrorConvention::Variance }
    }
}

/// Element-wise floating point tolerance: `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { rtol: 1e-5, atol: 1e-8 }
    }
}

impl Tolerance {
    /// Exact comparison.
    pub const EXACT: Tolerance = Tolerance { rtol: 0.0, atol: 0.0 };

    /// Whether `a` and `b` agree. NaN only matches NaN.
    #[inline]
    pub fn close(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        if a == b {
            return true;
        }
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }

    /// Whether two slices agree element-wise (lengths must match).
    pub fn all_close(&self, a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| self.close(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_defaults_to_variance_and_drop() {
        let opts = ImportOptions::default();
        assert_eq!(opts.convention, ErrorConvention::Variance);
        assert_eq!(opts.flow, FlowPolicy::Drop);
    }

    #[test]
    fn test_import_options_from_json() {
        let opts = ImportOptions::from_json(r#"{"convention": "std_dev", "flow": "fold"}"#).unwrap();
        assert_eq!(opts, ImportOptions::std_dev().with_flow(FlowPolicy::Fold));

        let partial = ImportOptions::from_json(r#"{"flow": "fold"}"#).unwrap();
        assert_eq!(partial.convention, ErrorConvention::Variance);
    }

    #[test]
    fn test_import_options_rejects_unknown_convention() {
        assert!(ImportOptions::from_json(r#"{"convention": "sigma"}"#).is_err());
    }

    #[test]
    fn test_tolerance_close() {
        let tol = Tolerance::default();
        assert!(tol.close(1.0, 1.0 + 1e-9));
        assert!(!tol.close(1.0, 1.001));
        assert!(tol.close(f64::NAN, f64::NAN));
        assert!(!tol.close(f64::NAN, 0.0));
        assert!(tol.close(f64::INFINITY, f64::INFINITY));
        assert!(!Tolerance::EXACT.close(1.0, 1.0 + 1e-12));
    }

    #[test]
    fn test_all_close_length_mismatch() {
        assert!(!Tolerance::default().all_close(&[1.0], &[1.0, 2.0]));
    }
}
