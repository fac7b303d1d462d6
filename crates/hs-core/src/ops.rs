//! Arithmetic between histograms and with scalars.
//!
//! Operands are treated as uncorrelated. Sums and differences combine
//! absolute errors in quadrature. Products and quotients combine relative
//! errors in quadrature, written out as in ROOT's `TH1::Multiply` and
//! `TH1::Divide`:
//!
//! ```text
//! a * b:  e² = (ea·b)² + (eb·a)²
//! a / b:  e² = ((ea·b)² + (eb·a)²) / b⁴
//! ```
//!
//! so a zero-valued operand drops its own term without erasing the other
//! operand's uncertainty. Every result shares the left operand's edges.

use std::ops::{Add, Div, Mul, Sub};

use crate::error::{Error, Result};
use crate::histogram::Histogram1D;

/// Value (and error) assigned to a bin whose divisor is exactly zero.
///
/// An empty bin is physically zero rather than unknown, so the quotient
/// continues as an empty bin.
pub const ZERO_DIVISION_SENTINEL: f64 = 0.0;

impl Histogram1D {
    fn check_binning(&self, other: &Histogram1D) -> Result<()> {
        if self.same_binning(other) {
            Ok(())
        } else {
            Err(Error::IncompatibleBinning { left: self.n_bins(), right: other.n_bins() })
        }
    }

    fn zip_with(
        &self,
        other: &Histogram1D,
        f: impl Fn(f64, f64, f64, f64) -> (f64, f64),
    ) -> Result<Histogram1D> {
        self.check_binning(other)?;
        let (values, errors) = self
            .values
            .iter()
            .zip(&self.errors)
            .zip(other.values.iter().zip(&other.errors))
            .map(|((&a, &sa), (&b, &sb))| f(a, sa, b, sb))
            .unzip();
        Ok(Histogram1D::from_parts(self.bin_edges.clone(), values, errors))
    }

    /// Bin-wise sum.
    pub fn try_add(&self, other: &Histogram1D) -> Result<Histogram1D> {
        self.zip_with(other, |a, sa, b, sb| (a + b, sa.hypot(sb)))
    }

    /// Bin-wise difference.
    pub fn try_sub(&self, other: &Histogram1D) -> Result<Histogram1D> {
        self.zip_with(other, |a, sa, b, sb| (a - b, sa.hypot(sb)))
    }

    /// Bin-wise product.
    pub fn try_mul(&self, other: &Histogram1D) -> Result<Histogram1D> {
        self.zip_with(other, |a, sa, b, sb| {
            (a * b, (sa * b).hypot(sb * a))
        })
    }

    /// Bin-wise quotient. Bins with a zero divisor get [`ZERO_DIVISION_SENTINEL`].
    pub fn try_div(&self, other: &Histogram1D) -> Result<Histogram1D> {
        self.zip_with(other, |a, sa, b, sb| {
            if b == 0.0 {
                return (ZERO_DIVISION_SENTINEL, 0.0);
            }
            let v = a / b;
            (v, sa.hypot(weighted(sb, v)) / b.abs())
        })
    }

    /// In-place bin-wise sum.
    pub fn accumulate(&mut self, other: &Histogram1D) -> Result<()> {
        self.check_binning(other)?;
        for ((v, e), (ov, oe)) in
            self.values.iter_mut().zip(self.errors.iter_mut()).zip(other.values.iter().zip(&other.errors))
        {
            *v += ov;
            *e = e.hypot(*oe);
        }
        Ok(())
    }

    /// Sum a non-empty sequence of histograms sharing one binning.
    pub fn sum<'a, I>(hists: I) -> Result<Histogram1D>
    where
        I: IntoIterator<Item = &'a Histogram1D>,
    {
        let mut iter = hists.into_iter();
        let mut acc = iter
            .next()
            .cloned()
            .ok_or_else(|| Error::Validation("cannot sum an empty set of histograms".into()))?;
        for h in iter {
            acc.accumulate(h)?;
        }
        Ok(acc)
    }

    /// Multiply values and errors by `factor`.
    pub fn scale(&self, factor: f64) -> Result<Histogram1D> {
        if !factor.is_finite() {
            return Err(Error::InvalidScalar(factor));
        }
        let values = self.values.iter().map(|v| v * factor).collect();
        let errors = self.errors.iter().map(|e| e * factor.abs()).collect();
        Ok(Histogram1D::from_parts(self.bin_edges.clone(), values, errors))
    }

    /// Divide values and errors by `divisor`.
    pub fn scale_down(&self, divisor: f64) -> Result<Histogram1D> {
        if !divisor.is_finite() || divisor == 0.0 {
            return Err(Error::InvalidScalar(divisor));
        }
        self.scale(1.0 / divisor)
    }

    /// Add `offset` to every value. Errors are unchanged.
    pub fn shift(&self, offset: f64) -> Result<Histogram1D> {
        if !offset.is_finite() {
            return Err(Error::InvalidScalar(offset));
        }
        let values = self.values.iter().map(|v| v + offset).collect();
        Ok(Histogram1D::from_parts(self.bin_edges.clone(), values, self.errors.clone()))
    }
}

/// `error * factor`, staying zero for a zero error even when `factor` overflowed.
#[inline]
fn weighted(error: f64, factor: f64) -> f64 {
    if error == 0.0 { 0.0 } else { error * factor }
}

fn add_scalar(h: &Histogram1D, c: f64) -> Result<Histogram1D> {
    h.shift(c)
}

fn sub_scalar(h: &Histogram1D, c: f64) -> Result<Histogram1D> {
    h.shift(-c)
}

fn mul_scalar(h: &Histogram1D, c: f64) -> Result<Histogram1D> {
    h.scale(c)
}

fn div_scalar(h: &Histogram1D, c: f64) -> Result<Histogram1D> {
    h.scale_down(c)
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $hist_fn:ident, $scalar_fn:ident) => {
        impl $trait<&Histogram1D> for &Histogram1D {
            type Output = Result<Histogram1D>;

            fn $method(self, rhs: &Histogram1D) -> Self::Output {
                self.$hist_fn(rhs)
            }
        }

        impl $trait<Histogram1D> for Histogram1D {
            type Output = Result<Histogram1D>;

            fn $method(self, rhs: Histogram1D) -> Self::Output {
                self.$hist_fn(&rhs)
            }
        }

        impl $trait<f64> for &Histogram1D {
            type Output = Result<Histogram1D>;

            fn $method(self, rhs: f64) -> Self::Output {
                $scalar_fn(self, rhs)
            }
        }

        impl $trait<f64> for Histogram1D {
            type Output = Result<Histogram1D>;

            fn $method(self, rhs: f64) -> Self::Output {
                $scalar_fn(&self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, try_add, add_scalar);
impl_binary_op!(Sub, sub, try_sub, sub_scalar);
impl_binary_op!(Mul, mul, try_mul, mul_scalar);
impl_binary_op!(Div, div, try_div, div_scalar);
