//! Bin lookup and interval sums.

use crate::error::{Error, Result};
use crate::histogram::Histogram1D;

/// One end of an interval, either a bin index or a value on the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// 0-indexed bin.
    Bin(usize),
    /// Axis value, mapped to the bin containing it.
    Value(f64),
}

impl Histogram1D {
    /// Index of the bin containing `x`.
    ///
    /// Bins are `[low, high)`, except the last which also contains its upper edge.
    pub fn find_bin(&self, x: f64) -> Result<usize> {
        let edges = self.bin_edges();
        let (low, high) = (edges[0], edges[edges.len() - 1]);
        if !(low..=high).contains(&x) {
            return Err(Error::OutOfRange { value: x, low, high });
        }
        let idx = edges.partition_point(|&e| e <= x) - 1;
        Ok(idx.min(self.n_bins() - 1))
    }

    /// Sum of bin values between `min` and `max` (both inclusive), with its error.
    ///
    /// `None` bounds default to the first and last bin.
    pub fn counts_in_interval(&self, min: Option<Bound>, max: Option<Bound>) -> Result<(f64, f64)> {
        let (lo, hi) = self.resolve_interval(min, max)?;
        Ok(self.interval_sum(lo, hi, |_| 1.0))
    }

    /// Width-weighted integral between `min` and `max` (both inclusive), with its error.
    pub fn integral(&self, min: Option<Bound>, max: Option<Bound>) -> Result<(f64, f64)> {
        let (lo, hi) = self.resolve_interval(min, max)?;
        let edges = self.bin_edges();
        Ok(self.interval_sum(lo, hi, |i| edges[i + 1] - edges[i]))
    }

    fn interval_sum(&self, lo: usize, hi: usize, weight: impl Fn(usize) -> f64) -> (f64, f64) {
        let (sum, var) = (lo..=hi).fold((0.0, 0.0), |(sum, var), i| {
            let w = weight(i);
            let e = self.errors()[i] * w;
            (sum + self.values()[i] * w, var + e * e)
        });
        (sum, var.sqrt())
    }

    fn resolve_interval(&self, min: Option<Bound>, max: Option<Bound>) -> Result<(usize, usize)> {
        let lo = match min {
            Some(b) => self.resolve_bound(b)?,
            None => 0,
        };
        let hi = match max {
            Some(b) => self.resolve_bound(b)?,
            None => self.n_bins() - 1,
        };
        if lo > hi {
            return Err(Error::InvalidRange(format!(
                "min bin {} is greater than max bin {}",
                lo, hi
            )));
        }
        Ok((lo, hi))
    }

    fn resolve_bound(&self, bound: Bound) -> Result<usize> {
        match bound {
            Bound::Value(x) => self.find_bin(x),
            Bound::Bin(i) if i < self.n_bins() => Ok(i),
            Bound::Bin(i) => Err(Error::OutOfRange {
                value: i as f64,
                low: 0.0,
                high: (self.n_bins() - 1) as f64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn basic() -> Histogram1D {
        Histogram1D::from_variances(
            vec![0.0, 1.0, 2.0, 3.0, 5.0],
            vec![2.0, 2.0, 3.0, 0.0],
            vec![4.0, 2.0, 3.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_find_bin() {
        let h = basic();
        let table = [
            (0.0, 0),
            (0.5, 0),
            (1.0, 1),
            (1.5, 1),
            (1.99, 1),
            (2.0, 2),
            (3.0, 3),
            (4.5, 3),
            (5.0, 3),
        ];
        for (x, expected) in table {
            assert_eq!(h.find_bin(x).unwrap(), expected, "x = {}", x);
        }
    }

    #[test]
    fn test_find_bin_out_of_range() {
        let h = basic();
        assert!(matches!(h.find_bin(-0.1), Err(Error::OutOfRange { .. })));
        assert!(matches!(h.find_bin(5.01), Err(Error::OutOfRange { .. })));
        assert!(h.find_bin(f64::NAN).is_err());
    }

    /// ROOT reference: bins [1, 2, 3, 4, 6] filled 5, 6, 7, 8 times plus a weight-4
    /// entry at 4.5, i.e. contents [5, 6, 7, 12] with sumw2 [5, 6, 7, 24].
    fn weighted() -> Histogram1D {
        Histogram1D::from_variances(
            vec![1.0, 2.0, 3.0, 4.0, 6.0],
            vec![5.0, 6.0, 7.0, 12.0],
            vec![5.0, 6.0, 7.0, 24.0],
        )
        .unwrap()
    }

    #[test]
    fn test_counts_in_interval_by_bins() {
        let h = weighted();
        let (sum, err) = h.counts_in_interval(Some(Bound::Bin(0)), Some(Bound::Bin(3))).unwrap();
        assert_relative_eq!(sum, 30.0);
        assert_relative_eq!(err, 42f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_integral_by_values() {
        let h = weighted();
        // 1.2 -> bin 0, 4.3 -> bin 3; last bin has width 2.
        let (sum, err) = h.integral(Some(Bound::Value(1.2)), Some(Bound::Value(4.3))).unwrap();
        assert_relative_eq!(sum, 5.0 + 6.0 + 7.0 + 24.0);
        assert_relative_eq!(err, (5.0f64 + 6.0 + 7.0 + 4.0 * 24.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_integral_mixed_bounds() {
        let h = weighted();
        let by_bins = h.integral(Some(Bound::Bin(0)), Some(Bound::Bin(3))).unwrap();
        let mixed = h.integral(Some(Bound::Value(1.0)), Some(Bound::Bin(3))).unwrap();
        let open = h.integral(None, None).unwrap();
        assert_eq!(by_bins, mixed);
        assert_eq!(by_bins, open);
    }

    #[test]
    fn test_integral_inverted_range() {
        let h = basic();
        let err = h.integral(Some(Bound::Value(3.0)), Some(Bound::Value(1.0))).unwrap_err();
        assert!(err.to_string().contains("greater than"));
    }

    #[test]
    fn test_integral_bin_past_end() {
        let h = basic();
        assert!(matches!(
            h.counts_in_interval(None, Some(Bound::Bin(4))),
            Err(Error::OutOfRange { .. })
        ));
    }
}
