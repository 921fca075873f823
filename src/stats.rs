//! Utilities to accumulate first and second moments; min;
//! and max of a `f64` statistic incrementally.
use serde_derive::Serialize;
use std::ops::AddAssign;

/// Stores the statistics collected from a `f64` random
/// variable. Accumulation of the statistic is done by
/// add-assigning (using `+=`) one of the following.
///
/// - a `f64` value.  Adds a new sample of unit weight.
/// - a `(f64, f64)` tuple.  Adds the first component with weight specified by the second component.
/// - another `PixelStats` value.  Accumulates the statistic from the other into `self`.
///
/// Weights are typically pixel areas, which makes
/// [`PixelStats::mean`] an area-weighted zonal mean.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PixelStats {
    max: f64,
    min: f64,
    sum: f64,
    sum_2: f64,
    weight: f64,
    count: usize,
}

impl Default for PixelStats {
    fn default() -> Self {
        use std::f64::*;
        PixelStats {
            max: NEG_INFINITY,
            min: INFINITY,
            sum: 0.,
            sum_2: 0.,
            weight: 0.,
            count: 0,
        }
    }
}

impl AddAssign<(f64, f64)> for PixelStats {
    fn add_assign(&mut self, (val, weight): (f64, f64)) {
        self.max = self.max.max(val);
        self.min = self.min.min(val);
        self.sum += val * weight;
        self.sum_2 += val * val * weight;
        self.weight += weight;
        self.count += 1;
    }
}

impl AddAssign<f64> for PixelStats {
    fn add_assign(&mut self, other: f64) {
        *self += (other, 1.);
    }
}

impl AddAssign<&PixelStats> for PixelStats {
    fn add_assign(&mut self, other: &PixelStats) {
        self.max = self.max.max(other.max);
        self.min = self.min.min(other.min);
        self.sum += other.sum;
        self.sum_2 += other.sum_2;
        self.weight += other.weight;
        self.count += other.count;
    }
}

impl AddAssign for PixelStats {
    fn add_assign(&mut self, other: PixelStats) {
        *self += &other;
    }
}

impl PixelStats {
    #[inline]
    pub fn max(&self) -> Option<f64> {
        self.defined(self.max)
    }

    #[inline]
    pub fn min(&self) -> Option<f64> {
        self.defined(self.min)
    }

    /// Weighted sum of the samples.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.weight <= 0.
    }

    /// Weighted mean; `None` without samples.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        self.defined(self.sum / self.weight)
    }

    /// Weighted (population) variance.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        Some((self.sum_2 / self.weight - mean * mean).max(0.))
    }

    pub fn std_deviation(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    #[inline]
    fn defined(&self, val: f64) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(val)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_stats_have_no_mean() {
        let stats = PixelStats::default();
        assert!(stats.is_empty());
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.max(), None);
    }

    #[test]
    fn weighted_mean_and_deviation() {
        let mut stats = PixelStats::default();
        stats += (1., 3.);
        stats += (5., 1.);
        assert_eq!(stats.count(), 2);
        assert_relative_eq!(stats.mean().unwrap(), 2.);
        // E[x²] = (3 + 25) / 4 = 7, var = 7 - 4
        assert_relative_eq!(stats.variance().unwrap(), 3.);
        assert_eq!(stats.min(), Some(1.));
        assert_eq!(stats.max(), Some(5.));
    }

    #[test]
    fn merge_equals_sequential() {
        let mut a = PixelStats::default();
        let mut b = PixelStats::default();
        let mut all = PixelStats::default();
        for (i, v) in [0.1, 0.4, -0.2, 0.9].iter().enumerate() {
            all += *v;
            if i % 2 == 0 {
                a += *v;
            } else {
                b += *v;
            }
        }
        a += b;
        assert_eq!(a.count(), all.count());
        assert_relative_eq!(a.mean().unwrap(), all.mean().unwrap());
        assert_relative_eq!(a.variance().unwrap(), all.variance().unwrap());
    }
}
