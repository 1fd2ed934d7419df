//! Linear trend forecaster
//!
//! Ordinary least squares over the index sequence `0..n` of a price window,
//! extrapolated one step ahead. Each entry of the window is forecast from
//! its own prefix only, as if later prices were not yet known.

/// Fitted line `price = intercept + slope * index`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Closed-form OLS over `(i, prices[i])`. Undefined for fewer than two points.
    pub fn fit(prices: &[f64]) -> Option<Self> {
        if prices.len() < 2 {
            return None;
        }

        let n = prices.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = prices.iter().sum::<f64>() / n;

        let mut num = 0.0;
        let mut den = 0.0;
        for (i, &y) in prices.iter().enumerate() {
            let dx = i as f64 - x_mean;
            num += dx * (y - y_mean);
            den += dx * dx;
        }

        let slope = num / den;
        Some(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn predict(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// One-step-ahead price predictor
pub struct TrendForecaster;

impl TrendForecaster {
    /// Forecast the price at index `prices.len()`
    pub fn predict_next(prices: &[f64]) -> Option<f64> {
        LinearFit::fit(prices).map(|fit| fit.predict(prices.len() as f64))
    }

    /// Forecast for every entry from its own prefix.
    ///
    /// Entry `i` gets the prediction of a fit over `prices[..=i]`; the first
    /// entry never has one, and a window shorter than two gets none at all.
    pub fn prefix_predictions(prices: &[f64]) -> Vec<Option<f64>> {
        if prices.len() < 2 {
            return vec![None; prices.len()];
        }

        (1..=prices.len())
            .map(|end| Self::predict_next(&prices[..end]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_linear_sequence_extrapolates_exactly() {
        let predicted = TrendForecaster::predict_next(&[100.0, 101.0, 102.0, 103.0]).unwrap();
        assert!((predicted - 104.0).abs() < EPS);
    }

    #[test]
    fn test_single_point_has_no_fit() {
        assert!(LinearFit::fit(&[78.0]).is_none());
        assert_eq!(TrendForecaster::prefix_predictions(&[78.0]), vec![None]);
        assert!(TrendForecaster::prefix_predictions(&[]).is_empty());
    }

    #[test]
    fn test_prefix_predictions_use_own_prefix() {
        let predictions = TrendForecaster::prefix_predictions(&[100.0, 101.0, 102.0, 103.0]);

        assert_eq!(predictions.len(), 4);
        assert!(predictions[0].is_none());
        for (i, expected) in [(1, 102.0), (2, 103.0), (3, 104.0)] {
            assert!((predictions[i].unwrap() - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_flat_prices_predict_same_value() {
        let predicted = TrendForecaster::predict_next(&[80.0, 80.0, 80.0]).unwrap();
        assert!((predicted - 80.0).abs() < EPS);
    }

    #[test]
    fn test_noisy_fit_matches_closed_form() {
        // y = 1, 3, 2 -> slope 0.5, intercept 1.5
        let fit = LinearFit::fit(&[1.0, 3.0, 2.0]).unwrap();
        assert!((fit.slope - 0.5).abs() < EPS);
        assert!((fit.intercept - 1.5).abs() < EPS);
        assert!((fit.predict(3.0) - 3.0).abs() < EPS);
    }
}
