//! Regression error metrics.

use crate::error::RfError;

/// Mean squared error between actual and predicted values.
///
/// # Errors
///
/// Returns [`RfError::TargetCountMismatch`] when the slices have different
/// lengths and [`RfError::EmptyDataset`] when both are empty.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64, RfError> {
    if actual.len() != predicted.len() {
        return Err(RfError::TargetCountMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| (a - p) * (a - p))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error between actual and predicted values.
///
/// # Errors
///
/// Same conditions as [`mean_squared_error`].
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64, RfError> {
    Ok(mean_squared_error(actual, predicted)?.sqrt())
}

/// Coefficient of determination (R²).
///
/// 1.0 for a perfect fit; 0.0 for a model no better than predicting the
/// mean; negative for worse. Returns 0.0 when the actual values are
/// constant (zero total variance), where R² is undefined.
///
/// # Errors
///
/// Same conditions as [`mean_squared_error`].
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64, RfError> {
    if actual.len() != predicted.len() {
        return Err(RfError::TargetCountMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    let mean: f64 = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|&a| (a - mean) * (a - mean)).sum();
    if ss_tot == 0.0 {
        return Ok(0.0);
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| (a - p) * (a - p))
        .sum();
    Ok(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_perfect_fit_is_zero() {
        let v = vec![1.0, 2.0, 3.0];
        assert!(mean_squared_error(&v, &v).unwrap().abs() < 1e-12);
    }

    #[test]
    fn mse_known_value() {
        let actual = vec![1.0, 2.0];
        let predicted = vec![2.0, 4.0];
        // ((1)^2 + (2)^2) / 2 = 2.5
        assert!((mean_squared_error(&actual, &predicted).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn rmse_is_sqrt_of_mse() {
        let actual = vec![0.0, 0.0];
        let predicted = vec![3.0, 4.0];
        // MSE = 12.5, RMSE = sqrt(12.5)
        let rmse = root_mean_squared_error(&actual, &predicted).unwrap();
        assert!((rmse - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn r_squared_perfect_fit_is_one() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!((r_squared(&v, &v).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn r_squared_mean_predictor_is_zero() {
        let actual = vec![1.0, 2.0, 3.0];
        let predicted = vec![2.0, 2.0, 2.0];
        assert!(r_squared(&actual, &predicted).unwrap().abs() < 1e-12);
    }

    #[test]
    fn r_squared_constant_actuals_is_zero() {
        let actual = vec![5.0, 5.0, 5.0];
        let predicted = vec![4.0, 5.0, 6.0];
        assert!(r_squared(&actual, &predicted).unwrap().abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = mean_squared_error(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            crate::RfError::TargetCountMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn empty_rejected() {
        assert!(mean_squared_error(&[], &[]).is_err());
        assert!(r_squared(&[], &[]).is_err());
    }
}
