use proptest::prelude::*;

use release_curves::calibration::{fit, resolve};
use release_curves::domain::{CalibrationModel, CalibrationPoint, ModelSource, ReleaseReading};
use release_curves::math::sum_squared_residuals;
use release_curves::release::aggregate;

fn model(slope: f64, intercept: f64) -> CalibrationModel {
    CalibrationModel {
        slope,
        intercept,
        r_squared: Some(1.0),
        n_points: 2,
        source: ModelSource::Fitted,
        standards: None,
    }
}

fn sse(points: &[CalibrationPoint], slope: f64, intercept: f64) -> f64 {
    let observed: Vec<f64> = points.iter().map(|p| p.absorbance).collect();
    let fitted: Vec<f64> = points.iter().map(|p| slope * p.concentration + intercept).collect();
    sum_squared_residuals(&observed, &fitted)
}

fn standards() -> impl Strategy<Value = Vec<CalibrationPoint>> {
    prop::collection::vec((0.0f64..200.0, 0.0f64..1.5), 3..12).prop_map(|pairs| {
        // Two fixed, well-separated standards guarantee a non-degenerate design.
        let mut points = vec![CalibrationPoint::new(0.0, 0.01), CalibrationPoint::new(100.0, 0.5)];
        points.extend(pairs.into_iter().map(|(c, a)| CalibrationPoint::new(c, a)));
        points
    })
}

proptest! {
    #[test]
    fn fitted_line_is_least_squares(points in standards(), ds in -1e-3f64..1e-3, di in -1e-2f64..1e-2) {
        let m = fit(&points).unwrap();
        let best = sse(&points, m.slope, m.intercept);
        let perturbed = sse(&points, m.slope + ds, m.intercept + di);
        prop_assert!(best <= perturbed + 1e-9);
    }

    #[test]
    fn r_squared_stays_in_unit_interval(points in standards()) {
        let r2 = fit(&points).unwrap().r_squared.unwrap();
        prop_assert!((0.0..=1.0).contains(&r2));
    }

    #[test]
    fn resolved_concentration_is_non_negative_and_monotone(
        slope in 1e-4f64..1.0,
        intercept in -0.1f64..0.1,
        a in -1.0f64..2.0,
        b in -1.0f64..2.0,
    ) {
        let m = model(slope, intercept);
        let ca = resolve(a, &m).unwrap();
        let cb = resolve(b, &m).unwrap();
        prop_assert!(ca >= 0.0 && cb >= 0.0);
        if a <= b {
            prop_assert!(ca <= cb);
        } else {
            prop_assert!(ca >= cb);
        }
    }

    #[test]
    fn release_values_are_always_finite(
        absorbances in prop::collection::vec(prop::num::f64::ANY, 0..20),
        volume in 0.1f64..100.0,
    ) {
        let readings: Vec<ReleaseReading> = absorbances
            .iter()
            .enumerate()
            .map(|(i, &a)| ReleaseReading::new(i as f64, a))
            .collect();
        let records = aggregate(&readings, &model(0.005, 0.0), volume).unwrap();
        for r in &records {
            prop_assert!(r.concentration.is_finite());
            prop_assert!(r.amount_released.is_finite());
            prop_assert!(r.cumulative_release.is_finite());
        }
    }

    #[test]
    fn cumulative_is_running_sum(
        absorbances in prop::collection::vec(-0.05f64..1.5, 0..30),
        volume in 0.1f64..100.0,
    ) {
        let readings: Vec<ReleaseReading> = absorbances
            .iter()
            .enumerate()
            .map(|(i, &a)| ReleaseReading::new(i as f64, a))
            .collect();
        let records = aggregate(&readings, &model(0.005, 0.0), volume).unwrap();

        prop_assert_eq!(records.len(), readings.len());
        let mut total = 0.0;
        let mut previous = 0.0;
        for r in &records {
            prop_assert!(r.amount_released >= 0.0);
            prop_assert!(r.cumulative_release >= previous);
            total += r.amount_released;
            previous = r.cumulative_release;
        }
        prop_assert!((previous - total).abs() <= 1e-9 * total.max(1.0));
    }
}
