use std::sync::Arc;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use forecast_service::models::{defaults, Granularity, ModelConfig, ModelParameters, TimeSeries};
use forecast_service::services::{DecomposableModel, ForecastOrchestrator};

fn series_strategy() -> impl Strategy<Value = TimeSeries> {
    (
        prop::collection::vec(-1000.0f64..1000.0, 2..60),
        prop_oneof![Just(1u64), Just(7u64)],
    )
        .prop_map(|(values, step)| {
            let start = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
            let dates = (0..values.len())
                .map(|i| start.checked_add_days(Days::new(i as u64 * step)).unwrap())
                .collect();
            TimeSeries::from_dates(dates, values).unwrap()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_forecast_shape_and_bounds(
        series in series_strategy(),
        periods in 1usize..40,
        return_components in any::<bool>(),
    ) {
        let orchestrator = ForecastOrchestrator::new(Arc::new(DecomposableModel::new()));
        let result = orchestrator.run(&series, &defaults(), periods, return_components).unwrap();

        prop_assert_eq!(result.forecast_dates().len(), periods);
        prop_assert_eq!(result.forecast_values().len(), periods);
        prop_assert_eq!(result.forecast_lower_bound().len(), periods);
        prop_assert_eq!(result.forecast_upper_bound().len(), periods);

        for i in 0..periods {
            prop_assert!(result.forecast_lower_bound()[i] <= result.forecast_values()[i]);
            prop_assert!(result.forecast_values()[i] <= result.forecast_upper_bound()[i]);
        }

        let step = match series.granularity() {
            Granularity::Days(n) => i64::from(n),
            other => return Err(TestCaseError::fail(format!("unexpected {:?}", other))),
        };
        let mut previous = series.last_date();
        for date in result.forecast_dates() {
            prop_assert_eq!((*date - previous).num_days(), step);
            previous = *date;
        }

        match result.components() {
            None => prop_assert!(!return_components),
            Some(components) => {
                prop_assert!(return_components);
                for values in components.values() {
                    prop_assert_eq!(values.len(), periods);
                }
            }
        }
    }

    #[test]
    fn prop_logistic_requires_ordered_capacity(cap in -100.0f64..100.0, floor in -100.0f64..100.0) {
        let raw = ModelParameters {
            growth: Some("logistic".into()),
            cap: Some(cap),
            floor: Some(floor),
            ..Default::default()
        };
        let built = ModelConfig::build(Some(&raw));
        if cap > floor {
            prop_assert_eq!(built.unwrap().capacity(), Some((cap, floor)));
        } else {
            prop_assert_eq!(built.unwrap_err().field, "cap");
        }
    }

    #[test]
    fn prop_unsorted_dates_rejected(values in prop::collection::vec(-10.0f64..10.0, 3..20), swap in 0usize..18) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut dates: Vec<String> = (0..values.len())
            .map(|i| start.checked_add_days(Days::new(i as u64)).unwrap().format("%Y-%m-%d").to_string())
            .collect();
        let i = swap % (values.len() - 1);
        dates.swap(i, i + 1);

        let err = TimeSeries::build(&dates, &values).unwrap_err();
        prop_assert_eq!(err.field, "dates");
    }
}

#[test]
fn test_build_without_overrides_equals_defaults() {
    assert_eq!(ModelConfig::build(None).unwrap(), defaults());
    assert_eq!(
        ModelConfig::build(Some(&ModelParameters::default())).unwrap(),
        defaults()
    );
}
