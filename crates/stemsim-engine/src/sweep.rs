//! Parameter values visited by a sweep.

use stemsim_core::config::SweepConfig;

/// The values a run set iterates over.
///
/// Without a sweep this is a single `None`: the configuration is used
/// unchanged. With one, the values are `min`, `min + step`, ... while below
/// `max`, followed by `max` itself.
pub fn sweep_values(sweep: Option<&SweepConfig>) -> Vec<Option<f64>> {
    let Some(sweep) = sweep else {
        return vec![None];
    };

    let mut values = Vec::new();
    let mut step: u32 = 0;
    loop {
        let value = f64::from(step).mul_add(sweep.step, sweep.min);
        if value.is_nan() || value >= sweep.max {
            break;
        }
        values.push(Some(value));
        match step.checked_add(1) {
            Some(next) => step = next,
            None => break,
        }
    }
    values.push(Some(sweep.max));
    values
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sweep(min: f64, max: f64, step: f64) -> SweepConfig {
        SweepConfig {
            parameter: String::from("crypt.mean_cells"),
            min,
            max,
            step,
        }
    }

    #[test]
    fn no_sweep_runs_once_unchanged() {
        assert_eq!(sweep_values(None), vec![None]);
    }

    #[test]
    fn max_is_always_visited() {
        assert_eq!(
            sweep_values(Some(&sweep(2.0, 10.0, 4.0))),
            vec![Some(2.0), Some(6.0), Some(10.0)]
        );
        assert_eq!(
            sweep_values(Some(&sweep(2.0, 9.0, 4.0))),
            vec![Some(2.0), Some(6.0), Some(9.0)]
        );
    }

    #[test]
    fn degenerate_range_is_a_single_value() {
        assert_eq!(sweep_values(Some(&sweep(5.0, 5.0, 1.0))), vec![Some(5.0)]);
    }
}
