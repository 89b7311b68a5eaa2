//! Carry elapsed progress from a cancelled event over to its replacement.
//!
//! When a rate changes mid-wait, an event can be regenerated so that the
//! fraction of its wait already elapsed is kept instead of redrawn. None of
//! the scheduling paths in this crate do that; [`rescale`] is provided as a
//! standalone utility.

use tracing::warn;

use crate::event::SimEvent;

/// Errors raised while rescaling an event.
#[derive(Debug, thiserror::Error)]
pub enum RescaleError {
    /// A step of the computation produced NaN.
    #[error("rescaling produced NaN while computing {step}")]
    NotANumber {
        /// The quantity that was NaN.
        step: &'static str,
    },
}

fn finite(value: f64, step: &'static str) -> Result<f64, RescaleError> {
    if value.is_nan() {
        return Err(RescaleError::NotANumber { step });
    }
    Ok(value)
}

/// Rescale `event` so it keeps the progress `original` had made.
///
/// Nothing happens when `original` is absent or already invalid. If the
/// original had completed its whole wait, its timing is copied verbatim.
///
/// # Errors
///
/// Returns [`RescaleError::NotANumber`] if any intermediate value is NaN.
/// `event` may be partially updated in that case.
#[allow(clippy::float_cmp)]
pub fn rescale(original: Option<&SimEvent>, event: &mut SimEvent) -> Result<(), RescaleError> {
    let Some(original) = original.filter(|o| o.is_valid()) else {
        return Ok(());
    };

    if original.percent_complete == 1.0 {
        event.time = original.time;
        event.clocked = original.clocked;
        event.percent_complete = original.percent_complete;
        return Ok(());
    }

    let original_wait = finite(
        (original.time - original.clocked) / (1.0 - original.percent_complete),
        "original wait",
    )?;
    let origin = finite(original.time - original_wait, "origin")?;
    let elapsed = finite((event.clocked - origin) / original_wait, "elapsed fraction")?;

    event.time = finite(
        (event.time - event.clocked).mul_add(1.0 - elapsed, event.clocked),
        "time",
    )?;
    event.percent_complete = finite(
        (event.clocked - origin) / (event.time - origin),
        "percent complete",
    )?;

    if event.time < event.clocked {
        warn!(
            id = %event.id,
            time = event.time,
            clocked = event.clocked,
            "Rescaled event precedes its clock time"
        );
    }
    Ok(())
}
