//! Control-run slice sampling.
//!
//! Multi-decadal variability is estimated from `number` consecutive slices of
//! `nyears` years taken in a control run, starting `shift` years after the
//! beginning of the available data to skip the spin-up. When the data is too
//! short for the full shift, the slices are pushed back so that they end on
//! the last available year; the shift is relaxed, never the slice count.

use tracing::debug;

use crate::error::PeriodError;
use crate::range::YearRange;

/// Slice layout for control-run sampling.
///
/// # Example
///
/// ```
/// use delta_period::SamplingConfig;
///
/// let config = SamplingConfig::default().with_nyears(30).with_number(10);
/// assert_eq!(config.duration(), 300);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Years skipped at the start of the available data.
    shift: u32,
    /// Length of each slice, in years.
    nyears: u32,
    /// Number of slices.
    number: u32,
}

impl SamplingConfig {
    /// Creates a configuration.
    pub fn new(shift: u32, nyears: u32, number: u32) -> Self {
        Self {
            shift,
            nyears,
            number,
        }
    }

    /// Sets the spin-up shift.
    pub fn with_shift(mut self, shift: u32) -> Self {
        self.shift = shift;
        self
    }

    /// Sets the slice length.
    pub fn with_nyears(mut self, nyears: u32) -> Self {
        self.nyears = nyears;
        self
    }

    /// Sets the number of slices.
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    /// Returns the spin-up shift.
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Returns the slice length.
    pub fn nyears(&self) -> u32 {
        self.nyears
    }

    /// Returns the number of slices.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Total number of years covered by the slices, saturating at
    /// `u32::MAX` for configurations rejected by [`SamplingConfig::validate`].
    pub fn duration(&self) -> u32 {
        self.nyears.saturating_mul(self.number)
    }

    /// Validates this configuration.
    ///
    /// Slices must hold at least one year and there must be at least two of
    /// them, since their spread is what gets measured. The shift and the
    /// total duration must be representable as year offsets.
    pub fn validate(&self) -> Result<(), PeriodError> {
        if self.nyears < 1 {
            return Err(PeriodError::InvalidSampling {
                reason: "nyears must be at least 1".to_string(),
            });
        }
        if self.number < 2 {
            return Err(PeriodError::InvalidSampling {
                reason: format!("number must be at least 2, got {}", self.number),
            });
        }
        let duration = self.nyears.checked_mul(self.number).ok_or_else(|| PeriodError::InvalidSampling {
            reason: format!("{} slices of {} years overflow", self.number, self.nyears),
        })?;
        year_offset(duration, "duration")?;
        year_offset(self.shift, "shift")?;
        Ok(())
    }
}

fn year_offset(value: u32, what: &str) -> Result<i32, PeriodError> {
    i32::try_from(value).map_err(|_| PeriodError::InvalidSampling {
        reason: format!("{what} of {value} years is out of range"),
    })
}

impl Default for SamplingConfig {
    /// 20 slices of 20 years after a 100-year spin-up.
    fn default() -> Self {
        Self::new(100, 20, 20)
    }
}

/// The slices chosen for one control run.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceEnsemble {
    slices: Vec<YearRange>,
    relaxed: bool,
}

impl SliceEnsemble {
    /// The slices, in chronological order.
    pub fn slices(&self) -> &[YearRange] {
        &self.slices
    }

    /// First year of the first slice.
    pub fn begin(&self) -> i32 {
        self.slices[0].start()
    }

    /// Whole window covered by the slices.
    pub fn window(&self) -> YearRange {
        YearRange::new(self.begin(), self.slices[self.slices.len() - 1].end())
            .unwrap_or(self.slices[0])
    }

    /// Returns `true` if the spin-up shift had to be reduced.
    pub fn relaxed(&self) -> bool {
        self.relaxed
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Always `false` for an ensemble built by [`sample`].
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Lays out `number` contiguous slices of `nyears` years in `available`.
///
/// The first slice starts at `available.start() + shift`. If the last slice
/// would end after `available.end()`, the layout is moved back to end on the
/// last available year, provided it still starts within the available data.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidSampling`] for an invalid configuration and
/// [`PeriodError::InsufficientData`] when `available` is shorter than
/// `nyears * number` years.
pub fn sample(available: YearRange, config: &SamplingConfig) -> Result<SliceEnsemble, PeriodError> {
    config.validate()?;
    let duration = config.duration();
    let span = i64::from(duration);
    let mut begin = i64::from(available.start()) + i64::from(config.shift());
    let mut relaxed = false;

    if begin + span - 1 > i64::from(available.end()) {
        let alt_begin = i64::from(available.end()) - span + 1;
        if alt_begin >= i64::from(available.start()) {
            debug!(
                available = %available,
                shift = config.shift(),
                alt_shift = alt_begin - i64::from(available.start()),
                "relaxing control-run spin-up shift"
            );
            begin = alt_begin;
            relaxed = true;
        } else {
            return Err(PeriodError::InsufficientData {
                available,
                needed: duration,
                shortfall: duration - available.len(),
            });
        }
    }

    // the whole layout now lies inside `available`
    let begin = i32::try_from(begin).map_err(|_| PeriodError::InvalidSampling {
        reason: format!("first slice year {begin} is out of range"),
    })?;
    let nyears = year_offset(config.nyears(), "nyears")?;
    let slices = (0..year_offset(config.number(), "number")?)
        .map(|k| YearRange::starting_at(begin + k * nyears, config.nyears()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SliceEnsemble { slices, relaxed })
}
