use shared::domain::DurationChoice;

use crate::error::CoachError;

pub struct TimeSelector;

impl TimeSelector {
    pub fn options() -> &'static [DurationChoice] {
        &DurationChoice::OPTIONS
    }

    pub fn choose(minutes: u32) -> Result<DurationChoice, CoachError> {
        Ok(DurationChoice::try_from(minutes)?)
    }
}
