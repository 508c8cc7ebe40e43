//! State / district / week selection

use crate::data::parse_week;
use crate::errors::{OutbreakError, Result};
use crate::types::RiskRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Label for "no constraint" in every selector
pub const ALL: &str = "(All)";

/// True for `(All)`, `all` and the empty string, in any case
pub fn is_all(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case(ALL) || v.eq_ignore_ascii_case("all")
}

/// Find `value` among `choices`, exactly first and then ignoring case
fn resolve(value: &str, choices: &[String]) -> Option<String> {
    let v = value.trim();
    choices
        .iter()
        .find(|c| c.as_str() == v)
        .or_else(|| choices.iter().find(|c| c.eq_ignore_ascii_case(v)))
        .cloned()
}

/// Current dashboard selection. `None` means "(All)".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub state: Option<String>,
    pub district: Option<String>,
    pub week: Option<NaiveDate>,
}

/// Values each selector can currently offer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub states: Vec<String>,
    pub districts: Vec<String>,
    pub weeks: Vec<NaiveDate>,
}

impl FilterOptions {
    /// Sorted unique choices. Districts are limited to the selected state.
    pub fn from_records(records: &[RiskRecord], filter: &Filter) -> Self {
        let states: BTreeSet<&str> = records.iter().map(|r| r.state.as_str()).collect();
        let districts: BTreeSet<&str> = records
            .iter()
            .filter(|r| filter.state.as_deref().map_or(true, |s| r.state == s))
            .map(|r| r.district.as_str())
            .collect();
        let weeks: BTreeSet<NaiveDate> = records.iter().map(|r| r.week_start).collect();

        Self {
            states: states.into_iter().map(String::from).collect(),
            districts: districts.into_iter().map(String::from).collect(),
            weeks: weeks.into_iter().collect(),
        }
    }
}

impl Filter {
    /// Build a filter from optional selector values, validating each
    /// against the data in selector order (state, district, week).
    pub fn build(
        records: &[RiskRecord],
        state: Option<&str>,
        district: Option<&str>,
        week: Option<&str>,
    ) -> Result<Self> {
        let mut filter = Filter::default();
        if let Some(s) = state {
            filter.select_state(s, records)?;
        }
        if let Some(d) = district {
            filter.select_district(d, records)?;
        }
        if let Some(w) = week {
            filter.select_week(w, records)?;
        }
        Ok(filter)
    }

    /// Select a state. Returns true when the selected district had to be
    /// cleared because it is not in the new state.
    pub fn select_state(&mut self, value: &str, records: &[RiskRecord]) -> Result<bool> {
        if is_all(value) {
            self.state = None;
            return Ok(false);
        }

        let options = FilterOptions::from_records(records, &Filter::default());
        let state = resolve(value, &options.states)
            .ok_or_else(|| OutbreakError::UnknownState(value.trim().to_string()))?;
        self.state = Some(state);

        let district_cleared = match &self.district {
            Some(d) => {
                let allowed = FilterOptions::from_records(records, self).districts;
                !allowed.contains(d)
            }
            None => false,
        };
        if district_cleared {
            self.district = None;
        }
        Ok(district_cleared)
    }

    /// Select a district among those of the selected state
    pub fn select_district(&mut self, value: &str, records: &[RiskRecord]) -> Result<()> {
        if is_all(value) {
            self.district = None;
            return Ok(());
        }

        let options = FilterOptions::from_records(records, self);
        let district = resolve(value, &options.districts)
            .ok_or_else(|| OutbreakError::UnknownDistrict(value.trim().to_string()))?;
        self.district = Some(district);
        Ok(())
    }

    /// Select a forecast week
    pub fn select_week(&mut self, value: &str, records: &[RiskRecord]) -> Result<()> {
        if is_all(value) {
            self.week = None;
            return Ok(());
        }

        let week = parse_week(value)?;
        if !records.iter().any(|r| r.week_start == week) {
            return Err(OutbreakError::UnknownWeek(week));
        }
        self.week = Some(week);
        Ok(())
    }

    /// Clear every constraint
    pub fn reset(&mut self) {
        *self = Filter::default();
    }

    pub fn is_unfiltered(&self) -> bool {
        self.state.is_none() && self.district.is_none() && self.week.is_none()
    }

    pub fn matches(&self, record: &RiskRecord) -> bool {
        self.state.as_deref().map_or(true, |s| record.state == s)
            && self.district.as_deref().map_or(true, |d| record.district == d)
            && self.week.map_or(true, |w| record.week_start == w)
    }

    /// Rows matching every constraint, in input order
    pub fn apply(&self, records: &[RiskRecord]) -> Vec<RiskRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let week = self.week.map(|w| w.to_string());
        write!(
            f,
            "State: {} | District: {} | Week: {}",
            self.state.as_deref().unwrap_or(ALL),
            self.district.as_deref().unwrap_or(ALL),
            week.as_deref().unwrap_or(ALL),
        )
    }
}
