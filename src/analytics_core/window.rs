//! Settlement-date windows used to select current, prior and historical sales

use chrono::NaiveDate;
use serde::Serialize;

const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, PartialEq)]
pub enum WindowError {
    InvalidDate(String),
    Inverted { start: String, end: String },
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::InvalidDate(d) => write!(f, "Invalid YYYYMMDD date: {}", d),
            WindowError::Inverted { start, end } => {
                write!(f, "Window start {} is not before end {}", start, end)
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// Half-open date range `[start, end)` over YYYYMMDD strings.
///
/// Either bound may be open. Dates compare as strings, which is only valid
/// because both bounds are validated as eight-digit calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DateWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Everything settled on or after `start`
    pub fn since(start: &str) -> Result<Self, WindowError> {
        Ok(Self {
            start: Some(validate_date(start)?),
            end: None,
        })
    }

    /// `[start, end)`
    pub fn between(start: &str, end: &str) -> Result<Self, WindowError> {
        let start = validate_date(start)?;
        let end = validate_date(end)?;
        if start >= end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    pub fn contains(&self, date: &str) -> bool {
        let after_start = self.start.as_deref().map_or(true, |s| date >= s);
        let before_end = self.end.as_deref().map_or(true, |e| date < e);
        after_start && before_end
    }
}

/// The cutoffs one analysis run works against.
///
/// - `current`: sales feeding suburb statistics and outlier baselines
/// - `prior`: the comparison period for growth
/// - `feature`: the wider history used for the monthly feature table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisWindows {
    pub current: DateWindow,
    pub prior: DateWindow,
    pub feature: DateWindow,
}

impl AnalysisWindows {
    /// Build windows from explicit cutoffs.
    ///
    /// The prior period ends where the current one starts.
    pub fn from_cutoffs(
        current_start: &str,
        prior_start: &str,
        feature_start: &str,
    ) -> Result<Self, WindowError> {
        Ok(Self {
            current: DateWindow::since(current_start)?,
            prior: DateWindow::between(prior_start, current_start)?,
            feature: DateWindow::since(feature_start)?,
        })
    }

    /// Calendar-year windows: `year` is current, `year - 1` is prior and
    /// the feature table spans both.
    pub fn for_year(year: i32) -> Result<Self, WindowError> {
        let current_start = year_start(year)?;
        let prior_start = year_start(year - 1)?;
        Self::from_cutoffs(&current_start, &prior_start, &prior_start)
    }
}

fn year_start(year: i32) -> Result<String, WindowError> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .ok_or_else(|| WindowError::InvalidDate(format!("{}0101", year)))
}

/// Accept only eight-digit calendar dates
pub fn validate_date(date: &str) -> Result<String, WindowError> {
    let trimmed = date.trim();
    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WindowError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| WindowError::InvalidDate(date.to_string()))?;
    Ok(trimmed.to_string())
}
