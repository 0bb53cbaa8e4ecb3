use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::study::StudyField;

pub const DEFAULT_ROWS_PER_PAGE: u32 = 25;
/// Width of the default study-date window, counted back from today.
pub const DEFAULT_DATE_FILTER_NUM_DAYS: u64 = 25_000;

/// Direction requested by the list widget.
///
/// The names are inverted relative to the usual meaning: `Desc` orders records
/// ascending on the sort key and `Asc` orders them descending. The list widget
/// has always been driven by this contract, so it is reproduced as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("Unknown sort order '{other}'; expected asc or desc.")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortData {
    pub field: StudyField,
    pub order: SortOrder,
}

impl Default for SortData {
    fn default() -> Self {
        Self {
            field: StudyField::PatientName,
            order: SortOrder::Desc,
        }
    }
}

/// Filter, paging and sort state the list widget hands back on every search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub accession_number: Option<String>,
    pub study_description: Option<String>,
    pub modalities: Option<String>,
    pub study_date_from: NaiveDate,
    pub study_date_to: NaiveDate,
    pub current_page: u32,
    pub rows_per_page: u32,
    pub sort: SortData,
}

/// Partial criteria laid over the defaults; `None` keeps the default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaPatch {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub accession_number: Option<String>,
    pub study_description: Option<String>,
    pub modalities: Option<String>,
    pub study_date_from: Option<NaiveDate>,
    pub study_date_to: Option<NaiveDate>,
    pub current_page: Option<u32>,
    pub rows_per_page: Option<u32>,
    pub sort_field: Option<StudyField>,
    pub sort_order: Option<SortOrder>,
}

pub fn default_search_criteria(now: DateTime<Utc>) -> SearchCriteria {
    search_criteria_with_window(now, DEFAULT_ROWS_PER_PAGE, DEFAULT_DATE_FILTER_NUM_DAYS)
}

/// Defaults for a given page size and date window, ending on the day of `now`.
pub fn search_criteria_with_window(
    now: DateTime<Utc>,
    rows_per_page: u32,
    date_filter_num_days: u64,
) -> SearchCriteria {
    let today = now.date_naive();
    let study_date_from = today
        .checked_sub_days(Days::new(date_filter_num_days))
        .unwrap_or(NaiveDate::MIN);

    SearchCriteria {
        patient_id: None,
        patient_name: None,
        accession_number: None,
        study_description: None,
        modalities: None,
        study_date_from,
        study_date_to: today,
        current_page: 0,
        rows_per_page,
        sort: SortData::default(),
    }
}

impl SearchCriteria {
    pub fn patched(mut self, patch: &CriteriaPatch) -> Self {
        if let Some(value) = &patch.patient_id {
            self.patient_id = Some(value.clone());
        }
        if let Some(value) = &patch.patient_name {
            self.patient_name = Some(value.clone());
        }
        if let Some(value) = &patch.accession_number {
            self.accession_number = Some(value.clone());
        }
        if let Some(value) = &patch.study_description {
            self.study_description = Some(value.clone());
        }
        if let Some(value) = &patch.modalities {
            self.modalities = Some(value.clone());
        }
        if let Some(value) = patch.study_date_from {
            self.study_date_from = value;
        }
        if let Some(value) = patch.study_date_to {
            self.study_date_to = value;
        }
        if let Some(value) = patch.current_page {
            self.current_page = value;
        }
        if let Some(value) = patch.rows_per_page {
            self.rows_per_page = value;
        }
        if let Some(value) = &patch.sort_field {
            self.sort.field = value.clone();
        }
        if let Some(value) = patch.sort_order {
            self.sort.order = value;
        }
        self
    }
}
