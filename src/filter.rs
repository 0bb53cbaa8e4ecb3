use chrono::NaiveDate;

use crate::criteria::SearchCriteria;

/// Request payload handed to the search service for a single search.
///
/// Sorting is never part of the request; results are ordered client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFilter {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub accession_number: Option<String>,
    pub study_description: Option<String>,
    pub modalities_in_study: Option<String>,
    pub study_date_from: NaiveDate,
    pub study_date_to: NaiveDate,
    pub limit: u32,
    pub offset: u64,
}

/// Text filters are copied verbatim; no trimming or validation happens here.
pub fn build_filter(criteria: &SearchCriteria) -> BackendFilter {
    BackendFilter {
        patient_id: criteria.patient_id.clone(),
        patient_name: criteria.patient_name.clone(),
        accession_number: criteria.accession_number.clone(),
        study_description: criteria.study_description.clone(),
        modalities_in_study: criteria.modalities.clone(),
        study_date_from: criteria.study_date_from,
        study_date_to: criteria.study_date_to,
        limit: criteria.rows_per_page,
        offset: u64::from(criteria.current_page) * u64::from(criteria.rows_per_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{default_search_criteria, CriteriaPatch};
    use chrono::{TimeZone, Utc};

    fn criteria(patch: CriteriaPatch) -> SearchCriteria {
        let now = Utc
            .with_ymd_and_hms(2026, 10, 18, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        default_search_criteria(now).patched(&patch)
    }

    #[test]
    fn offset_is_page_times_rows() {
        let filter = build_filter(&criteria(CriteriaPatch {
            current_page: Some(2),
            rows_per_page: Some(25),
            ..CriteriaPatch::default()
        }));
        assert_eq!(filter.offset, 50);
        assert_eq!(filter.limit, 25);
    }

    #[test]
    fn first_page_has_zero_offset() {
        let filter = build_filter(&criteria(CriteriaPatch::default()));
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn large_pages_do_not_overflow() {
        let filter = build_filter(&criteria(CriteriaPatch {
            current_page: Some(u32::MAX),
            rows_per_page: Some(u32::MAX),
            ..CriteriaPatch::default()
        }));
        assert_eq!(filter.offset, u64::from(u32::MAX) * u64::from(u32::MAX));
    }

    #[test]
    fn text_filters_pass_through_untouched() {
        let source = criteria(CriteriaPatch {
            patient_id: Some("  PID-7 ".to_string()),
            patient_name: Some(String::new()),
            modalities: Some("MG\\CT".to_string()),
            ..CriteriaPatch::default()
        });
        let filter = build_filter(&source);
        assert_eq!(filter.patient_id.as_deref(), Some("  PID-7 "));
        assert_eq!(filter.patient_name.as_deref(), Some(""));
        assert_eq!(filter.modalities_in_study.as_deref(), Some("MG\\CT"));
        assert!(filter.accession_number.is_none());
        assert!(filter.study_description.is_none());
        assert_eq!(filter.study_date_from, source.study_date_from);
        assert_eq!(filter.study_date_to, source.study_date_to);
    }

    #[test]
    fn equal_criteria_build_equal_filters() {
        let source = criteria(CriteriaPatch {
            accession_number: Some("ACC-1".to_string()),
            current_page: Some(4),
            ..CriteriaPatch::default()
        });
        assert_eq!(build_filter(&source), build_filter(&source.clone()));
    }
}
