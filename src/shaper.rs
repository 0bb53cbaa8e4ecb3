use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::criteria::SortOrder;
use crate::display_date::{normalize_display_date, parse_display_date};
use crate::study::{StudyField, StudyRecord};

pub fn normalize_study_date(record: &mut StudyRecord) {
    if parse_display_date(&record.study_date).is_none() {
        record.study_date = normalize_display_date(&record.study_date);
    }
}

/// Rewrites every study date into display form, then sorts with a stable sort.
///
/// Study dates compare as calendar dates (unreadable dates first); other
/// fields compare by raw value. See [`SortOrder`] for the direction contract.
pub fn normalize_and_sort(
    mut records: Vec<StudyRecord>,
    field: &StudyField,
    order: SortOrder,
) -> Vec<StudyRecord> {
    records.iter_mut().for_each(normalize_study_date);
    records.sort_by(|a, b| {
        let ordering = compare_by_field(a, b, field);
        match order {
            SortOrder::Desc => ordering,
            SortOrder::Asc => ordering.reverse(),
        }
    });
    records
}

fn compare_by_field(a: &StudyRecord, b: &StudyRecord, field: &StudyField) -> Ordering {
    if *field == StudyField::StudyDate {
        return study_date_key(a).cmp(&study_date_key(b));
    }
    a.field_value(field).compare(&b.field_value(field))
}

fn study_date_key(record: &StudyRecord) -> Option<NaiveDate> {
    parse_display_date(&record.study_date)
}
