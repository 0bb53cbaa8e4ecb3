use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the study list as returned by the search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    #[serde(rename = "studyInstanceUID")]
    pub study_instance_uid: String,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession_number: Option<String>,
    /// Either the canonical display form ("Jan 15, 2020") or raw DICOM DA ("20200115").
    #[serde(default)]
    pub study_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_instances: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Field a study list can be sorted by, named the way the list widget names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StudyField {
    StudyInstanceUid,
    PatientName,
    PatientId,
    AccessionNumber,
    StudyDate,
    StudyTime,
    StudyDescription,
    Modalities,
    NumberOfInstances,
    Other(String),
}

impl StudyField {
    pub fn parse(name: &str) -> Self {
        match name {
            "studyInstanceUID" => Self::StudyInstanceUid,
            "patientName" => Self::PatientName,
            "patientId" => Self::PatientId,
            "accessionNumber" => Self::AccessionNumber,
            "studyDate" => Self::StudyDate,
            "studyTime" => Self::StudyTime,
            "studyDescription" => Self::StudyDescription,
            "modalities" => Self::Modalities,
            "numberOfInstances" => Self::NumberOfInstances,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::StudyInstanceUid => "studyInstanceUID",
            Self::PatientName => "patientName",
            Self::PatientId => "patientId",
            Self::AccessionNumber => "accessionNumber",
            Self::StudyDate => "studyDate",
            Self::StudyTime => "studyTime",
            Self::StudyDescription => "studyDescription",
            Self::Modalities => "modalities",
            Self::NumberOfInstances => "numberOfInstances",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for StudyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw value of a record field, as used by the non-date comparator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

impl FieldValue<'_> {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Missing => 0,
            FieldValue::Number(_) => 1,
            FieldValue::Text(_) => 2,
        }
    }

    /// Total order: missing < number < text; numbers numerically, text by string order.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl StudyRecord {
    pub fn field_value(&self, field: &StudyField) -> FieldValue<'_> {
        match field {
            StudyField::StudyInstanceUid => FieldValue::Text(&self.study_instance_uid),
            StudyField::PatientName => FieldValue::Text(&self.patient_name),
            StudyField::PatientId => optional_text(self.patient_id.as_deref()),
            StudyField::AccessionNumber => optional_text(self.accession_number.as_deref()),
            StudyField::StudyDate => FieldValue::Text(&self.study_date),
            StudyField::StudyTime => optional_text(self.study_time.as_deref()),
            StudyField::StudyDescription => optional_text(self.study_description.as_deref()),
            StudyField::Modalities => optional_text(self.modalities.as_deref()),
            StudyField::NumberOfInstances => self
                .number_of_instances
                .map(|count| FieldValue::Number(f64::from(count)))
                .unwrap_or(FieldValue::Missing),
            StudyField::Other(name) => match self.extra.get(name) {
                Some(Value::String(text)) => FieldValue::Text(text),
                Some(Value::Number(number)) => number
                    .as_f64()
                    .map(FieldValue::Number)
                    .unwrap_or(FieldValue::Missing),
                _ => FieldValue::Missing,
            },
        }
    }
}

fn optional_text(value: Option<&str>) -> FieldValue<'_> {
    value.map(FieldValue::Text).unwrap_or(FieldValue::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_field_names_roundtrip() {
        for name in [
            "studyInstanceUID",
            "patientName",
            "studyDate",
            "numberOfInstances",
            "referringPhysician",
        ] {
            assert_eq!(StudyField::parse(name).name(), name);
        }
        assert_eq!(
            StudyField::parse("referringPhysician"),
            StudyField::Other("referringPhysician".to_string())
        );
    }

    #[test]
    fn record_deserializes_camel_case_and_keeps_unknown_fields() {
        let json = r#"{
            "studyInstanceUID": "1.2.3",
            "patientName": "DOE^JANE",
            "studyDate": "20200115",
            "numberOfInstances": 12,
            "referringPhysician": "HOUSE^G"
        }"#;
        let record: StudyRecord = serde_json::from_str(json).expect("record should parse");
        assert_eq!(record.study_instance_uid, "1.2.3");
        assert_eq!(record.patient_name, "DOE^JANE");
        assert_eq!(record.number_of_instances, Some(12));
        assert_eq!(
            record.field_value(&StudyField::parse("referringPhysician")),
            FieldValue::Text("HOUSE^G")
        );
    }

    #[test]
    fn field_values_compare_missing_then_numbers_then_text() {
        let missing = FieldValue::Missing;
        let small = FieldValue::Number(2.0);
        let large = FieldValue::Number(10.0);
        let text = FieldValue::Text("A");

        assert_eq!(missing.compare(&small), Ordering::Less);
        assert_eq!(small.compare(&large), Ordering::Less);
        assert_eq!(large.compare(&text), Ordering::Less);
        assert_eq!(FieldValue::Text("B").compare(&text), Ordering::Greater);
        assert_eq!(missing.compare(&FieldValue::Missing), Ordering::Equal);
    }

    #[test]
    fn numeric_field_compares_numerically() {
        let few = StudyRecord {
            number_of_instances: Some(9),
            ..StudyRecord::default()
        };
        let many = StudyRecord {
            number_of_instances: Some(120),
            ..StudyRecord::default()
        };
        let field = StudyField::NumberOfInstances;
        assert_eq!(
            few.field_value(&field).compare(&many.field_value(&field)),
            Ordering::Less
        );
    }
}
