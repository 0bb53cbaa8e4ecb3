use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::display_date::format_compact_date;
use crate::filter::BackendFilter;
use crate::search::{SearchService, ServerConfig};
use crate::study::StudyRecord;

const TAG_STUDY_DATE: &str = "00080020";
const TAG_STUDY_TIME: &str = "00080030";
const TAG_ACCESSION_NUMBER: &str = "00080050";
const TAG_MODALITIES_IN_STUDY: &str = "00080061";
const TAG_STUDY_DESCRIPTION: &str = "00081030";
const TAG_PATIENT_NAME: &str = "00100010";
const TAG_PATIENT_ID: &str = "00100020";
const TAG_STUDY_INSTANCE_UID: &str = "0020000D";
const TAG_NUMBER_OF_STUDY_RELATED_INSTANCES: &str = "00201208";

const DICOM_JSON: &str = "application/dicom+json";

/// Study search over DICOMweb QIDO-RS (`GET {base}/studies`).
pub struct QidoSearchService {
    client: Client,
}

impl QidoSearchService {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

impl SearchService for QidoSearchService {
    fn search_studies(
        &self,
        server: Option<&ServerConfig>,
        filter: &BackendFilter,
    ) -> Result<Option<Vec<StudyRecord>>> {
        let Some(server) = server else {
            bail!("No DICOMweb server is configured");
        };
        let base = normalize_base_url(&server.base_url);
        if base.is_empty() {
            bail!("DICOMweb server has an empty base URL");
        }

        let url = studies_url(&base);
        let params = qido_study_params(filter);
        log::debug!("QIDO-RS {url} {params:?}");

        let body = http_get_text(&self.client, &url, &params, server.basic_auth())
            .with_context(|| format!("Failed searching studies at {url}"))?;
        let Some(body) = body else {
            return Ok(None);
        };
        parse_study_records(&body).map(Some)
    }
}

fn build_http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .context("Could not initialize HTTP client for DICOMweb")
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = strip_query_and_fragment(base_url.trim())
        .trim()
        .trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    if has_root_only_path(trimmed) {
        return format!("{trimmed}/dicom-web");
    }

    trimmed.to_string()
}

fn strip_query_and_fragment(value: &str) -> &str {
    let query_index = value.find('?').unwrap_or(value.len());
    let fragment_index = value.find('#').unwrap_or(value.len());
    &value[..query_index.min(fragment_index)]
}

fn has_root_only_path(url: &str) -> bool {
    if let Some((_, rest)) = url.split_once("://") {
        match rest.find('/') {
            None => true,
            Some(path_index) => rest[path_index..].trim_matches('/').is_empty(),
        }
    } else {
        !url.contains('/')
    }
}

fn studies_url(base: &str) -> String {
    format!("{base}/studies")
}

fn qido_study_params(filter: &BackendFilter) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    let text_filters = [
        ("PatientID", &filter.patient_id),
        ("PatientName", &filter.patient_name),
        ("AccessionNumber", &filter.accession_number),
        ("StudyDescription", &filter.study_description),
        ("ModalitiesInStudy", &filter.modalities_in_study),
    ];
    for (key, value) in text_filters {
        if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
            params.push((key, value.to_string()));
        }
    }

    params.push((
        "StudyDate",
        format!(
            "{}-{}",
            format_compact_date(filter.study_date_from),
            format_compact_date(filter.study_date_to)
        ),
    ));
    params.push((
        "includefield",
        format!("{TAG_STUDY_DESCRIPTION},{TAG_MODALITIES_IN_STUDY}"),
    ));
    params.push(("limit", filter.limit.to_string()));
    params.push(("offset", filter.offset.to_string()));
    params
}

fn parse_study_records(json: &str) -> Result<Vec<StudyRecord>> {
    let objects: Vec<Map<String, Value>> =
        serde_json::from_str(json).context("QIDO-RS response was not a DICOM JSON array")?;

    let mut records = Vec::with_capacity(objects.len());
    for object in &objects {
        let study_instance_uid = match first_tag_string(object, TAG_STUDY_INSTANCE_UID) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                log::debug!("Skipping QIDO-RS study without a StudyInstanceUID");
                continue;
            }
        };
        records.push(StudyRecord {
            study_instance_uid,
            patient_name: first_tag_string(object, TAG_PATIENT_NAME).unwrap_or_default(),
            patient_id: first_tag_string(object, TAG_PATIENT_ID),
            accession_number: first_tag_string(object, TAG_ACCESSION_NUMBER),
            study_date: first_tag_string(object, TAG_STUDY_DATE).unwrap_or_default(),
            study_time: first_tag_string(object, TAG_STUDY_TIME),
            study_description: first_tag_string(object, TAG_STUDY_DESCRIPTION),
            modalities: joined_tag_strings(object, TAG_MODALITIES_IN_STUDY),
            number_of_instances: first_tag_string(object, TAG_NUMBER_OF_STUDY_RELATED_INSTANCES)
                .and_then(|value| value.trim().parse::<u32>().ok()),
            extra: Default::default(),
        });
    }
    Ok(records)
}

fn tag_values<'a>(object: &'a Map<String, Value>, tag: &str) -> &'a [Value] {
    object
        .get(tag)
        .and_then(|element| element.get("Value"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        // Person names carry their components under Alphabetic/Ideographic/Phonetic.
        Value::Object(person_name) => person_name
            .get("Alphabetic")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn first_tag_string(object: &Map<String, Value>, tag: &str) -> Option<String> {
    tag_values(object, tag).first().and_then(value_to_string)
}

fn joined_tag_strings(object: &Map<String, Value>, tag: &str) -> Option<String> {
    let values = tag_values(object, tag)
        .iter()
        .filter_map(value_to_string)
        .collect::<Vec<_>>();
    if values.is_empty() {
        None
    } else {
        Some(values.join("\\"))
    }
}

fn http_get_text(
    client: &Client,
    url: &str,
    params: &[(&str, String)],
    auth: Option<(&str, &str)>,
) -> Result<Option<String>> {
    let mut request = client.get(url).header(ACCEPT, DICOM_JSON).query(params);
    if let Some((username, password)) = auth {
        request = request.basic_auth(username, Some(password));
    }

    let response = request
        .send()
        .with_context(|| format!("HTTP request failed for {url}"))?;
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    if !status.is_success() {
        let detail = response
            .text()
            .unwrap_or_else(|_| String::from("unable to read error body"));
        bail!("HTTP {status} for {url}: {detail}");
    }

    let body = response
        .text()
        .with_context(|| format!("Could not read response body from {url}"))?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(body))
}
