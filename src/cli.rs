use std::path::PathBuf;

use studylist::config::StudyListConfig;
use studylist::criteria::{CriteriaPatch, SortOrder};
use studylist::display_date::parse_compact_date;
use studylist::search::ServerConfig;
use studylist::study::StudyField;

pub const USAGE: &str = "\
Usage: studylist [options]

  --server URL            DICOMweb base URL (root URLs get /dicom-web appended)
  --user NAME             basic auth user (requires --password)
  --password SECRET       basic auth password (requires --user)
  --patient-id ID
  --patient-name NAME
  --accession NUMBER
  --description TEXT
  --modalities LIST
  --from YYYYMMDD         first study date
  --to YYYYMMDD           last study date
  --page N                zero-based page
  --rows N                rows per page
  --sort FIELD[:ORDER]    e.g. studyDate:desc
  --open UID              open a study from the list
  --cloud-adapter         enable the cloud DICOM store dialogs
  --settings PATH         settings file (default: per-user settings.toml)
  -h, --help";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliRequest {
    pub settings_path: Option<PathBuf>,
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub enable_cloud_adapter: bool,
    pub patch: CriteriaPatch,
    pub open_study: Option<String>,
    pub show_help: bool,
}

impl CliRequest {
    /// Command-line values take precedence over the settings file.
    pub fn apply_to_config(&self, config: &mut StudyListConfig) {
        if self.enable_cloud_adapter {
            config.enable_google_cloud_adapter = true;
        }
        if let Some(rows) = self.patch.rows_per_page {
            config.rows_per_page = rows;
        }
        if let Some(url) = &self.server_url {
            let mut server = ServerConfig::new(url.clone());
            if let (Some(user), Some(password)) = (&self.username, &self.password) {
                server = server.with_basic_auth(user.clone(), password.clone());
            }
            config.server = Some(server);
        } else if let (Some(server), Some(user), Some(password)) =
            (config.server.as_mut(), &self.username, &self.password)
        {
            server.username = Some(user.clone());
            server.password = Some(password.clone());
        }
    }
}

pub fn parse_cli_args(args: &[String]) -> Result<CliRequest, String> {
    let mut request = CliRequest::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let (flag, inline_value) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };

        match flag {
            "-h" | "--help" => request.show_help = true,
            "--cloud-adapter" => request.enable_cloud_adapter = true,
            "--server" | "--user" | "--password" | "--patient-id" | "--patient-name"
            | "--accession" | "--description" | "--modalities" | "--from" | "--to" | "--page"
            | "--rows" | "--sort" | "--open" | "--settings" => {
                let value = match inline_value {
                    Some(value) => value,
                    None => iter
                        .next()
                        .cloned()
                        .ok_or_else(|| format!("Missing value after {flag}."))?,
                };
                apply_flag(&mut request, flag, value)?;
            }
            other => return Err(format!("Unknown argument '{other}'.")),
        }
    }

    if request.username.is_some() != request.password.is_some() {
        return Err("Basic auth requires both user and password.".to_string());
    }
    if let (Some(from), Some(to)) = (request.patch.study_date_from, request.patch.study_date_to) {
        if from > to {
            log::warn!("Study date range is inverted ({from} > {to}); searching as given");
        }
    }
    Ok(request)
}

fn apply_flag(request: &mut CliRequest, flag: &str, value: String) -> Result<(), String> {
    let patch = &mut request.patch;
    match flag {
        "--server" => {
            if value.trim().is_empty() {
                return Err("--server requires a URL.".to_string());
            }
            request.server_url = Some(value);
        }
        "--user" => request.username = Some(value),
        "--password" => request.password = Some(value),
        "--patient-id" => patch.patient_id = Some(value),
        "--patient-name" => patch.patient_name = Some(value),
        "--accession" => patch.accession_number = Some(value),
        "--description" => patch.study_description = Some(value),
        "--modalities" => patch.modalities = Some(value),
        "--from" => patch.study_date_from = Some(parse_date_arg(flag, &value)?),
        "--to" => patch.study_date_to = Some(parse_date_arg(flag, &value)?),
        "--page" => patch.current_page = Some(parse_count_arg(flag, &value)?),
        "--rows" => {
            let rows = parse_count_arg(flag, &value)?;
            if rows == 0 {
                return Err("--rows must be greater than zero.".to_string());
            }
            patch.rows_per_page = Some(rows);
        }
        "--sort" => {
            let (field, order) = match value.split_once(':') {
                Some((field, order)) => (field, Some(SortOrder::parse(order)?)),
                None => (value.as_str(), None),
            };
            if field.trim().is_empty() {
                return Err("--sort requires a field name.".to_string());
            }
            patch.sort_field = Some(StudyField::parse(field.trim()));
            if order.is_some() {
                patch.sort_order = order;
            }
        }
        "--open" => request.open_study = Some(value),
        "--settings" => request.settings_path = Some(PathBuf::from(value)),
        _ => return Err(format!("Unknown argument '{flag}'.")),
    }
    Ok(())
}

fn parse_date_arg(flag: &str, value: &str) -> Result<chrono::NaiveDate, String> {
    parse_compact_date(value)
        .ok_or_else(|| format!("{flag} expects a date as YYYYMMDD, got '{value}'."))
}

fn parse_count_arg(flag: &str, value: &str) -> Result<u32, String> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("{flag} expects a non-negative integer, got '{value}'."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn empty_args_give_default_request() {
        let request = parse_cli_args(&[]).expect("args should parse");
        assert_eq!(request, CliRequest::default());
    }

    #[test]
    fn parse_filters_paging_and_sort() {
        let request = parse_cli_args(&args(&[
            "--server",
            "http://localhost:8042",
            "--patient-name=DOE*",
            "--modalities",
            "MG",
            "--from",
            "20190101",
            "--to=20201231",
            "--page",
            "2",
            "--rows",
            "25",
            "--sort",
            "studyDate:asc",
        ]))
        .expect("args should parse");

        assert_eq!(request.server_url.as_deref(), Some("http://localhost:8042"));
        assert_eq!(request.patch.patient_name.as_deref(), Some("DOE*"));
        assert_eq!(request.patch.modalities.as_deref(), Some("MG"));
        assert_eq!(
            request.patch.study_date_from,
            NaiveDate::from_ymd_opt(2019, 1, 1)
        );
        assert_eq!(
            request.patch.study_date_to,
            NaiveDate::from_ymd_opt(2020, 12, 31)
        );
        assert_eq!(request.patch.current_page, Some(2));
        assert_eq!(request.patch.rows_per_page, Some(25));
        assert_eq!(request.patch.sort_field, Some(StudyField::StudyDate));
        assert_eq!(request.patch.sort_order, Some(SortOrder::Asc));
    }

    #[test]
    fn sort_without_order_keeps_default_order() {
        let request =
            parse_cli_args(&args(&["--sort", "accessionNumber"])).expect("args should parse");
        assert_eq!(request.patch.sort_field, Some(StudyField::AccessionNumber));
        assert_eq!(request.patch.sort_order, None);
    }

    #[test]
    fn auth_requires_user_and_password() {
        let error = parse_cli_args(&args(&["--server", "http://pacs", "--user", "viewer"]))
            .expect_err("args should fail");
        assert!(error.contains("both user and password"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let error = parse_cli_args(&args(&["--from", "2020-13-01"])).expect_err("args should fail");
        assert!(error.contains("YYYYMMDD"));

        let error = parse_cli_args(&args(&["--page", "-1"])).expect_err("args should fail");
        assert!(error.contains("non-negative integer"));

        let error = parse_cli_args(&args(&["--rows", "0"])).expect_err("args should fail");
        assert!(error.contains("greater than zero"));

        let error =
            parse_cli_args(&args(&["--sort", "studyDate:up"])).expect_err("args should fail");
        assert!(error.contains("expected asc or desc"));

        let error = parse_cli_args(&args(&["--bogus"])).expect_err("args should fail");
        assert!(error.contains("Unknown argument"));

        let error = parse_cli_args(&args(&["--server"])).expect_err("args should fail");
        assert!(error.contains("Missing value after --server"));
    }

    #[test]
    fn cli_overrides_settings() {
        let request = parse_cli_args(&args(&[
            "--server",
            "http://pacs/dicom-web",
            "--user",
            "viewer",
            "--password",
            "secret",
            "--rows",
            "10",
            "--cloud-adapter",
        ]))
        .expect("args should parse");

        let mut config = StudyListConfig::default();
        request.apply_to_config(&mut config);
        assert!(config.enable_google_cloud_adapter);
        assert_eq!(config.rows_per_page, 10);
        let server = config.server.expect("server should be set");
        assert_eq!(server.base_url, "http://pacs/dicom-web");
        assert_eq!(server.basic_auth(), Some(("viewer", "secret")));
    }

    #[test]
    fn credentials_apply_to_configured_server() {
        let request = parse_cli_args(&args(&["--user", "viewer", "--password", "secret"]))
            .expect("args should parse");
        let mut config = StudyListConfig {
            server: Some(ServerConfig::new("http://from-settings/dicom-web")),
            ..StudyListConfig::default()
        };
        request.apply_to_config(&mut config);
        let server = config.server.expect("server should be set");
        assert_eq!(server.base_url, "http://from-settings/dicom-web");
        assert_eq!(server.basic_auth(), Some(("viewer", "secret")));
    }
}
