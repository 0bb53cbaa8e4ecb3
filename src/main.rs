mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use studylist::config::{load_config_or_default, settings_file_path};
use studylist::dicomweb::QidoSearchService;
use studylist::search::Navigator;
use studylist::study::StudyRecord;
use studylist::study_list::{ListStatus, ModalKind, StudyListController};

struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: &str) {
        println!("Open {route}");
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let request = match cli::parse_cli_args(&args) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("Argument error: {err}\n\n{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };
    if request.show_help {
        println!("{}", cli::USAGE);
        return ExitCode::SUCCESS;
    }

    match run(&request) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(request: &cli::CliRequest) -> Result<ExitCode> {
    let settings_path = request.settings_path.clone().or_else(settings_file_path);
    let mut config = load_config_or_default(settings_path.as_deref());
    request.apply_to_config(&mut config);

    let service = Arc::new(QidoSearchService::new()?);
    let mut list = StudyListController::new(config, service, Box::new(PrintNavigator));
    list.mount(&request.patch);
    list.wait();

    if list.modal() == ModalKind::StorePicker {
        eprintln!("No DICOMweb server selected.");
        eprintln!("Pass --server or add a [server] table to the settings file.");
        return Ok(ExitCode::FAILURE);
    }
    if list.status() == ListStatus::Error {
        eprintln!("Error: {}", list.error().unwrap_or_default());
        return Ok(ExitCode::FAILURE);
    }

    print_studies(list.studies());
    if let Some(study_instance_uid) = request.open_study.as_deref() {
        list.on_select_item(study_instance_uid);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_studies(studies: &[StudyRecord]) {
    if studies.is_empty() {
        println!("No studies found.");
        return;
    }

    println!(
        "{:<28} {:<16} {:<14} {:<12} {:<10} {:<30} STUDY UID",
        "PATIENT", "PATIENT ID", "STUDY DATE", "ACCESSION", "MODALITY", "DESCRIPTION"
    );
    for study in studies {
        println!(
            "{:<28} {:<16} {:<14} {:<12} {:<10} {:<30} {}",
            study.patient_name,
            study.patient_id.as_deref().unwrap_or("-"),
            study.study_date,
            study.accession_number.as_deref().unwrap_or("-"),
            study.modalities.as_deref().unwrap_or("-"),
            study.study_description.as_deref().unwrap_or("-"),
            study.study_instance_uid
        );
    }
}
