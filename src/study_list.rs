use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};

use crate::config::StudyListConfig;
use crate::criteria::{search_criteria_with_window, CriteriaPatch, SearchCriteria, SortData};
use crate::filter::build_filter;
use crate::search::{viewer_route, Navigator, SearchService, ServerConfig};
use crate::shaper::normalize_and_sort;
use crate::study::StudyRecord;

pub type Clock = fn() -> DateTime<Utc>;

/// Which of the cloud store dialogs is open. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalKind {
    #[default]
    None,
    StorePicker,
    FilesUploader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Error,
    Ready,
}

/// Everything the list widget is handed besides its callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyListProps<'a> {
    pub studies: &'a [StudyRecord],
    pub page_size: u32,
    pub default_sort: SortData,
    pub date_filter_num_days: u64,
    pub study_list_functions_enabled: bool,
    pub show_cloud_store_controls: bool,
}

struct SearchOutcome {
    generation: u64,
    result: Result<Vec<StudyRecord>, String>,
}

/// Study list state: issues searches and publishes shaped results.
///
/// Every search gets the next generation number. A finished search is only
/// published if no newer search was issued in the meantime.
pub struct StudyListController {
    config: StudyListConfig,
    server: Option<ServerConfig>,
    service: Arc<dyn SearchService>,
    navigator: Box<dyn Navigator>,
    clock: Clock,
    criteria: Option<SearchCriteria>,
    studies: Option<Vec<StudyRecord>>,
    error: Option<String>,
    modal: ModalKind,
    generation: u64,
    search_receiver: Option<Receiver<SearchOutcome>>,
}

impl StudyListController {
    pub fn new(
        config: StudyListConfig,
        service: Arc<dyn SearchService>,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        let server = config.server.clone();
        Self {
            config,
            server,
            service,
            navigator,
            clock: Utc::now,
            criteria: None,
            studies: None,
            error: None,
            modal: ModalKind::None,
            generation: 0,
            search_receiver: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn default_criteria(&self) -> SearchCriteria {
        search_criteria_with_window(
            (self.clock)(),
            self.config.rows_per_page,
            self.config.date_filter_num_days,
        )
    }

    /// First activation. Without a server the cloud store picker is shown
    /// instead of searching, when the cloud adapter is enabled.
    pub fn mount(&mut self, initial: &CriteriaPatch) {
        if self.server.is_none() && self.config.enable_google_cloud_adapter {
            log::info!("No server selected; opening the DICOM store picker");
            self.modal = ModalKind::StorePicker;
            return;
        }
        let criteria = self.default_criteria().patched(initial);
        self.search(criteria);
    }

    pub fn set_server(&mut self, server: Option<ServerConfig>) {
        if self.server == server {
            return;
        }
        log::info!(
            "Study list server changed to {}",
            server
                .as_ref()
                .map(|server| server.base_url.as_str())
                .unwrap_or("<none>")
        );

        self.server = server;
        self.modal = ModalKind::None;
        self.criteria = None;
        self.studies = None;
        self.error = None;
        self.generation += 1;
        self.search_receiver = None;
        self.mount(&CriteriaPatch::default());
    }

    pub fn on_search(&mut self, criteria: SearchCriteria) {
        self.search(criteria);
    }

    pub fn on_select_item(&self, study_instance_uid: &str) {
        self.navigator.navigate(&viewer_route(study_instance_uid));
    }

    pub fn open_modal(&mut self, modal: ModalKind) {
        if modal != ModalKind::None && !self.config.enable_google_cloud_adapter {
            log::warn!("Ignoring {modal:?}: the cloud adapter is disabled");
            return;
        }
        self.modal = modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalKind::None;
    }

    pub fn search(&mut self, criteria: SearchCriteria) {
        self.generation += 1;
        let generation = self.generation;
        let filter = build_filter(&criteria);
        let sort = criteria.sort.clone();
        let server = self.server.clone();
        let service = Arc::clone(&self.service);
        log::debug!(
            "Study search {generation}: page {} ({} rows), sort {} {}",
            criteria.current_page,
            criteria.rows_per_page,
            sort.field,
            sort.order
        );

        self.criteria = Some(criteria);
        self.error = None;

        let (tx, rx) = mpsc::channel::<SearchOutcome>();
        thread::spawn(move || {
            let result = service
                .search_studies(server.as_ref(), &filter)
                .map(|studies| {
                    normalize_and_sort(studies.unwrap_or_default(), &sort.field, sort.order)
                })
                .map_err(|err| format!("{err:#}"));
            if tx.send(SearchOutcome { generation, result }).is_err() {
                log::debug!("Study search {generation} finished after being superseded");
            }
        });
        self.search_receiver = Some(rx);
    }

    /// Applies a finished search if there is one. Returns whether state changed.
    pub fn poll(&mut self) -> bool {
        let Some(receiver) = self.search_receiver.take() else {
            return false;
        };

        match receiver.try_recv() {
            Ok(outcome) => self.apply(outcome),
            Err(TryRecvError::Empty) => {
                self.search_receiver = Some(receiver);
                false
            }
            Err(TryRecvError::Disconnected) => {
                self.publish_error("Study search worker disconnected.".to_string());
                true
            }
        }
    }

    /// Blocks until the latest search has been published.
    pub fn wait(&mut self) {
        let Some(receiver) = self.search_receiver.take() else {
            return;
        };
        match receiver.recv() {
            Ok(outcome) => {
                self.apply(outcome);
            }
            Err(_) => self.publish_error("Study search worker disconnected.".to_string()),
        }
    }

    fn apply(&mut self, outcome: SearchOutcome) -> bool {
        if outcome.generation != self.generation {
            log::debug!(
                "Dropping stale study search {} (latest is {})",
                outcome.generation,
                self.generation
            );
            return false;
        }

        match outcome.result {
            Ok(studies) => {
                log::info!(
                    "Study search {} returned {} studies",
                    outcome.generation,
                    studies.len()
                );
                self.studies = Some(studies);
                self.error = None;
            }
            Err(err) => self.publish_error(err),
        }
        true
    }

    fn publish_error(&mut self, error: String) {
        log::warn!("Study search failed: {error}");
        self.studies = None;
        self.error = Some(error);
    }

    pub fn status(&self) -> ListStatus {
        if self.error.is_some() {
            ListStatus::Error
        } else if self.studies.is_none() && self.modal == ModalKind::None {
            ListStatus::Loading
        } else {
            ListStatus::Ready
        }
    }

    pub fn studies(&self) -> &[StudyRecord] {
        self.studies.as_deref().unwrap_or_default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_searching(&self) -> bool {
        self.search_receiver.is_some()
    }

    pub fn criteria(&self) -> Option<&SearchCriteria> {
        self.criteria.as_ref()
    }

    pub fn server(&self) -> Option<&ServerConfig> {
        self.server.as_ref()
    }

    pub fn modal(&self) -> ModalKind {
        self.modal
    }

    pub fn list_props(&self) -> StudyListProps<'_> {
        StudyListProps {
            studies: self.studies(),
            page_size: self.config.rows_per_page,
            default_sort: SortData::default(),
            date_filter_num_days: self.config.date_filter_num_days,
            study_list_functions_enabled: false,
            show_cloud_store_controls: self.config.enable_google_cloud_adapter,
        }
    }
}
