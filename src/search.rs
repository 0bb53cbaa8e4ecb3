use anyhow::Result;
use serde::Deserialize;

use crate::filter::BackendFilter;
use crate::study::StudyRecord;

/// Where studies are searched. Handed to the search service untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ServerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            name: None,
            base_url: base_url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        self.username.as_deref().zip(self.password.as_deref())
    }
}

/// Backend that answers study searches.
///
/// `Ok(None)` means the backend had nothing to say and is shown as an empty list.
pub trait SearchService: Send + Sync + 'static {
    fn search_studies(
        &self,
        server: Option<&ServerConfig>,
        filter: &BackendFilter,
    ) -> Result<Option<Vec<StudyRecord>>>;
}

impl<F> SearchService for F
where
    F: Fn(Option<&ServerConfig>, &BackendFilter) -> Result<Option<Vec<StudyRecord>>>
        + Send
        + Sync
        + 'static,
{
    fn search_studies(
        &self,
        server: Option<&ServerConfig>,
        filter: &BackendFilter,
    ) -> Result<Option<Vec<StudyRecord>>> {
        self(server, filter)
    }
}

/// Destination of "open this study" requests from the list.
pub trait Navigator {
    fn navigate(&self, route: &str);
}

pub fn viewer_route(study_instance_uid: &str) -> String {
    format!("/viewer/{study_instance_uid}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_requires_both_parts() {
        let server = ServerConfig::new("http://localhost:8042/dicom-web");
        assert!(server.basic_auth().is_none());

        let mut half = server.clone();
        half.username = Some("viewer".to_string());
        assert!(half.basic_auth().is_none());

        let full = server.with_basic_auth("viewer", "secret");
        assert_eq!(full.basic_auth(), Some(("viewer", "secret")));
    }

    #[test]
    fn viewer_route_is_keyed_by_study_uid() {
        assert_eq!(viewer_route("1.2.840.1"), "/viewer/1.2.840.1");
    }
}
