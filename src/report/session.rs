//! Interactive session state.
//!
//! The session owns the one active battery and its file binding explicitly,
//! instead of keeping them as process globals. Every operation takes the
//! session by reference; mutation is serialized through the single owner, so
//! aggregate statistics are never computed mid-mutation.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::errors::{NeuronormError, Result};
use crate::io::persistence;
use crate::report::battery::Battery;

/// The current battery plus the file path it is bound to, if any.
#[derive(Debug, Default)]
pub struct ReportSession {
    /// The one active battery; mutated only through this session.
    pub battery: Battery,
    path: Option<PathBuf>,
}

impl ReportSession {
    /// Start a session with a fresh, unnamed battery and no file binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// The file path the battery is bound to, set by `open` and `save_as`.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Discard the current battery for a fresh one and drop the file binding.
    pub fn reset(&mut self) {
        info!("starting new battery");
        self.battery = Battery::default();
        self.path = None;
    }

    /// Load a battery document and bind the session to its path.
    pub fn open(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.battery = persistence::load_battery(&path)?;
        self.path = Some(path);
        Ok(())
    }

    /// Save to the bound path. Errors if the session has never been bound;
    /// callers fall back to [`save_as`](Self::save_as).
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or_else(|| {
            NeuronormError::io(
                "no file bound to this session",
                std::io::Error::new(std::io::ErrorKind::NotFound, "no current file"),
            )
        })?;
        persistence::save_battery(path, &self.battery)
    }

    /// Save to `path` and rebind the session to it.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        persistence::save_battery(&path, &self.battery)?;
        self.path = Some(path);
        Ok(())
    }

    /// Persist the current battery as a template (patient data stripped).
    /// Does not rebind the session path.
    pub fn save_template(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_battery(path, &self.battery.template())
    }

    /// Load a battery document as a template: adopt its domains and battery
    /// name into the current session, leaving patient identity, notes, the
    /// premorbid estimate, and the file binding untouched.
    pub fn apply_template(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let template = persistence::load_battery(path.as_ref())?;
        info!(name = %template.name, "applying battery template");

        self.battery.adopt_structure(template);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::core::scales::NormScale;
    use crate::report::result::TestResult;

    fn add_sample(session: &mut ReportSession) {
        session.battery.add_test(
            TestResult::builder("JOLO (Full)", "Visuospatial Functioning")
                .scale(NormScale::T)
                .score(52.0)
                .build(),
        );
    }

    #[test]
    fn test_save_requires_binding() {
        let session = ReportSession::new();
        assert!(session.save().is_err());
    }

    #[test]
    fn test_save_as_binds_then_save_reuses_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = ReportSession::new();
        add_sample(&mut session);
        session.save_as(&path).unwrap();
        assert_eq!(session.path(), Some(path.as_path()));

        session.battery.notes = "updated".to_string();
        session.save().unwrap();

        let mut reopened = ReportSession::new();
        reopened.open(&path).unwrap();
        assert_eq!(reopened.battery.notes, "updated");
        assert_eq!(reopened.battery.test_count(), 1);
    }

    #[test]
    fn test_reset_discards_battery_and_binding() {
        let dir = tempdir().unwrap();
        let mut session = ReportSession::new();
        add_sample(&mut session);
        session.save_as(dir.path().join("b.json")).unwrap();

        session.reset();
        assert_eq!(session.battery.test_count(), 0);
        assert_eq!(session.path(), None);
    }

    #[test]
    fn test_template_round_trip_strips_patient_data() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("template.json");

        let mut source = ReportSession::new();
        source.battery.name = "Standard Dementia Battery".to_string();
        source.battery.patient_name = "Doe, Jane".to_string();
        add_sample(&mut source);
        source.save_template(&template_path).unwrap();

        let mut target = ReportSession::new();
        target.battery.patient_name = "Roe, Rachel".to_string();
        target.battery.notes = "existing note".to_string();
        target.apply_template(&template_path).unwrap();

        assert_eq!(target.battery.name, "Standard Dementia Battery");
        assert_eq!(target.battery.test_count(), 1);
        // patient identity and notes survive the template application
        assert_eq!(target.battery.patient_name, "Roe, Rachel");
        assert_eq!(target.battery.notes, "existing note");
        assert_eq!(target.path(), None);
    }

    #[test]
    fn test_apply_template_keeps_premorbid_estimate() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("template.json");

        let mut source = ReportSession::new();
        source.battery.name = "Standard Adult Battery".to_string();
        add_sample(&mut source);
        source.save_template(&template_path).unwrap();

        let mut target = ReportSession::new();
        target.battery.set_premorbid(110.0, NormScale::StandardScore);
        let derived = target.battery.premorbid_percentile();
        target.apply_template(&template_path).unwrap();

        assert_eq!(target.battery.name, "Standard Adult Battery");
        assert_eq!(target.battery.test_count(), 1);
        // the current battery's premorbid estimate is not part of the
        // template's structure and must survive application
        assert_eq!(target.battery.premorbid_score(), Some(110.0));
        assert_eq!(target.battery.premorbid_percentile(), derived);
    }
}
