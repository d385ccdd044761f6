//! Form drafts for creating and editing records
//!
//! Every draft is updated through [`Draft::set_field`], addressing fields by
//! their wire name so one code path handles every input control.

use crate::types::{CompanyRepo, OrganisationRepo, ResourceKind};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A form body that can be edited field by field and sent to the backend
pub trait Draft: Serialize + Default + Clone + fmt::Debug + Send + Sync {
    /// Replace one field by wire name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for names the draft does not have and
    /// [`Error::Validation`] when the text cannot be stored in the field.
    fn set_field(&mut self, name: &str, value: &str) -> Result<()>;

    /// JSON body for create/update requests
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_body(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A draft for a record that a plain create/edit form may send as-is
///
/// Bookings are not record drafts: their time must be checked against the
/// slots of the chosen date before anything is sent.
pub trait RecordDraft: Draft {
    /// Resource collection the draft is sent to
    const KIND: ResourceKind;
}

fn unknown(name: &str) -> Error {
    Error::UnknownField {
        field: name.to_string(),
    }
}

fn parse_count(name: &str, value: &str) -> Result<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse()
        .map_err(|_| Error::validation(name, format!("expected a whole number, got '{value}'")))
}

/// Repository visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone
    #[default]
    Public,
    /// Visible to members only
    Private,
}

impl Visibility {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            _ => Err(Error::validation(
                "visibility",
                format!("expected public or private, got '{value}'"),
            )),
        }
    }
}

/// Create/edit body for organisation repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationRepoDraft {
    /// Repository name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Repository URL
    pub github_repo_url: String,
    /// Public or private
    pub visibility: Visibility,
    /// Primary language
    pub language: String,
    /// License identifier
    pub license: String,
    /// Fork count
    pub forks_count: u64,
    /// Open issue count
    pub open_issues_count: u64,
    /// Watcher count
    pub watchers_count: u64,
    /// Default branch name
    pub default_branch: String,
    /// Comma-separated topics
    pub topics: String,
}

impl Default for OrganisationRepoDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            github_repo_url: String::new(),
            visibility: Visibility::Public,
            language: String::new(),
            license: String::new(),
            forks_count: 0,
            open_issues_count: 0,
            watchers_count: 0,
            default_branch: "main".to_string(),
            topics: String::new(),
        }
    }
}

impl Draft for OrganisationRepoDraft {
    fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "name" => self.name = value.to_string(),
            "description" => self.description = value.to_string(),
            "github_repo_url" => self.github_repo_url = value.to_string(),
            "visibility" => self.visibility = Visibility::parse(value)?,
            "language" => self.language = value.to_string(),
            "license" => self.license = value.to_string(),
            "forks_count" => self.forks_count = parse_count(name, value)?,
            "open_issues_count" => self.open_issues_count = parse_count(name, value)?,
            "watchers_count" => self.watchers_count = parse_count(name, value)?,
            "default_branch" => self.default_branch = value.to_string(),
            "topics" => self.topics = value.to_string(),
            _ => return Err(unknown(name)),
        }
        Ok(())
    }
}

impl RecordDraft for OrganisationRepoDraft {
    const KIND: ResourceKind = ResourceKind::OrganisationRepo;
}

impl From<&OrganisationRepo> for OrganisationRepoDraft {
    fn from(repo: &OrganisationRepo) -> Self {
        let defaults = Self::default();
        Self {
            name: repo.name.clone(),
            description: repo.description.clone().unwrap_or_default(),
            github_repo_url: repo.url.clone().unwrap_or_default(),
            visibility: repo
                .visibility
                .as_deref()
                .and_then(|v| Visibility::parse(v).ok())
                .unwrap_or_default(),
            language: repo.language.clone().unwrap_or_default(),
            license: repo.license.clone().unwrap_or_default(),
            forks_count: repo.forks_count.unwrap_or_default(),
            open_issues_count: repo.open_issues_count.unwrap_or_default(),
            watchers_count: repo.watchers_count.unwrap_or_default(),
            default_branch: repo
                .default_branch
                .clone()
                .filter(|b| !b.is_empty())
                .unwrap_or(defaults.default_branch),
            topics: defaults.topics,
        }
    }
}

/// Create/edit body for company repositories
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompanyRepoDraft {
    /// Repository name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Status label
    pub status: String,
    /// Star count as typed
    pub no_of_stars: String,
}

impl Draft for CompanyRepoDraft {
    fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "name" => self.name = value.to_string(),
            "description" => self.description = value.to_string(),
            "status" => self.status = value.to_string(),
            "no_of_stars" => self.no_of_stars = value.to_string(),
            _ => return Err(unknown(name)),
        }
        Ok(())
    }
}

impl RecordDraft for CompanyRepoDraft {
    const KIND: ResourceKind = ResourceKind::CompanyRepo;
}

impl From<&CompanyRepo> for CompanyRepoDraft {
    fn from(repo: &CompanyRepo) -> Self {
        let stars = match &repo.no_of_stars {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            name: repo.name.clone(),
            description: repo.description.clone().unwrap_or_default(),
            status: repo.status.clone().unwrap_or_default(),
            no_of_stars: stars,
        }
    }
}

/// Create body for booking appointments
///
/// `meeting_time` is only meaningful together with `meeting_date`: slot
/// identity is date-scoped, so changing the date clears the time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookingDraft {
    /// Reason or details of the appointment
    pub appointment_for: String,
    /// Calendar date of the meeting
    pub meeting_date: Option<NaiveDate>,
    /// `HH:MM` slot label, empty until a slot is chosen
    pub meeting_time: String,
    /// Name of the person booking
    pub booker_name: String,
    /// Email of the person booking
    pub booker_email: String,
}

impl BookingDraft {
    /// Set the date; returns whether it actually changed. The time is always cleared.
    pub fn set_meeting_date(&mut self, date: Option<NaiveDate>) -> bool {
        let changed = self.meeting_date != date;
        self.meeting_date = date;
        self.meeting_time.clear();
        changed
    }
}

/// Parse an ISO `YYYY-MM-DD` date, treating blank input as unset
///
/// # Errors
///
/// Returns a validation error for text that is not a calendar date.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| Error::validation("meeting_date", format!("'{value}' is not a date: {e}")))
}

impl Draft for BookingDraft {
    fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "appointment_for" => self.appointment_for = value.to_string(),
            "meeting_date" => {
                self.set_meeting_date(parse_date(value)?);
            }
            "meeting_time" => self.meeting_time = value.trim().to_string(),
            "booker_name" => self.booker_name = value.to_string(),
            "booker_email" => self.booker_email = value.to_string(),
            _ => return Err(unknown(name)),
        }
        Ok(())
    }
}
