//! Core types for paginated resource lists and booking slots

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field name to ordered human-readable messages, as returned by a rejected create/update
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The query a list controller fetches for
///
/// Any change to any field triggers exactly one new fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListQuery {
    /// Page number (1-based)
    pub page: u32,
    /// Free-text filter
    pub filter: String,
    /// Refresh counter, bumped to re-fetch without changing page or filter
    pub epoch: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            filter: String::new(),
            epoch: 0,
        }
    }
}

impl ListQuery {
    /// Same query on another page
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// New filter text; the page position is reset to the first page
    #[must_use]
    pub fn with_filter(&self, filter: impl Into<String>) -> Self {
        Self {
            page: 1,
            filter: filter.into(),
            epoch: self.epoch,
        }
    }

    /// Same page and filter with the next refresh epoch
    #[must_use]
    pub fn next_epoch(&self) -> Self {
        Self {
            epoch: self.epoch.wrapping_add(1),
            ..self.clone()
        }
    }
}

/// One entry of the pagination bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    /// Target page, `None` for non-navigable entries such as ellipses
    pub page: Option<u32>,
    /// Whether this entry represents the current page
    pub active: bool,
    /// Label to display
    pub label: String,
}

impl PageLink {
    /// Link for a concrete page number
    pub fn for_page(page: u32, active: bool) -> Self {
        Self {
            page: Some(page),
            active,
            label: page.to_string(),
        }
    }

    /// Whether clicking the link can change the page
    pub const fn is_navigable(&self) -> bool {
        self.page.is_some()
    }
}

/// One page of a filtered resource collection
///
/// `current_page <= last_page` always holds and `links` always contains an
/// entry for `current_page`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    /// Items on this page, in backend order
    pub items: Vec<T>,
    /// Current page (1-based)
    pub current_page: u32,
    /// Last available page
    pub last_page: u32,
    /// Pagination bar entries
    pub links: Vec<PageLink>,
}

impl<T> PageResult<T> {
    /// Build a page, restoring the page invariants if the input breaks them
    pub fn new(items: Vec<T>, current_page: u32, last_page: u32, mut links: Vec<PageLink>) -> Self {
        let last_page = last_page.max(1);
        let current_page = current_page.clamp(1, last_page);

        if !links.iter().any(|link| link.page == Some(current_page)) {
            links.push(PageLink::for_page(current_page, true));
        }

        Self {
            items,
            current_page,
            last_page,
            links,
        }
    }

    /// Empty first page, used before the first fetch and after a failed one
    pub fn empty() -> Self {
        Self::new(Vec::new(), 1, 1, Vec::new())
    }

    /// Whether `page` is a valid navigation target for this result
    pub const fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.last_page
    }
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A bookable time on one calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSlot {
    /// `HH:MM` label
    pub time: String,
    /// Whether the slot can still be booked
    pub available: bool,
}

/// The resource types the admin client manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Organisation repositories
    OrganisationRepo,
    /// Company repositories
    CompanyRepo,
    /// Booking appointments
    Booking,
}

impl ResourceKind {
    /// All kinds, in menu order
    pub const ALL: [Self; 3] = [Self::OrganisationRepo, Self::CompanyRepo, Self::Booking];

    const fn base_path(self) -> &'static str {
        match self {
            Self::OrganisationRepo => "/user/org_repository",
            Self::CompanyRepo => "/user/repository",
            Self::Booking => "/user/booking",
        }
    }

    /// Paginated list endpoint
    pub fn list_path(self) -> String {
        format!("{}/fetch", self.base_path())
    }

    /// Delete endpoint for one record
    pub fn delete_path(self, id: u64) -> String {
        format!("{}/delete/{id}", self.base_path())
    }

    /// Create endpoint
    pub fn create_path(self) -> String {
        match self {
            Self::OrganisationRepo | Self::CompanyRepo => {
                format!("{}/add_repository", self.base_path())
            }
            Self::Booking => format!("{}/create", self.base_path()),
        }
    }

    /// Update endpoint for one record, `None` when records of this kind are immutable
    pub fn update_path(self, id: u64) -> Option<String> {
        match self {
            Self::OrganisationRepo | Self::CompanyRepo => {
                Some(format!("{}/update/{id}", self.base_path()))
            }
            Self::Booking => None,
        }
    }

    /// Human-readable singular name
    pub const fn singular(self) -> &'static str {
        match self {
            Self::OrganisationRepo | Self::CompanyRepo => "Repository",
            Self::Booking => "Booking",
        }
    }

    /// Human-readable plural name, lowercase
    pub const fn plural(self) -> &'static str {
        match self {
            Self::OrganisationRepo => "organisation repositories",
            Self::CompanyRepo => "repositories",
            Self::Booking => "appointments",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OrganisationRepo => "org-repos",
            Self::CompanyRepo => "repos",
            Self::Booking => "bookings",
        };
        f.write_str(name)
    }
}

impl FromStr for ResourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "org-repos" | "org-repo" | "organisation" | "organisation-repos" => {
                Ok(Self::OrganisationRepo)
            }
            "repos" | "repo" | "company" | "company-repos" => Ok(Self::CompanyRepo),
            "bookings" | "booking" | "appointments" => Ok(Self::Booking),
            other => Err(crate::Error::invalid_input(format!(
                "unknown resource kind '{other}' (expected org-repos, repos or bookings)"
            ))),
        }
    }
}

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A record that can be listed and deleted
pub trait Record:
    DeserializeOwned + Serialize + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Which resource collection this record belongs to
    const KIND: ResourceKind;

    /// Backend identifier
    fn id(&self) -> u64;

    /// One-line description for listings
    fn summary(&self) -> String;
}

/// Organisation repository as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganisationRepo {
    /// Backend identifier
    pub id: u64,
    /// Repository name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Repository URL
    #[serde(default)]
    pub url: Option<String>,
    /// `public` or `private`
    #[serde(default)]
    pub visibility: Option<String>,
    /// Primary language
    #[serde(default)]
    pub language: Option<String>,
    /// License identifier
    #[serde(default)]
    pub license: Option<String>,
    /// Fork count
    #[serde(default)]
    pub forks_count: Option<u64>,
    /// Open issue count
    #[serde(default)]
    pub open_issues_count: Option<u64>,
    /// Watcher count
    #[serde(default)]
    pub watchers_count: Option<u64>,
    /// Default branch name
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl Record for OrganisationRepo {
    const KIND: ResourceKind = ResourceKind::OrganisationRepo;

    fn id(&self) -> u64 {
        self.id
    }

    fn summary(&self) -> String {
        format!(
            "{} ({}, {})",
            self.name,
            self.visibility.as_deref().unwrap_or("public"),
            self.language.as_deref().unwrap_or("N/A")
        )
    }
}

/// Company repository as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompanyRepo {
    /// Backend identifier
    pub id: u64,
    /// Repository name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Status label
    #[serde(default)]
    pub status: Option<String>,
    /// Star count, kept as sent by the backend
    #[serde(default)]
    pub no_of_stars: Option<serde_json::Value>,
}

impl Record for CompanyRepo {
    const KIND: ResourceKind = ResourceKind::CompanyRepo;

    fn id(&self) -> u64 {
        self.id
    }

    fn summary(&self) -> String {
        format!(
            "{} [{}]",
            self.name,
            self.status.as_deref().unwrap_or("N/A")
        )
    }
}

/// Booking appointment as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Booking {
    /// Backend identifier
    pub id: u64,
    /// Appointment title
    #[serde(default)]
    pub name: Option<String>,
    /// Name of the person who booked
    #[serde(default)]
    pub booker_name: Option<String>,
    /// Email of the person who booked
    #[serde(default)]
    pub booker_email: Option<String>,
    /// Start of the appointment as sent by the backend
    #[serde(default, rename = "startDateTime")]
    pub start_date_time: Option<String>,
}

impl Record for Booking {
    const KIND: ResourceKind = ResourceKind::Booking;

    fn id(&self) -> u64 {
        self.id
    }

    fn summary(&self) -> String {
        format!(
            "{} - {} <{}> at {}",
            self.name.as_deref().unwrap_or("N/A"),
            self.booker_name.as_deref().unwrap_or("N/A"),
            self.booker_email.as_deref().unwrap_or("N/A"),
            self.start_date_time.as_deref().unwrap_or("N/A")
        )
    }
}
