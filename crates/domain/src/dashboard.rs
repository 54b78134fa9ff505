use chrono::{DateTime, Utc};
use dashsync_core::OrgId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DashboardError;

/// Reserved title of the implicit root folder.
pub const ROOT_FOLDER_NAME: &str = "General";

/// Folder name used for dashboards that live at the root.
pub const GENERAL_FOLDER_NAME: &str = ROOT_FOLDER_NAME;

/// Maximum length of a dashboard uid.
pub const UID_MAX_LENGTH: usize = 40;

/// Dashboard or folder together with its raw JSON model.
///
/// The structured `title` and `uid` are kept in sync with the `"title"` and `"uid"` keys of the
/// JSON payload by every setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    id: i64,
    uid: String,
    org_id: OrgId,
    title: String,
    slug: String,
    folder_id: i64,
    is_folder: bool,
    version: i64,
    plugin_id: String,
    updated: Option<DateTime<Utc>>,
    data: Value,
}

impl Dashboard {
    /// Creates a dashboard from its JSON model.
    ///
    /// `id`, `uid`, `title` and `version` are read from the payload; a payload that is not a JSON
    /// object is replaced by an empty object.
    #[must_use]
    pub fn from_json(org_id: OrgId, data: Value) -> Self {
        let data = match data {
            Value::Object(_) => data,
            _ => Value::Object(Map::new()),
        };

        let id = data.get("id").and_then(Value::as_i64).unwrap_or_default();
        let uid = data
            .get("uid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let title = data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let version = data
            .get("version")
            .and_then(Value::as_i64)
            .unwrap_or_default();

        Self {
            id,
            uid,
            org_id,
            slug: slugify(&title),
            title,
            folder_id: 0,
            is_folder: false,
            version,
            plugin_id: String::new(),
            updated: None,
            data,
        }
    }

    /// Places the dashboard inside a folder; `0` is the root.
    #[must_use]
    pub fn with_folder_id(mut self, folder_id: i64) -> Self {
        self.folder_id = folder_id;
        self
    }

    /// Marks the dashboard as a folder.
    #[must_use]
    pub fn as_folder(mut self) -> Self {
        self.is_folder = true;
        self
    }

    /// Records the plugin that ships the dashboard.
    #[must_use]
    pub fn with_plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = plugin_id.into();
        self
    }

    /// Returns the numeric id, `0` for unsaved dashboards.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the short uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        self.uid.as_str()
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the URL slug derived from the title.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the parent folder id, `0` for the root.
    #[must_use]
    pub fn folder_id(&self) -> i64 {
        self.folder_id
    }

    /// Returns whether this is a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.is_folder
    }

    /// Returns the version the caller based its edit on.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the plugin id, empty when not plugin-provided.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        self.plugin_id.as_str()
    }

    /// Returns the last persisted update time.
    #[must_use]
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    /// Returns the raw JSON model.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Sets the title, its slug and the payload `"title"`.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.slug = slugify(&self.title);
        self.set_data_field("title", Value::String(self.title.clone()));
    }

    /// Sets the uid and the payload `"uid"`.
    pub fn set_uid(&mut self, uid: impl Into<String>) {
        self.uid = uid.into();
        self.set_data_field("uid", Value::String(self.uid.clone()));
    }

    /// Sets the id and the payload `"id"`. Owned by persistence.
    pub fn set_id(&mut self, id: i64) {
        self.id = id;
        self.set_data_field("id", Value::from(id));
    }

    /// Sets the version and the payload `"version"`. Owned by persistence.
    pub fn set_version(&mut self, version: i64) {
        self.version = version;
        self.set_data_field("version", Value::from(version));
    }

    /// Sets the update timestamp. Owned by persistence.
    pub fn set_updated(&mut self, updated: DateTime<Utc>) {
        self.updated = Some(updated);
    }

    /// Trims title and uid in place, writing the trimmed title back into the payload.
    pub fn normalize(&mut self) {
        let title = self.title.trim().to_owned();
        self.set_title(title);
        let uid = self.uid.trim().to_owned();
        self.set_uid(uid);
    }

    /// Checks the title, folder and uid invariants in their fixed order.
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.title.is_empty() {
            return Err(DashboardError::TitleEmpty);
        }

        if self.is_folder && self.folder_id > 0 {
            return Err(DashboardError::FolderCannotHaveParent);
        }

        if self.is_folder && self.title.to_lowercase() == ROOT_FOLDER_NAME.to_lowercase() {
            return Err(DashboardError::FolderNameExists);
        }

        if !is_valid_short_uid(&self.uid) {
            return Err(DashboardError::InvalidUid);
        }

        if self.uid.len() > UID_MAX_LENGTH {
            return Err(DashboardError::UidTooLong);
        }

        Ok(())
    }

    /// Resource the save permission is checked against: the dashboard itself, or its folder while
    /// the dashboard is still unsaved.
    #[must_use]
    pub fn save_permission_target(&self) -> i64 {
        if self.id == 0 {
            self.folder_id
        } else {
            self.id
        }
    }

    fn set_data_field(&mut self, key: &str, value: Value) {
        if let Value::Object(map) = &mut self.data {
            map.insert(key.to_owned(), value);
        }
    }
}

/// Returns whether the uid only uses the short-id alphabet `[a-zA-Z0-9_-]`.
///
/// An empty uid is valid; persistence generates one.
#[must_use]
pub fn is_valid_short_uid(uid: &str) -> bool {
    uid.chars()
        .all(|character| character.is_ascii_alphanumeric() || character == '-' || character == '_')
}

/// Lower-case, dash-separated URL slug of a title.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for character in title.chars().flat_map(char::to_lowercase) {
        if character.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(character);
        } else {
            pending_dash = true;
        }
    }

    slug
}
