//! Storage configuration.
//!
//! Supplementary models are addressed by a free-form "kind" string. The two
//! conventional kinds, a section header and a section footer, are spelled
//! differently by list-style and grid-style hosts, so storages carry the pair
//! they should use in a [`SupplementaryKinds`] value.

/// Header kind used by list-style hosts.
pub const LIST_SECTION_HEADER_KIND: &str = "ListSectionHeader";
/// Footer kind used by list-style hosts.
pub const LIST_SECTION_FOOTER_KIND: &str = "ListSectionFooter";
/// Header kind used by grid-style hosts.
pub const GRID_SECTION_HEADER_KIND: &str = "GridElementKindSectionHeader";
/// Footer kind used by grid-style hosts.
pub const GRID_SECTION_FOOTER_KIND: &str = "GridElementKindSectionFooter";

/// The supplementary kinds a storage uses for headers and footers.
///
/// Both kinds are unset by default. Header and footer setters on a storage
/// without the matching kind log a warning and do nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SupplementaryKinds {
    /// Kind used for section headers.
    pub header: Option<String>,
    /// Kind used for section footers.
    pub footer: Option<String>,
}

impl SupplementaryKinds {
    /// Kinds for list-style hosts.
    pub fn list() -> Self {
        Self {
            header: Some(LIST_SECTION_HEADER_KIND.to_owned()),
            footer: Some(LIST_SECTION_FOOTER_KIND.to_owned()),
        }
    }

    /// Kinds for grid-style hosts.
    pub fn grid() -> Self {
        Self {
            header: Some(GRID_SECTION_HEADER_KIND.to_owned()),
            footer: Some(GRID_SECTION_FOOTER_KIND.to_owned()),
        }
    }

    /// Custom kinds.
    pub fn custom(header: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            footer: Some(footer.into()),
        }
    }
}

/// Construction-time options for a storage.
///
/// # Example
///
/// ```
/// use horizon_storage::{StorageConfig, SupplementaryKinds};
///
/// let config = StorageConfig::new()
///     .with_defers_datasource_updates(false)
///     .with_supplementary_kinds(SupplementaryKinds::list());
/// assert!(!config.defers_datasource_updates);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Whether mutations are applied through deferred datasource updates.
    ///
    /// When `true` (the default), a mutation only records changes and enqueues
    /// the datasource update; the storage content changes when the delivered
    /// update is replayed. When `false`, content changes immediately and the
    /// delivered update carries only records.
    pub defers_datasource_updates: bool,
    /// Header and footer kinds.
    pub supplementary_kinds: SupplementaryKinds,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            defers_datasource_updates: true,
            supplementary_kinds: SupplementaryKinds::default(),
        }
    }
}

impl StorageConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether datasource updates are deferred.
    pub fn with_defers_datasource_updates(mut self, defers: bool) -> Self {
        self.defers_datasource_updates = defers;
        self
    }

    /// Set the header and footer kinds.
    pub fn with_supplementary_kinds(mut self, kinds: SupplementaryKinds) -> Self {
        self.supplementary_kinds = kinds;
        self
    }
}
