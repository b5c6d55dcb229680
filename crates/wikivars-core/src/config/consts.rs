//! Limits and names shared across the crate

/// Storage key limits
pub mod keys {
    /// Set names and variable names are cut to this many characters
    pub const MAX_KEY_CHARS: usize = 50;
}

/// File-backed store layout
pub mod store {
    /// Lock file guarding the store directory
    pub const LOCK_FILE: &str = "store.lock";

    /// Subdirectory holding one JSON record per page
    pub const PAGES_DIR: &str = "pages";

    /// Extension of page record files
    pub const RECORD_EXT: &str = "json";
}

/// Render side-channel keys
pub mod stash {
    /// Key of the in-progress set collection
    pub const SAVED_SETS: &str = "wikivars-saved-sets";
}
