use serde::{Deserialize, Serialize};

/// User-facing texts attached to store failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreMessages {
    pub duplicate: String,
    pub not_found: String,
    pub add_failed: String,
    pub remove_failed: String,
    pub load_available_failed: String,
    pub load_user_failed: String,
}

impl Default for StoreMessages {
    fn default() -> Self {
        Self {
            duplicate: "This place is already in your favorite places.".to_string(),
            not_found: "This place is already removed from your favorite places.".to_string(),
            add_failed: "Failed to push this place to the user places.".to_string(),
            remove_failed: "Failed to remove this place from the user places.".to_string(),
            load_available_failed: "Could not get available places. Please try again later."
                .to_string(),
            load_user_failed: "Could not get your favorite places. Please try again later."
                .to_string(),
        }
    }
}
