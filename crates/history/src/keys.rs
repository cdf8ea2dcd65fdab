//! Storage keys. They match the browser app's localStorage key names.

pub const HISTORY_KEY: &str = "vin_diesel_history";
pub const USERS_KEY: &str = "vin_diesel_users";
pub const ACTIVE_USER_KEY: &str = "vin_diesel_active_user";
pub const THEME_KEY: &str = "vin_diesel_theme";
pub const RECENT_QUESTIONS_KEY: &str = "vin_diesel_recent_questions";
