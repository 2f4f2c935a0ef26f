pub mod health;
pub mod sacli;
pub mod settings;

pub use health::{
    API_KEY_HEADER, CERT_FILE, DEFAULT_PORT, ENV_FILE, HEALTH_PATH, HEALTHY_STATUS, KEY_FILE,
};
pub use sacli::{DEFAULT_SACLI_PATH, SacliCommand};
pub use settings::{AgentSettings, SettingsError};
