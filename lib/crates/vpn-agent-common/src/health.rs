//! Health contract exposed by the agent and the file names it reads at start.

/// Path of the authenticated health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Request header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Port the agent listens on when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8443;

/// Environment file holding the agent settings, inside the configuration root.
pub const ENV_FILE: &str = ".env";

/// TLS private key, inside the configuration root.
pub const KEY_FILE: &str = "key.pem";

/// Self-signed TLS certificate, inside the configuration root.
pub const CERT_FILE: &str = "cert.pem";

/// Expected body marker of a healthy agent.
pub const HEALTHY_STATUS: &str = "healthy";
