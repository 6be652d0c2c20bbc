//! Configuration types.

/// Server configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Path of the SQLite database file.
    pub db_path: String,
}

impl ServerConfig {
    /// Read configuration from `TODO_API_*` environment variables,
    /// falling back to local-development defaults.
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("TODO_API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let db_path =
            std::env::var("TODO_API_DB_PATH").unwrap_or_else(|_| "./data/todos.db".to_string());

        Self {
            bind_addr: format!("0.0.0.0:{port}"),
            db_path,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            db_path: "./data/todos.db".to_string(),
        }
    }
}
