use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// Connection settings for the Postgres sink.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid
/// accidentally leaking the password into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct PgConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Database name.
    pub name: String,
    pub username: String,
    pub password: Option<SecretString>,
}

impl PgConnectionConfig {
    /// Builds sqlx connect options for the configured database.
    pub fn with_db(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.name)
            .ssl_mode(PgSslMode::Prefer);

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }
}
