use colored::Colorize;
use log::{error, info};
use playsync_server::{run_server, ConfigError, ServerConfig};
use playsync_store::{AuthKeys, DatabaseError, HttpMediaStore, PgDatabase, PlaySync};
use thiserror::Error;

#[derive(Debug, Error)]
enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),
}

impl StartError {
    fn hint(&self) -> String {
        match self {
            StartError::Config(_) => {
                "Check the environment the server is started with. Every required variable is listed in the error above.".to_string()
            }
            StartError::Database(_) => {
                "This is a database error. Make sure the Postgres instance is running and DATABASE_URL points at it, then try again.".to_string()
            }
        }
    }
}

async fn start() -> Result<(), StartError> {
    let config = ServerConfig::from_env()?;

    info!("Connecting to database...");
    let database = PgDatabase::new(&config.database_url).await?;

    let media = HttpMediaStore::new(&config.media_url);

    let keys = AuthKeys {
        access_secret: config.access_token_secret.clone(),
        refresh_secret: config.refresh_token_secret.clone(),
    };

    let playsync = PlaySync::new(database, media, keys);

    info!("Initialized successfully.");
    run_server(playsync, config).await;

    Ok(())
}

#[tokio::main]
async fn main() {
    playsync_server::init_logger();

    if let Err(error) = start().await {
        error!(
            "{} Read the error below to troubleshoot the issue.",
            "PlaySync failed to start!".bold().red()
        );
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
    }
}
