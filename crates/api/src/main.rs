use std::sync::Arc;

use anyhow::Context;

use oncologic_api::config::ApiConfig;
use oncologic_auth::{InMemoryDirectory, UserDirectory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    oncologic_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let directory: Arc<dyn UserDirectory> = match &config.directory_file {
        Some(path) => {
            let directory = InMemoryDirectory::from_json_file(path)?;
            tracing::info!(
                path = %path.display(),
                users = directory.len(),
                "user directory loaded"
            );
            Arc::new(directory)
        }
        None => {
            tracing::warn!("DIRECTORY_FILE not set; no user can log in");
            Arc::new(InMemoryDirectory::new())
        }
    };

    let app = oncologic_api::app::build_app(&config, directory).context("invalid access policy")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
