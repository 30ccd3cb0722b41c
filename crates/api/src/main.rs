use anyhow::Context;

use coursemart_infra::LedgerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    coursemart_observability::init();

    let config = LedgerConfig::from_env().context("invalid configuration")?;
    let app = coursemart_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        ledger_id = %config.ledger_id,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
