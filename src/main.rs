use std::sync::Arc;

use category_recommender::{
    config::Config,
    create_router, db,
    services::{PgEventSource, ReportSettings},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("category_recommender=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    if config.run_migrations {
        db::run_migrations(&pool).await?;
    }

    let settings = ReportSettings {
        top_n: config.top_n,
        default_window_days: config.default_window_days,
    };
    let state = AppState::new(Arc::new(PgEventSource::new(pool)), settings);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        top_n = settings.top_n,
        "Category recommender listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
