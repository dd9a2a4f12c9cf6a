mod app;
mod auth;
mod cards;
mod config;
mod diseases;
mod error;
mod forum;
mod history;
mod media;
mod recipes;
mod reviews;
mod state;
mod storage;
mod tips;
mod users;
mod wishlist;

#[cfg(test)]
mod test_support;

use crate::state::AppState;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "masakio=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    app::serve(app::build_app(app_state)).await
}
