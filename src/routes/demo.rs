use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::demo::seed_demo_products;
use crate::models::{AppState, DemoSetupResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/setup-demo", post(setup_demo))
        .with_state(state)
}

async fn setup_demo(State(state): State<AppState>) -> Json<DemoSetupResponse> {
    info!("Demo setup requested");
    Json(seed_demo_products(&state).await)
}
