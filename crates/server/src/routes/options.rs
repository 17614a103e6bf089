//! Selector option lists.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use retail_hub_db::options::filter_options;
use retail_hub_db::OptionSource;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionList {
    pub source: String,
    pub values: Vec<String>,
}

/// GET /api/options/{source} - Distinct values, sorted, for one selector.
pub async fn get_options(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> ApiResult<Json<OptionList>> {
    let parsed: OptionSource = source.parse().map_err(ApiError::NotFound)?;
    let values = filter_options(&state.db, parsed).await?;
    Ok(Json(OptionList {
        source: parsed.slug().to_string(),
        values,
    }))
}

/// Create the option routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/options/{source}", get(get_options))
}
