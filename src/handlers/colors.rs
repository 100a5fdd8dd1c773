use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{Color, ColorsListResponse, CreateColorRequest, UpdateColorRequest};

#[derive(Deserialize)]
pub struct ColorsQuery {
    pub page: Option<i64>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<i64>,
    pub search: Option<String>,
}

pub async fn list_colors(
    State(color_service): State<crate::AppState>,
    Query(params): Query<ColorsQuery>,
) -> AppResult<Json<ColorsListResponse>> {
    let response = color_service
        .list_colors(params.page, params.page_size, params.search)
        .await?;

    Ok(Json(response))
}

pub async fn list_all_colors(
    State(color_service): State<crate::AppState>,
) -> AppResult<Json<Vec<Color>>> {
    let colors = color_service.list_all_colors().await?;
    Ok(Json(colors))
}

pub async fn get_color(
    State(color_service): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Color>> {
    let color = color_service.get_color(id).await?;
    Ok(Json(color))
}

pub async fn get_color_by_name(
    State(color_service): State<crate::AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Color>> {
    let color = color_service.get_color_by_name(&name).await?;
    Ok(Json(color))
}

pub async fn create_color(
    State(color_service): State<crate::AppState>,
    Json(req): Json<CreateColorRequest>,
) -> AppResult<(StatusCode, Json<Color>)> {
    let color = color_service.create_color(req).await?;
    Ok((StatusCode::CREATED, Json(color)))
}

pub async fn update_color(
    State(color_service): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateColorRequest>,
) -> AppResult<Json<Color>> {
    let color = color_service.update_color(id, req).await?;
    Ok(Json(color))
}

pub async fn delete_color(
    State(color_service): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Color>> {
    let color = color_service.delete_color(id).await?;
    Ok(Json(color))
}
