use crate::adapters::location::ReportedLocation;
use crate::adapters::KeyStatus;
use crate::core::locate::acquire_location;
use crate::core::workflow::discover_candidates;
use crate::core::{ConfigProvider, Geocoder, PlacesProvider, WorkflowSnapshot};
use crate::domain::model::{Coordinate, PlaceCandidate, SearchRadius, UserLocation};
use crate::server::AppState;
use crate::utils::error::{PickerError, Result};
use crate::utils::validation::bounded_radius;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_NEARBY_RADIUS_METERS: i64 = 5000;
const DEFAULT_PHOTO_WIDTH: u32 = 400;
const CARD_PHOTO_WIDTH: u32 = 800;

#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    photo_reference: Option<String>,
    maxwidth: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    restaurants: Vec<PlaceCandidate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    photo_url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    session_id: String,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    workflow: WorkflowSnapshot,
}

/// 瀏覽器回報的定位結果：座標或 geolocation 錯誤碼
#[derive(Debug, Deserialize)]
pub struct LocationReport {
    lat: Option<f64>,
    lng: Option<f64>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RadiusRequest {
    radius_km: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct PickRequest {
    #[serde(default)]
    radius_km: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickResponse {
    restaurant: PlaceCandidate,
    photo_url: Option<String>,
    maps_url: String,
    price_label: Option<String>,
    candidate_count: usize,
}

fn required_coordinate(lat: Option<f64>, lng: Option<f64>) -> Result<Coordinate> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
        _ => Err(PickerError::invalid_input(
            "location",
            "missing",
            "Latitude and longitude are required",
        )),
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn geocode(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<GeocodeResponse>> {
    let coordinate = required_coordinate(query.lat, query.lng)?;

    // 地址解析失敗仍回 200，以座標字串代替
    let response = match state.places.reverse_geocode(coordinate).await {
        Ok(address) => GeocodeResponse {
            address,
            error: None,
        },
        Err(e) => {
            tracing::warn!("Geocoding error: {}", e);
            GeocodeResponse {
                address: coordinate.label(),
                error: Some(e.to_string()),
            }
        }
    };
    Ok(Json(response))
}

/// `radius` 以公尺計，預設 5000；搜尋時四捨五入到整數公里，最少 1 公里，
/// 因此 300 公尺實際以 1000 公尺查詢
pub async fn nearby_restaurants(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>> {
    let coordinate = required_coordinate(query.lat, query.lng)?;
    let radius =
        SearchRadius::from_meters(query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_METERS))?;

    let restaurants = match discover_candidates(state.places.as_ref(), coordinate, radius).await {
        Ok(set) => set.candidates,
        Err(PickerError::NoCandidatesFound { .. }) => Vec::new(),
        Err(e) => return Err(e),
    };
    Ok(Json(NearbyResponse { restaurants }))
}

pub async fn restaurant_photo(
    State(state): State<AppState>,
    Query(query): Query<PhotoQuery>,
) -> Result<Json<PhotoResponse>> {
    let reference = query
        .photo_reference
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            PickerError::invalid_input("photo_reference", "missing", "Photo reference is required")
        })?;

    let photo_url = state
        .places
        .photo_url(&reference, query.maxwidth.unwrap_or(DEFAULT_PHOTO_WIDTH))
        .await?;
    Ok(Json(PhotoResponse { photo_url }))
}

pub async fn key_status(State(state): State<AppState>) -> Json<KeyStatus> {
    Json(state.places.key_status())
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let id = state.sessions.create();
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: id.to_string(),
        }),
    )
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let entry = state.sessions.get(&id)?;
    let workflow = entry.try_workflow()?;

    Ok(Json(SessionView {
        session_id: id,
        created_at: entry.created_at(),
        workflow: workflow.snapshot(),
    }))
}

pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.sessions.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn report_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(report): Json<LocationReport>,
) -> Result<Json<UserLocation>> {
    let entry = state.sessions.get(&id)?;
    let mut workflow = entry.try_workflow()?;

    let reported = match report.error_code {
        Some(code) => ReportedLocation::from_error_code(code),
        None => ReportedLocation::Position(required_coordinate(report.lat, report.lng)?),
    };

    match acquire_location(
        &reported,
        state.places.as_ref(),
        state.config.location_timeout(),
    )
    .await
    {
        Ok(location) => {
            workflow.set_location(location.clone());
            Ok(Json(location))
        }
        Err(e) => {
            workflow.record_failure(e.kind());
            Err(e)
        }
    }
}

pub async fn set_radius(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RadiusRequest>,
) -> Result<Json<WorkflowSnapshot>> {
    let radius = bounded_radius(request.radius_km, state.config.radius_bounds())?;

    let entry = state.sessions.get(&id)?;
    let mut workflow = entry.try_workflow()?;
    workflow.set_radius(radius);
    Ok(Json(workflow.snapshot()))
}

pub async fn pick(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PickRequest>,
) -> Result<Json<PickResponse>> {
    let entry = state.sessions.get(&id)?;
    let mut workflow = entry.try_workflow()?;

    if let Some(km) = request.radius_km {
        workflow.set_radius(bounded_radius(km, state.config.radius_bounds())?);
    }

    let restaurant = workflow.pick_restaurant().await?;
    let photo_url = workflow.resolve_photo(&restaurant, CARD_PHOTO_WIDTH).await;
    let candidate_count = workflow.candidates().map_or(0, |set| set.len());

    Ok(Json(pick_response(restaurant, photo_url, candidate_count)))
}

pub async fn pick_again(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PickResponse>> {
    let entry = state.sessions.get(&id)?;
    let mut workflow = entry.try_workflow()?;

    let restaurant = workflow.pick_again().await?;
    let photo_url = workflow.resolve_photo(&restaurant, CARD_PHOTO_WIDTH).await;
    let candidate_count = workflow.candidates().map_or(0, |set| set.len());

    Ok(Json(pick_response(restaurant, photo_url, candidate_count)))
}

fn pick_response(
    restaurant: PlaceCandidate,
    photo_url: Option<String>,
    candidate_count: usize,
) -> PickResponse {
    PickResponse {
        maps_url: restaurant.maps_url(),
        price_label: restaurant.price_label(),
        restaurant,
        photo_url,
        candidate_count,
    }
}
