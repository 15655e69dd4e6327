use axum::extract::{Path, Query, State};
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::extract::decode;
use super::{ApiError, ApiJson, AppState, CurrentActor};
use crate::display::Outcome;
use crate::error::Error;
use crate::identity;
use crate::lifecycle::{Overview, RentalManager};
use crate::model::{Car, NewCar, NewUser, Rental, RentalForm, RentalId, User, UserId};

type ApiResult<T> = std::result::Result<T, ApiError>;

/// A rental plus the confirmation for the action that produced it.
#[derive(Debug, Serialize)]
pub struct RentalResponse {
    rental: Rental,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'static str>,
}

impl RentalResponse {
    fn plain(rental: Rental) -> Json<Self> {
        Json(Self {
            rental,
            notice: None,
        })
    }

    fn after(rental: Rental, outcome: Outcome) -> Json<Self> {
        Json(Self {
            rental,
            notice: Some(outcome.notice()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    limit: Option<usize>,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "carshare is serving"
    }))
}

pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .blocking(move |storage, _| identity::register(storage, form))
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn user_overview(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<Overview>> {
    let user = UserId(id);
    if actor.user_id != user {
        return Err(Error::authorization("view overview", "users can only see their own overview").into());
    }
    let overview = state
        .blocking(move |storage, policy| RentalManager::new(storage, policy).overview(user))
        .await?;
    Ok(Json(overview))
}

pub async fn list_cars(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Vec<Car>>> {
    let cars = state
        .blocking(move |storage, policy| RentalManager::new(storage, policy).cars_for(&actor))
        .await?;
    Ok(Json(cars))
}

pub async fn register_car(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(car): ApiJson<NewCar>,
) -> ApiResult<(StatusCode, Json<Car>)> {
    let car = state
        .blocking(move |storage, policy| {
            RentalManager::new(storage, policy).register_car(&actor, car)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(car)))
}

pub async fn browse_rentals(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> ApiResult<Json<Vec<Rental>>> {
    let limit = params
        .limit
        .map_or(state.page_size(), |limit| limit.min(state.page_size()));
    let rentals = state
        .blocking(move |storage, policy| RentalManager::new(storage, policy).browse(limit))
        .await?;
    Ok(Json(rentals))
}

pub async fn create_rental(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(form): ApiJson<RentalForm>,
) -> ApiResult<(StatusCode, Json<RentalResponse>)> {
    let rental = state
        .blocking(move |storage, policy| RentalManager::new(storage, policy).create(&actor, form))
        .await?;
    info!(rental = %rental.id, "Created rental via API");
    Ok((
        StatusCode::CREATED,
        RentalResponse::after(rental, Outcome::Created),
    ))
}

pub async fn show_rental(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RentalResponse>> {
    let rental = state
        .blocking(move |storage, policy| RentalManager::new(storage, policy).show(RentalId(id)))
        .await?;
    Ok(RentalResponse::plain(rental))
}

pub async fn update_rental(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<RentalResponse>> {
    // Decoded only after the rental is found and the actor may edit it.
    let rental = state
        .blocking(move |storage, policy| {
            RentalManager::new(storage, policy).update_with(RentalId(id), &actor, || decode(&body))
        })
        .await?;
    Ok(RentalResponse::after(rental, Outcome::Updated))
}

pub async fn reserve_rental(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<RentalResponse>> {
    let rental = state
        .blocking(move |storage, policy| {
            RentalManager::new(storage, policy).reserve(RentalId(id), &actor)
        })
        .await?;
    Ok(RentalResponse::after(rental, Outcome::Reserved))
}

pub async fn cancel_rental(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<RentalResponse>> {
    let rental = state
        .blocking(move |storage, policy| {
            RentalManager::new(storage, policy).cancel(RentalId(id), &actor)
        })
        .await?;
    Ok(RentalResponse::after(rental, Outcome::Canceled))
}

pub async fn delete_rental(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<RentalResponse>> {
    let rental = state
        .blocking(move |storage, policy| {
            RentalManager::new(storage, policy).delete(RentalId(id), &actor)
        })
        .await?;
    Ok(RentalResponse::after(rental, Outcome::Deleted))
}
