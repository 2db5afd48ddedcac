use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::db_storage::{AdsStorage, EntityKind, RecordPatch};
use crate::errors::{AppError, ResultExt, ValidationError, ValidationReason};
use crate::graph_client::GraphClient;
use crate::models::*;
use crate::normalizer::{
    self, NormalizedAd, NormalizedAdSet, NormalizedCampaign,
};

/// Header naming the account that owns the campaign hierarchy.
pub const OWNER_HEADER: &str = "x-user-id";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Campaign / ad set / ad persistence.
    pub storage: AdsStorage,
    /// Facebook Graph API client.
    pub graph: GraphClient,
    /// Synced ad sets by `owner:id`. Unsynced records are never cached so a
    /// later sync is picked up on the next lookup.
    pub adset_cache: Cache<String, AdSetRecord>,
}

/// Normalized body plus the Graph path it would be posted to.
#[derive(Debug, Serialize)]
pub struct NormalizedPreview<T> {
    pub path: String,
    pub body: T,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    /// `archive` (default) or `delete`.
    pub mode: Option<String>,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-fb-ads-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

fn owner_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", OWNER_HEADER)))
}

/// Context for a local insert that follows a successful Graph create, so the
/// remote object can be reconciled if the insert fails.
fn remote_created_context(kind: EntityKind, facebook_id: &str) -> String {
    format!(
        "storing {} already created on Facebook as {}",
        kind.label(),
        facebook_id
    )
}

fn adset_cache_key(owner_id: &str, adset_id: &str) -> String {
    format!("{}:{}", owner_id, adset_id)
}

/// Looks up an ad set, serving synced records from cache.
async fn load_adset(
    state: &AppState,
    owner_id: &str,
    adset_id: &str,
) -> Result<Option<AdSetRecord>, AppError> {
    let key = adset_cache_key(owner_id, adset_id);
    if let Some(cached) = state.adset_cache.get(&key).await {
        tracing::debug!("Ad set cache hit: {}", adset_id);
        return Ok(Some(cached));
    }

    let record = state.storage.find_adset(owner_id, adset_id).await?;
    if let Some(record) = &record {
        if record.facebook_adset_id.is_some() {
            state.adset_cache.insert(key, record.clone()).await;
        }
    }
    Ok(record)
}

/// Resolves the ad set's `campaignId` (internal) to the campaign record and
/// rewrites the request to carry the Facebook campaign id.
async fn resolve_campaign(
    state: &AppState,
    owner_id: &str,
    mut request: AdSetRequest,
) -> Result<(CampaignRecord, AdSetRequest), AppError> {
    let internal_id = match request.campaign_id.as_ref().filter(|c| !c.is_blank()) {
        Some(NumericInput::Text(id)) => id.trim().to_string(),
        Some(NumericInput::Number(id)) => id.to_string(),
        None => return Err(ValidationError::missing("campaignId").into()),
    };

    let campaign = state
        .storage
        .find_campaign(owner_id, &internal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("campaign {}", internal_id)))?;

    let facebook_campaign_id = campaign.facebook_campaign_id.clone().ok_or_else(|| {
        ValidationError::new("campaignId", ValidationReason::UnsyncedParent)
    })?;

    request.campaign_id = Some(NumericInput::Text(facebook_campaign_id));
    Ok((campaign, request))
}

async fn resolve_adset_for_ad(
    state: &AppState,
    owner_id: &str,
    request: &AdRequest,
) -> Result<Option<AdSetRecord>, AppError> {
    match request
        .adset_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        Some(id) => load_adset(state, owner_id, id).await,
        None => Ok(None),
    }
}

// ============================================================================
// Dry-run normalization
// ============================================================================

/// POST /api/v1/normalize/campaign
pub async fn normalize_campaign(
    Json(request): Json<CampaignRequest>,
) -> Result<Json<NormalizedPreview<NormalizedCampaign>>, AppError> {
    let body = normalizer::validate_and_normalize_campaign(&request)?;
    Ok(Json(NormalizedPreview {
        path: format!("{}/campaigns", body.ad_account_id),
        body,
    }))
}

/// POST /api/v1/normalize/adset
pub async fn normalize_adset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AdSetRequest>,
) -> Result<Json<NormalizedPreview<NormalizedAdSet>>, AppError> {
    let owner = owner_id(&headers)?;
    let (campaign, request) = resolve_campaign(&state, &owner, request).await?;
    let body = normalizer::validate_and_normalize_adset(&request)?;
    Ok(Json(NormalizedPreview {
        path: format!("{}/adsets", campaign.facebook_ad_account_id),
        body,
    }))
}

/// POST /api/v1/normalize/ad
pub async fn normalize_ad(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AdRequest>,
) -> Result<Json<NormalizedPreview<NormalizedAd>>, AppError> {
    let owner = owner_id(&headers)?;
    let adset = resolve_adset_for_ad(&state, &owner, &request).await?;
    let body = normalizer::validate_and_normalize_ad(&request, adset.as_ref())?;
    let account = adset
        .map(|a| a.facebook_ad_account_id)
        .unwrap_or_default();
    Ok(Json(NormalizedPreview {
        path: format!("{}/ads", account),
        body,
    }))
}

// ============================================================================
// Creation
// ============================================================================

/// POST /api/v1/campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CampaignRequest>,
) -> Result<(StatusCode, Json<CreatedEntityResponse>), AppError> {
    let owner = owner_id(&headers)?;
    let campaign = normalizer::validate_and_normalize_campaign(&request)?;
    tracing::info!(
        "Creating campaign '{}' in {} for {}",
        campaign.name,
        campaign.ad_account_id,
        owner
    );

    let facebook_id = state.graph.create_campaign(&campaign).await?;
    let record = state
        .storage
        .insert_campaign(&owner, &campaign, &facebook_id)
        .await
        .with_context(|| remote_created_context(EntityKind::Campaign, &facebook_id))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedEntityResponse {
            id: record.id,
            facebook_id,
            status: campaign.status,
        }),
    ))
}

/// POST /api/v1/adsets
///
/// `campaignId` in the body is the internal campaign id.
pub async fn create_adset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AdSetRequest>,
) -> Result<(StatusCode, Json<CreatedEntityResponse>), AppError> {
    let owner = owner_id(&headers)?;
    let (campaign, request) = resolve_campaign(&state, &owner, request).await?;
    let adset = normalizer::validate_and_normalize_adset(&request)?;
    tracing::info!(
        "Creating ad set '{}' under campaign {} ({})",
        adset.name,
        campaign.id,
        adset.campaign_id
    );

    let facebook_id = state
        .graph
        .create_adset(&campaign.facebook_ad_account_id, &adset)
        .await?;
    let record = state
        .storage
        .insert_adset(&owner, &campaign.id, &adset, &facebook_id)
        .await
        .with_context(|| remote_created_context(EntityKind::AdSet, &facebook_id))?;

    state
        .adset_cache
        .insert(adset_cache_key(&owner, &record.id), record.clone())
        .await;

    Ok((
        StatusCode::CREATED,
        Json(CreatedEntityResponse {
            id: record.id,
            facebook_id,
            status: adset.status,
        }),
    ))
}

/// POST /api/v1/ads
pub async fn create_ad(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AdRequest>,
) -> Result<(StatusCode, Json<CreatedEntityResponse>), AppError> {
    let owner = owner_id(&headers)?;
    let adset = resolve_adset_for_ad(&state, &owner, &request).await?;
    let ad = normalizer::validate_and_normalize_ad(&request, adset.as_ref())?;

    // validate_and_normalize_ad only succeeds with a resolved ad set
    let adset = adset.ok_or_else(|| {
        AppError::InternalError("ad normalized without a resolved ad set".to_string())
    })?;
    tracing::info!(
        "Creating ad '{}' in ad set {} ({})",
        ad.name,
        adset.id,
        ad.adset_id
    );

    let facebook_id = state
        .graph
        .create_ad(&adset.facebook_ad_account_id, &ad)
        .await?;
    let record = state
        .storage
        .insert_ad(&owner, &adset.id, &ad, &facebook_id)
        .await
        .with_context(|| remote_created_context(EntityKind::Ad, &facebook_id))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedEntityResponse {
            id: record.id,
            facebook_id,
            status: ad.status,
        }),
    ))
}

// ============================================================================
// Partial update
// ============================================================================

#[allow(clippy::too_many_arguments)]
async fn push_update<T: Serialize>(
    state: &AppState,
    kind: EntityKind,
    owner: &str,
    id: &str,
    facebook_id: Option<&str>,
    name: Option<&str>,
    status: Option<EntityStatus>,
    update: &T,
) -> Result<Json<serde_json::Value>, AppError> {
    match facebook_id {
        Some(facebook_id) => state.graph.update_object(facebook_id, update).await?,
        None => tracing::warn!(
            "{} {} has no Facebook id, updating local copy only",
            kind.label(),
            id
        ),
    }

    let spec_patch = serde_json::to_value(update)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize update: {}", e)))?;
    let patch = RecordPatch {
        name,
        status,
        spec_patch: spec_patch.clone(),
    };
    if !state.storage.apply_patch(kind, owner, id, &patch).await? {
        return Err(AppError::NotFound(format!("{} {}", kind.label(), id)));
    }

    Ok(Json(json!({ "id": id, "updated": true, "changes": spec_patch })))
}

/// PATCH /api/v1/campaigns/:id
pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CampaignUpdateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    let update = normalizer::validate_and_normalize_campaign_update(&request)?;
    let campaign = state
        .storage
        .find_campaign(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("campaign {}", id)))?;
    normalizer::check_budget_against_stored(
        &campaign.spec,
        update.daily_budget.as_deref(),
        update.lifetime_budget.as_deref(),
    )?;

    push_update(
        &state,
        EntityKind::Campaign,
        &owner,
        &id,
        campaign.facebook_campaign_id.as_deref(),
        update.name.as_deref(),
        update.status,
        &update,
    )
    .await
}

/// PATCH /api/v1/adsets/:id
pub async fn update_adset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AdSetUpdateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    let update = normalizer::validate_and_normalize_adset_update(&request)?;
    let adset = state
        .storage
        .find_adset(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ad set {}", id)))?;
    normalizer::check_budget_against_stored(
        &adset.spec,
        update.daily_budget.as_deref(),
        update.lifetime_budget.as_deref(),
    )?;

    let response = push_update(
        &state,
        EntityKind::AdSet,
        &owner,
        &id,
        adset.facebook_adset_id.as_deref(),
        update.name.as_deref(),
        update.status,
        &update,
    )
    .await?;

    state
        .adset_cache
        .invalidate(&adset_cache_key(&owner, &id))
        .await;
    Ok(response)
}

/// PATCH /api/v1/ads/:id
pub async fn update_ad(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AdUpdateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    let update = normalizer::validate_and_normalize_ad_update(&request)?;
    let ad = state
        .storage
        .find_ad(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ad {}", id)))?;

    push_update(
        &state,
        EntityKind::Ad,
        &owner,
        &id,
        ad.facebook_ad_id.as_deref(),
        update.name.as_deref(),
        update.status,
        &update,
    )
    .await
}

// ============================================================================
// Soft delete
// ============================================================================

fn delete_status(params: &DeleteParams) -> Result<EntityStatus, AppError> {
    match params.mode.as_deref().map(str::trim) {
        None | Some("") | Some("archive") => Ok(EntityStatus::Archived),
        Some("delete") => Ok(EntityStatus::Deleted),
        Some(other) => Err(AppError::BadRequest(format!(
            "Unknown delete mode '{}', expected 'archive' or 'delete'",
            other
        ))),
    }
}

async fn soft_delete(
    state: &AppState,
    kind: EntityKind,
    owner: &str,
    id: &str,
    facebook_id: Option<&str>,
    status: EntityStatus,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(facebook_id) = facebook_id {
        state.graph.set_status(facebook_id, status).await?;
    }
    if !state.storage.set_status(kind, owner, id, status).await? {
        return Err(AppError::NotFound(format!("{} {}", kind.label(), id)));
    }

    tracing::info!("{} {} moved to {}", kind.label(), id, status);
    Ok(Json(json!({ "id": id, "status": status })))
}

/// DELETE /api/v1/campaigns/:id
pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    let status = delete_status(&params)?;
    let campaign = state
        .storage
        .find_campaign(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("campaign {}", id)))?;

    soft_delete(
        &state,
        EntityKind::Campaign,
        &owner,
        &id,
        campaign.facebook_campaign_id.as_deref(),
        status,
    )
    .await
}

/// DELETE /api/v1/adsets/:id
pub async fn delete_adset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    let status = delete_status(&params)?;
    let adset = state
        .storage
        .find_adset(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ad set {}", id)))?;

    let response = soft_delete(
        &state,
        EntityKind::AdSet,
        &owner,
        &id,
        adset.facebook_adset_id.as_deref(),
        status,
    )
    .await?;

    state
        .adset_cache
        .invalidate(&adset_cache_key(&owner, &id))
        .await;
    Ok(response)
}

/// DELETE /api/v1/ads/:id
pub async fn delete_ad(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner = owner_id(&headers)?;
    let status = delete_status(&params)?;
    let ad = state
        .storage
        .find_ad(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ad {}", id)))?;

    soft_delete(
        &state,
        EntityKind::Ad,
        &owner,
        &id,
        ad.facebook_ad_id.as_deref(),
        status,
    )
    .await
}
