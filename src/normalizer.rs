//! Request normalization for the Campaign → AdSet → Ad hierarchy.
//!
//! Every function here is a pure boundary check run right before a Graph API
//! submission: it either returns the exact body to send, or the first field that
//! makes the request unusable. Nothing in this module performs I/O; the ad set
//! lookup needed for ads is done by the caller and passed in.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::OnceLock;

use crate::errors::{ValidationError, ValidationReason};
use crate::models::{
    AdRequest, AdSetRecord, AdSetRequest, AdSetUpdateRequest, AdUpdateRequest, BidStrategy,
    BillingEvent, CampaignRequest, CampaignUpdateRequest, CustomEventType, DistanceUnit,
    EntityStatus, NumericInput, Objective, OptimizationGoal, PromotedObject, SpecialAdCategory,
    TargetingEntity, TargetingSpec,
};

/// Status applied to newly created entities when the request leaves it out.
pub const DEFAULT_STATUS: EntityStatus = EntityStatus::Paused;

const MIN_TARGET_AGE: i64 = 13;
const MAX_TARGET_AGE: i64 = 65;
const GENDER_CODES: &[&str] = &["1", "2"];

// ============================================================================
// Normalized bodies (Graph API field names)
// ============================================================================

/// Body for `POST /act_{id}/campaigns`.
///
/// `ad_account_id` is kept so the value reads back as a request; the Graph
/// client moves it into the path before posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCampaign {
    pub ad_account_id: String,
    pub name: String,
    pub objective: Objective,
    pub status: EntityStatus,
    pub special_ad_categories: Vec<SpecialAdCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<BidStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeting: Option<TargetingSpec>,
}

/// Body for `POST /act_{id}/adsets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAdSet {
    pub name: String,
    pub campaign_id: u64,
    pub optimization_goal: OptimizationGoal,
    pub billing_event: BillingEvent,
    /// Minor currency units, as given.
    pub bid_amount: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeting: Option<TargetingSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_object: Option<PromotedObject>,
    pub status: EntityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeRef {
    pub creative_id: u64,
}

/// Body for `POST /act_{id}/ads`. `adset_id` is always the Facebook identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAd {
    pub name: String,
    pub adset_id: u64,
    pub creative: CreativeRef,
    pub status: EntityStatus,
}

/// Body for `POST /{campaign_id}`; only changed fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<BidStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeting: Option<TargetingSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdSetUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_goal: Option<OptimizationGoal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_event: Option<BillingEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeting: Option<TargetingSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creative: Option<CreativeRef>,
}

// ============================================================================
// Creation
// ============================================================================

/// Validates a campaign creation request.
///
/// Checks run in this order: `name`, `objective`, `facebookAdAccountId`
/// presence, then enumerations, budgets, bid strategy, special ad categories
/// and targeting. Targeting is checked structurally and passed through as-is.
pub fn validate_and_normalize_campaign(
    request: &CampaignRequest,
) -> Result<NormalizedCampaign, ValidationError> {
    let name = required_text("name", request.name.as_deref())?;
    let objective = required_text("objective", request.objective.as_deref())?;
    let account = required_text(
        "facebookAdAccountId",
        request.facebook_ad_account_id.as_deref(),
    )?;

    let objective = Objective::parse_field("objective", &objective)?;
    let ad_account_id = normalize_ad_account_id(&account)?;
    let status = status_or_default("status", request.status.as_deref())?;
    let (daily_budget, lifetime_budget) = exclusive_budgets(
        request.daily_budget.as_ref(),
        request.lifetime_budget.as_ref(),
    )?;
    let bid_strategy = optional_enum("bidStrategy", request.bid_strategy.as_deref(), |f, v| {
        BidStrategy::parse_field(f, v)
    })?;

    let special_ad_categories = request
        .special_ad_categories
        .iter()
        .flatten()
        .enumerate()
        .map(|(i, category)| {
            SpecialAdCategory::parse_field(&format!("specialAdCategories[{}]", i), category)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(targeting) = &request.targeting {
        validate_targeting("targeting", targeting)?;
    }

    Ok(NormalizedCampaign {
        ad_account_id,
        name,
        objective,
        status,
        special_ad_categories,
        daily_budget,
        lifetime_budget,
        bid_strategy,
        targeting: request.targeting.clone(),
    })
}

/// Validates an ad set creation request whose `campaignId` is the Facebook
/// campaign identifier.
pub fn validate_and_normalize_adset(
    request: &AdSetRequest,
) -> Result<NormalizedAdSet, ValidationError> {
    let name = required_text("name", request.name.as_deref())?;
    let campaign_id = required_positive_id("campaignId", request.campaign_id.as_ref())?;

    let optimization_goal = required_text(
        "optimizationGoal",
        request.optimization_goal.as_deref(),
    )?;
    let optimization_goal = OptimizationGoal::parse_field("optimizationGoal", &optimization_goal)?;

    let billing_event = required_text("billingEvent", request.billing_event.as_deref())?;
    let billing_event = BillingEvent::parse_field("billingEvent", &billing_event)?;

    let bid_amount = match request.bid_amount.as_ref().filter(|b| !b.is_blank()) {
        Some(amount) => positive_number("bidAmount", amount)?,
        None => return Err(ValidationError::missing("bidAmount")),
    };

    let (daily_budget, lifetime_budget) = exclusive_budgets(
        request.daily_budget.as_ref(),
        request.lifetime_budget.as_ref(),
    )?;

    if let Some(targeting) = &request.targeting {
        validate_targeting("targeting", targeting)?;
    }
    if let Some(promoted) = &request.promoted_object {
        validate_promoted_object("promotedObject", promoted)?;
    }

    let status = status_or_default("status", request.status.as_deref())?;
    check_schedule(request.start_time, request.end_time)?;

    Ok(NormalizedAdSet {
        name,
        campaign_id,
        optimization_goal,
        billing_event,
        bid_amount,
        daily_budget,
        lifetime_budget,
        targeting: request.targeting.clone(),
        promoted_object: request.promoted_object.clone(),
        status,
        start_time: request.start_time,
        end_time: request.end_time,
    })
}

/// Validates an ad creation request against the ad set it points at.
///
/// `resolved_adset` is the record the caller looked up by `adsetId`. The ad can
/// only be created once that ad set exists on Facebook, so a missing or unusable
/// `facebook_adset_id` is rejected with [`ValidationReason::InvalidFacebookAdSetId`]
/// even when every field of the ad itself is valid.
pub fn validate_and_normalize_ad(
    request: &AdRequest,
    resolved_adset: Option<&AdSetRecord>,
) -> Result<NormalizedAd, ValidationError> {
    let name = required_text("name", request.name.as_deref())?;
    let adset_id = required_text("adsetId", request.adset_id.as_deref())?;

    let creative_id = match request.creative_id.as_ref().filter(|c| !c.is_blank()) {
        Some(creative) => creative.as_positive_u64().ok_or_else(|| {
            ValidationError::new("creativeId", ValidationReason::InvalidCreativeId)
        })?,
        None => return Err(ValidationError::missing("creativeId")),
    };

    let adset = resolved_adset.ok_or_else(|| {
        ValidationError::new("adsetId", ValidationReason::InvalidFacebookAdSetId)
    })?;
    if adset.id != adset_id {
        return Err(ValidationError::new(
            "adsetId",
            ValidationReason::Malformed(format!(
                "resolved ad set '{}' does not match '{}'",
                adset.id, adset_id
            )),
        ));
    }
    let facebook_adset_id = adset
        .facebook_adset_id
        .as_deref()
        .and_then(|id| NumericInput::from(id).as_positive_u64())
        .ok_or_else(|| ValidationError::new("adsetId", ValidationReason::InvalidFacebookAdSetId))?;

    let status = status_or_default("status", request.status.as_deref())?;

    Ok(NormalizedAd {
        name,
        adset_id: facebook_adset_id,
        creative: CreativeRef { creative_id },
        status,
    })
}

// ============================================================================
// Partial updates
// ============================================================================

pub fn validate_and_normalize_campaign_update(
    request: &CampaignUpdateRequest,
) -> Result<CampaignUpdate, ValidationError> {
    let name = optional_text("name", request.name.as_deref())?;
    let status = optional_enum("status", request.status.as_deref(), |f, v| {
        EntityStatus::parse_field(f, v)
    })?;
    let (daily_budget, lifetime_budget) = exclusive_budgets(
        request.daily_budget.as_ref(),
        request.lifetime_budget.as_ref(),
    )?;
    let bid_strategy = optional_enum("bidStrategy", request.bid_strategy.as_deref(), |f, v| {
        BidStrategy::parse_field(f, v)
    })?;
    if let Some(targeting) = &request.targeting {
        validate_targeting("targeting", targeting)?;
    }

    let update = CampaignUpdate {
        name,
        status,
        daily_budget,
        lifetime_budget,
        bid_strategy,
        targeting: request.targeting.clone(),
    };
    if update == CampaignUpdate::default() {
        return Err(ValidationError::new("body", ValidationReason::EmptyUpdate));
    }
    Ok(update)
}

pub fn validate_and_normalize_adset_update(
    request: &AdSetUpdateRequest,
) -> Result<AdSetUpdate, ValidationError> {
    let name = optional_text("name", request.name.as_deref())?;
    let status = optional_enum("status", request.status.as_deref(), |f, v| {
        EntityStatus::parse_field(f, v)
    })?;
    let optimization_goal = optional_enum(
        "optimizationGoal",
        request.optimization_goal.as_deref(),
        |f, v| OptimizationGoal::parse_field(f, v),
    )?;
    let billing_event = optional_enum("billingEvent", request.billing_event.as_deref(), |f, v| {
        BillingEvent::parse_field(f, v)
    })?;
    let bid_amount = request
        .bid_amount
        .as_ref()
        .filter(|b| !b.is_blank())
        .map(|amount| positive_number("bidAmount", amount))
        .transpose()?;
    let (daily_budget, lifetime_budget) = exclusive_budgets(
        request.daily_budget.as_ref(),
        request.lifetime_budget.as_ref(),
    )?;
    if let Some(targeting) = &request.targeting {
        validate_targeting("targeting", targeting)?;
    }

    let update = AdSetUpdate {
        name,
        status,
        optimization_goal,
        billing_event,
        bid_amount,
        daily_budget,
        lifetime_budget,
        targeting: request.targeting.clone(),
        end_time: request.end_time,
    };
    if update == AdSetUpdate::default() {
        return Err(ValidationError::new("body", ValidationReason::EmptyUpdate));
    }
    Ok(update)
}

pub fn validate_and_normalize_ad_update(
    request: &AdUpdateRequest,
) -> Result<AdUpdate, ValidationError> {
    let name = optional_text("name", request.name.as_deref())?;
    let status = optional_enum("status", request.status.as_deref(), |f, v| {
        EntityStatus::parse_field(f, v)
    })?;
    let creative = match request.creative_id.as_ref() {
        Some(creative) if creative.is_blank() => {
            return Err(ValidationError::missing("creativeId"));
        }
        Some(creative) => Some(CreativeRef {
            creative_id: creative.as_positive_u64().ok_or_else(|| {
                ValidationError::new("creativeId", ValidationReason::InvalidCreativeId)
            })?,
        }),
        None => None,
    };

    let update = AdUpdate {
        name,
        status,
        creative,
    };
    if update == AdUpdate::default() {
        return Err(ValidationError::new("body", ValidationReason::EmptyUpdate));
    }
    Ok(update)
}

/// Normalizes an ad account reference to the `act_<digits>` form used in Graph paths.
pub fn normalize_ad_account_id(value: &str) -> Result<String, ValidationError> {
    static AD_ACCOUNT: OnceLock<Regex> = OnceLock::new();
    let pattern =
        AD_ACCOUNT.get_or_init(|| Regex::new(r"^(?:act_)?(\d+)$").expect("ad account pattern"));

    pattern
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|digits| NumericInput::from(digits.as_str()).as_positive_u64())
        .map(|id| format!("act_{}", id))
        .ok_or_else(|| {
            ValidationError::new("facebookAdAccountId", ValidationReason::NotPositiveInteger)
        })
}

// ============================================================================
// Field helpers
// ============================================================================

fn required_text(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::missing(field)),
    }
}

/// Present-but-blank is rejected; absent stays `None`.
fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    value.map(|v| required_text(field, Some(v))).transpose()
}

fn optional_enum<T>(
    field: &str,
    value: Option<&str>,
    parse: impl Fn(&str, &str) -> Result<T, ValidationError>,
) -> Result<Option<T>, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => parse(field, v).map(Some),
        _ => Ok(None),
    }
}

fn status_or_default(field: &str, value: Option<&str>) -> Result<EntityStatus, ValidationError> {
    Ok(optional_enum(field, value, |f, v| EntityStatus::parse_field(f, v))?
        .unwrap_or(DEFAULT_STATUS))
}

fn required_positive_id(field: &str, value: Option<&NumericInput>) -> Result<u64, ValidationError> {
    match value.filter(|v| !v.is_blank()) {
        Some(v) => v
            .as_positive_u64()
            .ok_or_else(|| ValidationError::new(field, ValidationReason::NotPositiveInteger)),
        None => Err(ValidationError::missing(field)),
    }
}

/// Budgets are sent to Facebook as decimal strings of minor currency units.
fn budget_string(field: &str, value: Option<&NumericInput>) -> Result<Option<String>, ValidationError> {
    value
        .map(|v| {
            v.as_positive_u64()
                .map(|amount| amount.to_string())
                .ok_or_else(|| ValidationError::new(field, ValidationReason::NotPositiveInteger))
        })
        .transpose()
}

fn exclusive_budgets(
    daily: Option<&NumericInput>,
    lifetime: Option<&NumericInput>,
) -> Result<(Option<String>, Option<String>), ValidationError> {
    let daily = daily.filter(|b| !b.is_blank());
    let lifetime = lifetime.filter(|b| !b.is_blank());

    if daily.is_some() && lifetime.is_some() {
        return Err(ValidationError::new(
            "lifetimeBudget",
            ValidationReason::MutuallyExclusiveBudgets,
        ));
    }

    Ok((
        budget_string("dailyBudget", daily)?,
        budget_string("lifetimeBudget", lifetime)?,
    ))
}

/// Any finite number above zero, emitted unchanged. Integer strings stay integers.
/// Rejects an update that sets one budget kind while the stored body carries
/// the other. `stored` is the previously normalized body.
pub fn check_budget_against_stored(
    stored: &Value,
    daily_budget: Option<&str>,
    lifetime_budget: Option<&str>,
) -> Result<(), ValidationError> {
    let has = |key: &str| stored.get(key).map_or(false, |v| !v.is_null());

    if daily_budget.is_some() && has("lifetime_budget") {
        return Err(ValidationError::new(
            "dailyBudget",
            ValidationReason::MutuallyExclusiveBudgets,
        ));
    }
    if lifetime_budget.is_some() && has("daily_budget") {
        return Err(ValidationError::new(
            "lifetimeBudget",
            ValidationReason::MutuallyExclusiveBudgets,
        ));
    }
    Ok(())
}

fn positive_number(field: &str, value: &NumericInput) -> Result<Number, ValidationError> {
    let not_positive = || {
        ValidationError::new(
            field,
            ValidationReason::OutOfRange("must be a positive number".to_string()),
        )
    };

    let amount = value.as_positive_f64().ok_or_else(not_positive)?;
    match value {
        NumericInput::Number(n) => Ok(n.clone()),
        NumericInput::Text(_) => match value.as_positive_u64() {
            Some(whole) => Ok(Number::from(whole)),
            None => Number::from_f64(amount).ok_or_else(not_positive),
        },
    }
}

fn check_schedule(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            return Err(ValidationError::new(
                "endTime",
                ValidationReason::OutOfRange("must be after startTime".to_string()),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Structured targeting / promoted object checks
// ============================================================================

/// Checks a targeting spec structurally. Field paths in rejections are rooted at `prefix`.
pub fn validate_targeting(prefix: &str, targeting: &TargetingSpec) -> Result<(), ValidationError> {
    for (name, age) in [("ageMin", targeting.age_min), ("ageMax", targeting.age_max)] {
        if let Some(age) = age {
            if !(MIN_TARGET_AGE..=MAX_TARGET_AGE).contains(&age) {
                return Err(ValidationError::new(
                    format!("{}.{}", prefix, name),
                    ValidationReason::OutOfRange(format!(
                        "{} is outside {}..={}",
                        age, MIN_TARGET_AGE, MAX_TARGET_AGE
                    )),
                ));
            }
        }
    }
    if let (Some(min), Some(max)) = (targeting.age_min, targeting.age_max) {
        if min > max {
            return Err(ValidationError::new(
                format!("{}.ageMin", prefix),
                ValidationReason::OutOfRange(format!("ageMin {} exceeds ageMax {}", min, max)),
            ));
        }
    }

    for (i, gender) in targeting.genders.iter().enumerate() {
        if !matches!(gender, 1 | 2) {
            return Err(ValidationError::new(
                format!("{}.genders[{}]", prefix, i),
                ValidationReason::NotInAllowedSet {
                    value: gender.to_string(),
                    allowed: GENDER_CODES,
                },
            ));
        }
    }

    if let Some(geo) = &targeting.geo_locations {
        static COUNTRY_CODE: OnceLock<Regex> = OnceLock::new();
        let country =
            COUNTRY_CODE.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("country code pattern"));

        for (i, code) in geo.countries.iter().enumerate() {
            if !country.is_match(code) {
                return Err(ValidationError::new(
                    format!("{}.geoLocations.countries[{}]", prefix, i),
                    ValidationReason::Malformed(format!(
                        "'{}' is not an ISO 3166-1 alpha-2 code",
                        code
                    )),
                ));
            }
        }
        for (i, region) in geo.regions.iter().enumerate() {
            check_location_key(&format!("{}.geoLocations.regions[{}].key", prefix, i), &region.key)?;
        }
        for (i, city) in geo.cities.iter().enumerate() {
            let path = format!("{}.geoLocations.cities[{}]", prefix, i);
            check_location_key(&format!("{}.key", path), &city.key)?;
            if let Some(radius) = city.radius {
                let bounds = match city.distance_unit.unwrap_or(DistanceUnit::Mile) {
                    DistanceUnit::Mile => 10..=50,
                    DistanceUnit::Kilometer => 17..=80,
                };
                if !bounds.contains(&radius) {
                    return Err(ValidationError::new(
                        format!("{}.radius", path),
                        ValidationReason::OutOfRange(format!(
                            "{} is outside {}..={}",
                            radius,
                            bounds.start(),
                            bounds.end()
                        )),
                    ));
                }
            }
        }
    }

    check_entities(&format!("{}.interests", prefix), &targeting.interests)?;
    check_entities(&format!("{}.behaviors", prefix), &targeting.behaviors)?;
    check_entities(
        &format!("{}.customAudiences", prefix),
        &targeting.custom_audiences,
    )?;
    check_entities(
        &format!("{}.excludedCustomAudiences", prefix),
        &targeting.excluded_custom_audiences,
    )?;

    for (i, locale) in targeting.locales.iter().enumerate() {
        if *locale <= 0 {
            return Err(ValidationError::new(
                format!("{}.locales[{}]", prefix, i),
                ValidationReason::NotPositiveInteger,
            ));
        }
    }

    Ok(())
}

fn check_location_key(field: &str, key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::missing(field));
    }
    if NumericInput::from(key).as_positive_u64().is_none() {
        return Err(ValidationError::new(field, ValidationReason::NotPositiveInteger));
    }
    Ok(())
}

fn check_entities(path: &str, entities: &[TargetingEntity]) -> Result<(), ValidationError> {
    for (i, entity) in entities.iter().enumerate() {
        if entity.id.as_positive_u64().is_none() {
            return Err(ValidationError::new(
                format!("{}[{}].id", path, i),
                ValidationReason::NotPositiveInteger,
            ));
        }
    }
    Ok(())
}

fn validate_promoted_object(prefix: &str, promoted: &PromotedObject) -> Result<(), ValidationError> {
    let positive = |name: &str, id: &NumericInput| {
        id.as_positive_u64().map(|_| ()).ok_or_else(|| {
            ValidationError::new(
                format!("{}.{}", prefix, name),
                ValidationReason::NotPositiveInteger,
            )
        })
    };

    match promoted {
        PromotedObject::Pixel {
            pixel_id,
            custom_event_type,
        } => {
            positive("pixelId", pixel_id)?;
            CustomEventType::parse_field(&format!("{}.customEventType", prefix), custom_event_type)?;
        }
        PromotedObject::Application {
            application_id,
            object_store_url,
        } => {
            positive("applicationId", application_id)?;
            let parsed = url::Url::parse(object_store_url).map_err(|e| {
                ValidationError::new(
                    format!("{}.objectStoreUrl", prefix),
                    ValidationReason::Malformed(e.to_string()),
                )
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::new(
                    format!("{}.objectStoreUrl", prefix),
                    ValidationReason::Malformed("store URL must use http or https".to_string()),
                ));
            }
        }
        PromotedObject::ProductSet { product_set_id } => positive("productSetId", product_set_id)?,
        PromotedObject::Page { page_id } => positive("pageId", page_id)?,
    }
    Ok(())
}
