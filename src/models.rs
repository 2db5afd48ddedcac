use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::{ValidationError, ValidationReason};

// ============================================================================
// Loosely typed scalar inputs
// ============================================================================

/// Identifier or amount as clients send it: a JSON number or a numeric string.
///
/// The internal store keeps most Facebook identifiers as strings while the Graph
/// API write endpoints want numbers, so both shapes are accepted and coerced later.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    /// Coerces to an integer greater than zero, if possible.
    pub fn as_positive_u64(&self) -> Option<u64> {
        match self {
            NumericInput::Number(n) => n.as_u64().filter(|v| *v > 0),
            NumericInput::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                trimmed.parse::<u64>().ok().filter(|v| *v > 0)
            }
        }
    }

    /// Coerces to a finite number greater than zero, if possible.
    pub fn as_positive_f64(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(n) => n.as_f64()?,
            NumericInput::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value > 0.0).then_some(value)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, NumericInput::Text(s) if s.trim().is_empty())
    }
}

impl From<u64> for NumericInput {
    fn from(value: u64) -> Self {
        NumericInput::Number(value.into())
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

// ============================================================================
// Closed enumerations defined by the Marketing API
// ============================================================================

macro_rules! platform_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALLOWED: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Parses a wire value, naming `field` in the rejection.
            pub fn parse_field(field: &str, value: &str) -> Result<Self, ValidationError> {
                match value.trim() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ValidationError::new(
                        field,
                        ValidationReason::NotInAllowedSet {
                            value: other.to_string(),
                            allowed: Self::ALLOWED,
                        },
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

platform_enum! {
    /// Lifecycle status shared by campaigns, ad sets and ads.
    EntityStatus {
        Active => "ACTIVE",
        Paused => "PAUSED",
        Archived => "ARCHIVED",
        Deleted => "DELETED",
    }
}

platform_enum! {
    /// Outcome-based campaign objectives.
    Objective {
        Awareness => "OUTCOME_AWARENESS",
        Traffic => "OUTCOME_TRAFFIC",
        Engagement => "OUTCOME_ENGAGEMENT",
        Leads => "OUTCOME_LEADS",
        AppPromotion => "OUTCOME_APP_PROMOTION",
        Sales => "OUTCOME_SALES",
    }
}

platform_enum! {
    BidStrategy {
        LowestCostWithoutCap => "LOWEST_COST_WITHOUT_CAP",
        LowestCostWithBidCap => "LOWEST_COST_WITH_BID_CAP",
        CostCap => "COST_CAP",
        LowestCostWithMinRoas => "LOWEST_COST_WITH_MIN_ROAS",
    }
}

platform_enum! {
    OptimizationGoal {
        None => "NONE",
        AppInstalls => "APP_INSTALLS",
        AdRecallLift => "AD_RECALL_LIFT",
        EngagedUsers => "ENGAGED_USERS",
        EventResponses => "EVENT_RESPONSES",
        Impressions => "IMPRESSIONS",
        LeadGeneration => "LEAD_GENERATION",
        QualityLead => "QUALITY_LEAD",
        LinkClicks => "LINK_CLICKS",
        OffsiteConversions => "OFFSITE_CONVERSIONS",
        PageLikes => "PAGE_LIKES",
        PostEngagement => "POST_ENGAGEMENT",
        QualityCall => "QUALITY_CALL",
        Reach => "REACH",
        LandingPageViews => "LANDING_PAGE_VIEWS",
        VisitInstagramProfile => "VISIT_INSTAGRAM_PROFILE",
        Value => "VALUE",
        ThruPlay => "THRUPLAY",
        Conversations => "CONVERSATIONS",
    }
}

platform_enum! {
    BillingEvent {
        AppInstalls => "APP_INSTALLS",
        Clicks => "CLICKS",
        Impressions => "IMPRESSIONS",
        LinkClicks => "LINK_CLICKS",
        None => "NONE",
        OfferClaims => "OFFER_CLAIMS",
        PageLikes => "PAGE_LIKES",
        PostEngagement => "POST_ENGAGEMENT",
        ThruPlay => "THRUPLAY",
        Purchase => "PURCHASE",
        ListingInteraction => "LISTING_INTERACTION",
    }
}

platform_enum! {
    /// Required on campaign creation; an empty list means no special category.
    SpecialAdCategory {
        None => "NONE",
        Employment => "EMPLOYMENT",
        Housing => "HOUSING",
        Credit => "CREDIT",
        IssuesElectionsPolitics => "ISSUES_ELECTIONS_POLITICS",
        FinancialProductsServices => "FINANCIAL_PRODUCTS_SERVICES",
    }
}

platform_enum! {
    /// Pixel events an ad set can optimize for.
    CustomEventType {
        Purchase => "PURCHASE",
        Lead => "LEAD",
        CompleteRegistration => "COMPLETE_REGISTRATION",
        AddToCart => "ADD_TO_CART",
        InitiatedCheckout => "INITIATED_CHECKOUT",
        AddPaymentInfo => "ADD_PAYMENT_INFO",
        ContentView => "CONTENT_VIEW",
        Search => "SEARCH",
        Contact => "CONTACT",
        Subscribe => "SUBSCRIBE",
        Other => "OTHER",
    }
}

// ============================================================================
// Targeting (shared by campaigns and ad sets)
// ============================================================================

/// Audience definition in the Graph API's `targeting` shape.
///
/// Serialized with the platform's snake_case keys; camelCase keys are accepted
/// on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetingSpec {
    #[serde(default, alias = "ageMin", skip_serializing_if = "Option::is_none")]
    pub age_min: Option<i64>,
    #[serde(default, alias = "ageMax", skip_serializing_if = "Option::is_none")]
    pub age_max: Option<i64>,
    /// 1 = male, 2 = female; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genders: Vec<i64>,
    #[serde(default, alias = "geoLocations", skip_serializing_if = "Option::is_none")]
    pub geo_locations: Option<GeoLocations>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<TargetingEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviors: Vec<TargetingEntity>,
    #[serde(default, alias = "customAudiences", skip_serializing_if = "Vec::is_empty")]
    pub custom_audiences: Vec<TargetingEntity>,
    #[serde(
        default,
        alias = "excludedCustomAudiences",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub excluded_custom_audiences: Vec<TargetingEntity>,
    #[serde(default, alias = "devicePlatforms", skip_serializing_if = "Vec::is_empty")]
    pub device_platforms: Vec<DevicePlatform>,
    #[serde(default, alias = "publisherPlatforms", skip_serializing_if = "Vec::is_empty")]
    pub publisher_platforms: Vec<PublisherPlatform>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locales: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocations {
    /// ISO 3166-1 alpha-2 codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<GeoKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cities: Vec<CityTarget>,
    #[serde(default, alias = "locationTypes", skip_serializing_if = "Vec::is_empty")]
    pub location_types: Vec<LocationType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoKey {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTarget {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<i64>,
    #[serde(default, alias = "distanceUnit", skip_serializing_if = "Option::is_none")]
    pub distance_unit: Option<DistanceUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Mile,
    Kilometer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Home,
    Recent,
    TravelIn,
}

/// Interest, behavior or custom audience reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingEntity {
    pub id: NumericInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePlatform {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublisherPlatform {
    Facebook,
    Instagram,
    AudienceNetwork,
    Messenger,
}

/// What an ad set promotes, one shape per platform object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromotedObject {
    Pixel {
        #[serde(alias = "pixelId")]
        pixel_id: NumericInput,
        #[serde(alias = "customEventType")]
        custom_event_type: String,
    },
    Application {
        #[serde(alias = "applicationId")]
        application_id: NumericInput,
        #[serde(alias = "objectStoreUrl")]
        object_store_url: String,
    },
    ProductSet {
        #[serde(alias = "productSetId")]
        product_set_id: NumericInput,
    },
    Page {
        #[serde(alias = "pageId")]
        page_id: NumericInput,
    },
}

// ============================================================================
// Client requests
// ============================================================================

/// Campaign creation request as submitted by the dashboard.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRequest {
    pub name: Option<String>,
    pub objective: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "daily_budget")]
    pub daily_budget: Option<NumericInput>,
    #[serde(alias = "lifetime_budget")]
    pub lifetime_budget: Option<NumericInput>,
    #[serde(alias = "bid_strategy")]
    pub bid_strategy: Option<String>,
    pub targeting: Option<TargetingSpec>,
    #[serde(alias = "special_ad_categories")]
    pub special_ad_categories: Option<Vec<String>>,
    #[serde(alias = "ad_account_id")]
    pub facebook_ad_account_id: Option<String>,
}

/// Ad set creation request. `campaignId` names the campaign on Facebook.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSetRequest {
    pub name: Option<String>,
    #[serde(alias = "campaign_id")]
    pub campaign_id: Option<NumericInput>,
    #[serde(alias = "optimization_goal")]
    pub optimization_goal: Option<String>,
    #[serde(alias = "billing_event")]
    pub billing_event: Option<String>,
    #[serde(alias = "bid_amount")]
    pub bid_amount: Option<NumericInput>,
    #[serde(alias = "daily_budget")]
    pub daily_budget: Option<NumericInput>,
    #[serde(alias = "lifetime_budget")]
    pub lifetime_budget: Option<NumericInput>,
    pub targeting: Option<TargetingSpec>,
    #[serde(alias = "promoted_object")]
    pub promoted_object: Option<PromotedObject>,
    pub status: Option<String>,
    #[serde(alias = "start_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(alias = "end_time")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Ad creation request. `adsetId` is the internal ad set identifier.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRequest {
    pub name: Option<String>,
    pub adset_id: Option<String>,
    pub creative_id: Option<NumericInput>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignUpdateRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub daily_budget: Option<NumericInput>,
    pub lifetime_budget: Option<NumericInput>,
    pub bid_strategy: Option<String>,
    pub targeting: Option<TargetingSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSetUpdateRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub optimization_goal: Option<String>,
    pub billing_event: Option<String>,
    pub bid_amount: Option<NumericInput>,
    pub daily_budget: Option<NumericInput>,
    pub lifetime_budget: Option<NumericInput>,
    pub targeting: Option<TargetingSpec>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdUpdateRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub creative_id: Option<NumericInput>,
}

// ============================================================================
// Persisted records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    pub name: String,
    pub status: String,
    pub facebook_ad_account_id: String,
    #[serde(default)]
    pub facebook_campaign_id: Option<String>,
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Ad set as stored locally. `facebook_adset_id` stays empty until the ad set
/// has been created on Facebook.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdSetRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub campaign_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "facebook_adset_id")]
    pub facebook_adset_id: Option<String>,
    #[serde(default)]
    pub facebook_ad_account_id: String,
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    pub adset_id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub facebook_ad_id: Option<String>,
    #[serde(default)]
    pub facebook_ad_account_id: String,
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response returned after an entity has been created locally and on Facebook.
#[derive(Debug, Serialize)]
pub struct CreatedEntityResponse {
    pub id: String,
    pub facebook_id: String,
    pub status: EntityStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_input_accepts_number_and_string() {
        let from_number: NumericInput = serde_json::from_value(json!(123456789)).unwrap();
        let from_string: NumericInput = serde_json::from_value(json!("123456789")).unwrap();

        assert_eq!(from_number.as_positive_u64(), Some(123456789));
        assert_eq!(from_string.as_positive_u64(), Some(123456789));
    }

    #[test]
    fn test_numeric_input_rejects_non_positive_and_garbage() {
        assert_eq!(NumericInput::from("0").as_positive_u64(), None);
        assert_eq!(NumericInput::from("-5").as_positive_u64(), None);
        assert_eq!(NumericInput::from("12abc").as_positive_u64(), None);
        assert_eq!(NumericInput::from("").as_positive_u64(), None);
        assert_eq!(NumericInput::from("+7").as_positive_u64(), None);

        let negative: NumericInput = serde_json::from_value(json!(-3)).unwrap();
        assert_eq!(negative.as_positive_u64(), None);
        let fractional: NumericInput = serde_json::from_value(json!(1.5)).unwrap();
        assert_eq!(fractional.as_positive_u64(), None);
        assert_eq!(fractional.as_positive_f64(), Some(1.5));
    }

    #[test]
    fn test_platform_enum_parse_names_field() {
        assert_eq!(
            BidStrategy::parse_field("bidStrategy", "COST_CAP").unwrap(),
            BidStrategy::CostCap
        );

        let err = BillingEvent::parse_field("billingEvent", "SOMETIMES").unwrap_err();
        assert_eq!(err.field, "billingEvent");
        assert!(err.to_string().contains("not in allowed set"));
    }

    #[test]
    fn test_enum_serializes_to_wire_value() {
        let value = serde_json::to_value(OptimizationGoal::ThruPlay).unwrap();
        assert_eq!(value, json!("THRUPLAY"));
        assert_eq!(EntityStatus::Paused.to_string(), "PAUSED");
    }

    #[test]
    fn test_targeting_accepts_camel_case_and_emits_snake_case() {
        let targeting: TargetingSpec = serde_json::from_value(json!({
            "ageMin": 18,
            "ageMax": 45,
            "geoLocations": { "countries": ["BR"], "locationTypes": ["home"] },
            "devicePlatforms": ["mobile"]
        }))
        .unwrap();

        let out = serde_json::to_value(&targeting).unwrap();
        assert_eq!(
            out,
            json!({
                "age_min": 18,
                "age_max": 45,
                "geo_locations": { "countries": ["BR"], "location_types": ["home"] },
                "device_platforms": ["mobile"]
            })
        );
    }

    #[test]
    fn test_promoted_object_picks_variant_by_shape() {
        let pixel: PromotedObject = serde_json::from_value(json!({
            "pixelId": "1234",
            "customEventType": "PURCHASE"
        }))
        .unwrap();
        assert!(matches!(pixel, PromotedObject::Pixel { .. }));

        let page: PromotedObject = serde_json::from_value(json!({ "page_id": 42 })).unwrap();
        assert!(matches!(page, PromotedObject::Page { .. }));
    }

    #[test]
    fn test_adset_record_reads_store_document() {
        let record: AdSetRecord = serde_json::from_value(json!({
            "_id": "507f1f77bcf86cd799439011",
            "facebookAdsetId": "987654321"
        }))
        .unwrap();

        assert_eq!(record.id, "507f1f77bcf86cd799439011");
        assert_eq!(record.facebook_adset_id.as_deref(), Some("987654321"));
    }
}
