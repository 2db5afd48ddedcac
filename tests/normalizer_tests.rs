/// Scenario tests for request normalization
/// Covers required fields, budget exclusivity, identifier coercion and the
/// ad → ad set sync invariant using JSON shaped like dashboard requests.
use rust_fb_ads_api::errors::{ErrorCategory, ValidationReason};
use rust_fb_ads_api::models::{AdRequest, AdSetRecord, AdSetRequest, CampaignRequest};
use rust_fb_ads_api::models::AdSetUpdateRequest;
use rust_fb_ads_api::normalizer::{
    check_budget_against_stored, validate_and_normalize_ad, validate_and_normalize_adset,
    validate_and_normalize_adset_update, validate_and_normalize_campaign,
};
use serde_json::{json, Value};

fn ad_request(value: Value) -> AdRequest {
    serde_json::from_value(value).unwrap()
}

fn adset_record(facebook_adset_id: Value) -> AdSetRecord {
    serde_json::from_value(json!({
        "_id": "507f1f77bcf86cd799439011",
        "campaignId": "507f191e810c19729de860ea",
        "name": "Lookalike 1%",
        "facebookAdsetId": facebook_adset_id,
        "facebookAdAccountId": "act_1001"
    }))
    .unwrap()
}

fn test_ad() -> AdRequest {
    ad_request(json!({
        "name": "Test Ad",
        "adsetId": "507f1f77bcf86cd799439011",
        "creativeId": "123456789",
        "status": "PAUSED"
    }))
}

#[cfg(test)]
mod ad_tests {
    use super::*;

    #[test]
    fn test_ad_scenario_produces_numeric_identifiers() {
        let record = adset_record(json!("987654321"));
        let body = validate_and_normalize_ad(&test_ad(), Some(&record)).unwrap();

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Test Ad",
                "adset_id": 987654321u64,
                "creative": { "creative_id": 123456789u64 },
                "status": "PAUSED"
            })
        );
        assert!(value["adset_id"].is_u64());
        assert!(value["creative"]["creative_id"].is_u64());
    }

    #[test]
    fn test_ad_scenario_rejects_zero_or_missing_external_id() {
        for external in [json!("0"), Value::Null] {
            let record = adset_record(external);
            let err = validate_and_normalize_ad(&test_ad(), Some(&record)).unwrap_err();
            assert!(err.to_string().contains("invalid Facebook adset ID"));
            assert_eq!(err.category(), ErrorCategory::Integrity);
        }
    }

    #[test]
    fn test_ad_never_uses_internal_adset_id() {
        let record = adset_record(json!("120330000000042"));
        let body = validate_and_normalize_ad(&test_ad(), Some(&record)).unwrap();
        assert_eq!(body.adset_id, 120330000000042);
    }

    #[test]
    fn test_ad_creative_id_as_number_is_accepted() {
        let request = ad_request(json!({
            "name": "Numeric creative",
            "adsetId": "507f1f77bcf86cd799439011",
            "creativeId": 42
        }));
        let record = adset_record(json!("987654321"));

        let body = validate_and_normalize_ad(&request, Some(&record)).unwrap();
        assert_eq!(body.creative.creative_id, 42);
        assert_eq!(body.status.as_str(), "PAUSED");
    }

    #[test]
    fn test_ad_invalid_creative_ids() {
        let record = adset_record(json!("987654321"));
        for creative in [json!("abc"), json!("0"), json!("-12"), json!(-12), json!(0), json!("12.5")] {
            let request = ad_request(json!({
                "name": "Test Ad",
                "adsetId": "507f1f77bcf86cd799439011",
                "creativeId": creative
            }));
            let err = validate_and_normalize_ad(&request, Some(&record)).unwrap_err();
            assert!(
                err.to_string().contains("invalid creative ID"),
                "creative {} gave {}",
                creative,
                err
            );
        }
    }

    #[test]
    fn test_ad_missing_fields_are_named() {
        let record = adset_record(json!("987654321"));
        let cases = [
            ("adsetId", json!({ "name": "Ad", "creativeId": "1" })),
            ("creativeId", json!({ "name": "Ad", "adsetId": "507f1f77bcf86cd799439011" })),
            ("name", json!({ "adsetId": "507f1f77bcf86cd799439011", "creativeId": "1" })),
        ];

        for (field, body) in cases {
            let err = validate_and_normalize_ad(&ad_request(body), Some(&record)).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.reason, ValidationReason::MissingRequiredField);
        }
    }

    #[test]
    fn test_ad_is_idempotent() {
        let record = adset_record(json!("987654321"));
        let first = validate_and_normalize_ad(&test_ad(), Some(&record)).unwrap();
        let second = validate_and_normalize_ad(&test_ad(), Some(&record)).unwrap();
        assert_eq!(first, second);
    }
}

#[cfg(test)]
mod campaign_tests {
    use super::*;

    fn campaign(value: Value) -> CampaignRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_campaign_missing_fields_are_named() {
        let cases = [
            ("name", json!({ "objective": "OUTCOME_SALES", "facebookAdAccountId": "act_1" })),
            ("objective", json!({ "name": "C", "facebookAdAccountId": "act_1" })),
            ("facebookAdAccountId", json!({ "name": "C", "objective": "OUTCOME_SALES" })),
        ];

        for (field, body) in cases {
            let err = validate_and_normalize_campaign(&campaign(body)).unwrap_err();
            assert_eq!(err.field, field);
        }
    }

    #[test]
    fn test_campaign_rejects_both_budgets() {
        let err = validate_and_normalize_campaign(&campaign(json!({
            "name": "Black Friday",
            "objective": "OUTCOME_SALES",
            "facebookAdAccountId": "act_1",
            "dailyBudget": 5000,
            "lifetimeBudget": "150000"
        })))
        .unwrap_err();

        assert_eq!(err.reason, ValidationReason::MutuallyExclusiveBudgets);
    }

    #[test]
    fn test_campaign_accepts_each_bid_strategy() {
        for strategy in [
            "LOWEST_COST_WITHOUT_CAP",
            "LOWEST_COST_WITH_BID_CAP",
            "COST_CAP",
            "LOWEST_COST_WITH_MIN_ROAS",
        ] {
            let body = validate_and_normalize_campaign(&campaign(json!({
                "name": "C",
                "objective": "OUTCOME_LEADS",
                "facebookAdAccountId": "99",
                "bidStrategy": strategy
            })))
            .unwrap();
            assert_eq!(body.bid_strategy.map(|s| s.as_str()), Some(strategy));
        }
    }

    #[test]
    fn test_campaign_normalized_body_normalizes_to_itself() {
        let first = validate_and_normalize_campaign(&campaign(json!({
            "name": "C",
            "objective": "OUTCOME_SALES",
            "facebookAdAccountId": "act_1",
            "dailyBudget": 5000,
            "bidStrategy": "COST_CAP",
            "targeting": { "geoLocations": { "countries": ["BR"] } }
        })))
        .unwrap();

        let reparsed = campaign(serde_json::to_value(&first).unwrap());
        let second = validate_and_normalize_campaign(&reparsed).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.ad_account_id, "act_1");
    }

    #[test]
    fn test_campaign_unknown_objective() {
        let err = validate_and_normalize_campaign(&campaign(json!({
            "name": "C",
            "objective": "CONVERSIONS_PLUS",
            "facebookAdAccountId": "act_1"
        })))
        .unwrap_err();

        assert_eq!(err.field, "objective");
        assert!(err.to_string().contains("not in allowed set"));
    }
}

#[cfg(test)]
mod adset_tests {
    use super::*;

    fn adset(value: Value) -> AdSetRequest {
        serde_json::from_value(value).unwrap()
    }

    fn valid_adset() -> Value {
        json!({
            "name": "São Paulo 25-45",
            "campaignId": "120200000000001",
            "optimizationGoal": "OFFSITE_CONVERSIONS",
            "billingEvent": "IMPRESSIONS",
            "bidAmount": 300,
            "dailyBudget": "2000",
            "targeting": {
                "ageMin": 25,
                "ageMax": 45,
                "genders": [2],
                "geoLocations": {
                    "countries": ["BR"],
                    "cities": [{ "key": "269969", "radius": 25, "distanceUnit": "mile" }]
                },
                "interests": [{ "id": "6003107902433", "name": "Football" }],
                "publisherPlatforms": ["facebook", "instagram"]
            },
            "promotedObject": { "pixelId": "1122334455", "customEventType": "PURCHASE" }
        })
    }

    #[test]
    fn test_adset_full_request_normalizes() {
        let body = validate_and_normalize_adset(&adset(valid_adset())).unwrap();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["campaign_id"], json!(120200000000001u64));
        assert_eq!(value["daily_budget"], json!("2000"));
        assert_eq!(value["bid_amount"], json!(300));
        assert_eq!(value["targeting"]["geo_locations"]["countries"], json!(["BR"]));
        assert_eq!(value["promoted_object"]["pixel_id"], json!("1122334455"));
        assert_eq!(value["status"], json!("PAUSED"));
    }

    #[test]
    fn test_adset_missing_fields_are_named() {
        for field in ["campaignId", "optimizationGoal", "billingEvent", "bidAmount"] {
            let mut body = valid_adset();
            body.as_object_mut().unwrap().remove(field);
            let err = validate_and_normalize_adset(&adset(body)).unwrap_err();
            assert_eq!(err.field, field);
        }
    }

    #[test]
    fn test_adset_rejects_both_budgets() {
        let mut body = valid_adset();
        body["lifetimeBudget"] = json!(90000);

        let err = validate_and_normalize_adset(&adset(body)).unwrap_err();
        assert_eq!(err.reason, ValidationReason::MutuallyExclusiveBudgets);
    }

    #[test]
    fn test_adset_rejects_invalid_interest_id() {
        let mut body = valid_adset();
        body["targeting"]["interests"] = json!([{ "id": "football" }]);

        let err = validate_and_normalize_adset(&adset(body)).unwrap_err();
        assert_eq!(err.field, "targeting.interests[0].id");
    }

    #[test]
    fn test_adset_accepts_any_positive_bid() {
        let mut body = valid_adset();
        body["bidAmount"] = json!(0.4);

        let normalized = validate_and_normalize_adset(&adset(body)).unwrap();
        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["bid_amount"], json!(0.4));

        for bid in [json!(0), json!(-3.5), json!("abc")] {
            let mut body = valid_adset();
            body["bidAmount"] = bid;
            let err = validate_and_normalize_adset(&adset(body)).unwrap_err();
            assert_eq!(err.field, "bidAmount");
        }
    }

    #[test]
    fn test_adset_update_cannot_add_other_budget_kind() {
        let stored = serde_json::to_value(
            validate_and_normalize_adset(&adset(valid_adset())).unwrap(),
        )
        .unwrap();
        let update: AdSetUpdateRequest =
            serde_json::from_value(json!({ "lifetimeBudget": "90000" })).unwrap();
        let update = validate_and_normalize_adset_update(&update).unwrap();

        let err = check_budget_against_stored(
            &stored,
            update.daily_budget.as_deref(),
            update.lifetime_budget.as_deref(),
        )
        .unwrap_err();
        assert_eq!(err.field, "lifetimeBudget");
        assert_eq!(err.reason, ValidationReason::MutuallyExclusiveBudgets);

        let same_kind: AdSetUpdateRequest =
            serde_json::from_value(json!({ "dailyBudget": "3000" })).unwrap();
        let same_kind = validate_and_normalize_adset_update(&same_kind).unwrap();
        assert!(check_budget_against_stored(
            &stored,
            same_kind.daily_budget.as_deref(),
            same_kind.lifetime_budget.as_deref(),
        )
        .is_ok());
    }

    #[test]
    fn test_adset_normalized_body_normalizes_to_itself() {
        let first = validate_and_normalize_adset(&adset(valid_adset())).unwrap();
        let reparsed = adset(serde_json::to_value(&first).unwrap());
        let second = validate_and_normalize_adset(&reparsed).unwrap();

        assert_eq!(first, second);
    }
}
