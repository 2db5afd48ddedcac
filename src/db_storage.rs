use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{AdRecord, AdSetRecord, CampaignRecord, EntityStatus};
use crate::normalizer::{NormalizedAd, NormalizedAdSet, NormalizedCampaign};

/// Which level of the hierarchy a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Campaign,
    AdSet,
    Ad,
}

impl EntityKind {
    fn table(&self) -> &'static str {
        match self {
            EntityKind::Campaign => "campaigns",
            EntityKind::AdSet => "ad_sets",
            EntityKind::Ad => "ads",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Campaign => "campaign",
            EntityKind::AdSet => "ad set",
            EntityKind::Ad => "ad",
        }
    }
}

/// Local fields changed by a partial update. `spec_patch` is merged into the
/// stored JSON spec key by key.
#[derive(Debug, Clone)]
pub struct RecordPatch<'a> {
    pub name: Option<&'a str>,
    pub status: Option<EntityStatus>,
    pub spec_patch: Value,
}

const ADSET_SELECT: &str = r#"
    SELECT s.id, s.owner_id, s.campaign_id, s.name, s.status, s.facebook_adset_id,
           c.facebook_ad_account_id, s.spec, s.created_at, s.updated_at
    FROM ad_sets s
    JOIN campaigns c ON c.id = s.campaign_id
"#;

const AD_SELECT: &str = r#"
    SELECT a.id, a.owner_id, a.adset_id, a.name, a.status, a.facebook_ad_id,
           c.facebook_ad_account_id, a.spec, a.created_at, a.updated_at
    FROM ads a
    JOIN ad_sets s ON s.id = a.adset_id
    JOIN campaigns c ON c.id = s.campaign_id
"#;

fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn to_spec(body: &impl serde::Serialize) -> Result<Value, AppError> {
    serde_json::to_value(body)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize spec: {}", e)))
}

/// Persistence for campaigns, ad sets and ads.
///
/// Every lookup is scoped to the owning account; a row owned by someone else
/// reads as absent.
#[derive(Clone)]
pub struct AdsStorage {
    pool: PgPool,
}

impl AdsStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_campaign(
        &self,
        owner_id: &str,
        campaign: &NormalizedCampaign,
        facebook_campaign_id: &str,
    ) -> Result<CampaignRecord, AppError> {
        let record = sqlx::query_as::<_, CampaignRecord>(
            r#"
            INSERT INTO campaigns
                (id, owner_id, name, status, facebook_ad_account_id, facebook_campaign_id, spec)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner_id, name, status, facebook_ad_account_id,
                      facebook_campaign_id, spec, created_at, updated_at
            "#,
        )
        .bind(new_record_id())
        .bind(owner_id)
        .bind(&campaign.name)
        .bind(campaign.status.as_str())
        .bind(&campaign.ad_account_id)
        .bind(facebook_campaign_id)
        .bind(to_spec(campaign)?)
        .fetch_one(&self.pool)
        .await
        .context("inserting campaign")?;

        tracing::info!(
            "Stored campaign {} (facebook id {})",
            record.id,
            facebook_campaign_id
        );
        Ok(record)
    }

    pub async fn find_campaign(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<CampaignRecord>, AppError> {
        let record = sqlx::query_as::<_, CampaignRecord>(
            r#"
            SELECT id, owner_id, name, status, facebook_ad_account_id,
                   facebook_campaign_id, spec, created_at, updated_at
            FROM campaigns
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .context("loading campaign")?;

        Ok(record)
    }

    pub async fn insert_adset(
        &self,
        owner_id: &str,
        campaign_id: &str,
        adset: &NormalizedAdSet,
        facebook_adset_id: &str,
    ) -> Result<AdSetRecord, AppError> {
        let id = new_record_id();

        sqlx::query(
            r#"
            INSERT INTO ad_sets
                (id, owner_id, campaign_id, name, status, facebook_adset_id, spec)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(campaign_id)
        .bind(&adset.name)
        .bind(adset.status.as_str())
        .bind(facebook_adset_id)
        .bind(to_spec(adset)?)
        .execute(&self.pool)
        .await
        .context("inserting ad set")?;

        tracing::info!(
            "Stored ad set {} under campaign {} (facebook id {})",
            id,
            campaign_id,
            facebook_adset_id
        );

        self.find_adset(owner_id, &id)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Ad set {} vanished after insert", id)))
    }

    /// Loads an ad set together with its campaign's ad account.
    pub async fn find_adset(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<AdSetRecord>, AppError> {
        let record = sqlx::query_as::<_, AdSetRecord>(&format!(
            "{} WHERE s.id = $1 AND s.owner_id = $2",
            ADSET_SELECT
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .context("loading ad set")?;

        Ok(record)
    }

    pub async fn insert_ad(
        &self,
        owner_id: &str,
        adset_id: &str,
        ad: &NormalizedAd,
        facebook_ad_id: &str,
    ) -> Result<AdRecord, AppError> {
        let id = new_record_id();

        sqlx::query(
            r#"
            INSERT INTO ads
                (id, owner_id, adset_id, name, status, facebook_ad_id, spec)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(adset_id)
        .bind(&ad.name)
        .bind(ad.status.as_str())
        .bind(facebook_ad_id)
        .bind(to_spec(ad)?)
        .execute(&self.pool)
        .await
        .context("inserting ad")?;

        tracing::info!("Stored ad {} under ad set {}", id, adset_id);

        self.find_ad(owner_id, &id)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Ad {} vanished after insert", id)))
    }

    pub async fn find_ad(&self, owner_id: &str, id: &str) -> Result<Option<AdRecord>, AppError> {
        let record = sqlx::query_as::<_, AdRecord>(&format!(
            "{} WHERE a.id = $1 AND a.owner_id = $2",
            AD_SELECT
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .context("loading ad")?;

        Ok(record)
    }

    /// Applies a partial update; returns `false` when no row matched.
    pub async fn apply_patch(
        &self,
        kind: EntityKind,
        owner_id: &str,
        id: &str,
        patch: &RecordPatch<'_>,
    ) -> Result<bool, AppError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET name = COALESCE($3, name),
                status = COALESCE($4, status),
                spec = spec || $5::jsonb,
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            "#,
            kind.table()
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(patch.name)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(&patch.spec_patch)
            .execute(&self.pool)
            .await
            .with_context(|| format!("updating {} {}", kind.label(), id))?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft delete: only the status column changes.
    pub async fn set_status(
        &self,
        kind: EntityKind,
        owner_id: &str,
        id: &str,
        status: EntityStatus,
    ) -> Result<bool, AppError> {
        self.apply_patch(
            kind,
            owner_id,
            id,
            &RecordPatch {
                name: None,
                status: Some(status),
                spec_patch: serde_json::json!({ "status": status }),
            },
        )
        .await
    }
}
