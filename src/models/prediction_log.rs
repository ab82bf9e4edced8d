//! Prediction log model
//!
//! Append-only record of every prediction. Rows are never updated; the only
//! delete path is a bulk clear by the owning user (or the user-row cascade).

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// The two model families predictions can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    HeartDisease,
    BrainTumorMulticlass,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeartDisease => "heart_disease",
            Self::BrainTumorMulticlass => "brain_tumor_multiclass",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "heart_disease" => Some(Self::HeartDisease),
            "brain_tumor_multiclass" => Some(Self::BrainTumorMulticlass),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PredictionLog {
    pub id: i64,
    pub user_id: Uuid,
    pub model_type: String,
    pub input_summary: String,
    pub prediction_result: String,
    pub probability: f32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryFilter {
    pub model_type: Option<String>,
    pub limit: Option<i64>,
}

impl PredictionLog {
    /// Insert one row and return its generated id. Insert and id retrieval
    /// are a single statement, so the pair is atomic.
    pub async fn append(
        pool: &PgPool,
        user_id: Uuid,
        model_type: ModelType,
        input_summary: &str,
        prediction_result: &str,
        probability: f32,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO prediction_logs (user_id, model_type, input_summary, prediction_result, probability)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#
        )
        .bind(user_id)
        .bind(model_type.as_str())
        .bind(input_summary)
        .bind(prediction_result)
        .bind(probability)
        .fetch_one(pool)
        .await
    }

    /// Most recent entry for a user and model type, if any
    pub async fn latest(
        pool: &PgPool,
        user_id: Uuid,
        model_type: ModelType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PredictionLog>(
            r#"
            SELECT * FROM prediction_logs
            WHERE user_id = $1 AND model_type = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(user_id)
        .bind(model_type.as_str())
        .fetch_optional(pool)
        .await
    }

    /// Ownership-scoped lookup. A log belonging to another user comes back
    /// as None, indistinguishable from a log that does not exist.
    pub async fn find_for_user(
        pool: &PgPool,
        log_id: i64,
        user_id: Uuid,
        model_type: Option<ModelType>,
    ) -> Result<Option<Self>, sqlx::Error> {
        match model_type {
            Some(mt) => {
                sqlx::query_as::<_, PredictionLog>(
                    "SELECT * FROM prediction_logs WHERE id = $1 AND user_id = $2 AND model_type = $3"
                )
                .bind(log_id)
                .bind(user_id)
                .bind(mt.as_str())
                .fetch_optional(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, PredictionLog>(
                    "SELECT * FROM prediction_logs WHERE id = $1 AND user_id = $2"
                )
                .bind(log_id)
                .bind(user_id)
                .fetch_optional(pool)
                .await
            }
        }
    }

    /// A user's history, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: HistoryFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(50).clamp(1, 200);

        match filter.model_type.as_deref().and_then(ModelType::parse) {
            Some(mt) => {
                sqlx::query_as::<_, PredictionLog>(
                    r#"
                    SELECT * FROM prediction_logs
                    WHERE user_id = $1 AND model_type = $2
                    ORDER BY created_at DESC
                    LIMIT $3
                    "#
                )
                .bind(user_id)
                .bind(mt.as_str())
                .bind(limit)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, PredictionLog>(
                    r#"
                    SELECT * FROM prediction_logs
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Delete all entries for a user. Irreversible; returns rows removed.
    pub async fn clear_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prediction_logs WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_round_trip() {
        assert_eq!(ModelType::parse("heart_disease"), Some(ModelType::HeartDisease));
        assert_eq!(
            ModelType::parse("brain_tumor_multiclass"),
            Some(ModelType::BrainTumorMulticlass)
        );
        assert_eq!(ModelType::parse("unknown"), None);

        assert_eq!(ModelType::HeartDisease.as_str(), "heart_disease");
        assert_eq!(ModelType::BrainTumorMulticlass.as_str(), "brain_tumor_multiclass");
    }

    #[test]
    fn test_model_type_serde_matches_column_values() {
        let json = serde_json::to_string(&ModelType::HeartDisease).unwrap();
        assert_eq!(json, "\"heart_disease\"");
        let json = serde_json::to_string(&ModelType::BrainTumorMulticlass).unwrap();
        assert_eq!(json, "\"brain_tumor_multiclass\"");
    }
}
