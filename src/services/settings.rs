use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::system_setting;
use crate::error::AppResult;

pub const BUSINESS_CATEGORY: &str = "business";

/// Business-rule knobs consumed by the booking core. Values are read
/// fresh on every use; a change takes effect on the next read.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessSettings {
    pub payment_timeout_minutes: i64,
    pub reschedule_fee_rate: Decimal,
    pub refund_fee_rate: Decimal,
    pub min_reschedule_hours: i64,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            payment_timeout_minutes: 30,
            reschedule_fee_rate: Decimal::new(5, 2),
            refund_fee_rate: Decimal::new(5, 2),
            min_reschedule_hours: 2,
        }
    }
}

impl BusinessSettings {
    /// Load the business category; missing or malformed keys keep their
    /// defaults.
    pub async fn load<C: ConnectionTrait>(conn: &C) -> AppResult<Self> {
        let rows = system_setting::Entity::find()
            .filter(system_setting::Column::Category.eq(BUSINESS_CATEGORY))
            .all(conn)
            .await?;

        let mut settings = Self::default();
        for row in rows {
            match row.key.as_str() {
                "payment_timeout" => {
                    if let Ok(v) = row.value.parse() {
                        settings.payment_timeout_minutes = v;
                    }
                }
                "reschedule_fee_rate" => {
                    if let Ok(v) = Decimal::from_str(&row.value) {
                        settings.reschedule_fee_rate = v;
                    }
                }
                "refund_fee_rate" => {
                    if let Ok(v) = Decimal::from_str(&row.value) {
                        settings.refund_fee_rate = v;
                    }
                }
                "min_reschedule_hours" => {
                    if let Ok(v) = row.value.parse() {
                        settings.min_reschedule_hours = v;
                    }
                }
                _ => {}
            }
        }
        Ok(settings)
    }

    /// Seed rows for a fresh database, one per business key.
    pub fn default_entries() -> Vec<(&'static str, String, &'static str)> {
        let defaults = Self::default();
        vec![
            (
                "payment_timeout",
                defaults.payment_timeout_minutes.to_string(),
                "Minutes before an unpaid order expires",
            ),
            (
                "reschedule_fee_rate",
                defaults.reschedule_fee_rate.to_string(),
                "Reschedule fee as a fraction of the original ticket price",
            ),
            (
                "refund_fee_rate",
                defaults.refund_fee_rate.to_string(),
                "Refund fee as a fraction of the ticket price",
            ),
            (
                "min_reschedule_hours",
                defaults.min_reschedule_hours.to_string(),
                "Minimum hours before departure for a reschedule",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<system_setting::Model>::new()])
            .into_connection();

        let settings = BusinessSettings::load(&db).await.unwrap();
        assert_eq!(settings, BusinessSettings::default());
        assert_eq!(settings.payment_timeout_minutes, 30);
        assert_eq!(settings.reschedule_fee_rate, Decimal::new(5, 2));
        assert_eq!(settings.min_reschedule_hours, 2);
    }

    #[tokio::test]
    async fn test_overrides_and_malformed_values() {
        let rows = vec![
            system_setting::Model {
                id: 1,
                category: BUSINESS_CATEGORY.to_string(),
                key: "payment_timeout".to_string(),
                value: "45".to_string(),
                description: None,
                updated_at: chrono::Utc::now().into(),
            },
            system_setting::Model {
                id: 2,
                category: BUSINESS_CATEGORY.to_string(),
                key: "reschedule_fee_rate".to_string(),
                value: "0.10".to_string(),
                description: None,
                updated_at: chrono::Utc::now().into(),
            },
            system_setting::Model {
                id: 3,
                category: BUSINESS_CATEGORY.to_string(),
                key: "min_reschedule_hours".to_string(),
                value: "not-a-number".to_string(),
                description: None,
                updated_at: chrono::Utc::now().into(),
            },
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();

        let settings = BusinessSettings::load(&db).await.unwrap();
        assert_eq!(settings.payment_timeout_minutes, 45);
        assert_eq!(settings.reschedule_fee_rate, Decimal::new(10, 2));
        // malformed value keeps the default
        assert_eq!(settings.min_reschedule_hours, 2);
    }
}
