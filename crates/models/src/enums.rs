//! Closed value sets stored as short strings.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Active/inactive flag shared by clients and catalog services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Only `Completed` payments affect a job's outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[sea_orm(string_value = "advance")]
    Advance,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "full")]
    Full,
    #[sea_orm(string_value = "refund")]
    Refund,
}

impl PaymentStatus {
    pub fn is_completed(self) -> bool { matches!(self, PaymentStatus::Completed) }
}

impl PaymentType {
    pub fn is_refund(self) -> bool { matches!(self, PaymentType::Refund) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_match_serde_names() {
        assert_eq!(PaymentStatus::Completed.to_value(), "completed");
        assert_eq!(serde_json::to_string(&PaymentType::Refund).unwrap(), "\"refund\"");
        assert_eq!(JobPriority::Urgent.to_value(), "urgent");
        assert_eq!(PaymentMethod::try_from_value(&"transfer".to_string()).unwrap(), PaymentMethod::Transfer);
    }

    #[test]
    fn defaults_follow_schema_defaults() {
        assert_eq!(RecordStatus::default(), RecordStatus::Active);
        assert_eq!(JobPriority::default(), JobPriority::Medium);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Completed);
    }

    #[test]
    fn unknown_value_is_rejected() {
        assert!(PaymentStatus::try_from_value(&"paid".to_string()).is_err());
    }
}
