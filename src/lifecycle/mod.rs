//! Use cases for tenders and bids. Each mutating operation runs as one transaction:
//! resolve the acting user, check rights against stored state, read the current row,
//! merge the change in memory, write it back guarded by the version that was read, and
//! append the history row. Any failure rolls the whole unit back.

use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Bid, Tender};
use crate::types::ServiceType;

pub mod bids;
pub mod tenders;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_FEEDBACK_LEN: usize = 1000;

/// Field-level delta for a tender. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TenderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<ServiceType>,
    pub organization_id: Option<Uuid>,
}

impl TenderPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.service_type.is_none()
            && self.organization_id.is_none()
    }

    fn validate(&self) -> ServiceResult<()> {
        if self.is_empty() {
            return Err(ServiceError::validation("no changes provided"));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Whether applying the patch would change any field of `current`.
    pub fn changes(&self, current: &Tender) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.trim() != current.name)
            || self
                .description
                .as_ref()
                .is_some_and(|description| *description != current.description)
            || self
                .service_type
                .is_some_and(|service_type| service_type != current.service_type)
            || self
                .organization_id
                .is_some_and(|organization_id| organization_id != current.organization_id)
    }

    /// The row that results from applying this patch to `current`, one version later.
    pub fn merge_onto(&self, current: &Tender, now: NaiveDateTime) -> Tender {
        Tender {
            name: self
                .name
                .as_deref()
                .map(|name| name.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            service_type: self.service_type.unwrap_or(current.service_type),
            organization_id: self.organization_id.unwrap_or(current.organization_id),
            version: current.version + 1,
            updated_at: now,
            ..current.clone()
        }
    }
}

/// Field-level delta for a bid.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BidPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl BidPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    fn validate(&self) -> ServiceResult<()> {
        if self.is_empty() {
            return Err(ServiceError::validation("no changes provided"));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    pub fn changes(&self, current: &Bid) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.trim() != current.name)
            || self
                .description
                .as_ref()
                .is_some_and(|description| *description != current.description)
    }

    pub fn merge_onto(&self, current: &Bid) -> Bid {
        Bid {
            name: self
                .name
                .as_deref()
                .map(|name| name.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            version: current.version + 1,
            ..current.clone()
        }
    }
}

pub(crate) fn validate_name(name: &str) -> ServiceResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("name must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn validate_description(description: &str) -> ServiceResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ServiceError::validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn validate_version(version: i32) -> ServiceResult<()> {
    if version < 1 {
        return Err(ServiceError::validation("version must be at least 1"));
    }
    Ok(())
}

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorType, BidStatus, TenderStatus};
    use chrono::NaiveDate;

    fn timestamp(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 1)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    fn tender() -> Tender {
        Tender {
            id: Uuid::new_v4(),
            name: "Tender 1".to_string(),
            description: "Road repair".to_string(),
            service_type: ServiceType::Construction,
            status: TenderStatus::Created,
            organization_id: Uuid::new_v4(),
            creator_username: "user1".to_string(),
            version: 1,
            created_at: timestamp(8),
            updated_at: timestamp(8),
        }
    }

    #[test]
    fn merge_keeps_untouched_fields_and_bumps_version() {
        let current = tender();
        let patch = TenderPatch {
            description: Some("Bridge repair".to_string()),
            ..TenderPatch::default()
        };

        let next = patch.merge_onto(&current, timestamp(9));

        assert_eq!(next.description, "Bridge repair");
        assert_eq!(next.name, current.name);
        assert_eq!(next.service_type, current.service_type);
        assert_eq!(next.organization_id, current.organization_id);
        assert_eq!(next.status, current.status);
        assert_eq!(next.created_at, current.created_at);
        assert_eq!(next.version, 2);
        assert_eq!(next.updated_at, timestamp(9));
    }

    #[test]
    fn merge_trims_names() {
        let patch = TenderPatch {
            name: Some("  Tender 1b ".to_string()),
            service_type: Some(ServiceType::Delivery),
            ..TenderPatch::default()
        };
        let next = patch.merge_onto(&tender(), timestamp(10));
        assert_eq!(next.name, "Tender 1b");
        assert_eq!(next.service_type, ServiceType::Delivery);
    }

    #[test]
    fn empty_patches_are_rejected() {
        assert!(matches!(
            TenderPatch::default().validate(),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            BidPatch::default().validate(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn patch_matching_current_row_changes_nothing() {
        let current = tender();
        let same_owner = TenderPatch {
            organization_id: Some(current.organization_id),
            ..TenderPatch::default()
        };
        assert!(!same_owner.changes(&current));

        let same_name = TenderPatch {
            name: Some(format!(" {} ", current.name)),
            service_type: Some(current.service_type),
            ..TenderPatch::default()
        };
        assert!(!same_name.changes(&current));

        let moved = TenderPatch {
            organization_id: Some(Uuid::new_v4()),
            ..TenderPatch::default()
        };
        assert!(moved.changes(&current));
    }

    #[test]
    fn names_are_bounded() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_description(&"d".repeat(MAX_DESCRIPTION_LEN + 1)).is_err());
    }

    #[test]
    fn bid_merge_bumps_version_only_for_given_fields() {
        let current = Bid {
            bid_id: Uuid::new_v4(),
            name: "Bid 1".to_string(),
            description: "Offer".to_string(),
            status: BidStatus::Published,
            tender_id: Uuid::new_v4(),
            author_type: AuthorType::User,
            author_id: Uuid::new_v4(),
            version: 4,
            created_at: timestamp(8),
        };
        let next = BidPatch {
            name: Some("Bid 1 revised".to_string()),
            description: None,
        }
        .merge_onto(&current);

        assert_eq!(next.name, "Bid 1 revised");
        assert_eq!(next.description, "Offer");
        assert_eq!(next.status, BidStatus::Published);
        assert_eq!(next.version, 5);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let parsed: Result<TenderPatch, _> =
            serde_json::from_str(r#"{"name":"T","status":"Closed"}"#);
        assert!(parsed.is_err());
        let parsed: TenderPatch =
            serde_json::from_str(r#"{"serviceType":"Manufacture"}"#).expect("valid patch");
        assert_eq!(parsed.service_type, Some(ServiceType::Manufacture));
    }
}
