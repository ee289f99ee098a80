use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::normalize;
use crate::store::server_timestamp;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// Ticket status. Tickets are created `pending`; approval and rejection are
/// performed outside this service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

pub mod keys {
    pub const REQUESTER: &str = "requester";
    pub const DEPARTMENT: &str = "department";
    pub const URGENCY: &str = "urgency";
    pub const PART_NAME: &str = "partName";
    pub const PART_DESCRIPTION: &str = "partDescription";
    pub const QUANTITY: &str = "quantity";
    pub const VEHICLE_MODEL: &str = "vehicleModel";
    pub const TECHNICAL_SPECS: &str = "technicalSpecs";
    pub const JUSTIFICATION: &str = "justification";
    pub const NOTES: &str = "notes";
    pub const ESTIMATED_COST: &str = "estimatedCost";
    pub const IMAGE: &str = "image";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = "createdAt";
}

/// A submitted part request, as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartApplication {
    pub id: String,
    pub requester: String,
    pub department: String,
    pub urgency: Urgency,
    pub part_name: Option<String>,
    pub part_description: Option<String>,
    pub quantity: u32,
    pub vehicle_model: Option<String>,
    pub technical_specs: Option<String>,
    pub justification: Option<String>,
    pub notes: Option<String>,
    pub estimated_cost: Option<Decimal>,
    /// Blob path of the attached image
    pub image: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl PartApplication {
    pub fn from_raw(id: &str, raw: &Value) -> Self {
        let empty = Map::new();
        let raw = raw.as_object().unwrap_or(&empty);
        let created_at = raw
            .get(keys::CREATED_AT)
            .and_then(Value::as_i64)
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .unwrap_or_default();

        Self {
            id: id.to_string(),
            requester: normalize::text(raw, keys::REQUESTER).unwrap_or_default(),
            department: normalize::text(raw, keys::DEPARTMENT).unwrap_or_default(),
            urgency: normalize::text(raw, keys::URGENCY)
                .and_then(|u| u.parse().ok())
                .unwrap_or_default(),
            part_name: normalize::text(raw, keys::PART_NAME),
            part_description: normalize::text(raw, keys::PART_DESCRIPTION),
            quantity: normalize::quantity(raw, keys::QUANTITY).clamp(1, u32::MAX as u64) as u32,
            vehicle_model: normalize::text(raw, keys::VEHICLE_MODEL),
            technical_specs: normalize::text(raw, keys::TECHNICAL_SPECS),
            justification: normalize::text(raw, keys::JUSTIFICATION),
            notes: normalize::text(raw, keys::NOTES),
            estimated_cost: normalize::decimal(raw, keys::ESTIMATED_COST),
            image: normalize::text(raw, keys::IMAGE),
            status: normalize::text(raw, keys::STATUS)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            created_at,
        }
    }

    /// Fields without which a ticket cannot be rendered
    pub fn missing_mandatory_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.id.trim().is_empty() {
            missing.push("id".to_string());
        }
        if self.requester.trim().is_empty() {
            missing.push("requester".to_string());
        }
        if self.department.trim().is_empty() {
            missing.push("department".to_string());
        }
        if self.part_name.is_none()
            && self.part_description.is_none()
            && self.technical_specs.is_none()
        {
            missing.push("part_name|part_description|technical_specs".to_string());
        }
        missing
    }
}

/// Image attached to a submission
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ImageUpload {
    /// `image/png`, `image/jpeg` or `image/webp`
    pub content_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

/// Request body of a ticket submission
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct NewApplication {
    #[validate(length(max = 120))]
    #[serde(default)]
    pub requester: String,
    #[validate(length(max = 120))]
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[validate(length(max = 200))]
    pub part_name: Option<String>,
    #[validate(length(max = 4000))]
    pub part_description: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: Option<u32>,
    #[validate(length(max = 120))]
    pub vehicle_model: Option<String>,
    #[validate(length(max = 4000))]
    pub technical_specs: Option<String>,
    #[validate(length(max = 4000))]
    pub justification: Option<String>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
    #[validate(custom = "validate_cost")]
    pub estimated_cost: Option<Decimal>,
    pub image: Option<ImageUpload>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl NewApplication {
    /// Required fields that are empty: requester, department, and at least
    /// one of part name, part description or technical specs
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.requester.trim().is_empty() {
            missing.push("requester".to_string());
        }
        if self.department.trim().is_empty() {
            missing.push("department".to_string());
        }
        if non_blank(&self.part_name).is_none()
            && non_blank(&self.part_description).is_none()
            && non_blank(&self.technical_specs).is_none()
        {
            missing.push("part_name|part_description|technical_specs".to_string());
        }
        missing
    }

    /// Full stored record with status `pending` and a server-assigned creation time
    pub fn to_record(&self, image_path: Option<&str>) -> Value {
        let mut record = Map::new();
        record.insert(keys::REQUESTER.into(), json!(self.requester.trim()));
        record.insert(keys::DEPARTMENT.into(), json!(self.department.trim()));
        record.insert(keys::URGENCY.into(), json!(self.urgency.to_string()));
        record.insert(keys::QUANTITY.into(), json!(self.quantity.unwrap_or(1)));

        let optional = [
            (keys::PART_NAME, &self.part_name),
            (keys::PART_DESCRIPTION, &self.part_description),
            (keys::VEHICLE_MODEL, &self.vehicle_model),
            (keys::TECHNICAL_SPECS, &self.technical_specs),
            (keys::JUSTIFICATION, &self.justification),
            (keys::NOTES, &self.notes),
        ];
        for (key, value) in optional {
            if let Some(text) = non_blank(value) {
                record.insert(key.into(), json!(text));
            }
        }

        if let Some(cost) = self.estimated_cost {
            record.insert(keys::ESTIMATED_COST.into(), json!(cost.to_string()));
        }
        if let Some(path) = image_path {
            record.insert(keys::IMAGE.into(), json!(path));
        }
        record.insert(
            keys::STATUS.into(),
            json!(ApplicationStatus::Pending.to_string()),
        );
        record.insert(keys::CREATED_AT.into(), server_timestamp());
        Value::Object(record)
    }
}

fn validate_cost(cost: &Decimal) -> Result<(), ValidationError> {
    if cost.is_sign_negative() && !cost.is_zero() {
        let mut err = ValidationError::new("estimated_cost");
        err.message = Some("estimated_cost must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::is_server_timestamp;
    use rust_decimal_macros::dec;

    fn bolt_request() -> NewApplication {
        NewApplication {
            requester: "Alice".into(),
            department: "Eng".into(),
            technical_specs: Some("bolt".into()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_fields_lists_every_gap() {
        let empty = NewApplication {
            technical_specs: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            empty.missing_fields(),
            vec![
                "requester".to_string(),
                "department".to_string(),
                "part_name|part_description|technical_specs".to_string()
            ]
        );
        assert!(bolt_request().missing_fields().is_empty());
    }

    #[test]
    fn record_is_pending_with_server_timestamp() {
        let record = bolt_request().to_record(None);
        assert_eq!(record["status"], json!("pending"));
        assert_eq!(record["urgency"], json!("medium"));
        assert_eq!(record["quantity"], json!(1));
        assert!(is_server_timestamp(&record["createdAt"]));
        assert!(record.get("justification").is_none());
    }

    #[test]
    fn stored_record_reads_back() {
        let mut record = NewApplication {
            estimated_cost: Some(dec!(12.5)),
            urgency: Urgency::High,
            ..bolt_request()
        }
        .to_record(Some("applications/abc.png"));
        record["createdAt"] = json!(1_700_000_000_000i64);

        let ticket = PartApplication::from_raw("abc", &record);
        assert_eq!(ticket.requester, "Alice");
        assert_eq!(ticket.technical_specs.as_deref(), Some("bolt"));
        assert_eq!(ticket.estimated_cost, Some(dec!(12.5)));
        assert_eq!(ticket.urgency, Urgency::High);
        assert_eq!(ticket.status, ApplicationStatus::Pending);
        assert_eq!(ticket.image.as_deref(), Some("applications/abc.png"));
        assert_eq!(ticket.created_at.timestamp_millis(), 1_700_000_000_000);
        assert!(ticket.missing_mandatory_fields().is_empty());
    }

    #[test]
    fn negative_cost_fails_validation() {
        let request = NewApplication {
            estimated_cost: Some(dec!(-1)),
            ..bolt_request()
        };
        assert!(request.validate().is_err());
        assert!(bolt_request().validate().is_ok());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "Approved".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Approved
        );
        assert_eq!(ApplicationStatus::Rejected.to_string(), "rejected");
    }
}
