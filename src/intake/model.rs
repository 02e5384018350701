//! Lead data models: collected fields, intents, the validated lead record.

use serde::{Deserialize, Serialize};

use crate::error::LeadError;

/// What the latest utterance is asking about.
///
/// Recomputed on every turn; never sticky.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    General,
    ServiceInquiry,
    ProjectInquiry,
    PricingInquiry,
    ContactRequest,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::General => "general",
            Self::ServiceInquiry => "service_inquiry",
            Self::ProjectInquiry => "project_inquiry",
            Self::PricingInquiry => "pricing_inquiry",
            Self::ContactRequest => "contact_request",
        };
        write!(f, "{s}")
    }
}

/// Names of the fields a lead can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Name,
    Email,
    Company,
    Phone,
    ProjectType,
    Budget,
    Timeline,
    Description,
}

impl LeadField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Company => "company",
            Self::Phone => "phone",
            Self::ProjectType => "project_type",
            Self::Budget => "budget",
            Self::Timeline => "timeline",
            Self::Description => "description",
        }
    }

    /// Human label used when steering the conversation.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Company => "Company",
            Self::Phone => "Phone",
            Self::ProjectType => "Project Type",
            Self::Budget => "Budget",
            Self::Timeline => "Timeline",
            Self::Description => "Brief Requirement",
        }
    }
}

impl std::fmt::Display for LeadField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields collected from the conversation so far.
///
/// Every field is unset until extracted. Merging is first-write-wins: a set
/// field is never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LeadFields {
    /// Preferred collection order.
    pub const ORDER: [LeadField; 8] = [
        LeadField::Name,
        LeadField::Email,
        LeadField::Company,
        LeadField::ProjectType,
        LeadField::Description,
        LeadField::Timeline,
        LeadField::Budget,
        LeadField::Phone,
    ];

    pub fn get(&self, field: LeadField) -> Option<&str> {
        match field {
            LeadField::Name => self.name.as_deref(),
            LeadField::Email => self.email.as_deref(),
            LeadField::Company => self.company.as_deref(),
            LeadField::Phone => self.phone.as_deref(),
            LeadField::ProjectType => self.project_type.as_deref(),
            LeadField::Budget => self.budget.as_deref(),
            LeadField::Timeline => self.timeline.as_deref(),
            LeadField::Description => self.description.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: LeadField) -> &mut Option<String> {
        match field {
            LeadField::Name => &mut self.name,
            LeadField::Email => &mut self.email,
            LeadField::Company => &mut self.company,
            LeadField::Phone => &mut self.phone,
            LeadField::ProjectType => &mut self.project_type,
            LeadField::Budget => &mut self.budget,
            LeadField::Timeline => &mut self.timeline,
            LeadField::Description => &mut self.description,
        }
    }

    pub fn is_set(&self, field: LeadField) -> bool {
        self.get(field).is_some()
    }

    /// Set a field only if it is currently unset. Returns whether it was written.
    pub fn set_if_unset(&mut self, field: LeadField, value: impl Into<String>) -> bool {
        let slot = self.slot_mut(field);
        if slot.is_some() {
            return false;
        }
        *slot = Some(value.into());
        true
    }

    /// Merge newly extracted fields; already-set fields win.
    pub fn merge(&mut self, extracted: LeadFields) {
        for field in Self::ORDER {
            if let Some(value) = extracted.get(field) {
                self.set_if_unset(field, value);
            }
        }
    }

    /// Fields that are set, in collection order.
    pub fn set_fields(&self) -> Vec<LeadField> {
        Self::ORDER.into_iter().filter(|f| self.is_set(*f)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.set_fields().is_empty()
    }

    /// Minimum viable lead: name and email.
    pub fn has_basic_info(&self) -> bool {
        self.name.is_some() && self.email.is_some()
    }

    pub fn has_project_info(&self) -> bool {
        self.project_type.is_some() || self.description.is_some()
    }
}

/// The validated hand-off record for the email and scheduling collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TryFrom<&LeadFields> for LeadRecord {
    type Error = LeadError;

    fn try_from(fields: &LeadFields) -> Result<Self, Self::Error> {
        let name = non_blank(&fields.name).ok_or(LeadError::MissingField("name"))?;
        let email = non_blank(&fields.email).ok_or(LeadError::MissingField("email"))?;
        if !super::rules::is_email(&email) {
            return Err(LeadError::InvalidEmail(email));
        }

        Ok(Self {
            name,
            email,
            company: non_blank(&fields.company),
            phone: non_blank(&fields.phone),
            project_type: non_blank(&fields.project_type),
            budget: non_blank(&fields.budget),
            timeline: non_blank(&fields.timeline),
            description: non_blank(&fields.description),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A suggestion chip that pre-fills the input box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub label: &'static str,
    pub icon: &'static str,
    pub action: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: Option<&str>, email: Option<&str>) -> LeadFields {
        LeadFields {
            name: name.map(String::from),
            email: email.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn merge_fills_unset_fields_only() {
        let mut current = fields(Some("Sam"), None);
        current.merge(LeadFields {
            name: Some("Someone Else".into()),
            email: Some("sam@x.com".into()),
            ..Default::default()
        });
        assert_eq!(current.name.as_deref(), Some("Sam"));
        assert_eq!(current.email.as_deref(), Some("sam@x.com"));
    }

    #[test]
    fn merging_empty_is_identity() {
        let samples = [
            LeadFields::default(),
            fields(Some("Sam"), Some("sam@x.com")),
            LeadFields {
                project_type: Some("Mobile App".into()),
                budget: Some("$20k".into()),
                ..Default::default()
            },
        ];
        for sample in samples {
            let mut merged = sample.clone();
            merged.merge(LeadFields::default());
            assert_eq!(merged, sample);
        }
    }

    #[test]
    fn set_if_unset_reports_write() {
        let mut f = LeadFields::default();
        assert!(f.set_if_unset(LeadField::Company, "Acme"));
        assert!(!f.set_if_unset(LeadField::Company, "Other"));
        assert_eq!(f.company.as_deref(), Some("Acme"));
    }

    #[test]
    fn basic_and_project_info() {
        assert!(!fields(Some("Sam"), None).has_basic_info());
        assert!(fields(Some("Sam"), Some("sam@x.com")).has_basic_info());

        let mut f = LeadFields::default();
        assert!(!f.has_project_info());
        f.description = Some("An inventory tracker for three warehouses".into());
        assert!(f.has_project_info());
    }

    #[test]
    fn serializes_only_set_fields() {
        let json = serde_json::to_value(fields(Some("Sam"), None)).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Sam" }));
    }

    #[test]
    fn lead_record_requires_name_and_email() {
        assert_eq!(
            LeadRecord::try_from(&fields(None, Some("sam@x.com"))),
            Err(LeadError::MissingField("name"))
        );
        assert_eq!(
            LeadRecord::try_from(&fields(Some("Sam"), Some("  "))),
            Err(LeadError::MissingField("email"))
        );
    }

    #[test]
    fn lead_record_rejects_malformed_email() {
        let err = LeadRecord::try_from(&fields(Some("Sam"), Some("sam at x"))).unwrap_err();
        assert!(matches!(err, LeadError::InvalidEmail(_)));
    }

    #[test]
    fn lead_record_carries_optional_fields() {
        let mut f = fields(Some(" Sam "), Some("sam@x.com"));
        f.company = Some("Acme".into());
        f.project_type = Some("Web Application".into());
        let record = LeadRecord::try_from(&f).unwrap();
        assert_eq!(record.name, "Sam");
        assert_eq!(record.company.as_deref(), Some("Acme"));
        assert_eq!(record.project_type.as_deref(), Some("Web Application"));
        assert!(record.phone.is_none());
    }

    #[test]
    fn intent_display_matches_serde() {
        let intents = [
            Intent::General,
            Intent::ServiceInquiry,
            Intent::ProjectInquiry,
            Intent::PricingInquiry,
            Intent::ContactRequest,
        ];
        for intent in intents {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(format!("\"{intent}\""), json);
        }
    }
}
