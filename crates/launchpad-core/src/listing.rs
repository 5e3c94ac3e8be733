use crate::error::{LaunchpadError, Result};
use crate::types::Collection;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ListingField
// ---------------------------------------------------------------------------

/// An editable field of an app store listing.
///
/// The set is closed: every field that can be synchronized with the
/// `store_listing` checklist appears here, and [`ListingField::item_key`] is
/// the mapping table from form field to checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingField {
    Name,
    Subtitle,
    Description,
    Keywords,
    PromotionalText,
    SupportUrl,
    MarketingUrl,
    PrivacyPolicyUrl,
    PrimaryCategory,
    ContentRating,
    WhatsNew,
}

impl ListingField {
    pub fn all() -> &'static [ListingField] {
        &[
            ListingField::Name,
            ListingField::Subtitle,
            ListingField::Description,
            ListingField::Keywords,
            ListingField::PromotionalText,
            ListingField::SupportUrl,
            ListingField::MarketingUrl,
            ListingField::PrivacyPolicyUrl,
            ListingField::PrimaryCategory,
            ListingField::ContentRating,
            ListingField::WhatsNew,
        ]
    }

    /// Column name on the store listing record.
    pub fn as_str(self) -> &'static str {
        match self {
            ListingField::Name => "name",
            ListingField::Subtitle => "subtitle",
            ListingField::Description => "description",
            ListingField::Keywords => "keywords",
            ListingField::PromotionalText => "promotional_text",
            ListingField::SupportUrl => "support_url",
            ListingField::MarketingUrl => "marketing_url",
            ListingField::PrivacyPolicyUrl => "privacy_policy_url",
            ListingField::PrimaryCategory => "primary_category",
            ListingField::ContentRating => "content_rating",
            ListingField::WhatsNew => "whats_new",
        }
    }

    /// `item_key` of the checklist item that tracks this field.
    pub fn item_key(self) -> &'static str {
        match self {
            ListingField::Name => "app_title",
            ListingField::Subtitle => "subtitle",
            ListingField::Description => "description",
            ListingField::Keywords => "keywords",
            ListingField::PromotionalText => "promotional_text",
            ListingField::SupportUrl => "support_url",
            ListingField::MarketingUrl => "marketing_url",
            ListingField::PrivacyPolicyUrl => "privacy_policy",
            ListingField::PrimaryCategory => "primary_category",
            ListingField::ContentRating => "content_rating",
            ListingField::WhatsNew => "release_notes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListingField::Name => "App title",
            ListingField::Subtitle => "Subtitle",
            ListingField::Description => "Description",
            ListingField::Keywords => "Keywords",
            ListingField::PromotionalText => "Promotional text",
            ListingField::SupportUrl => "Support URL",
            ListingField::MarketingUrl => "Marketing URL",
            ListingField::PrivacyPolicyUrl => "Privacy policy URL",
            ListingField::PrimaryCategory => "Primary category",
            ListingField::ContentRating => "Content rating",
            ListingField::WhatsNew => "Release notes",
        }
    }
}

impl fmt::Display for ListingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingField {
    type Err = LaunchpadError;

    fn from_str(s: &str) -> Result<Self> {
        ListingField::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| LaunchpadError::InvalidField(s.to_string()))
    }
}

/// A form value counts as filled once it has non-whitespace content.
pub fn has_value(value: &str) -> bool {
    !value.trim().is_empty()
}

// ---------------------------------------------------------------------------
// StoreListing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreListing {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub promotional_text: Option<String>,
    #[serde(default)]
    pub support_url: Option<String>,
    #[serde(default)]
    pub marketing_url: Option<String>,
    #[serde(default)]
    pub privacy_policy_url: Option<String>,
    #[serde(default)]
    pub primary_category: Option<String>,
    #[serde(default)]
    pub content_rating: Option<String>,
    #[serde(default)]
    pub whats_new: Option<String>,
}

impl StoreListing {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    pub fn value(&self, field: ListingField) -> Option<&str> {
        let v = match field {
            ListingField::Name => &self.name,
            ListingField::Subtitle => &self.subtitle,
            ListingField::Description => &self.description,
            ListingField::Keywords => &self.keywords,
            ListingField::PromotionalText => &self.promotional_text,
            ListingField::SupportUrl => &self.support_url,
            ListingField::MarketingUrl => &self.marketing_url,
            ListingField::PrivacyPolicyUrl => &self.privacy_policy_url,
            ListingField::PrimaryCategory => &self.primary_category,
            ListingField::ContentRating => &self.content_rating,
            ListingField::WhatsNew => &self.whats_new,
        };
        v.as_deref()
    }

    pub fn from_record(record: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(record.clone()).map_err(|e| LaunchpadError::MalformedRecord {
            collection: Collection::StoreListings.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mapping_table_covers_scenario_fields() {
        assert_eq!(ListingField::Name.item_key(), "app_title");
        assert_eq!(ListingField::Keywords.item_key(), "keywords");
        assert_eq!(ListingField::ContentRating.item_key(), "content_rating");
    }

    #[test]
    fn item_keys_are_unique() {
        let mut keys: Vec<&str> = ListingField::all().iter().map(|f| f.item_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), ListingField::all().len());
    }

    #[test]
    fn unknown_field_is_invalid() {
        let err = "app_icon".parse::<ListingField>().unwrap_err();
        assert!(matches!(err, LaunchpadError::InvalidField(ref f) if f == "app_icon"));
    }

    #[test]
    fn field_names_roundtrip() {
        for f in ListingField::all() {
            assert_eq!(f.as_str().parse::<ListingField>().unwrap(), *f);
        }
    }

    #[test]
    fn has_value_trims_whitespace() {
        assert!(has_value("fitness, coach"));
        assert!(!has_value(""));
        assert!(!has_value("  \t\n"));
        assert!(has_value(" x "));
    }

    #[test]
    fn listing_from_record_reads_values() {
        let rec = json!({
            "id": "l1",
            "project_id": "p1",
            "name": "MyApp",
            "keywords": null,
            "unrelated_column": 3
        });
        let listing = StoreListing::from_record(&rec).unwrap();
        assert_eq!(listing.value(ListingField::Name), Some("MyApp"));
        assert_eq!(listing.value(ListingField::Keywords), None);
    }

    #[test]
    fn listing_from_record_rejects_missing_id() {
        let err = StoreListing::from_record(&json!({ "project_id": "p1" })).unwrap_err();
        assert!(matches!(err, LaunchpadError::MalformedRecord { .. }));
    }
}
