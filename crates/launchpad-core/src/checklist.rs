use crate::error::{LaunchpadError, Result};
use crate::types::{ChecklistCategory, Collection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub project_id: String,
    pub category: ChecklistCategory,
    pub item_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChecklistItem {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        category: ChecklistCategory,
        item_key: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            category,
            item_key: item_key.into(),
            title: title.into(),
            is_completed: false,
            completed_at: None,
        }
    }

    pub fn from_record(record: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(record.clone()).map_err(|e| LaunchpadError::MalformedRecord {
            collection: Collection::ChecklistItems.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_records(records: &[serde_json::Value]) -> Result<Vec<Self>> {
        records.iter().map(Self::from_record).collect()
    }
}

// ---------------------------------------------------------------------------
// Templates seeded at project initialization
// ---------------------------------------------------------------------------

/// Default `(item_key, title)` pairs for a category.
///
/// `store_listing` has one entry per listing field except the content
/// rating, which is tracked by the review team outside the checklist.
pub fn template(category: ChecklistCategory) -> &'static [(&'static str, &'static str)] {
    match category {
        ChecklistCategory::StoreListing => &[
            ("app_title", "App title"),
            ("subtitle", "Subtitle"),
            ("description", "Description"),
            ("keywords", "Keywords"),
            ("promotional_text", "Promotional text"),
            ("support_url", "Support URL"),
            ("marketing_url", "Marketing URL"),
            ("privacy_policy", "Privacy policy"),
            ("primary_category", "Primary category"),
            ("release_notes", "Release notes"),
        ],
        ChecklistCategory::PreLaunch => &[
            ("beta_feedback_reviewed", "Beta feedback reviewed"),
            ("crash_free_sessions", "Crash-free sessions above target"),
            ("press_kit_ready", "Press kit ready"),
            ("ambassadors_briefed", "Ambassadors briefed"),
        ],
        ChecklistCategory::LaunchDay => &[
            ("build_submitted", "Build submitted for review"),
            ("launch_announcement_posted", "Launch announcement posted"),
            ("pricing_confirmed", "Pricing confirmed"),
        ],
        ChecklistCategory::PostLaunch => &[
            ("crash_rate_reviewed", "Crash rate reviewed"),
            ("reviews_answered", "Store reviews answered"),
            ("retrospective_held", "Launch retrospective held"),
        ],
    }
}

// ---------------------------------------------------------------------------
// Queries over a loaded snapshot
// ---------------------------------------------------------------------------

pub fn find_by_key<'a>(items: &'a [ChecklistItem], item_key: &str) -> Option<&'a ChecklistItem> {
    items.iter().find(|i| i.item_key == item_key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

pub fn progress(items: &[ChecklistItem]) -> Progress {
    let total = items.len();
    let completed = items.iter().filter(|i| i.is_completed).count();
    let percent = if total == 0 {
        0
    } else {
        ((completed * 100) / total) as u8
    };
    Progress {
        completed,
        total,
        percent,
    }
}

/// Human-readable summary: "4/10 complete (40%)"
pub fn summarize(items: &[ChecklistItem]) -> String {
    let p = progress(items);
    format!("{}/{} complete ({}%)", p.completed, p.total, p.percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingField;
    use serde_json::json;

    fn item(key: &str, done: bool) -> ChecklistItem {
        let mut i = ChecklistItem::new(
            format!("id-{key}"),
            "p1",
            ChecklistCategory::StoreListing,
            key,
            key,
        );
        i.is_completed = done;
        i
    }

    #[test]
    fn find_by_key_returns_match() {
        let items = vec![item("app_title", true), item("keywords", false)];
        assert_eq!(find_by_key(&items, "keywords").unwrap().id, "id-keywords");
        assert!(find_by_key(&items, "content_rating").is_none());
    }

    #[test]
    fn progress_counts_completed() {
        let items = vec![item("a", true), item("b", false), item("c", true)];
        let p = progress(&items);
        assert_eq!(p.completed, 2);
        assert_eq!(p.total, 3);
        assert_eq!(p.percent, 66);
        assert_eq!(summarize(&items), "2/3 complete (66%)");
    }

    #[test]
    fn progress_of_empty_list_is_zero() {
        assert_eq!(progress(&[]).percent, 0);
    }

    #[test]
    fn store_listing_template_skips_content_rating() {
        let keys: Vec<&str> = template(ChecklistCategory::StoreListing)
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert!(!keys.contains(&"content_rating"));
        for field in ListingField::all() {
            if *field != ListingField::ContentRating {
                assert!(keys.contains(&field.item_key()), "missing {field}");
            }
        }
    }

    #[test]
    fn from_record_parses_wire_shape() {
        let rec = json!({
            "id": "c1",
            "project_id": "p1",
            "category": "store_listing",
            "item_key": "keywords",
            "title": "Keywords",
            "is_completed": false,
            "completed_at": null
        });
        let parsed = ChecklistItem::from_record(&rec).unwrap();
        assert_eq!(parsed.item_key, "keywords");
        assert!(!parsed.is_completed);
    }

    #[test]
    fn from_record_rejects_unknown_category() {
        let rec = json!({
            "id": "c1",
            "project_id": "p1",
            "category": "marketing",
            "item_key": "x"
        });
        assert!(matches!(
            ChecklistItem::from_record(&rec),
            Err(LaunchpadError::MalformedRecord { .. })
        ));
    }
}
