use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Projects,
    StoreListings,
    ChecklistItems,
    Tasks,
}

impl Collection {
    pub fn all() -> &'static [Collection] {
        &[
            Collection::Projects,
            Collection::StoreListings,
            Collection::ChecklistItems,
            Collection::Tasks,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::StoreListings => "store_listings",
            Collection::ChecklistItems => "checklist_items",
            Collection::Tasks => "tasks",
        }
    }

    /// Collections whose cached reads embed data derived from this one.
    /// A write here must invalidate them too.
    pub fn dependents(self) -> &'static [Collection] {
        match self {
            // project cards carry launch progress
            Collection::ChecklistItems => &[Collection::Projects],
            // project cards show the listing title
            Collection::StoreListings => &[Collection::Projects],
            Collection::Projects | Collection::Tasks => &[],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = crate::error::LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::error::LaunchpadError::InvalidCollection(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ChecklistCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistCategory {
    StoreListing,
    PreLaunch,
    LaunchDay,
    PostLaunch,
}

impl ChecklistCategory {
    pub fn all() -> &'static [ChecklistCategory] {
        &[
            ChecklistCategory::StoreListing,
            ChecklistCategory::PreLaunch,
            ChecklistCategory::LaunchDay,
            ChecklistCategory::PostLaunch,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChecklistCategory::StoreListing => "store_listing",
            ChecklistCategory::PreLaunch => "pre_launch",
            ChecklistCategory::LaunchDay => "launch_day",
            ChecklistCategory::PostLaunch => "post_launch",
        }
    }
}

impl fmt::Display for ChecklistCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChecklistCategory {
    type Err = crate::error::LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChecklistCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::error::LaunchpadError::InvalidCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FieldStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Empty,
    Filled,
    Saving,
}

impl FieldStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldStatus::Empty => "empty",
            FieldStatus::Filled => "filled",
            FieldStatus::Saving => "saving",
        }
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scalar / Filters
// ---------------------------------------------------------------------------

/// A single comparable value used in filters and cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Scalar {
    /// Whether a JSON field value equals this scalar.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (Scalar::Null, Value::Null) => true,
            (Scalar::Bool(a), Value::Bool(b)) => a == b,
            (Scalar::Int(a), Value::Number(n)) => n.as_i64() == Some(*a),
            (Scalar::Str(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    /// Rendering used in query strings (`col=eq.<value>`).
    pub fn to_query_value(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Str(s) => s.clone(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_value())
    }
}

/// Column-equality filters. Sorted by column name so every consumer sees the
/// same order.
pub type Filters = BTreeMap<String, Scalar>;

/// Build a `Filters` map from `(column, value)` pairs.
pub fn filters<I, K, V>(pairs: I) -> Filters
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Scalar>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
