use crate::error::Result;
use crate::listing::{ListingField, StoreListing};
use crate::store::RemoteStore;
use crate::sync::{FieldSynchronizer, SyncOutcome};
use crate::types::FieldStatus;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// In-memory copy of a listing form.
///
/// Edits stay local until saved. Saving a field runs it through the
/// listing's [`FieldSynchronizer`] and clears its dirty mark on success.
pub struct EditSession<S> {
    sync: Arc<FieldSynchronizer<S>>,
    values: BTreeMap<ListingField, String>,
    dirty: BTreeSet<ListingField>,
}

impl<S: RemoteStore> EditSession<S> {
    pub fn hydrate(sync: Arc<FieldSynchronizer<S>>, listing: &StoreListing) -> Self {
        let values = ListingField::all()
            .iter()
            .map(|f| (*f, listing.value(*f).unwrap_or_default().to_string()))
            .collect();
        Self {
            sync,
            values,
            dirty: BTreeSet::new(),
        }
    }

    pub fn synchronizer(&self) -> &Arc<FieldSynchronizer<S>> {
        &self.sync
    }

    pub fn value(&self, field: ListingField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or_default()
    }

    /// Edit a field locally. Setting the value it already holds is a no-op.
    pub fn set(&mut self, field: ListingField, value: impl Into<String>) {
        let value = value.into();
        if self.value(field) == value {
            return;
        }
        self.values.insert(field, value);
        self.dirty.insert(field);
    }

    pub fn set_named(&mut self, field_name: &str, value: impl Into<String>) -> Result<()> {
        let field: ListingField = field_name.parse()?;
        self.set(field, value);
        Ok(())
    }

    pub fn is_dirty(&self, field: ListingField) -> bool {
        self.dirty.contains(&field)
    }

    pub fn dirty_fields(&self) -> Vec<ListingField> {
        self.dirty.iter().copied().collect()
    }

    /// Save one field, dirty or not.
    pub async fn save(&mut self, field: ListingField) -> Result<SyncOutcome> {
        let value = self.value(field).to_string();
        let outcome = self.sync.sync_field(field, &value).await?;
        self.dirty.remove(&field);
        Ok(outcome)
    }

    /// Save every dirty field in field order. Stops at the first failure;
    /// fields saved before it stay clean, the failing one and the rest stay
    /// dirty.
    pub async fn save_all(&mut self) -> Result<Vec<SyncOutcome>> {
        let mut outcomes = Vec::new();
        for field in self.dirty_fields() {
            outcomes.push(self.save(field).await?);
        }
        Ok(outcomes)
    }

    pub fn status(&self, field: ListingField) -> FieldStatus {
        self.sync.field_status(field)
    }
}
