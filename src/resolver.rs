//! Optimistic concurrency decisions for movie edits and deletes.
//!
//! Everything here is pure: the caller loads the current row, hands it in
//! together with what the client submitted, and persists (or not) based on
//! the verdict. The server row always wins; nothing is merged automatically.

use serde::Serialize;

use crate::models::{Movie, MovieField, MovieFields, VersionToken};

/// One field whose live value no longer matches what the client holds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: MovieField,
    pub current: String,
}

/// Payload returned when a write is rejected because the token is stale.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Conflict {
    pub changes: Vec<FieldChange>,
    pub row_version: VersionToken,
    #[serde(skip)]
    pub current: Movie,
}

impl Conflict {
    /// Conflict for an edit: only the submitted fields that differ from the
    /// live row are reported.
    pub fn against(current: &Movie, submitted: &MovieFields) -> Self {
        let changes = MovieField::ALL
            .into_iter()
            .filter(|&field| current.fields.differs(submitted, field))
            .map(|field| FieldChange { field, current: current.fields.render(field) })
            .collect();
        Self { changes, row_version: current.row_version.clone(), current: current.clone() }
    }

    /// Conflict for a delete, which carries no field values: every live field
    /// is reported.
    pub fn snapshot(current: &Movie) -> Self {
        let changes = MovieField::ALL
            .into_iter()
            .map(|field| FieldChange { field, current: current.fields.render(field) })
            .collect();
        Self { changes, row_version: current.row_version.clone(), current: current.clone() }
    }

    pub fn change(&self, field: MovieField) -> Option<&str> {
        self.changes.iter().find(|c| c.field == field).map(|c| c.current.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditVerdict {
    Apply,
    DeletedConflict,
    ModifiedConflict(Conflict),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteVerdict {
    Remove,
    AlreadyDeleted,
    ModifiedConflict(Conflict),
}

pub fn resolve_edit(
    current: Option<&Movie>,
    submitted: &MovieFields,
    token: &VersionToken,
) -> EditVerdict {
    match current {
        None => EditVerdict::DeletedConflict,
        Some(row) if row.row_version == *token => EditVerdict::Apply,
        Some(row) => EditVerdict::ModifiedConflict(Conflict::against(row, submitted)),
    }
}

pub fn resolve_delete(current: Option<&Movie>, token: &VersionToken) -> DeleteVerdict {
    match current {
        None => DeleteVerdict::AlreadyDeleted,
        Some(row) if row.row_version == *token => DeleteVerdict::Remove,
        Some(row) => DeleteVerdict::ModifiedConflict(Conflict::snapshot(row)),
    }
}
