//! Nested prompt document editing: addressing, classification, mutation and
//! dirty tracking. Pure logic, no I/O.

pub mod dirty;
pub mod draft;
pub mod mutate;
pub mod path;
pub mod schema;

pub use dirty::{DirtyEntry, DirtyFieldTracker};
pub use draft::DocumentDraft;
pub use mutate::{DocumentMutator, MutateError};
pub use path::{PathAddress, PathError};
pub use schema::{find_by_id, is_object_id, FieldKind, FieldSchema, PathClass};

pub(crate) use mutate::write_nested;
