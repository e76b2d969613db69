//! Data models for catalog entries.
//!
//! The canonical [`Record`] shape lives here together with the loosely-typed
//! [`RawRecord`] mirror of the remote API payload. Conversion between the two
//! (`RawRecord::into_record`) is the validation boundary: everything past it
//! has a required id and display name.

pub mod record;

pub use record::{
    image_name, record_key, RawRecord, Record, RecordDraft, RecordError, RecordImage, RecordName,
    RecordPatch, RecordProfile, NULL_CATEGORY,
};
