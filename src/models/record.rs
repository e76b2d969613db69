use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Durable-store key for a record.
pub fn record_key(id: i64) -> String {
    format!("record_{}", id)
}

/// Blob-store filename for a record's image artifact.
pub fn image_name(id: i64) -> String {
    format!("{}.png", id)
}

/// Category tag used for records that carry no tags at all.
/// Untyped records are selectable in the list filter under this label.
pub const NULL_CATEGORY: &str = "Null";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record is missing an id")]
    MissingId,

    #[error("record {0} has no display name")]
    MissingName(i64),
}

/// Structured display name. Only the English name is required; the other
/// locales survive round-trips when the upstream data set provides them.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RecordName {
    pub english: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub japanese: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chinese: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub french: Option<String>,
}

/// Free-form descriptive fields, locally editable.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RecordProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ability: Option<String>,
}

impl RecordProfile {
    pub fn is_empty(&self) -> bool {
        self.species.is_none()
            && self.height.is_none()
            && self.weight.is_none()
            && self.ability.is_none()
    }
}

/// Image reference: `remote` is the authoritative high-resolution source,
/// `local` a cached on-device path, lazily populated and revalidated.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RecordImage {
    pub remote: String,
    pub local: Option<String>,
}

/// Canonical catalog entry. `id` is immutable once created and doubles as
/// the durable-store key suffix and the blob filename stem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: i64,
    pub name: RecordName,
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<RecordProfile>,
    pub image: RecordImage,
}

impl Record {
    pub fn key(&self) -> String {
        record_key(self.id)
    }

    pub fn image_name(&self) -> String {
        image_name(self.id)
    }

    /// Whether this record matches a category filter. `NULL_CATEGORY`
    /// selects records with no tags.
    pub fn has_category(&self, category: &str) -> bool {
        if category == NULL_CATEGORY {
            self.types.is_empty() || self.types.iter().any(|t| t == NULL_CATEGORY)
        } else {
            self.types.iter().any(|t| t == category)
        }
    }

    /// Apply an edit patch. Only fields present in the patch change.
    pub fn apply_patch(&mut self, patch: &RecordPatch) {
        if let Some(ref name) = patch.name_english {
            self.name.english = name.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = Some(description.clone());
        }
        if patch.species.is_some()
            || patch.height.is_some()
            || patch.weight.is_some()
            || patch.ability.is_some()
        {
            let profile = self.profile.get_or_insert_with(RecordProfile::default);
            if let Some(ref species) = patch.species {
                profile.species = Some(species.clone());
            }
            if let Some(ref height) = patch.height {
                profile.height = Some(height.clone());
            }
            if let Some(ref weight) = patch.weight {
                profile.weight = Some(weight.clone());
            }
            if let Some(ref ability) = patch.ability {
                profile.ability = Some(ability.clone());
            }
        }
    }
}

/// Editable fields for `update_record`. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub name_english: Option<String>,
    pub description: Option<String>,
    pub species: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub ability: Option<String>,
}

/// Input for `create_record`. The id is assigned by the engine.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub name: String,
    pub types: Vec<String>,
    /// Source for the image artifact: a remote URL or a local file URI.
    pub image_source: Option<String>,
}

// Remote API shape. The upstream data set names the high-resolution source
// `hires` and ships sprite/thumbnail variants the engine does not keep.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<RawName>,
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub profile: Option<RecordProfile>,
    #[serde(default)]
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawName {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub japanese: Option<String>,
    #[serde(default)]
    pub chinese: Option<String>,
    #[serde(default)]
    pub french: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawImage {
    #[serde(default)]
    pub hires: Option<String>,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl RawRecord {
    /// Validate and convert to the canonical shape. This is the only place
    /// loosely-typed remote data enters the engine; malformed records are
    /// rejected here rather than surfacing as missing fields deeper in.
    pub fn into_record(self) -> Result<Record, RecordError> {
        let id = self.id.ok_or(RecordError::MissingId)?;

        let raw_name = self.name.unwrap_or_default();
        let english = raw_name
            .english
            .filter(|n| !n.trim().is_empty())
            .ok_or(RecordError::MissingName(id))?;

        // Prefer the high-res source; fall back to the sprite variants so a
        // partial upstream record still renders something.
        let remote = self
            .image
            .as_ref()
            .and_then(|i| {
                i.hires
                    .clone()
                    .or_else(|| i.thumbnail.clone())
                    .or_else(|| i.sprite.clone())
            })
            .unwrap_or_default();

        Ok(Record {
            id,
            name: RecordName {
                english,
                japanese: raw_name.japanese,
                chinese: raw_name.chinese,
                french: raw_name.french,
            },
            types: self.types,
            description: self.description,
            profile: self.profile.filter(|p| !p.is_empty()),
            image: RecordImage {
                remote,
                local: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawRecord {
        serde_json::from_str(json).expect("test raw record")
    }

    #[test]
    fn test_into_record_maps_hires_to_remote() {
        let record = raw(
            r#"{"id": 7, "name": {"english": "Squirtle"}, "type": ["Water"],
                "image": {"sprite": "s.png", "hires": "h.png"}}"#,
        )
        .into_record()
        .expect("valid record");

        assert_eq!(record.id, 7);
        assert_eq!(record.name.english, "Squirtle");
        assert_eq!(record.image.remote, "h.png");
        assert_eq!(record.image.local, None);
    }

    #[test]
    fn test_into_record_rejects_missing_id() {
        let err = raw(r#"{"name": {"english": "Ghost"}}"#)
            .into_record()
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingId));
    }

    #[test]
    fn test_into_record_rejects_blank_name() {
        let err = raw(r#"{"id": 3, "name": {"english": "  "}}"#)
            .into_record()
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingName(3)));
    }

    #[test]
    fn test_into_record_falls_back_to_thumbnail() {
        let record = raw(
            r#"{"id": 1, "name": {"english": "Bulbasaur"},
                "image": {"sprite": "s.png", "thumbnail": "t.png"}}"#,
        )
        .into_record()
        .expect("valid record");
        assert_eq!(record.image.remote, "t.png");
    }

    #[test]
    fn test_record_roundtrip_preserves_local_path() {
        let mut record = raw(r#"{"id": 4, "name": {"english": "Charmander"}, "type": ["Fire"]}"#)
            .into_record()
            .expect("valid record");
        record.image.local = Some("/images/4.png".to_string());

        let json = serde_json::to_string(&record).expect("serialize");
        let back: Record = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, record);
    }

    #[test]
    fn test_has_category_null_matches_untyped() {
        let untyped = raw(r#"{"id": 9, "name": {"english": "Missing"}}"#)
            .into_record()
            .expect("valid record");
        let typed = raw(r#"{"id": 10, "name": {"english": "Onix"}, "type": ["Rock"]}"#)
            .into_record()
            .expect("valid record");

        assert!(untyped.has_category(NULL_CATEGORY));
        assert!(!typed.has_category(NULL_CATEGORY));
        assert!(typed.has_category("Rock"));
        assert!(!typed.has_category("Water"));
    }

    #[test]
    fn test_apply_patch_merges_into_profile() {
        let mut record = raw(r#"{"id": 2, "name": {"english": "Ivysaur"}}"#)
            .into_record()
            .expect("valid record");

        record.apply_patch(&RecordPatch {
            name_english: Some("Ivy".to_string()),
            species: Some("Seed".to_string()),
            ..Default::default()
        });

        assert_eq!(record.name.english, "Ivy");
        assert_eq!(
            record.profile.as_ref().and_then(|p| p.species.as_deref()),
            Some("Seed")
        );
        // Untouched fields stay as they were.
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(record_key(25), "record_25");
        assert_eq!(image_name(25), "25.png");
    }
}
