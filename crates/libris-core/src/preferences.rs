//! Per-user reading preferences: free-text, comma-separated lists that are
//! fetched and overwritten wholesale.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
  #[serde(default, deserialize_with = "null_as_empty")]
  pub favorite_genres:  String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub favorite_authors: String,
}

/// Body of `PUT /preferences`. `None` fields are left unchanged by the
/// server; no merging or normalization happens client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreferenceUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub favorite_genres:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub favorite_authors: Option<String>,
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn null_fields_read_as_empty() {
    let p: Preferences =
      serde_json::from_str(r#"{"favorite_genres":null,"favorite_authors":"Le Guin"}"#)
        .unwrap();
    assert_eq!(p.favorite_genres, "");
    assert_eq!(p.favorite_authors, "Le Guin");
  }

  #[test]
  fn values_are_not_normalized() {
    let p: Preferences =
      serde_json::from_str(r#"{"favorite_genres":"Fiction, History"}"#).unwrap();
    assert_eq!(p.favorite_genres, "Fiction, History");
    assert_eq!(p.favorite_authors, "");
  }
}
