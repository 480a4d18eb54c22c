//! Row and column projection for the render layer.
//!
//! Columns name a dotted field path (`location.name`) that is resolved against
//! each record. Whether a cell shows a value or a loading marker depends only
//! on whether its row is a placeholder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::store::Row;

/// Dotted path to a possibly nested record field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path. Empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(GridError::Config(format!("invalid field path {path:?}")));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for FieldPath {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = GridError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A grid column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ColumnDef")]
pub struct Column {
    /// Stable identifier
    pub id: String,
    /// Header label; the id is used when empty
    pub header: String,
    /// Field resolved against each record
    pub path: FieldPath,
    /// Width override; the configured column width applies otherwise
    pub width: Option<f32>,
}

impl Column {
    /// Column whose id is also its field path.
    pub fn new(id: &str) -> Result<Self> {
        Ok(Self {
            id: id.to_string(),
            header: String::new(),
            path: FieldPath::parse(id)?,
            width: None,
        })
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.header = header.to_string();
        self
    }

    pub fn with_path(mut self, path: FieldPath) -> Self {
        self.path = path;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    /// Text shown in the header cell.
    pub fn label(&self) -> &str {
        if self.header.is_empty() {
            &self.id
        } else {
            &self.header
        }
    }
}

/// Column as written in JSON; `path` falls back to the id.
#[derive(Deserialize)]
struct ColumnDef {
    id: String,
    #[serde(default)]
    header: String,
    #[serde(default)]
    path: Option<FieldPath>,
    #[serde(default)]
    width: Option<f32>,
}

impl TryFrom<ColumnDef> for Column {
    type Error = GridError;

    fn try_from(def: ColumnDef) -> Result<Self> {
        let path = match def.path {
            Some(path) => path,
            None => FieldPath::parse(&def.id)?,
        };
        Ok(Self {
            id: def.id,
            header: def.header,
            path,
            width: def.width,
        })
    }
}

/// Parse a JSON array of columns.
pub fn columns_from_json(json: &str) -> Result<Vec<Column>> {
    Ok(serde_json::from_str(json)?)
}

/// Value handed to the render layer for one cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CellValue {
    /// Row has not loaded yet
    Placeholder,
    /// Row loaded but the field is missing or null
    Empty,
    /// Rendering-ready text
    Text(String),
}

impl CellValue {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Field lookup on a record type.
pub trait FieldAccess {
    fn field(&self, path: &FieldPath) -> CellValue;
}

impl FieldAccess for Value {
    fn field(&self, path: &FieldPath) -> CellValue {
        let mut current = self;
        for segment in path.segments() {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return CellValue::Empty,
            }
        }
        match current {
            Value::Null => CellValue::Empty,
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Resolve one cell. Placeholder rows always yield [`CellValue::Placeholder`].
pub fn resolve_cell<R: FieldAccess>(row: &Row<'_, R>, column: &Column) -> CellValue {
    match row {
        Row::Loaded(record) => record.field(&column.path),
        Row::Placeholder => CellValue::Placeholder,
        Row::Missing => CellValue::Empty,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> FieldPath {
        FieldPath::parse(p).unwrap()
    }

    #[test]
    fn test_nested_path() {
        let record = json!({
            "name": "Rick",
            "location": {"name": "Earth"},
            "episode": ["e1", "e2"]
        });
        assert_eq!(record.field(&path("location.name")), CellValue::Text("Earth".into()));
        assert_eq!(record.field(&path("episode.1")), CellValue::Text("e2".into()));
        assert_eq!(record.field(&path("location.url")), CellValue::Empty);
    }

    #[test]
    fn test_non_string_values() {
        let record = json!({"id": 7, "alive": true, "origin": null});
        assert_eq!(record.field(&path("id")), CellValue::Text("7".into()));
        assert_eq!(record.field(&path("alive")), CellValue::Text("true".into()));
        assert_eq!(record.field(&path("origin")), CellValue::Empty);
    }

    #[test]
    fn test_invalid_paths() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("location..name").is_err());
    }

    #[test]
    fn test_placeholder_row() {
        let column = Column::new("name").unwrap();
        let row: Row<'_, Value> = Row::Placeholder;
        assert!(resolve_cell(&row, &column).is_placeholder());
    }

    #[test]
    fn test_columns_from_json() {
        let columns = columns_from_json(
            r#"[{"id": "name", "path": "name"}, {"id": "loc", "header": "Location", "path": "location.name", "width": 300}]"#,
        )
        .unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].label(), "name");
        assert_eq!(columns[1].label(), "Location");
        assert_eq!(columns[1].path.segments().len(), 2);
        assert_eq!(columns[1].width, Some(300.0));
    }

    #[test]
    fn test_column_path_defaults_to_id() {
        let columns = columns_from_json(r#"[{"id": "origin.name"}]"#).unwrap();
        assert_eq!(columns[0].path, path("origin.name"));
        assert!(columns_from_json(r#"[{"id": "a..b"}]"#).is_err());
    }

    #[test]
    fn test_path_display() {
        assert_eq!(path("location.name").to_string(), "location.name");
    }
}
