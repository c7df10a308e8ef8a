use serde::Serialize;

/// Content of a single cell.
///
/// Formula text keeps its leading `=` in memory; the package writer strips
/// it when emitting `<f>` elements and the reader puts it back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Formula(String),
    /// Excel error literal such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    /// Build a formula cell. A missing leading `=` is added.
    pub fn formula(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with('=') {
            Self::Formula(text)
        } else {
            Self::Formula(format!("={text}"))
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Formula text including the leading `=`.
    #[must_use]
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            Self::Formula(f) => Some(f),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Cell with position, as exposed to JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellData {
    pub r: u32, // row (0-indexed)
    pub c: u32, // col (0-indexed)
    #[serde(flatten)]
    pub value: CellValue,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_prefix() {
        assert_eq!(CellValue::formula("B1+C1").as_formula(), Some("=B1+C1"));
        assert_eq!(CellValue::formula("=0").as_formula(), Some("=0"));
    }

    #[test]
    fn test_serialize_cell_data() {
        let cd = CellData {
            r: 1,
            c: 2,
            value: CellValue::Number(1.5),
        };
        let json = serde_json::to_value(&cd).unwrap();
        assert_eq!(json, serde_json::json!({"r": 1, "c": 2, "t": "number", "v": 1.5}));
    }
}
