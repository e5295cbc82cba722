use super::{Value, ValueKind};

// Largest integer magnitude an f64 holds without rounding.
const F64_SAFE_INT: f64 = 9_007_199_254_740_992.0;

impl Value {
    /// Coerce this value into the representation expected by `kind`.
    ///
    /// Sources frequently hand back text for numeric columns, integers for
    /// booleans, and so on; this is the single lenient conversion surface
    /// used by field setters. Returns `None` when no lossless conversion
    /// exists. `Null` never coerces; `List` only coerces to a blob of bytes.
    #[must_use]
    pub fn coerce(&self, kind: ValueKind) -> Option<Self> {
        if self.kind() == Some(kind) {
            return Some(self.clone());
        }

        match kind {
            ValueKind::Bool => self.coerce_bool().map(Self::Bool),
            ValueKind::Int => self.coerce_int().map(Self::Int),
            ValueKind::Uint => self.coerce_uint().map(Self::Uint),
            ValueKind::Float => self.coerce_float().map(Self::Float),
            ValueKind::Text => self.coerce_text().map(Self::Text),
            ValueKind::Blob => self.coerce_blob().map(Self::Blob),
        }
    }

    fn coerce_bool(&self) -> Option<bool> {
        match self {
            Self::Int(0) | Self::Uint(0) => Some(false),
            Self::Int(1) | Self::Uint(1) => Some(true),
            Self::Text(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") || text == "1" {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") || text == "0" {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[expect(clippy::cast_possible_truncation)]
    fn coerce_int(&self) -> Option<i64> {
        match self {
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Uint(v) => i64::try_from(*v).ok(),
            Self::Float(v) if v.fract() == 0.0 && v.abs() <= F64_SAFE_INT => Some(*v as i64),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn coerce_uint(&self) -> Option<u64> {
        match self {
            Self::Bool(v) => Some(u64::from(*v)),
            Self::Int(v) => u64::try_from(*v).ok(),
            Self::Float(v) if v.fract() == 0.0 && *v >= 0.0 && *v <= F64_SAFE_INT => {
                Some(*v as u64)
            }
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn coerce_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Uint(v) => Some(*v as f64),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    // JSON fixtures carry bytes as arrays of small integers
    fn coerce_blob(&self) -> Option<Vec<u8>> {
        match self {
            Self::Text(text) => Some(text.as_bytes().to_vec()),
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    Self::Int(v) => u8::try_from(*v).ok(),
                    Self::Uint(v) => u8::try_from(*v).ok(),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    fn coerce_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) | Self::Blob(_) => None,
            other => Some(other.render()),
        }
    }
}
