use convert_case::{Case, Casing};
use serde::Deserialize;

///
/// NamingConvention
///
/// How a Rust field name turns into a column name when neither a runtime
/// override nor a `#[column(name = ...)]` attribute names the column.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    #[default]
    AsIs,
    Pascal,
    Camel,
    Snake,
    UpperSnake,
}

impl NamingConvention {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::AsIs => name.to_string(),
            Self::Pascal => name.to_case(Case::Pascal),
            Self::Camel => name.to_case(Case::Camel),
            Self::Snake => name.to_case(Case::Snake),
            Self::UpperSnake => name.to_case(Case::UpperSnake),
        }
    }
}

///
/// TESTS
///
