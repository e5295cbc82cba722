use serde::Deserialize;
use std::fmt;

///
/// Dialect
///
/// Parameter marker convention of the target data source.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    SqlServer,
    Sqlite,
    MySql,
    Oracle,
    Postgres,
}

impl Dialect {
    /// Marker for parameter `name`, the `ordinal`-th (zero based) distinct
    /// parameter of the command.
    #[must_use]
    pub fn marker(self, name: &str, ordinal: usize) -> String {
        match self {
            Self::SqlServer | Self::Sqlite | Self::MySql => format!("@{name}"),
            Self::Oracle => format!(":{name}"),
            Self::Postgres => format!("${}", ordinal + 1),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SqlServer => "sql_server",
            Self::Sqlite => "sqlite",
            Self::MySql => "my_sql",
            Self::Oracle => "oracle",
            Self::Postgres => "postgres",
        };
        write!(f, "{label}")
    }
}
