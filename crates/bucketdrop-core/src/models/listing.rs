use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An object already persisted in the store, as shown in the file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObjectEntry {
    /// Basename of the object key, namespace prefix removed.
    pub key: String,
    pub size_label: String,
    pub last_modified: DateTime<Utc>,
}

/// Opaque cursor handed back by a paginated listing call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for ContinuationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for ContinuationToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// How "load more" combines a new page with the entries already shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMoreMode {
    /// Append the new page after the entries already displayed.
    #[default]
    Append,
    /// Replace the displayed entries with the new page.
    Replace,
}

impl FromStr for LoadMoreMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "append" => Ok(LoadMoreMode::Append),
            "replace" => Ok(LoadMoreMode::Replace),
            _ => Err(anyhow::anyhow!("Invalid load more mode: {}", s)),
        }
    }
}

impl Display for LoadMoreMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LoadMoreMode::Append => write!(f, "append"),
            LoadMoreMode::Replace => write!(f, "replace"),
        }
    }
}
