use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::KeyError;

/// Maximum length of an item key, counted in UTF-16 code units.
pub const MAX_ITEM_KEY_LEN: usize = 200;

/// Identifies one menu item (a dish) whose likes are being counted.
///
/// An item key is always non-empty and at most [`MAX_ITEM_KEY_LEN`] characters long.
/// Length is measured in UTF-16 code units, which is how the web client that writes
/// the vote records measures strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Validates and wraps a raw item key.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::EmptyItemKey` or `KeyError::ItemKeyTooLong`.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::EmptyItemKey);
        }
        let len = raw.encode_utf16().count();
        if len > MAX_ITEM_KEY_LEN {
            return Err(KeyError::ItemKeyTooLong(len));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
