use serde::{Deserialize, Serialize};

use super::order::Order;

/// Opaque scan position over the order index.
///
/// `Cursor::START` begins a scan and is also what the store hands back once
/// the scan has wrapped around, so callers stop when they see it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(u64);

impl Cursor {
    pub const START: Cursor = Cursor(0);

    pub fn is_terminal(&self) -> bool {
        *self == Cursor::START
    }
}

impl From<u64> for Cursor {
    fn from(raw: u64) -> Self {
        Cursor(raw)
    }
}

impl From<Cursor> for u64 {
    fn from(cursor: Cursor) -> Self {
        cursor.0
    }
}

/// One FindAll request. `size` is a batch hint, not an exact page length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindAllPage {
    pub cursor: Cursor,
    pub size: u64,
}

impl FindAllPage {
    pub fn first(size: u64) -> Self {
        Self {
            cursor: Cursor::START,
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindResult {
    pub orders: Vec<Order>,
    pub cursor: Cursor,
}

impl FindResult {
    pub fn is_last(&self) -> bool {
        self.cursor.is_terminal()
    }
}
