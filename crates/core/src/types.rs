//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned handle of a submitted request
pub type RequestId = u64;

/// Which constituent of a trading pair a token sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Zero,
    One,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::Zero => Side::One,
            Side::One => Side::Zero,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Side::Zero => 0,
            Side::One => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset-{}", self.index())
    }
}
