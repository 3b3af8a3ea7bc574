//! Item status enumeration and input normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Lifecycle status of an item.
///
/// The stored and serialized labels are the shop-facing ones
/// (`Menunggu`, `Proses`, `Selesai`, `Batal`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(ascii_case_insensitive)]
pub enum Status {
    /// Checked in, not started yet.
    #[serde(rename = "Menunggu")]
    #[strum(serialize = "Menunggu")]
    #[default]
    Waiting,
    /// Being worked on.
    #[serde(rename = "Proses")]
    #[strum(serialize = "Proses")]
    InProgress,
    /// Finished and ready for pickup.
    #[serde(rename = "Selesai")]
    #[strum(serialize = "Selesai")]
    Done,
    /// Cancelled by the customer or the shop.
    #[serde(rename = "Batal")]
    #[strum(serialize = "Batal")]
    Cancelled,
}

impl Status {
    /// Every status, in lifecycle order.
    pub const ALL: [Status; 4] = [
        Status::Waiting,
        Status::InProgress,
        Status::Done,
        Status::Cancelled,
    ];

    /// Canonical label as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Waiting => "Menunggu",
            Status::InProgress => "Proses",
            Status::Done => "Selesai",
            Status::Cancelled => "Batal",
        }
    }

    /// Match free text against the canonical labels, ignoring case and
    /// surrounding whitespace.
    pub fn parse_label(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse().ok()
    }

    /// Normalize an arbitrary JSON value. Anything that is not a string
    /// matching one of the labels yields `None`.
    pub fn normalize(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse_label)
    }

    /// Comma-separated list of valid labels, for error messages.
    pub fn choices() -> String {
        Self::ALL
            .iter()
            .map(Status::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
