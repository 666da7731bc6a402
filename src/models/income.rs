//! This file defines an income record and its recurrence frequency.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::{DatabaseID, UserID};

/// How often a recurring income repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    /// Repeats every day.
    Daily,
    /// Repeats every week.
    Weekly,
    /// Repeats every month.
    Monthly,
    /// Repeats every year.
    Yearly,
    /// Does not repeat.
    #[default]
    OneTime,
}

impl Frequency {
    /// The accepted wire and storage spellings, in declaration order.
    pub const VALUES: [&'static str; 5] = ["daily", "weekly", "monthly", "yearly", "one-time"];

    /// The wire and storage spelling of the frequency.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::OneTime => "one-time",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            "one-time" => Ok(Frequency::OneTime),
            other => Err(format!("invalid frequency \"{other}\"")),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money coming in for a user.
///
/// Amounts are integers in the smallest currency unit (e.g., cents).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    /// The income's ID in the database.
    pub id: DatabaseID,
    /// The user the income belongs to.
    pub user_id: UserID,
    /// The amount received in the smallest currency unit.
    pub amount: i64,
    /// Where the money came from.
    pub source: String,
    /// When the money was received.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Whether the income repeats.
    pub is_recurring: bool,
    /// How often the income repeats.
    pub frequency: Frequency,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
