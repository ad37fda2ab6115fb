use std::fmt;

use crate::record::{RawRecord, RowSkip};

/// A numeric box-score value.
///
/// Keeps the source text so documents repeat the value with the precision it
/// was recorded at (`"0.500"` stays `"0.500"`, not `0.5`).
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    raw: String,
    value: f64,
}

impl Stat {
    /// Parse a plain number. Decimal commas (`"0,500"`) are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let value = parse_number(raw)?;
        Some(Self {
            raw: raw.to_string(),
            value,
        })
    }

    /// Parse minutes played, either a number (`"35"`) or `"mm:ss"`.
    pub fn parse_minutes(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let value = match raw.split_once(':') {
            Some((minutes, seconds)) => {
                let minutes: u32 = minutes.parse().ok()?;
                let seconds: u32 = seconds.parse().ok()?;
                if seconds >= 60 {
                    return None;
                }
                f64::from(minutes) + f64::from(seconds) / 60.0
            }
            None => parse_number(raw)?,
        };
        Some(Self {
            raw: raw.to_string(),
            value,
        })
    }

    /// The parsed value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The value as written in the source file
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let value = raw
        .parse::<f64>()
        .ok()
        .or_else(|| raw.replace(',', ".").parse::<f64>().ok())?;
    value.is_finite().then_some(value)
}

/// One player's line for one game, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct GameLine {
    pub row: usize,
    pub player: String,
    pub team: String,
    pub date: String,
    pub opponent: String,
    pub minutes: Stat,
    pub points: Stat,
    pub rebounds: Stat,
    pub assists: Stat,
    pub steals: Stat,
    pub blocks: Stat,
    /// Field-goal fraction in `[0, 1]`
    pub field_goal_pct: Stat,
}

impl GameLine {
    /// Field-goal fraction as a percentage with one decimal place, e.g. `50.0%`.
    #[must_use]
    pub fn field_goal_percent(&self) -> String {
        format!("{:.1}%", self.field_goal_pct.value() * 100.0)
    }
}

impl TryFrom<&RawRecord> for GameLine {
    type Error = RowSkip;

    fn try_from(record: &RawRecord) -> Result<Self, Self::Error> {
        let row = record.row;
        let text = |column: &str, value: &Option<String>| -> Result<String, RowSkip> {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(RowSkip::new(row, format!("missing {column}"))),
            }
        };
        let number = |column: &str, value: &Option<String>| -> Result<Stat, RowSkip> {
            let raw = text(column, value)?;
            Stat::parse(&raw).ok_or_else(|| RowSkip::new(row, format!("{column} is not a number: {raw:?}")))
        };

        let minutes_raw = text("MP", &record.minutes)?;
        let minutes = Stat::parse_minutes(&minutes_raw)
            .ok_or_else(|| RowSkip::new(row, format!("MP is not a number: {minutes_raw:?}")))?;

        let field_goal_pct = number("FG%", &record.field_goal_pct)?;
        if !(0.0..=1.0).contains(&field_goal_pct.value()) {
            return Err(RowSkip::new(
                row,
                format!("FG% must be a fraction in [0, 1], got {field_goal_pct}"),
            ));
        }

        Ok(Self {
            row,
            player: text("Player", &record.player)?,
            team: text("Tm", &record.team)?,
            date: text("Data", &record.date)?,
            opponent: text("Opp", &record.opponent)?,
            minutes,
            points: number("PTS", &record.points)?,
            rebounds: number("TRB", &record.rebounds)?,
            assists: number("AST", &record.assists)?,
            steals: number("STL", &record.steals)?,
            blocks: number("BLK", &record.blocks)?,
            field_goal_pct,
        })
    }
}
