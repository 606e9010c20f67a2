use std::cmp::Ordering;

use super::error::{KeyError, Result, TraceError};
use super::model::TraceId;

/// Number of `_`-separated fields in an exported trace name
/// (`<prefix>_<group>_<series>_<sweep>_<trace>`).
pub const KEY_FIELDS: usize = 5;

// ---------------------------------------------------------------------------
// TraceKey – sortable view of a trace base name
// ---------------------------------------------------------------------------

/// Parsed form of `PM_1_2_3_Imon`. Field order is the comparison order, so the
/// derived `Ord` compares prefix, group, series, sweep, then trace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraceKey {
    pub prefix: String,
    pub group: i64,
    pub series: i64,
    pub sweep: i64,
    pub trace: String,
}

impl TraceKey {
    /// Parse a base name. No trimming or case folding is applied.
    pub fn parse_name(name: &str) -> Result<Self, KeyError> {
        let tokens: Vec<&str> = name.split('_').collect();
        if tokens.len() != KEY_FIELDS {
            return Err(KeyError::FieldCount {
                found: tokens.len(),
            });
        }

        Ok(TraceKey {
            prefix: tokens[0].to_string(),
            group: parse_field("group", tokens[1])?,
            series: parse_field("series", tokens[2])?,
            sweep: parse_field("sweep", tokens[3])?,
            trace: tokens[4].to_string(),
        })
    }

    /// Parse the base name of an identifier, attaching the identifier to errors.
    pub fn parse(id: &TraceId) -> Result<Self> {
        Self::parse_name(&id.display_name()).map_err(|source| TraceError::Parse {
            identifier: id.to_string(),
            source,
        })
    }
}

fn parse_field(field: &'static str, token: &str) -> Result<i64, KeyError> {
    token
        .parse::<i64>()
        .map_err(|_| KeyError::InvalidNumericField {
            field,
            token: token.to_string(),
        })
}

/// Three-way comparison of two parsed keys.
pub fn compare(a: &TraceKey, b: &TraceKey) -> Ordering {
    a.cmp(b)
}

/// Stable sort of identifiers by their [`TraceKey`].
///
/// Every identifier is parsed before anything is reordered; one bad name fails
/// the whole batch and leaves `ids` untouched.
pub fn sort_ids(ids: &mut Vec<TraceId>) -> Result<()> {
    let keys = ids
        .iter()
        .map(TraceKey::parse)
        .collect::<Result<Vec<_>>>()?;

    let mut keyed: Vec<(TraceKey, TraceId)> = keys.into_iter().zip(ids.drain(..)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a, b));
    ids.extend(keyed.into_iter().map(|(_, id)| id));
    Ok(())
}
