//! Realization labels and the preferred-variant ladder.

use std::collections::BTreeSet;
use std::str::FromStr;

use tracing::debug;

use crate::error::SelectError;

/// Parsed `r<N>i<N>p<N>[f<N>]` realization label.
///
/// The forcing index is absent in CMIP5 labels such as `r1i1p1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantLabel {
    /// Realization index.
    pub r: u32,
    /// Initialization index.
    pub i: u32,
    /// Physics index.
    pub p: u32,
    /// Forcing index.
    pub f: Option<u32>,
}

fn take_index<'a>(rest: &'a str, prefix: char, label: &str) -> Result<(u32, &'a str), SelectError> {
    let invalid = || SelectError::InvalidVariant {
        label: label.to_string(),
    };
    let rest = rest.strip_prefix(prefix).ok_or_else(invalid)?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value = rest[..end].parse().map_err(|_| invalid())?;
    Ok((value, &rest[end..]))
}

impl FromStr for VariantLabel {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (r, rest) = take_index(s, 'r', s)?;
        let (i, rest) = take_index(rest, 'i', s)?;
        let (p, rest) = take_index(rest, 'p', s)?;
        let (f, rest) = if rest.is_empty() {
            (None, rest)
        } else {
            let (f, rest) = take_index(rest, 'f', s)?;
            (Some(f), rest)
        };
        if !rest.is_empty() {
            return Err(SelectError::InvalidVariant {
                label: s.to_string(),
            });
        }
        Ok(Self { r, i, p, f })
    }
}

/// Picks one realization among `candidates` for `model`.
///
/// See the crate documentation for the preference ladder.
///
/// # Errors
///
/// Labels that cannot be parsed never win a rung but do not prevent the
/// others from being chosen.
///
/// # Errors
///
/// Returns [`SelectError::AmbiguousVariant`] if several `r1i1p1f*` (or,
/// lacking those, several `r1i1p*`) labels compete,
/// [`SelectError::InvalidVariant`] if no candidate label can be parsed and
/// [`SelectError::NoVariant`] if there is no candidate at all.
pub fn preferred_variant(candidates: &BTreeSet<String>, model: &str) -> Result<String, SelectError> {
    if candidates.contains("r1i1p1f1") {
        return Ok("r1i1p1f1".to_string());
    }

    let mut parsed = Vec::with_capacity(candidates.len());
    for label in candidates {
        match label.parse::<VariantLabel>() {
            Ok(v) => parsed.push((label.as_str(), v)),
            Err(e) => debug!(model, error = %e, "ignoring realization label"),
        }
    }
    if parsed.is_empty() {
        if let Some(label) = candidates.first() {
            return Err(SelectError::InvalidVariant { label: label.clone() });
        }
    }

    let rungs: [(fn(&VariantLabel) -> bool, bool); 3] = [
        (is_r1i1p1_any_forcing, true),
        (is_r1i1_any_physics, true),
        (is_r1_any_init, false),
    ];
    for (matches, ambiguity_is_fatal) in rungs {
        let hits: Vec<&str> = parsed
            .iter()
            .filter(|(_, v)| matches(v))
            .map(|(label, _)| *label)
            .collect();
        match hits.len() {
            0 => {}
            1 => return Ok(hits[0].to_string()),
            _ if ambiguity_is_fatal => {
                return Err(SelectError::AmbiguousVariant {
                    model: model.to_string(),
                    candidates: hits.iter().map(|s| s.to_string()).collect(),
                });
            }
            _ => {}
        }
    }

    parsed
        .iter()
        .min_by(|(la, va), (lb, vb)| va.r.cmp(&vb.r).then_with(|| la.cmp(lb)))
        .map(|(label, _)| label.to_string())
        .ok_or_else(|| SelectError::NoVariant {
            model: model.to_string(),
        })
}

fn is_r1i1p1_any_forcing(v: &VariantLabel) -> bool {
    v.r == 1 && v.i == 1 && v.p == 1 && v.f.is_some()
}

fn is_r1i1_any_physics(v: &VariantLabel) -> bool {
    v.r == 1 && v.i == 1
}

fn is_r1_any_init(v: &VariantLabel) -> bool {
    v.r == 1
}
