use anyhow::{anyhow, Result};

use crate::model::piece::Piece;
use crate::outcome::Rejection;

pub fn normalize_name(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses user-typed minutes. Only positive whole numbers are accepted.
pub fn parse_minutes(input: &str) -> std::result::Result<u32, Rejection> {
    let invalid = || Rejection::InvalidMinutes {
        input: input.to_string(),
    };
    match input.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(minutes) => Ok(minutes),
    }
}

/// Finds the piece a command-line reference points at.
///
/// Tried in order: exact id, exact name (case-insensitive), unique id prefix,
/// unique name prefix (case-insensitive).
pub fn resolve_piece<'a>(reference: &str, pieces: &'a [Piece]) -> Result<&'a Piece> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(anyhow!("Empty piece reference"));
    }
    let lowered = reference.to_lowercase();

    if let Some(piece) = pieces.iter().find(|p| p.id.as_str() == reference) {
        return Ok(piece);
    }
    let by_name: Vec<&Piece> = pieces
        .iter()
        .filter(|p| p.name.to_lowercase() == lowered)
        .collect();
    match by_name.len() {
        0 => {}
        1 => return Ok(by_name[0]),
        _ => return Err(ambiguous(reference, &by_name)),
    }

    let by_id: Vec<&Piece> = pieces
        .iter()
        .filter(|p| p.id.as_str().starts_with(reference))
        .collect();
    let matches = if by_id.is_empty() {
        pieces
            .iter()
            .filter(|p| p.name.to_lowercase().starts_with(&lowered))
            .collect()
    } else {
        by_id
    };

    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(anyhow!("Unknown piece: '{}'", reference)),
        _ => Err(ambiguous(reference, &matches)),
    }
}

fn ambiguous(reference: &str, candidates: &[&Piece]) -> anyhow::Error {
    let listed: Vec<String> = candidates
        .iter()
        .map(|p| format!("{} ({})", p.name, p.id.short()))
        .collect();
    anyhow!("Ambiguous piece: '{}' matches {:?}", reference, listed)
}
