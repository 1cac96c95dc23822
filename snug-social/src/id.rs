use nanoid::nanoid;

use crate::errors::SocialError;

/// Alphabet for generated post and comment ids (no ambiguous glyphs).
const ENTITY_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const ENTITY_ID_LENGTH: usize = 20;
/// Upper bound for ids handed in by callers.
const MAX_SUPPLIED_ID_LENGTH: usize = 64;

/// Generates a fresh post, comment or reply id.
pub fn generate_entity_id() -> String {
    nanoid!(ENTITY_ID_LENGTH, ENTITY_ID_ALPHABET)
}

/// Uses the caller-supplied comment id when present, otherwise generates one.
///
/// Supplied ids end up inside storage keys, so `:` and whitespace are refused.
pub fn comment_id_or_generate(supplied: Option<&str>) -> Result<String, SocialError> {
    let Some(candidate) = supplied else {
        return Ok(generate_entity_id());
    };
    if candidate.is_empty() || candidate.len() > MAX_SUPPLIED_ID_LENGTH {
        return Err(SocialError::invalid(format!(
            "comment id must be 1..={MAX_SUPPLIED_ID_LENGTH} characters"
        )));
    }
    if candidate.chars().any(|c| c == ':' || c.is_whitespace()) {
        return Err(SocialError::invalid("comment id must not contain ':' or whitespace"));
    }
    Ok(candidate.to_string())
}
