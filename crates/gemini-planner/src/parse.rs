use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use crate::error::GeminiError;

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"```(?:json|JSON)?").unwrap())
}

/// Remove markdown code-fence markers and surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    fence_re().replace_all(text, "").trim().to_string()
}

/// Parse model output into `T`, tolerating code fences.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, GeminiError> {
    let cleaned = strip_fences(text);
    serde_json::from_str(&cleaned).map_err(|source| GeminiError::Parse {
        text: cleaned,
        source,
    })
}
