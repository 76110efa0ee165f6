//! Lenient deserializers for values posted by HTML forms or query strings,
//! where everything arrives as text and unchecked checkboxes are omitted.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
    // A checkbox paired with a hidden fallback input posts the key twice.
    Many(Vec<Flag>),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes"),
            Flag::Many(values) => values.iter().any(Flag::is_set),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Text(String),
}

/// Checkbox value: `on`, `true`, `1` and `yes` are true, anything else is
/// false. Repeated values are true if any of them is. Pair with
/// `#[serde(default)]`, since an unchecked box is not posted at all.
pub fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Flag::deserialize(deserializer)?.is_set())
}

/// Integer that tolerates empty or malformed input by treating it as absent,
/// so the caller's defaulting rules apply.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Number>::deserialize(deserializer)? {
        Some(Number::Int(n)) => Some(n),
        Some(Number::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
