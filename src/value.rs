//! Conversion of stored config strings into typed values.
//!
//! Every config entry is an ordered list of strings. [`FromConfigValue`]
//! turns that list into a Rust type: `Vec<String>` takes all slots, every
//! other type reads the first slot.
//!
//! Enums (including flag sets) implement [`ConfigEnum`] with a name table and
//! hook into [`FromConfigValue`] through [`config_enum_value!`].

use std::path::PathBuf;

/// Conversion from a config entry's value slots.
pub trait FromConfigValue: Sized {
    fn from_config(values: &[String]) -> Result<Self, String>;
}

fn first(values: &[String]) -> &str {
    values.first().map(String::as_str).unwrap_or_default()
}

impl FromConfigValue for Vec<String> {
    fn from_config(values: &[String]) -> Result<Self, String> {
        Ok(values.to_vec())
    }
}

impl FromConfigValue for String {
    fn from_config(values: &[String]) -> Result<Self, String> {
        Ok(first(values).to_string())
    }
}

impl FromConfigValue for PathBuf {
    fn from_config(values: &[String]) -> Result<Self, String> {
        Ok(PathBuf::from(first(values).trim()))
    }
}

impl FromConfigValue for bool {
    fn from_config(values: &[String]) -> Result<Self, String> {
        let raw = first(values).trim();
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(format!("'{raw}' is not a valid boolean"))
        }
    }
}

macro_rules! from_str_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromConfigValue for $t {
                fn from_config(values: &[String]) -> Result<Self, String> {
                    let raw = first(values).trim();
                    raw.parse::<$t>()
                        .map_err(|e| format!("'{raw}' is not a valid {}: {e}", stringify!($t)))
                }
            }
        )*
    };
}

from_str_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, char);

/// A closed set of named values parsed from config text.
///
/// Plain enums match a single name. Flag sets (`FLAGS = true`) accept several
/// names separated by commas or spaces and combine them with [`union`].
///
/// [`union`]: ConfigEnum::union
pub trait ConfigEnum: Sized + Copy + 'static {
    /// Name → value table, matched case-sensitively.
    const VARIANTS: &'static [(&'static str, Self)];

    const FLAGS: bool = false;

    fn union(self, other: Self) -> Self {
        other
    }
}

/// Parse `raw` as a [`ConfigEnum`] value.
pub fn parse_enum<E: ConfigEnum>(raw: &str) -> Result<E, String> {
    let lookup = |name: &str| {
        E::VARIANTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| format!("'{name}' is not a known value"))
    };

    if !E::FLAGS {
        return lookup(raw.trim());
    }

    let normalized = raw.replace(' ', ",");
    let mut parts = normalized.split(',').map(str::trim).filter(|p| !p.is_empty());
    let Some(head) = parts.next() else {
        return Err("empty flag list".into());
    };
    parts.try_fold(lookup(head)?, |acc, part| Ok(acc.union(lookup(part)?)))
}

/// Implement [`FromConfigValue`] for one or more [`ConfigEnum`] types.
#[macro_export]
macro_rules! config_enum_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::value::FromConfigValue for $t {
                fn from_config(values: &[String]) -> Result<Self, String> {
                    let raw = values.first().map(String::as_str).unwrap_or_default();
                    $crate::value::parse_enum::<$t>(raw)
                }
            }
        )*
    };
}
