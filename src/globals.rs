//! Ambient variables available to templates but not settable from config
//! files: the resolution timestamp and the active platform group.
//!
//! Values render with an optional format, e.g. `{$DateTime,yyyyMMdd}` or
//! `{$BuildNumber,D4}`. Date formats use custom tokens (`yyyy`, `MM`, `dd`,
//! `HH`, `mm`, `ss`, `fff`, ...) or, when the format contains `%`, strftime
//! syntax. Integer formats use a specifier letter plus precision (`D3`, `X8`,
//! `N0`) or a `0`/`#` digit pattern.

use std::collections::HashMap;
use std::fmt;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Local, Timelike};

pub const DATE_TIME: &str = "DateTime";
pub const BUILD_TARGET_GROUP: &str = "BuildTargetGroup";

/// Largest padding width or precision a format may ask for.
pub const MAX_PRECISION: usize = 999;

/// A global variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalValue {
    DateTime(DateTime<Local>),
    Integer(i64),
    Text(String),
}

impl fmt::Display for GlobalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            GlobalValue::Integer(n) => write!(f, "{n}"),
            GlobalValue::Text(s) => f.write_str(s),
        }
    }
}

impl GlobalValue {
    /// Render with `format`. Text ignores the format; an empty format gives
    /// the default rendering.
    pub fn render(&self, format: &str) -> Result<String, String> {
        if format.is_empty() {
            return Ok(self.to_string());
        }
        match self {
            GlobalValue::DateTime(dt) => format_date_time(dt, format),
            GlobalValue::Integer(n) => format_integer(*n, format),
            GlobalValue::Text(s) => Ok(s.clone()),
        }
    }
}

/// Per-resolution global variables. Names are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalVariables {
    vars: HashMap<String, GlobalValue>,
}

impl GlobalVariables {
    /// The standard set: `DateTime` and `BuildTargetGroup`.
    pub fn standard(now: DateTime<Local>, platform: &str) -> Self {
        let mut globals = Self::default();
        globals.insert(DATE_TIME, GlobalValue::DateTime(now));
        globals.insert(BUILD_TARGET_GROUP, GlobalValue::Text(platform.to_string()));
        globals
    }

    pub fn insert(&mut self, name: &str, value: GlobalValue) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&GlobalValue> {
        self.vars.get(name)
    }
}

fn format_date_time(dt: &DateTime<Local>, format: &str) -> Result<String, String> {
    if format.contains('%') {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err("invalid strftime format".into());
        }
        return Ok(dt.format(format).to_string());
    }

    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        match c {
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&x| x == c)
                    .ok_or("unterminated quoted literal")?;
                out.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
                continue;
            }
            '\\' => {
                let next = chars.get(i + 1).ok_or("dangling escape")?;
                out.push(*next);
                i += 2;
                continue;
            }
            'y' => {
                let year = dt.year();
                let text = match run {
                    1 => (year % 100).to_string(),
                    2 => format!("{:02}", year % 100),
                    n => format!("{year:0n$}", n = checked_precision(n)?),
                };
                out.push_str(&text);
            }
            'M' => push_numeric_or_name(&mut out, run, dt.month(), month_name(dt.month())),
            'd' => push_numeric_or_name(&mut out, run, dt.day(), &dt.format("%A").to_string()),
            'H' => push_padded(&mut out, run, dt.hour()),
            'h' => push_padded(&mut out, run, dt.hour12().1),
            'm' => push_padded(&mut out, run, dt.minute()),
            's' => push_padded(&mut out, run, dt.second()),
            'f' | 'F' => {
                if run > 9 {
                    return Err("too many fraction digits".into());
                }
                let nanos = dt.nanosecond() % 1_000_000_000;
                let digits = format!("{nanos:09}");
                let frac = &digits[..run];
                if c == 'F' {
                    out.push_str(frac.trim_end_matches('0'));
                } else {
                    out.push_str(frac);
                }
            }
            't' => {
                let marker = if dt.hour12().0 { "PM" } else { "AM" };
                out.push_str(if run == 1 { &marker[..1] } else { marker });
            }
            _ => out.extend(std::iter::repeat_n(c, run)),
        }
        i += run;
    }
    Ok(out)
}

fn push_padded(out: &mut String, run: usize, value: u32) {
    if run == 1 {
        out.push_str(&value.to_string());
    } else {
        out.push_str(&format!("{value:02}"));
    }
}

fn push_numeric_or_name(out: &mut String, run: usize, value: u32, name: &str) {
    match run {
        1 | 2 => push_padded(out, run, value),
        3 => out.push_str(&name[..name.len().min(3)]),
        _ => out.push_str(name),
    }
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES[(month as usize).saturating_sub(1) % 12]
}

fn format_integer(n: i64, format: &str) -> Result<String, String> {
    if format.chars().all(|c| c == '0' || c == '#') {
        let width = format.chars().filter(|&c| c == '0').count();
        return Ok(pad_signed(n, checked_precision(width)?));
    }

    let mut chars = format.chars();
    let spec = chars.next().ok_or("empty format")?;
    let precision_text = chars.as_str();
    let precision: Option<usize> = if precision_text.is_empty() {
        None
    } else {
        let parsed = precision_text
            .parse()
            .map_err(|_| format!("invalid precision '{precision_text}'"))?;
        Some(checked_precision(parsed)?)
    };

    match spec {
        'D' | 'd' => Ok(pad_signed(n, precision.unwrap_or(0))),
        'X' => Ok(format!("{:0width$X}", n, width = precision.unwrap_or(0))),
        'x' => Ok(format!("{:0width$x}", n, width = precision.unwrap_or(0))),
        'N' | 'n' => Ok(group_thousands(n, precision.unwrap_or(2))),
        'F' | 'f' => Ok(format!("{:.prec$}", n as f64, prec = precision.unwrap_or(2))),
        'G' | 'g' => Ok(n.to_string()),
        other => Err(format!("unsupported integer format specifier '{other}'")),
    }
}

fn checked_precision(n: usize) -> Result<usize, String> {
    if n > MAX_PRECISION {
        return Err(format!("precision {n} exceeds {MAX_PRECISION}"));
    }
    Ok(n)
}

fn pad_signed(n: i64, width: usize) -> String {
    let digits = format!("{:0width$}", n.unsigned_abs(), width = width);
    if n < 0 { format!("-{digits}") } else { digits }
}

fn group_thousands(n: i64, decimals: usize) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if decimals > 0 {
        grouped.push('.');
        grouped.extend(std::iter::repeat_n('0', decimals));
    }
    if n < 0 { format!("-{grouped}") } else { grouped }
}
