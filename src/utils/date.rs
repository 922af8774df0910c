use chrono::NaiveDateTime;

pub const DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn format_date(date: NaiveDateTime) -> String {
    format!("{}", date.format(DATE_FMT))
}

// Dates are stored in the same format they are serialized in, so stored strings compare
// in chronological order.
pub mod serializer {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;
    use crate::utils::date::{DATE_FMT, format_date};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        format_date(*time).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let str_time: String = Deserialize::deserialize(deserializer)?;
        let time = NaiveDateTime::parse_from_str(&str_time, DATE_FMT).map_err(D::Error::custom)?;
        Ok(time)
    }
}

pub mod opt_serializer {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;
    use crate::utils::date::{DATE_FMT, format_date};

    pub fn serialize<S: Serializer>(time: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        time.map(format_date).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let str_time: Option<String> = Deserialize::deserialize(deserializer)?;
        match str_time {
            Some(s) if !s.is_empty() => {
                NaiveDateTime::parse_from_str(&s, DATE_FMT).map(Some).map_err(D::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

// Parses durations such as "30s", "15m", "1h" or "7d" into seconds; a bare number is seconds.
pub fn parse_ttl(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (num, multiplier) = match value.chars().last() {
        Some('s') => (&value[..value.len() - 1], 1),
        Some('m') => (&value[..value.len() - 1], 60),
        Some('h') => (&value[..value.len() - 1], 60 * 60),
        Some('d') => (&value[..value.len() - 1], 24 * 60 * 60),
        _ => (value, 1),
    };
    num.parse::<i64>().ok().filter(|n| *n > 0).map(|n| n * multiplier)
}
