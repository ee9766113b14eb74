use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

// 重新导出serde_with
pub use serde_with::{serde_as, DeserializeAs, SerializeAs};

/// Duration的人性化格式化器
///
/// 支持格式: "3s", "100ms", "2m", "1h", "1h30m45s", "2d"
pub struct HumanDur;

impl SerializeAs<Duration> for HumanDur {
    fn serialize_as<S>(source: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*source))
    }
}

impl<'de> DeserializeAs<'de, Duration> for HumanDur {
    fn deserialize_as<D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// 解析时间字符串: "1h30m45s" -> Duration
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err(anyhow!("empty duration"));
    }

    let mut total = Duration::ZERO;
    let mut rest = s.as_str();

    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return Err(anyhow!("expected a number in '{}'", s));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| anyhow!("invalid number '{}'", &rest[..num_end]))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let nanos_per_unit: u64 = match unit {
            "ns" => 1,
            "us" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3600 * 1_000_000_000,
            "d" => 86400 * 1_000_000_000,
            "" => return Err(anyhow!("missing time unit in '{}'", s)),
            other => return Err(anyhow!("unsupported time unit '{}'", other)),
        };

        total += Duration::from_nanos((value * nanos_per_unit as f64).round() as u64);
    }

    Ok(total)
}

/// Duration格式化为字符串: Duration -> "1h30m45s"
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let nanos = duration.subsec_nanos();

    if total_secs == 0 {
        return match nanos {
            0 => "0s".to_string(),
            n if n % 1_000_000 == 0 => format!("{}ms", n / 1_000_000),
            n if n % 1_000 == 0 => format!("{}us", n / 1_000),
            n => format!("{}ns", n),
        };
    }

    let mut out = String::new();
    let mut remaining = total_secs;
    for (unit, secs) in [("d", 86400), ("h", 3600), ("m", 60)] {
        if remaining >= secs {
            out.push_str(&format!("{}{}", remaining / secs, unit));
            remaining %= secs;
        }
    }

    if nanos == 0 {
        if remaining > 0 {
            out.push_str(&format!("{}s", remaining));
        }
    } else {
        out.push_str(&format!("{}ms", remaining * 1000 + (nanos / 1_000_000) as u64));
    }

    out
}
