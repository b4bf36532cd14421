use chrono::{SecondsFormat, Utc};

/// Returns the current UTC instant as an RFC 3339 string with microseconds.
///
/// Used to tag corrupted writes so the offending replica and moment are
/// attributable when snapshots are compared.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "bad timestamp {ts}");
    }
}
