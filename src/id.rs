//! ID generation for task records.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Generate a task ID anchored at the given creation time.
///
/// Format: `{timestamp_ms}-{random_hex}`
/// Example: `1738300800123-a1b2c3d4`
pub fn generate_task_id(created_at: DateTime<Utc>) -> String {
    let random: u32 = rand::rng().random();
    format!("{}-{:08x}", created_at.timestamp_millis(), random)
}

/// Generate an event ID
///
/// Format: `evt-{timestamp_ms}-{random_hex}`
pub fn generate_event_id(at: DateTime<Utc>) -> String {
    let random: u32 = rand::rng().random();
    format!("evt-{}-{:08x}", at.timestamp_millis(), random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_task_id_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap();
        let id = generate_task_id(at);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], at.timestamp_millis().to_string());
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_event_id_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap();
        let id = generate_event_id(at);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "evt");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_ids_sort_by_creation_time() {
        let earlier = Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 1, 31, 10, 0, 0).unwrap();
        assert!(generate_task_id(earlier) < generate_task_id(later));
    }
}
