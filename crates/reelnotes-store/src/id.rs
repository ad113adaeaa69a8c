use chrono::Utc;
use reelnotes_config::IdStrategy;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of candidate review ids.
///
/// Candidates only need to be unlikely to repeat; the store still checks each
/// one against the current collection before using it.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Millisecond timestamps, bumped by one when two calls land in the same millisecond.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: AtomicI64,
}

impl IdGenerator for TimestampIds {
    fn next_id(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self.last.compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return next.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}

pub fn generator_for(strategy: IdStrategy) -> Box<dyn IdGenerator> {
    match strategy {
        IdStrategy::Uuid => Box::new(UuidIds),
        IdStrategy::Timestamp => Box::new(TimestampIds::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_timestamp_ids_never_repeat_in_tight_loop() {
        let ids = TimestampIds::default();
        let seen: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_timestamp_ids_are_epoch_millis() {
        let before = Utc::now().timestamp_millis();
        let id: i64 = TimestampIds::default().next_id().parse().unwrap();
        assert!(id >= before);
    }

    #[test]
    fn test_uuid_ids_parse() {
        let id = UuidIds.next_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
