use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Source of `created_at`/`updated_at` values.
///
/// Stamps are kept at microsecond precision and are strictly increasing
/// within one process, so a row's `updated_at` always moves forward on write.
#[derive(Debug, Default)]
pub struct Timestamper {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Timestamper {
    pub fn new() -> Timestamper {
        Timestamper::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}

#[tokio::test]
async fn timestamper_is_strictly_increasing() -> anyhow::Result<()> {
    // arrange
    let clock = Timestamper::new();

    // act
    let stamps: Vec<_> = (0..1000).map(|_| clock.now()).collect();

    // assert
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    assert!(stamps.iter().all(|s| s.timestamp_subsec_nanos() % 1000 == 0));
    Ok(())
}
