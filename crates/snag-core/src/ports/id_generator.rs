//! IdGenerator port - ID 生成の抽象化
//!
//! Clock の時刻を ULID の timestamp 部分に使うので、FixedClock を渡すと
//! timestamp が決定的になります（ランダム部分は変わる）。

use crate::domain::ids::{AttemptId, RunId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator はログ相関用 ID を生成
pub trait IdGenerator: Send + Sync {
    fn generate_run_id(&self) -> RunId;

    fn generate_attempt_id(&self) -> AttemptId;
}

/// UlidGenerator は Clock の時刻 + 乱数で ULID を作る
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_run_id(&self) -> RunId {
        RunId::from(self.next_ulid())
    }

    fn generate_attempt_id(&self) -> AttemptId {
        AttemptId::from(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);
        let a = id_gen.generate_attempt_id();
        let b = id_gen.generate_attempt_id();
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_clock_pins_the_timestamp_part() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let run = id_gen.generate_run_id();
        let attempt = id_gen.generate_attempt_id();

        assert_eq!(run.as_ulid().timestamp_ms(), fixed_time.timestamp_millis() as u64);
        assert_eq!(attempt.as_ulid().timestamp_ms(), run.as_ulid().timestamp_ms());
    }
}
