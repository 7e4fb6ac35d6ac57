//! IdGenerator port.

use crate::domain::ids::{InvocationId, PassId};
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_pass_id(&self) -> PassId;

    fn generate_invocation_id(&self) -> InvocationId;
}

/// ULIDs stamped with the time reported by `C`.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_pass_id(&self) -> PassId {
        PassId::from(self.next())
    }

    fn generate_invocation_id(&self) -> InvocationId {
        InvocationId::from(self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn generated_ids_are_unique() {
        let id_gen = UlidGenerator::new(SystemClock);
        let a = id_gen.generate_invocation_id();
        let b = id_gen.generate_invocation_id();
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_clock_pins_the_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(at));

        let pass = id_gen.generate_pass_id();
        let invocation = id_gen.generate_invocation_id();

        assert_eq!(pass.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
        assert_eq!(invocation.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
        assert!(pass.to_string().starts_with("pass-"));
    }
}
