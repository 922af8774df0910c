use chrono::{NaiveDateTime, Utc};

// Clock is injected into services so due dates, overdue projection and token
// expiry can be tested without sleeping.
pub trait Clock: Sync + Send {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}
