use chrono::{DateTime, Local};

/// 取得目前時間的來源，測試時可替換成固定時間
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// 系統時間
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 永遠回傳同一個時間點
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
