/// Injectable time source for the poll loop.
use std::time::Duration;

pub trait Clock {
    fn sleep(&mut self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Wall-clock time via the tokio timer.
pub struct WallClock;

impl Clock for WallClock {
    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
