/// The shutdown monitor: assert liveness once at startup, then poll the
/// shutdown-request line until the Sleepy Pi asserts it, then hand the host
/// off to the shutdown command.
///
/// Generic over the pin, host and clock capabilities so the loop logic runs
/// identically against real hardware and against the simulated bank.
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::host::HostControl;
use crate::pins::{PinController, PinError};
use std::time::Duration;

/// Loop state. `ShutdownTriggered` is terminal: no further samples are taken
/// and no second shutdown request is ever issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    ShutdownTriggered,
}

pub struct ShutdownMonitor<P, H, C> {
    pins: P,
    host: H,
    clock: C,
    input_pin: u8,
    output_pin: u8,
    interval: Duration,
    state: MonitorState,
}

impl<P: PinController, H: HostControl, C: Clock> ShutdownMonitor<P, H, C> {
    pub fn new(config: &MonitorConfig, pins: P, host: H, clock: C) -> Self {
        Self {
            pins,
            host,
            clock,
            input_pin: config.pins.shutdown_request,
            output_pin: config.pins.liveness,
            interval: Duration::from_millis(config.poll.interval_ms),
            state: MonitorState::Running,
        }
    }

    /// Startup contract: configure both pins, then assert the liveness
    /// output high exactly once. Must complete before the first sample.
    pub fn start(&mut self) -> Result<(), PinError> {
        self.pins.configure_input(self.input_pin)?;
        self.pins.configure_output(self.output_pin)?;
        self.pins.write(self.output_pin, true)?;
        tracing::info!(
            pin = self.output_pin,
            "telling the Sleepy Pi we are running"
        );
        Ok(())
    }

    /// Take one input sample and act on it.
    ///
    /// An unasserted sample sleeps the poll interval and stays `Running`.
    /// An asserted sample requests the host shutdown and transitions to
    /// `ShutdownTriggered`; the shutdown command is fire-and-forget, so a
    /// command failure is logged but still ends the loop. Once triggered,
    /// further calls return without sampling.
    pub async fn poll_once(&mut self) -> Result<MonitorState, PinError> {
        if self.state == MonitorState::ShutdownTriggered {
            return Ok(self.state);
        }

        if self.pins.read(self.input_pin)? {
            tracing::info!(
                pin = self.input_pin,
                "Sleepy Pi requesting shutdown"
            );
            if let Err(e) = self.host.request_shutdown().await {
                tracing::error!(error = %e, "shutdown command failed");
            }
            self.state = MonitorState::ShutdownTriggered;
        } else {
            self.clock.sleep(self.interval).await;
        }

        Ok(self.state)
    }

    /// Run the monitor to completion: startup contract, then poll until the
    /// shutdown request is observed.
    pub async fn run(&mut self) -> Result<(), PinError> {
        self.start()?;
        tracing::info!(
            input_pin = self.input_pin,
            interval_ms = self.interval.as_millis() as u64,
            "watching for shutdown request"
        );
        while self.poll_once().await? == MonitorState::Running {}
        Ok(())
    }

    #[allow(dead_code)]
    pub fn state(&self) -> MonitorState {
        self.state
    }

    #[allow(dead_code)]
    pub fn pins(&self) -> &P {
        &self.pins
    }

    #[allow(dead_code)]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[allow(dead_code)]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;
    use crate::pins::{PinEvent, SimPinBank};

    /// Counts shutdown requests; optionally fails each one.
    #[derive(Default)]
    struct FakeHost {
        requests: u32,
        fail: bool,
    }

    impl HostControl for FakeHost {
        async fn request_shutdown(&mut self) -> Result<(), HostError> {
            self.requests += 1;
            if self.fail {
                Err(HostError::Failed { code: Some(1) })
            } else {
                Ok(())
            }
        }
    }

    /// Records requested sleep durations and returns immediately.
    #[derive(Default)]
    struct ManualClock {
        sleeps: Vec<Duration>,
    }

    impl Clock for ManualClock {
        async fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
        }
    }

    fn monitor_with(
        bank: SimPinBank,
    ) -> ShutdownMonitor<SimPinBank, FakeHost, ManualClock> {
        ShutdownMonitor::new(
            &MonitorConfig::default(),
            bank,
            FakeHost::default(),
            ManualClock::default(),
        )
    }

    #[test]
    fn test_startup_asserts_liveness_exactly_once() {
        let mut monitor = monitor_with(SimPinBank::new());
        monitor.start().unwrap();

        assert_eq!(monitor.pins().output(25), Some(true));
        assert_eq!(monitor.pins().writes_to(25), 1);
    }

    #[test]
    fn test_each_fresh_run_asserts_liveness_exactly_once() {
        for _ in 0..3 {
            let mut monitor = monitor_with(SimPinBank::new());
            monitor.start().unwrap();
            assert_eq!(monitor.pins().writes_to(25), 1);
        }
    }

    #[tokio::test]
    async fn test_liveness_asserted_before_first_sample() {
        let mut bank = SimPinBank::new();
        bank.set_input(24, true);
        let mut monitor = monitor_with(bank);
        monitor.run().await.unwrap();

        let journal = monitor.pins().journal();
        let wrote = journal
            .iter()
            .position(|e| matches!(e, PinEvent::Wrote { pin: 25, level: true }))
            .expect("liveness assertion missing");
        let first_read = journal
            .iter()
            .position(|e| matches!(e, PinEvent::Read { pin: 24, .. }))
            .expect("no input sample taken");
        assert!(wrote < first_read);
    }

    #[tokio::test]
    async fn test_no_trigger_while_input_stays_low() {
        let mut monitor = monitor_with(SimPinBank::new());
        monitor.start().unwrap();

        for _ in 0..1000 {
            assert_eq!(monitor.poll_once().await.unwrap(), MonitorState::Running);
        }

        assert_eq!(monitor.host().requests, 0);
        assert_eq!(monitor.pins().reads_of(24), 1000);
        assert_eq!(monitor.clock().sleeps.len(), 1000);
    }

    #[tokio::test]
    async fn test_trigger_scenario_low_five_then_high() {
        let mut bank = SimPinBank::new();
        bank.script_input(24, [false, false, false, false, false, true]);
        let mut monitor = monitor_with(bank);
        monitor.run().await.unwrap();

        assert_eq!(monitor.state(), MonitorState::ShutdownTriggered);
        assert_eq!(monitor.pins().writes_to(25), 1);
        assert_eq!(monitor.pins().reads_of(24), 6);
        assert_eq!(monitor.clock().sleeps.len(), 5);
        assert_eq!(monitor.host().requests, 1);
    }

    #[tokio::test]
    async fn test_no_samples_after_trigger() {
        let mut bank = SimPinBank::new();
        bank.set_input(24, true);
        let mut monitor = monitor_with(bank);
        monitor.run().await.unwrap();
        assert_eq!(monitor.pins().reads_of(24), 1);

        // Terminal state: polling again must not sample or re-request.
        assert_eq!(
            monitor.poll_once().await.unwrap(),
            MonitorState::ShutdownTriggered
        );
        assert_eq!(monitor.pins().reads_of(24), 1);
        assert_eq!(monitor.host().requests, 1);
    }

    #[tokio::test]
    async fn test_every_sleep_uses_the_configured_interval() {
        let mut bank = SimPinBank::new();
        bank.script_input(24, [false, false, false, true]);
        let mut monitor = monitor_with(bank);
        monitor.run().await.unwrap();

        assert_eq!(
            monitor.clock().sleeps,
            vec![Duration::from_millis(500); 3]
        );
    }

    #[tokio::test]
    async fn test_custom_interval_is_respected() {
        let config: MonitorConfig =
            toml::from_str("[poll]\ninterval_ms = 125").unwrap();
        let mut bank = SimPinBank::new();
        bank.script_input(24, [false, true]);
        let mut monitor = ShutdownMonitor::new(
            &config,
            bank,
            FakeHost::default(),
            ManualClock::default(),
        );
        monitor.run().await.unwrap();

        assert_eq!(monitor.clock().sleeps, vec![Duration::from_millis(125)]);
    }

    #[tokio::test]
    async fn test_failed_shutdown_command_still_ends_the_loop() {
        let mut bank = SimPinBank::new();
        bank.set_input(24, true);
        let mut monitor = ShutdownMonitor::new(
            &MonitorConfig::default(),
            bank,
            FakeHost {
                fail: true,
                ..Default::default()
            },
            ManualClock::default(),
        );
        monitor.run().await.unwrap();

        assert_eq!(monitor.state(), MonitorState::ShutdownTriggered);
        assert_eq!(monitor.host().requests, 1);
    }

    #[tokio::test]
    async fn test_configured_pin_numbers_are_used() {
        let config: MonitorConfig =
            toml::from_str("[pins]\nshutdown_request = 17\nliveness = 27").unwrap();
        let mut bank = SimPinBank::new();
        bank.set_input(17, true);
        let mut monitor = ShutdownMonitor::new(
            &config,
            bank,
            FakeHost::default(),
            ManualClock::default(),
        );
        monitor.run().await.unwrap();

        assert_eq!(monitor.pins().output(27), Some(true));
        assert_eq!(monitor.pins().reads_of(17), 1);
    }
}
