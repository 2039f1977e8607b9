//! Alarm Poller - Fixed-interval scan of active alarms
//!
//! Each cycle reads the clock once, loads active alarms, and hands every alarm
//! that matches the minute rule to the trigger sink on its own task. A failed
//! cycle is logged and the loop keeps going.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::matcher::{should_trigger, trigger_minute};
use crate::types::Alarm;

/// Default poll interval (60s)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Read access to stored alarms
#[async_trait]
pub trait AlarmSource: Send + Sync {
    /// Every alarm with `is_active = true`
    async fn list_active_alarms(&self) -> Result<Vec<Alarm>>;

    async fn get_alarm(&self, id: i64) -> Result<Alarm>;
}

/// Receives matched alarms
///
/// Implementations handle their own failures; nothing is reported back to the
/// poller.
#[async_trait]
pub trait TriggerSink: Send + Sync {
    async fn on_trigger(&self, alarm: Alarm, triggered_at: NaiveDateTime);
}

/// Local wall clock
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

/// Poller statistics
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PollerStatus {
    pub running: bool,
    pub interval_secs: u64,
    /// Completed cycles, failed ones included
    pub cycles: u64,
    pub total_triggered: u64,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub last_cycle_at: Option<NaiveDateTime>,
    pub last_error: Option<String>,
}

/// Alarm Poller - scans active alarms every interval
pub struct AlarmPoller {
    source: Arc<dyn AlarmSource>,
    sink: Arc<dyn TriggerSink>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    /// (alarm id, minute) pairs already dispatched in the current minute
    fired: Mutex<HashSet<(i64, NaiveDateTime)>>,
    stats: RwLock<PollerStatus>,
    shutdown: Notify,
    running: AtomicBool,
}

impl AlarmPoller {
    pub fn new(
        source: Arc<dyn AlarmSource>,
        sink: Arc<dyn TriggerSink>,
        clock: Arc<dyn Clock>,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            sink,
            clock,
            interval: config.interval,
            fired: Mutex::new(HashSet::new()),
            stats: RwLock::new(PollerStatus {
                interval_secs: config.interval.as_secs(),
                ..Default::default()
            }),
            shutdown: Notify::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Run the poll loop until [`stop`](Self::stop) is called
    ///
    /// The first cycle runs immediately.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Alarm poller already running");
            return;
        }
        info!("Starting alarm poller with {}s interval", self.interval.as_secs());

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = self.shutdown.notified() => {
                    info!("Alarm poller received shutdown signal");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Alarm poller stopped");
    }

    /// Stop the poll loop
    pub fn stop(&self) {
        info!("Stopping alarm poller...");
        self.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the poller statistics
    pub async fn status(&self) -> PollerStatus {
        let mut status = self.stats.read().await.clone();
        status.running = self.is_running();
        status
    }

    /// One cycle with bookkeeping; errors are logged, never returned
    pub async fn poll_once(&self) {
        let result = self.run_cycle().await;

        let mut stats = self.stats.write().await;
        stats.cycles += 1;
        stats.last_cycle_at = Some(self.clock.now());
        match result {
            Ok(triggered) => {
                stats.total_triggered += triggered.len() as u64;
                stats.last_error = None;
            },
            Err(e) => {
                error!("Alarm poll cycle failed: {}", e);
                stats.last_error = Some(e.to_string());
            },
        }
    }

    /// Scan active alarms once and dispatch matches
    ///
    /// Returns the IDs of the alarms handed to the sink. An alarm is
    /// dispatched at most once per minute even if cycles run closer together.
    pub async fn run_cycle(&self) -> Result<Vec<i64>> {
        let now = self.clock.now();
        let minute = trigger_minute(now);
        let alarms = self.source.list_active_alarms().await?;

        let mut fired = self.fired.lock().await;
        fired.retain(|(_, m)| *m == minute);

        let mut triggered = Vec::new();
        for alarm in alarms {
            if !alarm.is_active || !should_trigger(now, &alarm) {
                continue;
            }
            if !fired.insert((alarm.id, minute)) {
                debug!("Alarm {} already fired at {}", alarm.id, minute.format("%H:%M"));
                continue;
            }

            debug!("Alarm {} matched at {}", alarm.id, now);
            triggered.push(alarm.id);

            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                sink.on_trigger(alarm, now).await;
            });
        }

        Ok(triggered)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // unwrap is acceptable in tests
mod tests {
    use super::*;
    use crate::error::AlarmError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;
    use tracing_test::traced_test;

    struct FixedClock(StdMutex<NaiveDateTime>);

    impl FixedClock {
        fn at(s: &str) -> Arc<Self> {
            Arc::new(Self(StdMutex::new(
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap(),
            )))
        }

        fn set(&self, s: &str) {
            *self.0.lock().unwrap() =
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    struct StaticSource(Vec<Alarm>);

    #[async_trait]
    impl AlarmSource for StaticSource {
        async fn list_active_alarms(&self) -> Result<Vec<Alarm>> {
            Ok(self.0.clone())
        }

        async fn get_alarm(&self, id: i64) -> Result<Alarm> {
            self.0
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .ok_or(AlarmError::AlarmNotFound(id))
        }
    }

    /// Fails on the first call, succeeds afterwards
    #[derive(Default)]
    struct FlakySource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlarmSource for FlakySource {
        async fn list_active_alarms(&self) -> Result<Vec<Alarm>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AlarmError::DatabaseError("database is locked".into()));
            }
            Ok(Vec::new())
        }

        async fn get_alarm(&self, id: i64) -> Result<Alarm> {
            Err(AlarmError::AlarmNotFound(id))
        }
    }

    #[derive(Default)]
    struct CountingSink {
        fired: StdMutex<Vec<i64>>,
    }

    #[async_trait]
    impl TriggerSink for CountingSink {
        async fn on_trigger(&self, alarm: Alarm, _triggered_at: NaiveDateTime) {
            self.fired.lock().unwrap().push(alarm.id);
        }
    }

    fn alarm(id: i64, time: &str) -> Alarm {
        Alarm {
            id,
            time: NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M:%S").unwrap(),
            is_active: true,
            vibration: true,
            sound: "default".into(),
            repeat_days: vec![],
            description: None,
            user_id: 1,
        }
    }

    fn poller(source: Arc<dyn AlarmSource>, sink: Arc<dyn TriggerSink>, clock: Arc<dyn Clock>) -> AlarmPoller {
        AlarmPoller::new(source, sink, clock, PollerConfig::default())
    }

    #[tokio::test]
    async fn test_cycle_dispatches_matching_alarms() {
        let source = Arc::new(StaticSource(vec![
            alarm(1, "2024-01-01 07:00:00"),
            alarm(2, "2024-01-01 08:00:00"),
        ]));
        let sink = Arc::new(CountingSink::default());
        let clock = FixedClock::at("2024-01-03 07:00:05");
        let poller = poller(source, sink.clone(), clock);

        let triggered = poller.run_cycle().await.unwrap();
        assert_eq!(triggered, vec![1]);

        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*sink.fired.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_alarm_fires_once_per_minute() {
        let source = Arc::new(StaticSource(vec![alarm(1, "2024-01-01 07:00:00")]));
        let sink = Arc::new(CountingSink::default());
        let clock = FixedClock::at("2024-01-03 07:00:02");
        let poller = poller(source, sink, clock.clone());

        assert_eq!(poller.run_cycle().await.unwrap(), vec![1]);

        clock.set("2024-01-03 07:00:07");
        assert!(poller.run_cycle().await.unwrap().is_empty());

        // Next day, same minute fires again
        clock.set("2024-01-04 07:00:01");
        assert_eq!(poller.run_cycle().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_inactive_alarm_is_skipped() {
        let mut off = alarm(1, "2024-01-01 07:00:00");
        off.is_active = false;
        let poller = poller(
            Arc::new(StaticSource(vec![off])),
            Arc::new(CountingSink::default()),
            FixedClock::at("2024-01-03 07:00:01"),
        );

        assert!(poller.run_cycle().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_cycle_is_recorded() {
        let poller = poller(
            Arc::new(FlakySource::default()),
            Arc::new(CountingSink::default()),
            FixedClock::at("2024-01-03 07:00:01"),
        );

        poller.poll_once().await;
        let status = poller.status().await;
        assert_eq!(status.cycles, 1);
        assert!(status.last_error.unwrap().contains("database is locked"));
        assert!(logs_contain("Alarm poll cycle failed"));

        poller.poll_once().await;
        let status = poller.status().await;
        assert_eq!(status.cycles, 2);
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_failures_and_stops() {
        let source = Arc::new(FlakySource::default());
        let poller = Arc::new(poller(
            source.clone(),
            Arc::new(CountingSink::default()),
            FixedClock::at("2024-01-03 12:00:30"),
        ));

        let runner = Arc::clone(&poller);
        let handle = tokio::spawn(async move { runner.start().await });

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert!(poller.is_running());
        assert!(source.calls.load(Ordering::SeqCst) >= 3);

        poller.stop();
        handle.await.unwrap();
        assert!(!poller.is_running());
        assert!(poller.status().await.cycles >= 3);
    }
}
