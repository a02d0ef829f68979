//! The polling loop: fetch, validate, extract, notify, then sleep.
//!
//! After startup the loop alternates between [`Phase::Polling`] and
//! [`Phase::Sleeping`] forever. Duplicate suppression only remembers the last
//! status message and the last error message, so "A, B, A" notifies three times.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{NotifierError, Result};
use crate::homework::{check_response, current_date, parse_status, HomeworkSource};
use crate::telegram::{notify, Notifier};

pub const ERROR_PREFIX: &str = "Program malfunction";

/// Source of "now" and of the end-of-cycle pause.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current unix timestamp in seconds.
    fn now(&self) -> i64;

    async fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    async fn sleep(&self, duration: Duration) {
        sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Polling,
    Sleeping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A status message was derived; `sent` is false when it repeated the last one.
    Status { message: String, sent: bool },
    /// The cycle failed; `sent` is false when the error text repeated the last one.
    Failure { message: String, sent: bool },
}

impl CycleOutcome {
    pub fn was_sent(&self) -> bool {
        match self {
            CycleOutcome::Status { sent, .. } | CycleOutcome::Failure { sent, .. } => *sent,
        }
    }
}

pub fn error_message(err: &NotifierError) -> String {
    format!("{}: {}", ERROR_PREFIX, err)
}

pub struct Poller<S, N, C> {
    source: S,
    notifier: N,
    clock: C,
    interval: Duration,
    phase: Phase,
    cursor: i64,
    last_message: Option<String>,
    last_error: Option<String>,
}

impl<S, N, C> Poller<S, N, C>
where
    S: HomeworkSource,
    N: Notifier,
    C: Clock,
{
    pub fn new(source: S, notifier: N, clock: C, interval: Duration) -> Self {
        let cursor = clock.now();
        Self {
            source,
            notifier,
            clock,
            interval,
            phase: Phase::Polling,
            cursor,
            last_message: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Run forever. Only process termination stops it.
    pub async fn run(&mut self) {
        info!(
            "Starting homework poller with interval: {:?}",
            self.interval
        );

        loop {
            self.step().await;
        }
    }

    /// Run `cycles` complete poll-then-sleep cycles.
    pub async fn run_cycles(&mut self, cycles: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(cycles);
        while outcomes.len() < cycles {
            if let Some(outcome) = self.step().await {
                outcomes.push(outcome);
            }
        }
        // Finish the last cycle's sleep so the next call starts in Polling.
        if self.phase == Phase::Sleeping {
            self.step().await;
        }
        outcomes
    }

    /// Advance the state machine by one phase. Returns the outcome after a poll.
    pub async fn step(&mut self) -> Option<CycleOutcome> {
        match self.phase {
            Phase::Polling => {
                let outcome = self.poll_once().await;
                self.phase = Phase::Sleeping;
                Some(outcome)
            }
            Phase::Sleeping => {
                debug!("Sleeping for {:?}", self.interval);
                self.clock.sleep(self.interval).await;
                self.phase = Phase::Polling;
                None
            }
        }
    }

    /// One Polling phase without the trailing sleep.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        match self.fetch_message().await {
            Ok((message, next_cursor)) => {
                if let Some(cursor) = next_cursor {
                    self.cursor = cursor;
                }

                let sent = self.last_message.as_deref() != Some(message.as_str());
                if sent {
                    notify(&self.notifier, &message).await;
                    self.last_message = Some(message.clone());
                } else {
                    debug!("Status unchanged, not notifying: {}", message);
                }

                CycleOutcome::Status { message, sent }
            }
            Err(e) => self.report_failure(e).await,
        }
    }

    async fn fetch_message(&self) -> Result<(String, Option<i64>)> {
        let response = self.source.fetch(self.cursor).await?;
        let homework = check_response(&response)?;
        let message = parse_status(homework)?;
        Ok((message, current_date(&response)))
    }

    async fn report_failure(&mut self, err: NotifierError) -> CycleOutcome {
        match &err {
            NotifierError::HttpStatus { status } => {
                error!(kind = err.kind(), status = *status, "{}", err)
            }
            NotifierError::Transport(_)
            | NotifierError::Schema(_)
            | NotifierError::UnknownStatus(_) => error!(kind = err.kind(), "{}", err),
            NotifierError::Notification(_) | NotifierError::Config(_) => {
                error!(kind = err.kind(), "Unexpected error from homework source: {}", err)
            }
        }

        let message = error_message(&err);
        let sent = self.last_error.as_deref() != Some(message.as_str());
        if sent {
            notify(&self.notifier, &message).await;
            self.last_error = Some(message.clone());
        } else {
            debug!("Same error as last cycle, not notifying");
        }

        CycleOutcome::Failure { message, sent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use mockall::{mock, Sequence};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    mock! {
        pub Sink {}

        #[async_trait]
        impl Notifier for Sink {
            async fn send(&self, text: &str) -> Result<()>;
        }
    }

    struct ScriptedSource {
        answers: Mutex<VecDeque<Result<Value>>>,
        requested: Mutex<Vec<i64>>,
    }

    impl ScriptedSource {
        fn new(answers: Vec<Result<Value>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HomeworkSource for ScriptedSource {
        async fn fetch(&self, from_date: i64) -> Result<Value> {
            self.requested.lock().unwrap().push(from_date);
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"homeworks": []})))
        }
    }

    struct FakeClock {
        now: i64,
        slept: Mutex<Vec<Duration>>,
    }

    impl FakeClock {
        fn at(now: i64) -> Self {
            Self {
                now,
                slept: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> i64 {
            self.now
        }

        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    fn answer(name: &str, status: &str, date: i64) -> Result<Value> {
        Ok(json!({
            "homeworks": [{"homework_name": name, "status": status}],
            "current_date": date
        }))
    }

    fn status_text(name: &str) -> String {
        format!(
            "Changed review status of work \"{}\". Work has been taken for review by the reviewer.",
            name
        )
    }

    #[tokio::test]
    async fn test_identical_messages_notify_once() {
        let source = ScriptedSource::new(vec![
            answer("hw1", "reviewing", 100),
            answer("hw1", "reviewing", 200),
        ]);
        let mut sink = MockSink::new();
        let expected = status_text("hw1");
        sink.expect_send()
            .withf(move |text| text == expected)
            .times(1)
            .returning(|_| Ok(()));

        let mut poller = Poller::new(source, sink, FakeClock::at(50), Duration::from_secs(600));
        let outcomes = poller.run_cycles(2).await;

        assert!(outcomes[0].was_sent());
        assert!(!outcomes[1].was_sent());
        assert_eq!(poller.cursor(), 200);
    }

    #[tokio::test]
    async fn test_alternating_messages_notify_every_change() {
        let source = ScriptedSource::new(vec![
            answer("A", "reviewing", 1),
            answer("B", "reviewing", 2),
            answer("A", "reviewing", 3),
        ]);
        let mut seq = Sequence::new();
        let mut sink = MockSink::new();
        for name in ["A", "B", "A"] {
            let expected = status_text(name);
            sink.expect_send()
                .withf(move |text| text == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }

        let mut poller = Poller::new(source, sink, FakeClock::at(0), Duration::from_secs(1));
        let outcomes = poller.run_cycles(3).await;
        assert!(outcomes.iter().all(CycleOutcome::was_sent));
    }

    #[tokio::test]
    async fn test_repeated_error_notifies_once_and_keeps_cursor() {
        let source = ScriptedSource::new(vec![
            Err(NotifierError::HttpStatus { status: 500 }),
            Err(NotifierError::HttpStatus { status: 500 }),
            Err(SchemaError::EmptyList.into()),
        ]);
        let mut seq = Sequence::new();
        let mut sink = MockSink::new();
        sink.expect_send()
            .withf(|text| text.starts_with(ERROR_PREFIX) && text.contains("500"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_send()
            .withf(|text| text.contains("Homework list is empty"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut poller = Poller::new(source, sink, FakeClock::at(777), Duration::from_secs(600));
        let outcomes = poller.run_cycles(3).await;

        assert_eq!(
            outcomes.iter().map(CycleOutcome::was_sent).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        assert_eq!(poller.cursor(), 777);
        assert_eq!(poller.last_message(), None);
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed_and_remembered() {
        let source = ScriptedSource::new(vec![
            answer("hw", "reviewing", 10),
            answer("hw", "reviewing", 20),
        ]);
        let mut sink = MockSink::new();
        sink.expect_send()
            .times(1)
            .returning(|_| Err(NotifierError::Notification("chat not found".into())));

        let mut poller = Poller::new(source, sink, FakeClock::at(0), Duration::from_secs(600));
        let outcomes = poller.run_cycles(2).await;

        assert!(matches!(outcomes[0], CycleOutcome::Status { sent: true, .. }));
        assert_eq!(poller.last_message(), Some(status_text("hw").as_str()));
        assert_eq!(poller.last_error(), None);
    }

    #[tokio::test]
    async fn test_step_alternates_phases_and_sleeps_fixed_interval() {
        let source = ScriptedSource::new(vec![answer("hw", "approved", 5)]);
        let mut sink = MockSink::new();
        sink.expect_send().returning(|_| Ok(()));

        let mut poller = Poller::new(source, sink, FakeClock::at(1), Duration::from_secs(600));
        assert_eq!(poller.phase(), Phase::Polling);

        assert!(poller.step().await.is_some());
        assert_eq!(poller.phase(), Phase::Sleeping);

        assert!(poller.step().await.is_none());
        assert_eq!(poller.phase(), Phase::Polling);

        assert_eq!(
            *poller.clock.slept.lock().unwrap(),
            vec![Duration::from_secs(600)]
        );
    }

    #[tokio::test]
    async fn test_cursor_passed_to_source_and_missing_date_keeps_it() {
        let source = ScriptedSource::new(vec![
            answer("hw", "rejected", 300),
            Ok(json!({"homeworks": [{"homework_name": "hw", "status": "approved"}]})),
            answer("hw", "approved", 900),
        ]);
        let mut sink = MockSink::new();
        sink.expect_send().times(2).returning(|_| Ok(()));

        let mut poller = Poller::new(source, sink, FakeClock::at(100), Duration::from_secs(1));
        poller.run_cycles(3).await;

        assert_eq!(*poller.source.requested.lock().unwrap(), vec![100, 300, 300]);
        assert_eq!(poller.cursor(), 900);
    }

    #[test]
    fn test_error_message_format() {
        let err = NotifierError::UnknownStatus("canceled".into());
        assert_eq!(
            error_message(&err),
            "Program malfunction: Unknown homework status: canceled"
        );
    }
}
