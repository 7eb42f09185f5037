//! Collection loop tests
//!
//! These tests drive the loop with scripted runtime output instead of a real
//! container runtime, and a fixed clock instead of wall time.

#[cfg(test)]
mod scripted_runtime_tests {
    use crate::collector::{
        async_trait, Clock, CollectionLoopBuilder, CollectorState, StatsSource, TickOutcome,
    };
    use crate::error::{Result, StatsError};
    use crate::health::{components, ComponentStatus, HealthRegistry};
    use crate::models::Sample;
    use crate::series::{SeriesReader, SeriesSink, SeriesWriter};
    use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    const LINE_A: &str = "3f2a9c1e,12.50%,50MiB / 1GiB,4.88%,1.5GB / 200kB";
    const LINE_B: &str = "3f2a9c1e,80.00%,700MiB / 1GiB,68.36%,1.6GB / 3MB";

    /// Replays a fixed list of runtime outputs, then requests shutdown and
    /// blocks as a hung runtime would
    struct ScriptedSource {
        outputs: Mutex<VecDeque<Result<Option<String>>>>,
        shutdown: broadcast::Sender<()>,
        queried: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(outputs: Vec<Result<Option<String>>>, shutdown: broadcast::Sender<()>) -> Self {
            Self {
                outputs: Mutex::new(outputs.into()),
                shutdown,
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StatsSource for ScriptedSource {
        async fn query(&self, container_ref: &str) -> Result<Option<String>> {
            self.queried.lock().unwrap().push(container_ref.to_string());

            let next = self.outputs.lock().unwrap().pop_front();
            match next {
                Some(output) => output,
                None => {
                    let _ = self.shutdown.send(());
                    std::future::pending().await
                }
            }
        }
    }

    /// Clock advancing one second per reading
    struct SteppingClock {
        base: NaiveDateTime,
        offset: AtomicI64,
    }

    impl SteppingClock {
        fn new() -> Self {
            Self {
                base: NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap(),
                offset: AtomicI64::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> NaiveDateTime {
            let secs = self.offset.fetch_add(1, Ordering::SeqCst);
            self.base + ChronoDuration::seconds(secs)
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<Sample>>>);

    impl SeriesSink for SharedSink {
        fn append(&mut self, sample: &Sample) -> Result<()> {
            self.0.lock().unwrap().push(sample.clone());
            Ok(())
        }
    }

    fn some(line: &str) -> Result<Option<String>> {
        Ok(Some(line.to_string()))
    }

    fn ts(secs: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, secs)
            .unwrap()
    }

    #[test]
    fn test_step_skips_empty_output() {
        let state = CollectorState::new("web");

        let (state, outcome) = state.step(None, ts(0)).unwrap();
        assert_eq!(outcome, TickOutcome::Skipped);

        let (state, outcome) = state.step(Some("  \n"), ts(1)).unwrap();
        assert_eq!(outcome, TickOutcome::Skipped);

        assert_eq!(state.tick_count, 2);
        assert_eq!(state.ticks_skipped, 2);
        assert_eq!(state.samples_collected, 0);
        assert!(state.last_sample.is_none());
    }

    #[test]
    fn test_step_produces_sample() {
        let (state, outcome) = CollectorState::new("web")
            .step(Some(LINE_A), ts(3))
            .unwrap();

        let sample = match outcome {
            TickOutcome::Sampled(sample) => sample,
            TickOutcome::Skipped => panic!("expected a sample"),
        };
        assert_eq!(sample.timestamp, ts(3));
        assert_eq!(sample.container_id, "3f2a9c1e");
        assert_eq!(sample.cpu_percent, 12.5);
        assert_eq!(sample.memory_usage, "50MiB / 1GiB");
        assert_eq!(sample.disk_read_mib, 1536.0);
        assert_eq!(state.last_sample, Some(sample));
        assert_eq!(state.samples_collected, 1);
    }

    #[test]
    fn test_step_fails_on_malformed_output() {
        let err = CollectorState::new("web")
            .step(Some("unexpected banner text"), ts(0))
            .unwrap_err();
        assert!(matches!(err, StatsError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_loop_writes_one_entry_per_non_empty_tick() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let source = Arc::new(ScriptedSource::new(
            vec![some(LINE_A), Ok(None), some(LINE_B), Ok(None), some(LINE_A)],
            shutdown_tx,
        ));
        let sink = SharedSink::default();

        let collection_loop = CollectionLoopBuilder::new()
            .source(source.clone())
            .sink(Box::new(sink.clone()))
            .clock(Arc::new(SteppingClock::new()))
            .container("web")
            .interval(Duration::from_millis(1))
            .build()
            .unwrap();

        let state = collection_loop.run(shutdown_rx).await.unwrap();

        let samples = sink.0.lock().unwrap().clone();
        assert_eq!(samples.len(), 3);
        assert_eq!(state.samples_collected, 3);
        assert_eq!(state.ticks_skipped, 2);
        assert_eq!(state.tick_count, 5);

        // Samples keep tick order and are stamped after each query
        assert_eq!(samples[0].cpu_percent, 12.5);
        assert_eq!(samples[1].cpu_percent, 80.0);
        assert_eq!(samples[2].cpu_percent, 12.5);
        assert!(samples[0].timestamp < samples[1].timestamp);
        assert!(samples[1].timestamp < samples[2].timestamp);

        // The interrupted sixth query produced nothing
        let queried = source.queried.lock().unwrap();
        assert_eq!(queried.len(), 6);
        assert!(queried.iter().all(|c| c == "web"));
    }

    #[tokio::test]
    async fn test_loop_aborts_on_malformed_output() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let source = Arc::new(ScriptedSource::new(
            vec![some(LINE_A), some("3f2a9c1e,lots,1MiB / 2MiB,1%,0B / 0B"), some(LINE_B)],
            shutdown_tx,
        ));
        let sink = SharedSink::default();
        let health = HealthRegistry::new();
        health.register_all().await;

        let collection_loop = CollectionLoopBuilder::new()
            .source(source)
            .sink(Box::new(sink.clone()))
            .container("web")
            .interval(Duration::from_millis(1))
            .health(health.clone())
            .build()
            .unwrap();

        let err = collection_loop.run(shutdown_rx).await.unwrap_err();
        assert!(matches!(err, StatsError::Format { .. }));
        assert_eq!(sink.0.lock().unwrap().len(), 1);

        let status = health.health().await;
        assert_eq!(
            status.components[components::COLLECTOR].status,
            ComponentStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_loop_aborts_when_runtime_cannot_run() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let source = Arc::new(ScriptedSource::new(
            vec![Err(StatsError::Query {
                reason: "no such binary".to_string(),
            })],
            shutdown_tx,
        ));

        let collection_loop = CollectionLoopBuilder::new()
            .source(source)
            .sink(Box::new(SharedSink::default()))
            .container("web")
            .interval(Duration::from_millis(1))
            .build()
            .unwrap();

        let err = collection_loop.run(shutdown_rx).await.unwrap_err();
        assert!(matches!(err, StatsError::Query { .. }));
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown_before_first_tick() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        let source = Arc::new(ScriptedSource::new(vec![], shutdown_tx.clone()));
        let sink = SharedSink::default();

        let collection_loop = CollectionLoopBuilder::new()
            .source(source)
            .sink(Box::new(sink.clone()))
            .container("web")
            .build()
            .unwrap();

        let state = collection_loop.run(shutdown_rx).await.unwrap();
        assert_eq!(state.samples_collected, 0);
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loop_persists_to_series_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.csv");

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let source = Arc::new(ScriptedSource::new(
            vec![some(LINE_A), Ok(None), some(LINE_B)],
            shutdown_tx,
        ));

        let collection_loop = CollectionLoopBuilder::new()
            .source(source)
            .sink(Box::new(SeriesWriter::create(&path).unwrap()))
            .clock(Arc::new(SteppingClock::new()))
            .container("web")
            .interval(Duration::from_millis(1))
            .build()
            .unwrap();

        collection_loop.run(shutdown_rx).await.unwrap();

        let samples = SeriesReader::load(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].memory_usage, "700MiB / 1GiB");
        assert_eq!(samples[1].memory_percent, 68.36);
        assert_eq!(samples[1].disk_write_mib, 3.0);
    }

    #[test]
    fn test_builder_requires_source_and_sink() {
        let missing_source = CollectionLoopBuilder::new()
            .sink(Box::new(SharedSink::default()))
            .container("web")
            .build();
        assert!(missing_source.is_err());

        let (tx, _rx) = broadcast::channel(1);
        let missing_sink = CollectionLoopBuilder::new()
            .source(Arc::new(ScriptedSource::new(vec![], tx)))
            .container("web")
            .build();
        assert!(missing_sink.is_err());
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let (tx, _rx) = broadcast::channel(1);
        let source = Arc::new(ScriptedSource::new(vec![], tx));

        let no_container = CollectionLoopBuilder::new()
            .source(source.clone())
            .sink(Box::new(SharedSink::default()))
            .build();
        assert!(no_container.is_err());

        let zero_interval = CollectionLoopBuilder::new()
            .source(source)
            .sink(Box::new(SharedSink::default()))
            .container("web")
            .interval(Duration::ZERO)
            .build();
        assert!(zero_interval.is_err());
    }
}
