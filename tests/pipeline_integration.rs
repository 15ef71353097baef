//! Integration tests for the generation pipeline
//!
//! Engines here are built on in-test backends so that timing, failures and
//! concurrency can be controlled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tts_studio::audio::{decode_wav, AudioArtifact};
use tts_studio::core::error::{Result, TtsError, ValidationReason};
use tts_studio::engine::{
    EngineRegistry, EngineType, GenerationPipeline, GenerationRequest, LocalEngine,
    PipelineConfig, SynthesisBackend, TtsEngineInfo,
};
use tts_studio::history::{
    HistoryRecord, HistorySnapshot, HistoryStats, HistoryStore, MemoryHistoryStore, NewRecord,
    RetentionPolicy,
};
use tts_studio::voice::VoiceSpec;

const SAMPLE_RATE: u32 = 16000;

/// Backend that records how many calls overlap
struct CountingBackend {
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingBackend {
    fn new(delay: Duration) -> Self {
        Self::shared(delay, Arc::default(), Arc::default())
    }

    fn shared(delay: Duration, in_flight: Arc<AtomicUsize>, max_in_flight: Arc<AtomicUsize>) -> Self {
        Self {
            delay,
            in_flight,
            max_in_flight,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Duration::ZERO)
        }
    }
}

impl SynthesisBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<AudioArtifact> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as i16 + 1;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(TtsError::Synthesis {
                engine_id: "test".into(),
                message: "model crashed".into(),
            });
        }
        // every sample carries the call number so outputs can be told apart
        Ok(AudioArtifact::new(vec![call * 100; 1600], SAMPLE_RATE))
    }
}

/// Backend that remembers the text of every call, in call order
#[derive(Default)]
struct RecordingBackend {
    texts: Mutex<Vec<String>>,
}

impl SynthesisBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn synthesize(&self, text: &str, _voice_id: &str) -> Result<AudioArtifact> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(AudioArtifact::new(vec![1; 160], SAMPLE_RATE))
    }
}

fn engine_with<B: SynthesisBackend + 'static>(id: &str, backend: Arc<B>) -> Arc<LocalEngine> {
    let info = TtsEngineInfo {
        id: id.to_string(),
        name: format!("Test {}", id),
        description: "in-test engine".to_string(),
        engine_type: EngineType::Procedural,
        sample_rate: SAMPLE_RATE,
    };
    let voices = vec![
        VoiceSpec::new("alpha-f").with_description("first"),
        VoiceSpec::new("beta-m"),
    ];
    Arc::new(LocalEngine::new(info, voices, move || {
        Ok(Arc::clone(&backend) as Arc<dyn SynthesisBackend>)
    }))
}

async fn pipeline_with(
    engines: Vec<Arc<LocalEngine>>,
    history: Arc<dyn HistoryStore>,
    config: PipelineConfig,
) -> GenerationPipeline {
    let registry = EngineRegistry::new();
    for engine in engines {
        registry.register(engine).unwrap();
    }
    registry.initialize_all().await.unwrap();
    GenerationPipeline::new(Arc::new(registry), history, config)
}

fn memory_history() -> Arc<dyn HistoryStore> {
    Arc::new(MemoryHistoryStore::new(RetentionPolicy::unbounded()))
}

#[tokio::test]
async fn test_generate_records_history() {
    let history = memory_history();
    let backend = Arc::new(CountingBackend::new(Duration::ZERO));
    let pipeline = pipeline_with(
        vec![engine_with("test", backend)],
        Arc::clone(&history),
        PipelineConfig::default(),
    )
    .await;

    let generation = pipeline
        .generate(&GenerationRequest::new("  Hello, this is a test message!  ").with_voice("beta-m"))
        .await
        .unwrap();

    assert_eq!(generation.audio.engine_id, "test");
    assert_eq!(generation.audio.voice_id, "beta-m");
    assert_eq!(generation.audio.sample_rate, SAMPLE_RATE);
    assert_eq!(generation.record.text, "Hello, this is a test message!");
    assert_eq!(generation.record.size_bytes, generation.audio.wav.len() as u64);

    let stored = history.get(&generation.record.id).unwrap();
    assert_eq!(stored, generation.audio.wav);
    assert_eq!(history.stats().unwrap().total_files, 1);
}

#[tokio::test]
async fn test_voice_defaults_to_first_in_catalog() {
    let backend = Arc::new(CountingBackend::new(Duration::ZERO));
    let pipeline = pipeline_with(
        vec![engine_with("test", backend)],
        memory_history(),
        PipelineConfig::default(),
    )
    .await;

    let generation = pipeline
        .generate(&GenerationRequest::new("hi"))
        .await
        .unwrap();
    assert_eq!(generation.record.voice_id, "alpha-f");
}

#[tokio::test]
async fn test_rejected_requests_leave_no_record() {
    let history = memory_history();
    let backend = Arc::new(CountingBackend::new(Duration::ZERO));
    let pipeline = pipeline_with(
        vec![engine_with("test", Arc::clone(&backend))],
        Arc::clone(&history),
        PipelineConfig {
            max_text_len: 10,
            synthesis_timeout: None,
        },
    )
    .await;

    let err = pipeline.generate(&GenerationRequest::new("   ")).await.unwrap_err();
    assert!(matches!(
        err,
        TtsError::Validation {
            reason: ValidationReason::Empty,
            ..
        }
    ));

    let err = pipeline
        .generate(&GenerationRequest::new("far too long for the limit"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TtsError::Validation {
            reason: ValidationReason::TooLong,
            ..
        }
    ));

    let err = pipeline
        .generate(&GenerationRequest::new("hi").with_voice("gamma"))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::InvalidVoice { .. }));

    let err = pipeline
        .generate(&GenerationRequest::new("hi").with_engine("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::UnknownEngine { .. }));

    assert_eq!(history.stats().unwrap().total_files, 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backend_failure_is_generation_failed() {
    let history = memory_history();
    let pipeline = pipeline_with(
        vec![engine_with("test", Arc::new(CountingBackend::failing()))],
        Arc::clone(&history),
        PipelineConfig::default(),
    )
    .await;

    let err = pipeline
        .generate(&GenerationRequest::new("hello"))
        .await
        .unwrap_err();
    match err {
        TtsError::GenerationFailed { engine_id, message } => {
            assert_eq!(engine_id, "test");
            assert!(message.contains("model crashed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(history.list().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_synthesis_at_a_time_per_engine() {
    let history = memory_history();
    let backend = Arc::new(CountingBackend::new(Duration::from_millis(20)));
    let pipeline = Arc::new(
        pipeline_with(
            vec![engine_with("test", Arc::clone(&backend))],
            Arc::clone(&history),
            PipelineConfig::default(),
        )
        .await,
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                pipeline
                    .generate(&GenerationRequest::new(format!("request {}", i)))
                    .await
            })
        })
        .collect();

    let mut generations = Vec::new();
    for handle in handles {
        generations.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(history.stats().unwrap().total_files, 8);

    // each record holds exactly one call's audio, never a mix
    let mut seen = Vec::new();
    for generation in &generations {
        let artifact = decode_wav(&history.get(&generation.record.id).unwrap()).unwrap();
        let first = artifact.samples[0];
        assert!(artifact.samples.iter().all(|&s| s == first));
        seen.push(first);
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queued_requests_run_in_arrival_order() {
    let backend = Arc::new(RecordingBackend::default());
    let registry = Arc::new(EngineRegistry::new());
    registry
        .register(engine_with("test", Arc::clone(&backend)))
        .unwrap();
    registry.initialize_all().await.unwrap();
    let pipeline = Arc::new(GenerationPipeline::new(
        Arc::clone(&registry),
        memory_history(),
        PipelineConfig::default(),
    ));

    // hold the engine so every request has to queue
    let (_, lock) = registry.synthesis_slot("test").unwrap();
    let held = lock.lock_owned().await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline
                .generate(&GenerationRequest::new(format!("request {}", i)))
                .await
        }));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(backend.texts.lock().unwrap().is_empty());

    drop(held);
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let expected: Vec<String> = (0..6).map(|i| format!("request {}", i)).collect();
    assert_eq!(*backend.texts.lock().unwrap(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_engines_run_in_parallel() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let backend = |_: ()| {
        Arc::new(CountingBackend::shared(
            Duration::from_millis(200),
            Arc::clone(&in_flight),
            Arc::clone(&max_in_flight),
        ))
    };
    let pipeline = Arc::new(
        pipeline_with(
            vec![
                engine_with("one", backend(())),
                engine_with("two", backend(())),
            ],
            memory_history(),
            PipelineConfig::default(),
        )
        .await,
    );

    let first = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline
                .generate(&GenerationRequest::new("a").with_engine("one"))
                .await
        })
    };
    let second = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline
                .generate(&GenerationRequest::new("b").with_engine("two"))
                .await
        })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_leaves_no_record() {
    let history = memory_history();
    let backend = Arc::new(CountingBackend::new(Duration::from_millis(300)));
    let pipeline = pipeline_with(
        vec![engine_with("test", backend)],
        Arc::clone(&history),
        PipelineConfig {
            max_text_len: 100,
            synthesis_timeout: Some(Duration::from_millis(30)),
        },
    )
    .await;

    let err = pipeline
        .generate(&GenerationRequest::new("slow"))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::Timeout { duration_ms: 30, .. }));
    assert!(err.is_retryable());
    assert_eq!(history.stats().unwrap().total_files, 0);
}

/// Store whose appends always fail
struct ReadOnlyHistory(MemoryHistoryStore);

impl HistoryStore for ReadOnlyHistory {
    fn backend_name(&self) -> &'static str {
        "read-only"
    }

    fn retention(&self) -> RetentionPolicy {
        self.0.retention()
    }

    fn append(&self, _record: NewRecord, _audio: &[u8]) -> Result<HistoryRecord> {
        Err(TtsError::Io {
            message: "disk full".into(),
            path: None,
        })
    }

    fn list(&self) -> Result<Vec<HistoryRecord>> {
        self.0.list()
    }

    fn record(&self, id: &str) -> Result<HistoryRecord> {
        self.0.record(id)
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        self.0.get(id)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.0.delete(id)
    }

    fn clear(&self) -> Result<usize> {
        self.0.clear()
    }

    fn stats(&self) -> Result<HistoryStats> {
        self.0.stats()
    }

    fn snapshot(&self) -> Result<HistorySnapshot> {
        self.0.snapshot()
    }

    fn prune_older_than(&self, max_age: chrono::Duration) -> Result<usize> {
        self.0.prune_older_than(max_age)
    }
}

#[tokio::test]
async fn test_persist_failure_is_not_persisted() {
    let history: Arc<dyn HistoryStore> = Arc::new(ReadOnlyHistory(MemoryHistoryStore::default()));
    let pipeline = pipeline_with(
        vec![engine_with("test", Arc::new(CountingBackend::new(Duration::ZERO)))],
        history,
        PipelineConfig::default(),
    )
    .await;

    let err = pipeline
        .generate(&GenerationRequest::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::NotPersisted { .. }));

    // rendering alone does not touch history
    let audio = pipeline.render(&GenerationRequest::new("hello")).await.unwrap();
    assert!(!audio.wav.is_empty());
}

#[tokio::test]
async fn test_degraded_engine_still_generates() {
    let info = TtsEngineInfo {
        id: "offline".to_string(),
        name: "Offline".to_string(),
        description: "no model".to_string(),
        engine_type: EngineType::LocalProcess,
        sample_rate: 24000,
    };
    let engine = Arc::new(LocalEngine::new(
        info,
        vec![VoiceSpec::new("only-f")],
        || {
            Err(TtsError::Config {
                message: "model missing".into(),
                path: None,
            })
        },
    ));
    let history = memory_history();
    let pipeline = pipeline_with(vec![engine], Arc::clone(&history), PipelineConfig::default()).await;

    let generation = pipeline
        .generate(&GenerationRequest::new("Hello"))
        .await
        .unwrap();
    let artifact = decode_wav(&generation.audio.wav).unwrap();
    assert_eq!(artifact.sample_rate, 24000);
    assert!(artifact.samples.iter().all(|&s| s == 0));
    assert!((artifact.duration_secs() - 1.0).abs() < 1e-3);
    assert_eq!(history.stats().unwrap().total_files, 1);
}
