//! Property tests for audio encoding, history statistics and text limits

use proptest::prelude::*;

use tts_studio::audio::{decode_wav, encode_wav, AudioArtifact};
use tts_studio::engine::validate_text;
use tts_studio::history::{HistoryStore, MemoryHistoryStore, NewRecord, RetentionPolicy};

fn new_record(text: &str) -> NewRecord {
    NewRecord {
        text: text.to_string(),
        voice_id: "expr-voice-2-f".to_string(),
        engine_id: "kitten".to_string(),
    }
}

#[derive(Debug, Clone)]
enum Op {
    Append(usize),
    DeleteNth(usize),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1usize..512).prop_map(Op::Append),
        3 => (0usize..16).prop_map(Op::DeleteNth),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn wav_preserves_samples(
        samples in prop::collection::vec(any::<i16>(), 1..2048),
        rate in prop::sample::select(vec![16000u32, 22050, 24000, 44100]),
    ) {
        let artifact = AudioArtifact::new(samples, rate);
        let decoded = decode_wav(&encode_wav(&artifact).unwrap()).unwrap();
        prop_assert_eq!(decoded, artifact);
    }

    #[test]
    fn stats_match_records(ops in prop::collection::vec(op(), 1..40), max_files in 0usize..6) {
        let store = MemoryHistoryStore::new(RetentionPolicy { max_files, auto_cleanup_days: 0 });

        for op in ops {
            match op {
                Op::Append(size) => {
                    store.append(new_record("text"), &vec![0u8; size]).unwrap();
                }
                Op::DeleteNth(n) => {
                    let records = store.list().unwrap();
                    if let Some(record) = records.get(n) {
                        store.delete(&record.id).unwrap();
                    }
                }
                Op::Clear => {
                    store.clear().unwrap();
                }
            }

            let snapshot = store.snapshot().unwrap();
            prop_assert_eq!(snapshot.stats.total_files, snapshot.records.len());
            prop_assert_eq!(
                snapshot.stats.total_size_bytes,
                snapshot.records.iter().map(|r| r.size_bytes).sum::<u64>()
            );
            if max_files > 0 {
                prop_assert!(snapshot.records.len() <= max_files);
            }
            for pair in snapshot.records.windows(2) {
                prop_assert!(pair[0].timestamp >= pair[1].timestamp);
            }
        }
    }

    #[test]
    fn validation_counts_characters(text in "\\PC{0,40}", max in 1usize..30) {
        let trimmed = text.trim();
        let result = validate_text(&text, max);
        if trimmed.is_empty() || trimmed.chars().count() > max {
            prop_assert!(result.is_err());
        } else {
            prop_assert_eq!(result.unwrap(), trimmed);
        }
    }
}
