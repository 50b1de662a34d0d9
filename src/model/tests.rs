use super::*;
use candle_core::Device;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokenizers::Tokenizer;

const TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": { "type": "Lowercase" },
  "pre_tokenizer": { "type": "Whitespace" },
  "post_processor": {
    "type": "BertProcessing",
    "sep": ["[SEP]", 3],
    "cls": ["[CLS]", 2]
  },
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": {
      "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
      "what": 4, "is": 5, "rust": 6, "a": 7, "language": 8
    },
    "unk_token": "[UNK]"
  }
}"#;

fn tiny_tokenizer() -> Tokenizer {
    Tokenizer::from_str(TOKENIZER_JSON).expect("tokenizer json should parse")
}

fn write_tokenizer(dir: &Path) -> PathBuf {
    let path = dir.join("tokenizer.json");
    std::fs::write(&path, TOKENIZER_JSON).unwrap();
    path
}

mod pair_tests {
    use super::*;

    #[test]
    fn test_for_documents_preserves_order() {
        let pairs = ScoringPair::for_documents("q", &["first", "second", "third"]);

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], ScoringPair::new("q", "first"));
        assert_eq!(pairs[2].document, "third");
        assert!(pairs.iter().all(|p| p.query == "q"));
    }

    #[test]
    fn test_for_documents_empty() {
        assert!(ScoringPair::for_documents("q", &[]).is_empty());
    }
}

mod encoder_tests {
    use super::*;

    #[test]
    fn test_encode_pads_to_batch_longest() {
        let encoder = PairEncoder::new(tiny_tokenizer(), 512).unwrap();
        let pairs = [
            ScoringPair::new("what is rust", "rust is a language"),
            ScoringPair::new("what is rust", "a"),
        ];

        let batch = encoder.encode(&pairs, &Device::Cpu).unwrap();

        assert_eq!(batch.input_ids.dims(), &[2, 9]);
        assert_eq!(batch.type_ids.dims(), &[2, 9]);
        assert_eq!(batch.attention_mask.dims(), &[2, 9]);
        assert_eq!(batch.token_count, 15);

        let mask = batch.attention_mask.to_vec2::<u32>().unwrap();
        assert_eq!(mask[1][..6], [1, 1, 1, 1, 1, 1]);
        assert_eq!(mask[1][6..], [0, 0, 0]);
    }

    #[test]
    fn test_encode_marks_document_segment() {
        let encoder = PairEncoder::new(tiny_tokenizer(), 512).unwrap();
        let pairs = [ScoringPair::new("rust", "language")];

        let batch = encoder.encode(&pairs, &Device::Cpu).unwrap();
        let ids = batch.input_ids.to_vec2::<u32>().unwrap();
        let types = batch.type_ids.to_vec2::<u32>().unwrap();

        assert_eq!(ids[0], vec![2, 6, 3, 8, 3]);
        assert_eq!(types[0], vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_encode_truncates_to_max_seq_len() {
        let encoder = PairEncoder::new(tiny_tokenizer(), 6).unwrap();
        let pairs = [ScoringPair::new("what is rust", "rust is a language")];

        let batch = encoder.encode(&pairs, &Device::Cpu).unwrap();

        assert_eq!(batch.input_ids.dims(), &[1, 6]);
        assert_eq!(encoder.max_seq_len(), 6);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let encoder = PairEncoder::new(tiny_tokenizer(), 512).unwrap();
        let pairs = [ScoringPair::new("zebra", "rust")];

        let batch = encoder.encode(&pairs, &Device::Cpu).unwrap();
        let ids = batch.input_ids.to_vec2::<u32>().unwrap();

        assert_eq!(ids[0][1], 1);
    }

    #[test]
    fn test_from_model_dir_reads_tokenizer_json() {
        let dir = tempfile::tempdir().unwrap();
        write_tokenizer(dir.path());

        let encoder = PairEncoder::from_model_dir(dir.path(), 128).unwrap();
        assert_eq!(encoder.max_seq_len(), 128);
    }

    #[test]
    fn test_from_model_dir_missing_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let err = PairEncoder::from_model_dir(dir.path(), 128).unwrap_err();

        assert!(matches!(err, ModelError::ModelLoadFailed { .. }));
    }

    #[test]
    fn test_load_tokenizer_accepts_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tokenizer(dir.path());

        assert!(load_tokenizer(&path).is_ok());
        assert!(load_tokenizer(dir.path()).is_ok());
    }
}

mod lexical_tests {
    use super::*;
    use crate::model::lexical::{FUNCTION_WORDS, NO_EVIDENCE_LOGIT};

    #[test]
    fn test_function_words_sorted() {
        assert!(FUNCTION_WORDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_overlap_scores_no_evidence() {
        let backend = LexicalBackend::default();
        assert_eq!(backend.pair_logit("query", "candidate"), NO_EVIDENCE_LOGIT);
    }

    #[test]
    fn test_relevant_document_has_positive_logit() {
        let backend = LexicalBackend::default();

        let relevant = backend.pair_logit(
            "What is machine learning?",
            "Machine learning is a subset of artificial intelligence",
        );
        let irrelevant = backend.pair_logit("What is machine learning?", "The weather is nice today");

        // full coverage, 2 of 5 document terms matched
        assert!((relevant - 2.8).abs() < 1e-6, "relevant logit was {relevant}");
        assert_eq!(irrelevant, NO_EVIDENCE_LOGIT);
    }

    #[test]
    fn test_function_word_query_carries_no_evidence() {
        let backend = LexicalBackend::default();

        assert_eq!(backend.pair_logit("what is the", "what is the"), NO_EVIDENCE_LOGIT);
        assert_eq!(backend.pair_logit("", "rust"), NO_EVIDENCE_LOGIT);
        assert_eq!(backend.pair_logit("rust", ""), NO_EVIDENCE_LOGIT);
    }

    #[test]
    fn test_case_and_punctuation_ignored() {
        let backend = LexicalBackend::default();
        assert_eq!(
            backend.pair_logit("RUST?", "rust."),
            backend.pair_logit("rust", "Rust")
        );
    }

    #[test]
    fn test_sigmoid_squashes_logits() {
        use crate::scoring::ScoreActivation;

        let backend = LexicalBackend::default();
        let logit = backend.pair_logit("rust", "rust");
        let score = ScoreActivation::Sigmoid.apply(logit);

        assert!(score > 0.98 && score < 1.0);
        assert!(ScoreActivation::Sigmoid.apply(NO_EVIDENCE_LOGIT) < 0.2);
    }

    #[test]
    fn test_infer_emits_one_logit_per_pair() {
        let backend = LexicalBackend::default();
        let pairs = ScoringPair::for_documents("rust", &["rust", "go", "zig"]);

        let output = backend.infer(&pairs).unwrap();

        assert_eq!(output.logits.dims(), &[3]);
        assert_eq!(output.consumed_tokens, 6);
        assert!(!backend.is_model_loaded());
        assert_eq!(backend.name(), "lexical");
    }
}

mod mock_tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_squeeze_singleton_returns_scalar() {
        let backend = MockBackend::new().with_layout(MockLayout::SqueezeSingleton);
        let output = backend.infer(&[ScoringPair::new("q", "abc")]).unwrap();

        assert_eq!(output.logits.rank(), 0);
        assert_eq!(output.logits.to_scalar::<f32>().unwrap(), 3.0);
    }

    #[test]
    fn test_column_layout() {
        let backend = MockBackend::new().with_layout(MockLayout::Column);
        let pairs = ScoringPair::for_documents("q", &["a", "bb"]);

        let output = backend.infer(&pairs).unwrap();
        assert_eq!(output.logits.dims(), &[2, 1]);
    }

    #[test]
    fn test_counters_shared_across_clones() {
        let backend = MockBackend::new();
        let calls = backend.call_counter();
        let pairs = backend.pair_counter();

        let clone = backend.clone();
        clone.infer(&ScoringPair::for_documents("q", &["a", "b"])).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pairs.load(Ordering::SeqCst), 2);
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_failing_backend() {
        let backend = MockBackend::new().failing("out of memory");
        let err = backend.infer(&[ScoringPair::new("q", "d")]).unwrap_err();

        assert!(err.to_string().contains("out of memory"));
    }
}

mod cross_encoder_tests {
    use super::*;

    #[test]
    fn test_load_missing_directory() {
        let err = CrossEncoderBackend::load(Path::new("/nonexistent/reranker"), 512, Device::Cpu)
            .unwrap_err();

        assert!(matches!(err, ModelError::ModelNotFound { .. }));
    }

    #[test]
    fn test_load_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        write_tokenizer(dir.path());

        let err = CrossEncoderBackend::load(dir.path(), 512, Device::Cpu).unwrap_err();

        match err {
            ModelError::ModelLoadFailed { reason } => {
                assert!(reason.contains("model.safetensors"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();

        let err = CrossEncoderBackend::load(dir.path(), 512, Device::Cpu).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_error_messages_descriptive() {
        let err = ModelError::ModelNotFound {
            path: PathBuf::from("/some/path"),
        };
        assert!(err.to_string().contains("/some/path"));

        let err = ModelError::TokenizationFailed {
            reason: "bad input".to_string(),
        };
        assert!(err.to_string().contains("bad input"));
    }
}

mod forward_tests {
    use super::*;
    use crate::scoring::{BatchScorer, ScorerConfig};
    use crate::device::DeviceChoice;
    use candle_core::DType;
    use candle_nn::{VarBuilder, VarMap};
    use candle_transformers::models::bert::{self, BertModel};
    use candle_transformers::models::xlm_roberta::{self, XLMRobertaForSequenceClassification};

    const HIDDEN: usize = 8;

    fn bert_config_json(num_labels: usize, max_positions: usize) -> String {
        format!(
            r#"{{
  "model_type": "bert", "vocab_size": 9, "hidden_size": {HIDDEN}, "num_hidden_layers": 1,
  "num_attention_heads": 2, "intermediate_size": 16, "hidden_act": "gelu",
  "hidden_dropout_prob": 0.0, "max_position_embeddings": {max_positions},
  "type_vocab_size": 2, "initializer_range": 0.02, "layer_norm_eps": 1e-12,
  "pad_token_id": 0, "num_labels": {num_labels}
}}"#
        )
    }

    fn xlm_roberta_config_json(num_labels: usize, max_positions: usize) -> String {
        format!(
            r#"{{
  "model_type": "xlm-roberta", "vocab_size": 9, "hidden_size": {HIDDEN}, "num_hidden_layers": 1,
  "num_attention_heads": 2, "intermediate_size": 16, "hidden_act": "gelu",
  "hidden_dropout_prob": 0.0, "attention_probs_dropout_prob": 0.0,
  "max_position_embeddings": {max_positions}, "type_vocab_size": 2, "layer_norm_eps": 1e-5,
  "pad_token_id": 0, "position_embedding_type": "absolute", "num_labels": {num_labels}
}}"#
        )
    }

    /// Random BERT sequence classifier (`bert.` trunk, pooler, `classifier`).
    fn write_bert_model(dir: &Path, num_labels: usize, max_positions: usize) {
        let json = bert_config_json(num_labels, max_positions);
        let config: bert::Config = serde_json::from_str(&json).unwrap();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        BertModel::load(vb.pp("bert"), &config).unwrap();
        candle_nn::linear(HIDDEN, HIDDEN, vb.pp("bert.pooler.dense")).unwrap();
        candle_nn::linear(HIDDEN, num_labels, vb.pp("classifier")).unwrap();

        varmap.save(dir.join("model.safetensors")).unwrap();
        std::fs::write(dir.join("config.json"), json).unwrap();
        write_tokenizer(dir);
    }

    /// Random XLM-R sequence classifier; returns the in-memory model for reference.
    fn write_xlm_roberta_model(
        dir: &Path,
        num_labels: usize,
        max_positions: usize,
    ) -> XLMRobertaForSequenceClassification {
        let json = xlm_roberta_config_json(num_labels, max_positions);
        let config: xlm_roberta::Config = serde_json::from_str(&json).unwrap();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = XLMRobertaForSequenceClassification::new(num_labels, &config, vb).unwrap();

        varmap.save(dir.join("model.safetensors")).unwrap();
        std::fs::write(dir.join("config.json"), json).unwrap();
        write_tokenizer(dir);
        model
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "{actual:?} != {expected:?}");
        }
    }

    fn pairs() -> [ScoringPair<'static>; 2] {
        [
            ScoringPair::new("what is rust", "rust is a language"),
            ScoringPair::new("what is rust", "a"),
        ]
    }

    #[test]
    fn test_bert_backend_scores_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        write_bert_model(dir.path(), 1, 64);

        let backend = CrossEncoderBackend::load(dir.path(), 512, Device::Cpu).unwrap();
        let output = backend.infer(&pairs()).unwrap();

        assert_eq!(output.logits.dims(), &[2, 1]);
        assert_eq!(output.consumed_tokens, 15);
        assert!(backend.is_model_loaded());
        assert_eq!(backend.name(), "cross-encoder");
    }

    #[test]
    fn test_bert_scorer_lengths_and_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        write_bert_model(dir.path(), 1, 64);

        let backend = CrossEncoderBackend::load(dir.path(), 64, Device::Cpu).unwrap();
        let scorer =
            BatchScorer::with_backend(backend, DeviceChoice::GeneralPurpose, ScorerConfig::stub())
                .unwrap();

        let batch = scorer.score(&pairs()).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|s| s.is_finite()));

        let single = scorer.score(&pairs()[..1]).unwrap();
        assert_eq!(single.len(), 1);
        assert_close(single.as_slice(), &batch.as_slice()[..1]);

        assert_eq!(scorer.score(&pairs()).unwrap(), batch);
    }

    #[test]
    fn test_multi_label_head_uses_last_column() {
        let dir = tempfile::tempdir().unwrap();
        write_bert_model(dir.path(), 2, 64);

        let model = CrossEncoderModel::load(dir.path(), &Device::Cpu).unwrap();
        assert_eq!(model.num_labels(), 2);

        let encoder = PairEncoder::new(tiny_tokenizer(), 64).unwrap();
        let batch = encoder.encode(&pairs(), &Device::Cpu).unwrap();
        let full = model
            .forward(&batch.input_ids, &batch.type_ids, &batch.attention_mask)
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();

        let backend = CrossEncoderBackend::load(dir.path(), 64, Device::Cpu).unwrap();
        let output = backend.infer(&pairs()).unwrap();

        assert_eq!(output.logits.dims(), &[2]);
        let expected: Vec<f32> = full.iter().map(|row| row[1]).collect();
        assert_close(&output.logits.to_vec1::<f32>().unwrap(), &expected);
    }

    #[test]
    fn test_xlm_roberta_matches_reference_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_xlm_roberta_model(dir.path(), 1, 32);

        let model = CrossEncoderModel::load(dir.path(), &Device::Cpu).unwrap();
        assert!(model.is_xlm_roberta());

        let encoder = PairEncoder::new(tiny_tokenizer(), 16).unwrap();
        let batch = encoder.encode(&pairs(), &Device::Cpu).unwrap();

        let expected = reference
            .forward(&batch.input_ids, &batch.attention_mask, &batch.type_ids)
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();
        let actual = model
            .forward(&batch.input_ids, &batch.type_ids, &batch.attention_mask)
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();

        assert_close(&actual, &expected);
    }

    #[test]
    fn test_xlm_roberta_padding_does_not_change_scores() {
        let dir = tempfile::tempdir().unwrap();
        write_xlm_roberta_model(dir.path(), 1, 32);

        let backend = CrossEncoderBackend::load(dir.path(), 512, Device::Cpu).unwrap();
        let scorer =
            BatchScorer::with_backend(backend, DeviceChoice::GeneralPurpose, ScorerConfig::stub())
                .unwrap();

        let batched = scorer.score(&pairs()).unwrap();
        let alone = scorer.score(&pairs()[1..]).unwrap();

        assert_close(alone.as_slice(), &batched.as_slice()[1..]);
    }

    #[test]
    fn test_bert_layout_not_loaded_as_xlm_roberta() {
        let dir = tempfile::tempdir().unwrap();
        write_bert_model(dir.path(), 1, 64);

        let model = CrossEncoderModel::load(dir.path(), &Device::Cpu).unwrap();

        assert!(!model.is_xlm_roberta());
        assert_eq!(model.max_sequence_length(), 64);
    }

    #[test]
    fn test_max_seq_len_clamped_to_position_table() {
        let long_document = "rust is a language ".repeat(8);
        let long_pair = [ScoringPair::new("what is rust", &long_document)];

        let bert_dir = tempfile::tempdir().unwrap();
        write_bert_model(bert_dir.path(), 1, 8);
        let bert = CrossEncoderBackend::load(bert_dir.path(), 1024, Device::Cpu).unwrap();

        assert_eq!(bert.max_seq_len(), 8);
        assert_eq!(bert.infer(&long_pair).unwrap().logits.dims(), &[1, 1]);

        // XLM-R positions start at pad_token_id + 1
        let xlmr_dir = tempfile::tempdir().unwrap();
        write_xlm_roberta_model(xlmr_dir.path(), 1, 8);
        let xlmr = CrossEncoderBackend::load(xlmr_dir.path(), 1024, Device::Cpu).unwrap();

        assert_eq!(xlmr.max_seq_len(), 7);
        assert_eq!(xlmr.infer(&long_pair).unwrap().logits.dims(), &[1, 1]);
    }

    #[test]
    fn test_requested_seq_len_below_limit_kept() {
        let dir = tempfile::tempdir().unwrap();
        write_bert_model(dir.path(), 1, 64);

        let backend = CrossEncoderBackend::load(dir.path(), 6, Device::Cpu).unwrap();
        assert_eq!(backend.max_seq_len(), 6);
    }
}
