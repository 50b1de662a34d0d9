use candle_core as candle;
use candle::{DType, Device, IndexOp, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{self, BertModel};
use candle_transformers::models::xlm_roberta::{self, XLMRobertaForSequenceClassification};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::constants::{
    BERT_PREFIX, DEFAULT_NUM_LABELS, MODEL_CONFIG_FILE, MODEL_WEIGHTS_FILE, ROBERTA_PREFIX,
};

/// Fields of `config.json` that describe the classification head.
#[derive(Debug, Default, Deserialize)]
struct HeadConfig {
    #[serde(default)]
    num_labels: Option<usize>,
    #[serde(default)]
    id2label: Option<HashMap<String, String>>,
}

impl HeadConfig {
    fn num_labels(&self) -> usize {
        self.num_labels
            .or_else(|| self.id2label.as_ref().map(HashMap::len))
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_NUM_LABELS)
    }
}

/// BERT sequence-classification head: optional `pooler.dense` + tanh, then `classifier`.
struct PooledHead {
    pooler: Option<Linear>,
    classifier: Linear,
}

impl PooledHead {
    fn forward(&self, cls: &Tensor) -> Result<Tensor> {
        match &self.pooler {
            Some(pooler) => self.classifier.forward(&pooler.forward(cls)?.tanh()?),
            None => self.classifier.forward(cls),
        }
    }
}

enum Architecture {
    /// Positions numbered from 0.
    Bert { trunk: BertModel, head: PooledHead },
    /// Positions numbered from `pad_token_id + 1`, padding skipped.
    /// Carries its own `classifier.dense`/`classifier.out_proj` head.
    XlmRoberta(XLMRobertaForSequenceClassification),
}

/// BERT-family sequence classifier used as a cross-encoder.
///
/// Weights under a `roberta.` prefix load as XLM-RoBERTa; everything else
/// loads as BERT (with or without a `bert.` prefix).
pub struct CrossEncoderModel {
    architecture: Architecture,
    num_labels: usize,
    max_sequence_length: usize,
}

impl CrossEncoderModel {
    /// Loads `config.json` + `model.safetensors` from `model_dir` onto `device`.
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_content = std::fs::read_to_string(model_dir.join(MODEL_CONFIG_FILE))?;

        let head_config: HeadConfig = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse head config: {}", e)))?;
        let num_labels = head_config.num_labels();

        let weights_path = model_dir.join(MODEL_WEIGHTS_FILE);
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        if vb.contains_tensor(&format!("{ROBERTA_PREFIX}.embeddings.word_embeddings.weight")) {
            Self::load_xlm_roberta(vb, &config_content, num_labels)
        } else {
            Self::load_bert(vb, &config_content, num_labels)
        }
    }

    fn load_xlm_roberta(vb: VarBuilder, config_content: &str, num_labels: usize) -> Result<Self> {
        let config: xlm_roberta::Config = serde_json::from_str(config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse XLM-R config: {}", e)))?;

        let model = XLMRobertaForSequenceClassification::new(num_labels, &config, vb)?;

        // The first usable position is pad_token_id + 1.
        let max_sequence_length = config
            .max_position_embeddings
            .saturating_sub(config.pad_token_id as usize + 1);

        Ok(Self {
            architecture: Architecture::XlmRoberta(model),
            num_labels,
            max_sequence_length,
        })
    }

    fn load_bert(vb: VarBuilder, config_content: &str, num_labels: usize) -> Result<Self> {
        let config: bert::Config = serde_json::from_str(config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse BERT config: {}", e)))?;

        let trunk_vb =
            if vb.contains_tensor(&format!("{BERT_PREFIX}.embeddings.word_embeddings.weight")) {
                vb.pp(BERT_PREFIX)
            } else {
                vb.clone()
            };

        let trunk = BertModel::load(trunk_vb.clone(), &config)?;
        let hidden_size = config.hidden_size;

        let pooler = if trunk_vb.contains_tensor("pooler.dense.weight") {
            Some(candle_nn::linear(hidden_size, hidden_size, trunk_vb.pp("pooler.dense"))?)
        } else {
            None
        };
        let head = PooledHead {
            pooler,
            classifier: candle_nn::linear(hidden_size, num_labels, vb.pp("classifier"))?,
        };

        Ok(Self {
            architecture: Architecture::Bert { trunk, head },
            num_labels,
            max_sequence_length: config.max_position_embeddings,
        })
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Longest token sequence the position table can address.
    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    pub fn is_xlm_roberta(&self) -> bool {
        matches!(self.architecture, Architecture::XlmRoberta(_))
    }

    /// Runs a padded batch; returns logits shaped `[batch, num_labels]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        match &self.architecture {
            Architecture::Bert { trunk, head } => {
                let hidden = trunk.forward(input_ids, token_type_ids, Some(attention_mask))?;
                head.forward(&hidden.i((.., 0, ..))?)
            }
            Architecture::XlmRoberta(model) => {
                model.forward(input_ids, attention_mask, token_type_ids)
            }
        }
    }
}
