//! Sentence-transformer embeddings through ONNX Runtime.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::TensorRef;
use tokenizers::Tokenizer;

use crate::embedding::{Embedder, DEFAULT_DIMENSIONS};
use crate::error::{StoreError, StoreResult};

/// ONNX Runtime-backed embedder using a sentence-transformer model such as
/// all-MiniLM-L6-v2.
///
/// Expects a model directory containing:
/// - `model.onnx`: the sentence-transformer ONNX export
/// - `tokenizer.json`: the HuggingFace fast-tokenizer file
///
/// The model takes `input_ids`, `attention_mask` and `token_type_ids` as
/// i64 inputs and produces token-level embeddings. Token vectors are
/// mean-pooled under the attention mask and L2-normalized.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimensions: usize,
    name: String,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

fn embedding_error(context: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Embedding(format!("{context}: {err}"))
}

impl OnnxEmbedder {
    /// Load a sentence-transformer model from the given directory.
    ///
    /// The directory must contain `model.onnx` and `tokenizer.json`; its
    /// file name becomes part of the embedder name.
    pub fn from_directory(model_dir: &Path) -> StoreResult<Self> {
        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        Self::from_files(
            &model_dir.join("model.onnx"),
            &model_dir.join("tokenizer.json"),
            &model_name,
        )
    }

    /// Load from explicit model and tokenizer file paths.
    pub fn from_files(
        model_path: &Path,
        tokenizer_path: &Path,
        model_name: &str,
    ) -> StoreResult<Self> {
        if !model_path.exists() {
            return Err(StoreError::Embedding(format!(
                "ONNX model not found at {}",
                model_path.display()
            )));
        }
        if !tokenizer_path.exists() {
            return Err(StoreError::Embedding(format!(
                "tokenizer not found at {}",
                tokenizer_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| embedding_error("ONNX session builder", e))?
            .with_intra_threads(1)
            .map_err(|e| embedding_error("ONNX set threads", e))?
            .commit_from_file(model_path)
            .map_err(|e| embedding_error("ONNX load model", e))?;

        // Sentence-transformer output is [batch, seq_len, hidden_dim].
        let dimensions = session
            .outputs()
            .first()
            .and_then(|out| out.dtype().tensor_shape())
            .and_then(|shape| shape.last().copied())
            .and_then(|d| usize::try_from(d).ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DIMENSIONS);

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| embedding_error("load tokenizer", e))?;

        log::info!(
            "Loaded ONNX embedding model {} ({} dimensions)",
            model_path.display(),
            dimensions
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
            name: format!("onnx:{model_name}"),
        })
    }

    /// Tokenize one text as a `[1, seq_len]` batch.
    fn encode(&self, text: &str) -> StoreResult<[ndarray::Array2<i64>; 3]> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| embedding_error("tokenization failed", e))?;

        let widen = |values: &[u32]| values.iter().map(|&v| i64::from(v)).collect::<Vec<_>>();
        let seq_len = encoding.get_ids().len();
        let shape = |values: Vec<i64>| {
            ndarray::Array2::from_shape_vec((1, seq_len), values)
                .map_err(|e| embedding_error("input array", e))
        };

        Ok([
            shape(widen(encoding.get_ids()))?,
            shape(widen(encoding.get_attention_mask()))?,
            shape(widen(encoding.get_type_ids()))?,
        ])
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> StoreResult<Vec<f32>> {
        let [ids, mask, types] = self.encode(text)?;

        let ids_ref =
            TensorRef::from_array_view(&ids).map_err(|e| embedding_error("input_ids", e))?;
        let mask_ref =
            TensorRef::from_array_view(&mask).map_err(|e| embedding_error("attention_mask", e))?;
        let types_ref =
            TensorRef::from_array_view(&types).map_err(|e| embedding_error("token_type_ids", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| embedding_error("session lock poisoned", e))?;
        let outputs = session
            .run(ort::inputs![ids_ref, mask_ref, types_ref])
            .map_err(|e| embedding_error("ONNX inference failed", e))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| embedding_error("extract embeddings", e))?;
        let hidden_dim = match shape.iter().copied().collect::<Vec<i64>>().as_slice() {
            [_, .., last] => usize::try_from(*last).unwrap_or(0),
            other => {
                return Err(StoreError::Embedding(format!(
                    "unexpected output shape: {other:?}"
                )))
            }
        };

        Ok(mean_pool(data, mask.as_slice().unwrap_or_default(), hidden_dim))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Average the token vectors whose mask is set, then L2-normalize.
///
/// `data` holds `mask.len()` consecutive vectors of `hidden_dim` values.
fn mean_pool(data: &[f32], mask: &[i64], hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];
    if hidden_dim == 0 {
        return pooled;
    }

    let mut count = 0.0f32;
    for (token, &m) in data.chunks_exact(hidden_dim).zip(mask) {
        if m == 1 {
            for (acc, v) in pooled.iter_mut().zip(token) {
                *acc += v;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for val in &mut pooled {
            *val /= count;
        }
    }

    let norm: f32 = pooled.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in &mut pooled {
            *val /= norm;
        }
    }

    pooled
}
