//! Quantized GGUF models run in-process on candle.

use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};

use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use report_core::{async_trait, BackendError, ChatBackend, ChatMessage, ChatRequest};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Prompt plus completion never exceed this many tokens.
const MAX_CONTEXT_TOKENS: usize = 4096;

/// Completion length when the request does not set one.
const DEFAULT_MAX_TOKENS: usize = 512;

const SAMPLING_SEED: u64 = 299_792_458;

const EOS_METADATA_KEY: &str = "tokenizer.ggml.eos_token_id";

/// Model weights and tokenizer, used by one generation at a time.
struct Session {
    model: ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token: Option<u32>,
}

/// A llama-family GGUF model answering chat requests on the CPU.
///
/// Generation runs on the blocking pool. Calls are serialized; a call
/// abandoned by its caller still runs to completion before the next starts.
pub struct GgufBackend {
    name: String,
    session: Arc<Mutex<Session>>,
}

impl std::fmt::Debug for GgufBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GgufBackend")
            .field("name", &self.name)
            .finish()
    }
}

impl GgufBackend {
    /// Load quantized weights from `model_path` and a `tokenizer.json`.
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self, BackendError> {
        let mut file = File::open(model_path).map_err(|e| {
            BackendError::Unavailable(format!("cannot read model {}: {}", model_path.display(), e))
        })?;
        let content = gguf_file::Content::read(&mut file).map_err(|e| {
            BackendError::Unavailable(format!(
                "invalid GGUF file {}: {}",
                model_path.display(),
                e
            ))
        })?;
        let eos_from_metadata = content
            .metadata
            .get(EOS_METADATA_KEY)
            .and_then(|v| v.to_u32().ok());
        debug!(
            "GGUF {}: {} tensors, eos token {:?}",
            model_path.display(),
            content.tensor_infos.len(),
            eos_from_metadata
        );

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            BackendError::Unavailable(format!(
                "cannot load tokenizer {}: {}",
                tokenizer_path.display(),
                e
            ))
        })?;

        let device = Device::Cpu;
        let model = ModelWeights::from_gguf(content, &mut file, &device).map_err(|e| {
            BackendError::Unavailable(format!(
                "cannot load weights from {}: {}",
                model_path.display(),
                e
            ))
        })?;

        let eos_token = eos_from_metadata.or_else(|| tokenizer.token_to_id("</s>"));
        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gguf".to_string());
        info!("Loaded GGUF model {} on {:?}", name, device);

        Ok(Self {
            name,
            session: Arc::new(Mutex::new(Session {
                model,
                tokenizer,
                device,
                eos_token,
            })),
        })
    }
}

#[async_trait]
impl ChatBackend for GgufBackend {
    async fn complete(&self, request: ChatRequest) -> Result<String, BackendError> {
        let prompt = chat_prompt(&request.messages);
        let max_tokens = request
            .max_tokens
            .map(|t| t as usize)
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .clamp(1, MAX_CONTEXT_TOKENS / 2);
        let temperature = request.temperature.map(f64::from);
        let session = Arc::clone(&self.session);

        tokio::task::spawn_blocking(move || {
            let mut session = session
                .lock()
                .map_err(|_| BackendError::Unavailable("model session poisoned".to_string()))?;
            session.generate(&prompt, max_tokens, temperature)
        })
        .await
        .map_err(|e| BackendError::Unavailable(format!("generation task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Session {
    fn generate(
        &mut self,
        prompt: &str,
        max_tokens: usize,
        temperature: Option<f64>,
    ) -> Result<String, BackendError> {
        let encoding = self.tokenizer.encode(prompt, true).map_err(inference_error)?;
        let mut input = encoding.get_ids().to_vec();

        let budget = MAX_CONTEXT_TOKENS - max_tokens;
        if input.len() > budget {
            debug!("Prompt cut from {} to its last {} tokens", input.len(), budget);
            input.drain(..input.len() - budget);
        }

        let mut sampler = LogitsProcessor::new(SAMPLING_SEED, temperature, None);
        let mut generated = Vec::with_capacity(max_tokens);
        let mut index_pos = 0;

        while generated.len() < max_tokens {
            let tensor = Tensor::new(input.as_slice(), &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(inference_error)?;
            let logits = self
                .model
                .forward(&tensor, index_pos)
                .and_then(|l| l.squeeze(0))
                .map_err(inference_error)?;
            let next = sampler.sample(&logits).map_err(inference_error)?;
            if Some(next) == self.eos_token {
                break;
            }
            index_pos += input.len();
            generated.push(next);
            input = vec![next];
        }

        debug!("Generated {} tokens", generated.len());
        self.tokenizer
            .decode(&generated, true)
            .map_err(inference_error)
    }
}

fn inference_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::Unavailable(format!("inference failed: {}", e))
}

/// Flatten chat messages into a single instruction prompt.
///
/// Image parts are dropped; only their text survives.
pub(crate) fn chat_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        let heading = match message.role.as_str() {
            "system" => "System",
            "assistant" => "Assistant",
            _ => "User",
        };
        prompt.push_str("### ");
        prompt.push_str(heading);
        prompt.push_str(":\n");
        prompt.push_str(message.content.text().trim());
        prompt.push_str("\n\n");
    }
    prompt.push_str("### Assistant:\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::ContentPart;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_chat_prompt_layout() {
        let messages = vec![
            ChatMessage::system("You analyze outages."),
            ChatMessage::user_parts(vec![
                ContentPart::text("Summarize this.\n"),
                ContentPart::png_base64("AAAA"),
            ]),
        ];

        assert_eq!(
            chat_prompt(&messages),
            "### System:\nYou analyze outages.\n\n### User:\nSummarize this.\n\n### Assistant:\n"
        );
    }

    #[test]
    fn test_missing_model_file() {
        let dir = scratch_dir("report-synth-gguf-missing");
        let err = GgufBackend::load(&dir.join("absent.gguf"), &dir.join("tokenizer.json"))
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Unavailable(msg) if msg.contains("cannot read model")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_not_a_gguf_file() {
        let dir = scratch_dir("report-synth-gguf-garbage");
        let model = dir.join("model.gguf");
        std::fs::write(&model, b"this is not a gguf model at all").unwrap();

        let err = GgufBackend::load(&model, &dir.join("tokenizer.json"))
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Unavailable(msg) if msg.contains("invalid GGUF")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
