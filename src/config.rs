use std::path::PathBuf;
use std::time::Duration;

/// Placeholder token shipped in the docs; startup warns if it is still in use.
pub const DEFAULT_AUTH_TOKEN: &str = "your-secure-token-change-this-32-chars";

const LLAMA_CPP_PATH: &str = "/opt/philogic-ai/llama.cpp/build/bin/llama-cli";
const MODEL_PATH: &str = "/opt/philogic-ai/models/Qwen3-14B-Q5_K_M.gguf";

const MAX_TOKENS: u32 = 128;
const THREADS: u32 = 8;
const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.9;
// CPU only for a more stable start; raise once the GPU build is verified.
const GPU_LAYERS: u32 = 0;
const INFERENCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Process-wide configuration, built once at startup and never mutated.
/// Paths and inference tuning are compiled in; only the auth token and the
/// test-mode switch come from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub llama_cpp_path: PathBuf,
    pub model_path: PathBuf,
    pub auth_token: String,
    pub max_tokens: u32,
    pub threads: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub gpu_layers: u32,
    pub timeout: Duration,
    pub test_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let auth_token = std::env::var("PHILOGIC_AUTH_TOKEN")
            .unwrap_or_else(|_| DEFAULT_AUTH_TOKEN.to_string());
        let test_mode = std::env::var("PHILOGIC_TEST_MODE")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            llama_cpp_path: PathBuf::from(LLAMA_CPP_PATH),
            model_path: PathBuf::from(MODEL_PATH),
            auth_token,
            max_tokens: MAX_TOKENS,
            threads: THREADS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            gpu_layers: GPU_LAYERS,
            timeout: INFERENCE_TIMEOUT,
            test_mode,
        }
    }

    /// Base name of the model file, reported by the health and chat endpoints.
    pub fn model_name(&self) -> String {
        self.model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model_path.display().to_string())
    }
}
