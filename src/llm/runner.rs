use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::{GatewayError, Result};

/// Runs llama.cpp once for the given prompt and returns its raw stdout.
///
/// The flag set matches the llama-cli contract: model, prompt, generation
/// length, threads, sampling parameters, GPU offload, plus prompt-echo and
/// debug-log suppression. Output is decoded lossily so invalid byte
/// sequences from the model can never fail the request.
///
/// The wall-clock deadline is enforced with [`timeout`]; on expiry the child
/// is explicitly killed and reaped before `Timeout` is returned, with
/// `kill_on_drop` as a backstop on the remaining exit paths, so no
/// subprocess outlives its request.
pub async fn run(prompt: &str, config: &Config) -> Result<String> {
    if !config.llama_cpp_path.exists() {
        return Err(GatewayError::ExecutableNotFound(
            config.llama_cpp_path.clone(),
        ));
    }
    if !config.model_path.exists() {
        return Err(GatewayError::ModelNotFound(config.model_path.clone()));
    }

    let mut child = Command::new(&config.llama_cpp_path)
        .arg("-m")
        .arg(&config.model_path)
        .arg("-p")
        .arg(prompt)
        .args(["-n", &config.max_tokens.to_string()])
        .args(["-t", &config.threads.to_string()])
        .args(["--temp", &config.temperature.to_string()])
        .args(["--top-p", &config.top_p.to_string()])
        .args(["-ngl", &config.gpu_layers.to_string()])
        .arg("--no-display-prompt")
        .arg("--log-disable")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| GatewayError::Process("stdout not captured".to_string()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| GatewayError::Process("stderr not captured".to_string()))?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    // The pipes are drained while waiting so the child cannot block on a
    // full pipe buffer.
    let waited = timeout(config.timeout, async {
        tokio::try_join!(
            child.wait(),
            stdout_pipe.read_to_end(&mut stdout),
            stderr_pipe.read_to_end(&mut stderr),
        )
    })
    .await;

    let status = match waited {
        Ok(joined) => joined?.0,
        Err(_) => {
            tracing::warn!(
                "Inference exceeded {}s deadline, killing subprocess",
                config.timeout.as_secs()
            );
            // kill() sends SIGKILL and waits, so the child is reaped before
            // the timeout is reported.
            child.kill().await?;
            return Err(GatewayError::Timeout);
        }
    };

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        let excerpt: String = stderr.trim().chars().take(200).collect();
        return Err(GatewayError::Process(format!(
            "exited with {status}: {excerpt}"
        )));
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}
