use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use philogic_gateway::config::Config;
use philogic_gateway::error::GatewayError;
use philogic_gateway::llm::runner;

fn config_for(exec: PathBuf, model: PathBuf) -> Config {
    Config {
        llama_cpp_path: exec,
        model_path: model,
        auth_token: "unused".to_string(),
        max_tokens: 16,
        threads: 1,
        temperature: 0.7,
        top_p: 0.9,
        gpu_layers: 0,
        timeout: Duration::from_secs(5),
        test_mode: false,
    }
}

fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn fake_model(dir: &Path) -> PathBuf {
    let path = dir.join("model.gguf");
    std::fs::write(&path, b"stub").unwrap();
    path
}

#[tokio::test]
async fn missing_executable_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let model = fake_model(dir.path());
    let config = config_for(PathBuf::from("/no/such/llama-cli"), model);

    let err = runner::run("prompt", &config).await.unwrap_err();
    match err {
        GatewayError::ExecutableNotFound(path) => {
            assert_eq!(path, PathBuf::from("/no/such/llama-cli"));
        }
        other => panic!("expected ExecutableNotFound, got {other}"),
    }
}

#[tokio::test]
async fn missing_model_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), "llama.sh", "#!/bin/sh\nexit 0\n");
    let config = config_for(stub, PathBuf::from("/no/such/model.gguf"));

    let err = runner::run("prompt", &config).await.unwrap_err();
    match err {
        GatewayError::ModelNotFound(path) => {
            assert_eq!(path, PathBuf::from("/no/such/model.gguf"));
        }
        other => panic!("expected ModelNotFound, got {other}"),
    }
}

#[tokio::test]
async fn returns_raw_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(
        dir.path(),
        "llama.sh",
        "#!/bin/sh\nprintf 'Assistant: the answer\\n'\n",
    );
    let config = config_for(stub, fake_model(dir.path()));

    let output = runner::run("prompt", &config).await.unwrap();
    assert_eq!(output, "Assistant: the answer\n");
}

#[tokio::test]
async fn passes_prompt_via_p_flag() {
    let dir = tempfile::tempdir().unwrap();
    // Echo back the argument following -p.
    let stub = write_stub(
        dir.path(),
        "llama.sh",
        "#!/bin/sh\nwhile [ $# -gt 1 ]; do\n  if [ \"$1\" = \"-p\" ]; then printf '%s' \"$2\"; exit 0; fi\n  shift\ndone\nexit 1\n",
    );
    let config = config_for(stub, fake_model(dir.path()));

    let output = runner::run("the assembled prompt", &config).await.unwrap();
    assert_eq!(output, "the assembled prompt");
}

#[tokio::test]
async fn nonzero_exit_is_a_process_error_with_stderr_excerpt() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(
        dir.path(),
        "llama.sh",
        "#!/bin/sh\necho 'ggml backend exploded' >&2\nexit 3\n",
    );
    let config = config_for(stub, fake_model(dir.path()));

    let err = runner::run("prompt", &config).await.unwrap_err();
    match err {
        GatewayError::Process(msg) => assert!(msg.contains("ggml backend exploded")),
        other => panic!("expected Process, got {other}"),
    }
}

#[tokio::test]
async fn invalid_utf8_output_is_decoded_lossily() {
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(
        dir.path(),
        "llama.sh",
        "#!/bin/sh\nprintf 'ok \\377\\376 end'\n",
    );
    let config = config_for(stub, fake_model(dir.path()));

    let output = runner::run("prompt", &config).await.unwrap();
    assert!(output.starts_with("ok "));
    assert!(output.ends_with(" end"));
    assert!(output.contains('\u{FFFD}'));
}

#[tokio::test]
async fn deadline_kills_and_reaps_the_subprocess() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("stub.pid");
    // exec replaces the shell so the recorded pid is the sleeping process.
    let stub = write_stub(
        dir.path(),
        "llama.sh",
        &format!("#!/bin/sh\necho $$ > {}\nexec sleep 30\n", pid_file.display()),
    );
    let mut config = config_for(stub, fake_model(dir.path()));
    config.timeout = Duration::from_millis(200);

    let start = Instant::now();
    let err = runner::run("prompt", &config).await.unwrap_err();
    assert!(matches!(err, GatewayError::Timeout));
    assert!(start.elapsed() < Duration::from_secs(2));

    // The child is killed and reaped before run() returns, so its /proc
    // entry is already gone.
    let pid: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(
        !Path::new(&format!("/proc/{pid}")).exists(),
        "stub process {pid} still present after timeout"
    );
}
