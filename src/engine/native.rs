//! Native engine: the `minizinc` executable, one subprocess per solve.
//!
//! The model is written to the child's stdin (`--input-from-stdin`), the data goes on the
//! command line as `.dzn` text, and results are read back as `--json-stream` events.

use super::{Engine, EngineFailure, EngineRequest};
use crate::normalize::RawResponse;
use log::{debug, info};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Serializes native runs across every session of this process: some backends are not
/// reentrant when several instances share a process group.
static RUN_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Where to find the executable, and whether runs are serialized.
#[derive(Debug, Clone)]
pub struct NativeConfig {
    pub executable: PathBuf,
    pub exclusive: bool,
}

impl Default for NativeConfig {
    fn default() -> Self {
        NativeConfig { executable: PathBuf::from("minizinc"), exclusive: true }
    }
}

/// A verified `minizinc` executable.
#[derive(Debug)]
pub struct NativeEngine {
    executable: PathBuf,
    version: String,
    exclusive: bool,
}

impl NativeEngine {
    /// First line of `minizinc --version`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Command-line arguments for one run (everything after the executable).
pub(crate) fn arguments(request: &EngineRequest<'_>) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--solver".into(),
        request.solver_id.into(),
        "--json-stream".into(),
        "--output-mode".into(),
        "json".into(),
        "--output-time".into(),
        "--time-limit".into(),
        request.time_limit.as_millis().to_string(),
    ];
    if request.statistics {
        args.push("--statistics".into());
    }
    if request.collect_all_solutions {
        args.push("--all-solutions".into());
    }
    args.push("--cmdline-data".into());
    args.push(request.payload.to_dzn());
    args.push("--input-from-stdin".into());
    args
}

/// Parse `--json-stream` output, one JSON object per line. Non-JSON lines are dropped.
pub(crate) fn parse_stream(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(event @ Value::Object(_)) => Some(event),
            _ => {
                debug!("Ignoring non-JSON engine output line: {line}");
                None
            }
        })
        .collect()
}

/// Best human-readable explanation of a failed run.
fn failure_detail(events: &[Value], stderr: &str, status: std::process::ExitStatus) -> String {
    let messages: Vec<&str> = events
        .iter()
        .filter(|e| e.get("type").and_then(Value::as_str) == Some("error"))
        .filter_map(|e| e.get("message").or_else(|| e.get("what")).and_then(Value::as_str))
        .collect();

    if !messages.is_empty() {
        messages.join("; ")
    } else if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        format!("minizinc exited with {status}")
    }
}

impl Engine for NativeEngine {
    type Config = NativeConfig;

    async fn load(config: NativeConfig) -> Result<Self, EngineFailure> {
        let output = Command::new(&config.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineFailure::new(format!("cannot run '{}': {e}", config.executable.display())))?;

        if !output.status.success() {
            return Err(EngineFailure::new(format!(
                "'{} --version' exited with {}: {}",
                config.executable.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout).lines().next().unwrap_or_default().trim().to_string();
        info!("Using {} ({version})", config.executable.display());

        Ok(NativeEngine { executable: config.executable, version, exclusive: config.exclusive })
    }

    async fn run(&self, request: &EngineRequest<'_>) -> Result<RawResponse, EngineFailure> {
        let _guard = if self.exclusive { Some(RUN_LOCK.lock().await) } else { None };

        let mut child = Command::new(&self.executable)
            .args(arguments(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineFailure::new(format!("cannot start '{}': {e}", self.executable.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.model_text.as_bytes())
                .await
                .map_err(|e| EngineFailure::new(format!("cannot send model to minizinc: {e}")))?;
            // dropping stdin closes it so minizinc sees end of input
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineFailure::new(format!("lost contact with minizinc: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let events = parse_stream(&stdout);
        debug!("minizinc exited with {} after {} event(s)", output.status, events.len());

        if !output.status.success() {
            return Err(EngineFailure::new(failure_detail(&events, &stderr, output.status)));
        }

        if events.is_empty() {
            Ok(RawResponse::Text(stdout.into_owned()))
        } else {
            Ok(RawResponse::Stream(events))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ModelPayload;
    use std::time::Duration;

    fn payload() -> ModelPayload {
        ModelPayload { player_count: 2, ratings: vec![5, 6], position_codes: vec![1, 0] }
    }

    fn request<'a>(payload: &'a ModelPayload, all: bool) -> EngineRequest<'a> {
        EngineRequest {
            model_text: "solve satisfy;",
            payload,
            solver_id: "cbc",
            time_limit: Duration::from_millis(2500),
            collect_all_solutions: all,
            statistics: true,
        }
    }

    #[test]
    fn test_arguments() {
        let payload = payload();
        let args = arguments(&request(&payload, false));
        assert_eq!(
            args,
            vec![
                "--solver", "cbc", "--json-stream", "--output-mode", "json", "--output-time",
                "--time-limit", "2500", "--statistics", "--cmdline-data",
                "num_players = 2; ratings = [5, 6]; position_indices = [1, 0];",
                "--input-from-stdin",
            ]
        );
    }

    #[test]
    fn test_all_solutions_flag() {
        let payload = payload();
        assert!(arguments(&request(&payload, true)).contains(&"--all-solutions".to_string()));
        assert!(!arguments(&request(&payload, false)).contains(&"--all-solutions".to_string()));
    }

    #[test]
    fn test_parse_stream_skips_noise() {
        let events = parse_stream("{\"type\":\"status\",\"status\":\"SATISFIED\"}\n\nWarning: something\n[1,2]\n{\"type\":\"solution\"}\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["status"], "SATISFIED");
    }

    #[tokio::test]
    async fn test_load_missing_executable_fails() {
        let config = NativeConfig { executable: PathBuf::from("/definitely/not/here/minizinc"), exclusive: true };
        let err = NativeEngine::load(config).await.unwrap_err();
        assert!(err.detail.contains("/definitely/not/here/minizinc"));
    }

    /// Fake `minizinc` scripts standing in for the real executable.
    #[cfg(unix)]
    mod fake_executable {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(name: &str, body: &str) -> PathBuf {
            let path = std::env::temp_dir().join(format!("teamsplit-{}-{name}", std::process::id()));
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_run_reads_json_stream() {
            let script = write_script(
                "ok",
                r#"if [ "$1" = "--version" ]; then echo "MiniZinc to FlatZinc converter, version 2.8.5"; exit 0; fi
cat > /dev/null
printf '%s\n' '{"type": "solution", "output": {"default": "{\"team\" : [0, 1]}\n"}, "time": 3}'
printf '%s\n' '{"type": "status", "status": "OPTIMAL_SOLUTION"}'"#,
            );
            let engine = NativeEngine::load(NativeConfig { executable: script.clone(), exclusive: true }).await.unwrap();
            assert!(engine.version().contains("2.8.5"));

            let payload = payload();
            let raw = engine.run(&request(&payload, false)).await.unwrap();
            match raw {
                RawResponse::Stream(events) => assert_eq!(events.len(), 2),
                other => panic!("unexpected response: {other:?}"),
            }
            let _ = std::fs::remove_file(script);
        }

        #[tokio::test]
        async fn test_run_reports_error_exit() {
            let script = write_script(
                "fail",
                r#"if [ "$1" = "--version" ]; then echo "2.8.5"; exit 0; fi
cat > /dev/null
printf '%s\n' '{"type": "error", "what": "type error", "message": "no solver with id cbc"}'
exit 1"#,
            );
            let engine = NativeEngine::load(NativeConfig { executable: script.clone(), exclusive: true }).await.unwrap();
            let payload = payload();
            let err = engine.run(&request(&payload, false)).await.unwrap_err();
            assert_eq!(err.detail, "no solver with id cbc");
            let _ = std::fs::remove_file(script);
        }

        #[tokio::test]
        async fn test_load_rejects_failing_version_probe() {
            let script = write_script("broken", "echo 'libfoo.so missing' >&2\nexit 127");
            let err = NativeEngine::load(NativeConfig { executable: script.clone(), exclusive: true }).await.unwrap_err();
            assert!(err.detail.contains("libfoo.so missing"));
            let _ = std::fs::remove_file(script);
        }

        /// A fake engine that appends `start` and `end` lines to a log around a short sleep.
        fn start_end_recorder(name: &str) -> (PathBuf, PathBuf) {
            let log = std::env::temp_dir().join(format!("teamsplit-{}-{name}.log", std::process::id()));
            let _ = std::fs::remove_file(&log);
            let script = write_script(
                name,
                &format!(
                    r#"if [ "$1" = "--version" ]; then echo "2.8.5"; exit 0; fi
cat > /dev/null
echo start >> "{log}"
sleep 0.3
echo end >> "{log}"
printf '%s\n' '{{"type": "status", "status": "UNKNOWN"}}'"#,
                    log = log.display(),
                ),
            );
            (script, log)
        }

        async fn run_twice(script: PathBuf, log: PathBuf, exclusive: bool) -> Vec<String> {
            let engine = NativeEngine::load(NativeConfig { executable: script.clone(), exclusive }).await.unwrap();
            let payload = payload();
            let req = request(&payload, false);
            let (first, second) = tokio::join!(engine.run(&req), engine.run(&req));
            first.unwrap();
            second.unwrap();
            let lines = std::fs::read_to_string(&log).unwrap().lines().map(str::to_string).collect();
            let _ = std::fs::remove_file(script);
            let _ = std::fs::remove_file(log);
            lines
        }

        #[tokio::test]
        async fn test_exclusive_runs_do_not_overlap() {
            let (script, log) = start_end_recorder("exclusive");
            let lines = run_twice(script, log, true).await;
            assert_eq!(lines, ["start", "end", "start", "end"]);
        }

        #[tokio::test]
        async fn test_shared_runs_overlap() {
            let (script, log) = start_end_recorder("shared");
            let lines = run_twice(script, log, false).await;
            assert_eq!(lines, ["start", "start", "end", "end"]);
        }

        /// Gone, or a zombie nobody has reaped yet.
        #[cfg(target_os = "linux")]
        fn process_is_gone(pid: &str) -> bool {
            match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
                Err(_) => true,
                Ok(stat) => stat.rsplit(')').next().map(str::trim_start).is_some_and(|rest| rest.starts_with('Z')),
            }
        }

        #[cfg(target_os = "linux")]
        #[tokio::test]
        async fn test_dropped_run_kills_the_child() {
            let pid_file = std::env::temp_dir().join(format!("teamsplit-{}-hang.pid", std::process::id()));
            let _ = std::fs::remove_file(&pid_file);
            let script = write_script(
                "hang",
                &format!(
                    r#"if [ "$1" = "--version" ]; then echo "2.8.5"; exit 0; fi
echo $$ > "{}"
exec sleep 30"#,
                    pid_file.display()
                ),
            );
            let engine = NativeEngine::load(NativeConfig { executable: script.clone(), exclusive: false }).await.unwrap();
            let payload = payload();

            let abandoned = tokio::time::timeout(Duration::from_millis(500), engine.run(&request(&payload, false))).await;
            assert!(abandoned.is_err());

            let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
            let mut gone = false;
            for _ in 0..40 {
                if process_is_gone(&pid) {
                    gone = true;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            assert!(gone, "child {pid} still running after its run was dropped");
            let _ = std::fs::remove_file(script);
            let _ = std::fs::remove_file(pid_file);
        }
    }
}
