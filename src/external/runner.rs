use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::error::{ReconError, ReconResult};

/// Executable search path handed to every child process.
///
/// Built once at startup so tools installed with `go install` are visible
/// without touching the process environment.
#[derive(Debug, Clone)]
pub struct SearchPath(OsString);

impl SearchPath {
    pub fn from_env() -> Self {
        let current = std::env::var_os("PATH").unwrap_or_default();
        let go_bin = directories::BaseDirs::new().map(|d| d.home_dir().join("go").join("bin"));
        match go_bin {
            Some(dir) => Self::with_extra_dir(&current, &dir),
            None => Self(current),
        }
    }

    /// Prepend `dir` to `current` unless it is already listed.
    pub fn with_extra_dir(current: &OsStr, dir: &Path) -> Self {
        let mut parts: Vec<PathBuf> = std::env::split_paths(current).collect();
        if parts.iter().any(|p| p == dir) {
            return Self(current.to_os_string());
        }
        parts.insert(0, dir.to_path_buf());
        Self(std::env::join_paths(parts).unwrap_or_else(|_| current.to_os_string()))
    }

    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }

    pub fn contains(&self, dir: &Path) -> bool {
        std::env::split_paths(&self.0).any(|p| p == dir)
    }
}

/// A single external tool invocation: program, arguments and optional stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl ToolCommand {
    /// Build from a configured command prefix such as `/opt/amass` or
    /// `sh /tmp/fake.sh`.
    pub fn from_prefix(prefix: &str) -> ReconResult<Self> {
        let mut words = shell_words::split(prefix)
            .map_err(|e| ReconError::parse("tool command", e))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| ReconError::Config("empty tool command".into()))?;
        Ok(Self { program, args: words.collect(), stdin: None })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Program name as shown in logs and errors.
    pub fn name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }

    pub fn display(&self) -> String {
        let mut words = vec![self.program.clone()];
        words.extend(self.args.iter().cloned());
        shell_words::join(words)
    }
}

/// Runs external tools to completion and returns their stdout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    search_path: SearchPath,
}

impl ToolRunner {
    pub fn new(search_path: SearchPath) -> Self {
        Self { search_path }
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    fn resolve(&self, program: &str) -> ReconResult<PathBuf> {
        let cwd = std::env::current_dir()?;
        which::which_in(program, Some(self.search_path.as_os_str()), cwd)
            .map_err(|_| ReconError::ToolNotFound { tool: program.to_string() })
    }

    /// Execute `cmd`, waiting at most `timeout`. A timed-out child is killed
    /// before the error is returned.
    pub async fn execute(&self, cmd: &ToolCommand, timeout: Option<Duration>) -> ReconResult<String> {
        let tool = cmd.name().to_string();
        let program = self.resolve(&cmd.program)?;
        tracing::debug!(command = %cmd.display(), "executing");

        let mut child = Command::new(&program)
            .args(&cmd.args)
            .env("PATH", self.search_path.as_os_str())
            .stdin(if cmd.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ReconError::ToolNotFound { tool: tool.clone() },
                _ => ReconError::Io(e),
            })?;

        if let (Some(input), Some(mut pipe)) = (cmd.stdin.as_ref(), child.stdin.take()) {
            let payload = format!("{}\n", input);
            if let Err(e) = pipe.write_all(payload.as_bytes()).await {
                // the child may exit without reading its input
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let mut stdout = child.stdout.take().ok_or_else(|| ReconError::Config("stdout not captured".into()))?;
        let mut stderr = child.stderr.take().ok_or_else(|| ReconError::Config("stderr not captured".into()))?;

        let run = async {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let (r_out, r_err, status) = tokio::join!(
                stdout.read_to_end(&mut out),
                stderr.read_to_end(&mut err),
                child.wait()
            );
            r_out?;
            r_err?;
            Ok::<_, std::io::Error>((status?, out, err))
        };

        let waited = match timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| limit),
            None => Ok(run.await),
        };
        let (status, out, err) = match waited {
            Ok(res) => res?,
            Err(limit) => {
                tracing::warn!(tool = %tool, timeout_secs = limit.as_secs(), "tool timed out, killing it");
                let _ = child.kill().await;
                return Err(ReconError::ToolTimeout { tool, timeout: limit });
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&err);
            let tail: Vec<&str> = stderr.lines().rev().take(10).collect();
            let tail = tail.into_iter().rev().collect::<Vec<_>>().join("\n");
            tracing::warn!(tool = %tool, code = ?status.code(), stderr = %tail, "tool failed");
            return Err(ReconError::ToolFailure { tool, code: status.code(), stderr: tail });
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Non-empty, trimmed lines of tool output.
pub fn output_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ToolRunner {
        ToolRunner::new(SearchPath::from_env())
    }

    #[test]
    fn search_path_prepends_once() {
        let dir = Path::new("/home/user/go/bin");
        let sp = SearchPath::with_extra_dir(OsStr::new("/usr/bin:/bin"), dir);
        assert!(sp.contains(dir));
        assert_eq!(sp.as_os_str(), OsStr::new("/home/user/go/bin:/usr/bin:/bin"));

        let again = SearchPath::with_extra_dir(sp.as_os_str(), dir);
        assert_eq!(again.as_os_str(), sp.as_os_str());
    }

    #[test]
    fn prefix_is_shell_split() {
        let cmd = ToolCommand::from_prefix("sh '/tmp/my tools/fake.sh'").unwrap().arg("-d").arg("example.com");
        assert_eq!(cmd.program, "sh");
        assert_eq!(cmd.args, vec!["/tmp/my tools/fake.sh", "-d", "example.com"]);
        assert_eq!(ToolCommand::from_prefix("/opt/bin/amass").unwrap().name(), "amass");
        assert!(ToolCommand::from_prefix("   ").is_err());
    }

    #[test]
    fn output_lines_skips_blanks() {
        let lines: Vec<_> = output_lines("a\n\n  b  \n\t\n").collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let cmd = ToolCommand::from_prefix("sh -c").unwrap().arg("printf 'one\\ntwo\\n'");
        let out = runner().execute(&cmd, Some(Duration::from_secs(10))).await.unwrap();
        assert_eq!(out, "one\ntwo\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pipes_stdin() {
        let cmd = ToolCommand::from_prefix("cat").unwrap().stdin("a.example.com");
        let out = runner().execute(&cmd, Some(Duration::from_secs(10))).await.unwrap();
        assert_eq!(out.trim(), "a.example.com");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let cmd = ToolCommand::from_prefix("sh -c").unwrap().arg("echo boom >&2; exit 3");
        match runner().execute(&cmd, Some(Duration::from_secs(10))).await {
            Err(ReconError::ToolFailure { tool, code, stderr }) => {
                assert_eq!(tool, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let cmd = ToolCommand::from_prefix("sleep 5").unwrap();
        let started = std::time::Instant::now();
        let res = runner().execute(&cmd, Some(Duration::from_millis(200))).await;
        assert!(matches!(res, Err(ReconError::ToolTimeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_tool_is_killed() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("finished");
        let script = format!("sleep 1; touch '{}'", marker.display());
        let cmd = ToolCommand::from_prefix("sh -c").unwrap().arg(script);

        let res = runner().execute(&cmd, Some(Duration::from_millis(200))).await;
        assert!(matches!(res, Err(ReconError::ToolTimeout { .. })));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!marker.exists(), "killed tool must not finish its work");
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let cmd = ToolCommand::from_prefix("definitely-not-a-real-tool-7f3a").unwrap();
        let res = runner().execute(&cmd, None).await;
        assert!(matches!(res, Err(ReconError::ToolNotFound { .. })));
    }
}
