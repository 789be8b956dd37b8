//! 探测本机已安装的 Python 版本（`python --version`）。
//!
//! 子进程的 stdout/stderr 均被捕获：旧版 Python 把版本号写到 stderr。
//! 超时或启动失败时返回 `None`，渲染阶段据此不做高亮。

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn re_version_line() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"^\s*(\S+)\s+(\d+\.\d+\.\d+)").unwrap())
}

/// `"<Name> <major>.<minor>.<patch>"` 形式的探测结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub raw: String,
    pub name: String,
    pub number: String,
}

impl InstalledVersion {
    pub fn parse(output: &str) -> Option<Self> {
        let line = output.lines().find(|l| !l.trim().is_empty())?;
        let caps = re_version_line().captures(line)?;
        Some(Self {
            raw: line.trim().to_string(),
            name: caps[1].to_string(),
            number: caps[2].to_string(),
        })
    }

    pub fn matches(&self, version: &str) -> bool {
        self.number == version
    }
}

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub command: String,
    pub timeout: Duration,
}

pub fn probe_installed_version(options: &ProbeOptions) -> Option<InstalledVersion> {
    let child = Command::new(&options.command)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let child = match child {
        Ok(c) => c,
        Err(err) => {
            warn!(target: "probe", "无法启动 {}: {err}", options.command);
            return None;
        }
    };

    let output = wait_with_timeout(child, options.timeout)?;
    let parsed = InstalledVersion::parse(&output);
    match &parsed {
        Some(v) => debug!(
            target: "probe",
            name = %v.name,
            version = %v.number,
            "installed python detected"
        ),
        None => warn!(target: "probe", "无法解析版本输出: {:?}", output.trim()),
    }
    parsed
}

fn wait_with_timeout(mut child: Child, timeout: Duration) -> Option<String> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(target: "probe", %status, "version probe exited");
                break;
            }
            Ok(None) if Instant::now() >= deadline => {
                warn!(target: "probe", "版本探测超时（{} ms）", timeout.as_millis());
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                warn!(target: "probe", "等待子进程失败: {err}");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    }

    let mut text = String::new();
    if let Some(mut out) = child.stdout.take() {
        let _ = out.read_to_string(&mut text);
    }
    if text.trim().is_empty()
        && let Some(mut err) = child.stderr.take()
    {
        let _ = err.read_to_string(&mut text);
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_version_line() {
        let v = InstalledVersion::parse("Python 3.10.11\r\n").unwrap();
        assert_eq!(v.name, "Python");
        assert_eq!(v.number, "3.10.11");
        assert_eq!(v.raw, "Python 3.10.11");
        assert!(v.matches("3.10.11"));
        assert!(!v.matches("3.10.1"));
    }

    #[test]
    fn prerelease_tail_is_ignored() {
        let v = InstalledVersion::parse("Python 3.13.0rc2").unwrap();
        assert_eq!(v.number, "3.13.0");
    }

    #[test]
    fn garbage_is_unavailable() {
        assert_eq!(InstalledVersion::parse(""), None);
        assert_eq!(InstalledVersion::parse("command not found"), None);
        assert_eq!(InstalledVersion::parse("Python"), None);
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let options = ProbeOptions {
            command: "definitely-not-a-python-binary-8d1f".to_string(),
            timeout: Duration::from_millis(200),
        };
        assert_eq!(probe_installed_version(&options), None);
    }
}
