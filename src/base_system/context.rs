//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `py-releases.yml` 的字段元信息。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};
use super::version_probe::ProbeOptions;
use crate::network_parser::source::{DEFAULT_USER_AGENT, HttpOptions};
use crate::release_parser::models::{self, Limits};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 网络配置
    #[serde(default = "default_page_url")]
    pub page_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    // 本机 Python 探测
    #[serde(default = "default_python_command")]
    pub python_command: String,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    // 解析配置
    #[serde(default = "default_arch_suffix")]
    pub arch_suffix: String,
    #[serde(default = "default_response_capacity")]
    pub response_capacity: usize,
    #[serde(default = "default_truncation_margin")]
    pub truncation_margin: usize,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    #[serde(default = "default_max_version_len")]
    pub max_version_len: usize,
    #[serde(default = "default_max_url_len")]
    pub max_url_len: usize,
    #[serde(default = "default_scan_margin")]
    pub scan_margin: usize,
    #[serde(default = "default_version_lookahead")]
    pub version_lookahead: usize,
    #[serde(default = "default_suffix_lookahead")]
    pub suffix_lookahead: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_url: default_page_url(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            python_command: default_python_command(),
            probe_timeout_ms: default_probe_timeout_ms(),
            arch_suffix: default_arch_suffix(),
            response_capacity: default_response_capacity(),
            truncation_margin: default_truncation_margin(),
            max_records: default_max_records(),
            max_version_len: default_max_version_len(),
            max_url_len: default_max_url_len(),
            scan_margin: default_scan_margin(),
            version_lookahead: default_version_lookahead(),
            suffix_lookahead: default_suffix_lookahead(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "py-releases.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 14] = [
            FieldMeta {
                name: "page_url",
                description: "Python Windows 下载页地址",
            },
            FieldMeta {
                name: "user_agent",
                description: "请求使用的 User-Agent（python.org 会拒绝非浏览器 UA）",
            },
            FieldMeta {
                name: "request_timeout",
                description: "请求超时时间（秒）",
            },
            FieldMeta {
                name: "python_command",
                description: "用于探测本机版本的 Python 可执行文件",
            },
            FieldMeta {
                name: "probe_timeout_ms",
                description: "版本探测超时时间, 单位ms",
            },
            FieldMeta {
                name: "arch_suffix",
                description: "目标安装包文件名后缀, 例如 amd64.exe / arm64.exe",
            },
            FieldMeta {
                name: "response_capacity",
                description: "响应缓冲区容量（字节）",
            },
            FieldMeta {
                name: "truncation_margin",
                description: "缓冲区末尾保留字节数, 写满到此处即截断",
            },
            FieldMeta {
                name: "max_records",
                description: "最多提取的发布记录数",
            },
            FieldMeta {
                name: "max_version_len",
                description: "版本号字段最大长度（字节）",
            },
            FieldMeta {
                name: "max_url_len",
                description: "下载地址字段最大长度（字节）",
            },
            FieldMeta {
                name: "scan_margin",
                description: "锚点扫描在区段末尾前停止的字节数",
            },
            FieldMeta {
                name: "version_lookahead",
                description: "查找版本号结束位置的前瞻窗口（字节）",
            },
            FieldMeta {
                name: "suffix_lookahead",
                description: "查找架构后缀的前瞻窗口（字节）",
            },
        ];
        &FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        if self.page_url.trim().is_empty() {
            return Err("page_url must not be empty".to_string());
        }
        if self.arch_suffix.is_empty() || !self.arch_suffix.is_ascii() {
            return Err("arch_suffix must be a non-empty ASCII string".to_string());
        }
        self.limits().validate()
    }
}

impl Config {
    pub fn limits(&self) -> Limits {
        Limits {
            response_capacity: self.response_capacity,
            truncation_margin: self.truncation_margin,
            max_records: self.max_records,
            max_version_len: self.max_version_len,
            max_url_len: self.max_url_len,
            scan_margin: self.scan_margin,
            version_lookahead: self.version_lookahead,
            suffix_lookahead: self.suffix_lookahead,
        }
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            user_agent: self.user_agent.clone(),
            request_timeout: Duration::from_secs(self.request_timeout.max(1)),
        }
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            command: self.python_command.clone(),
            timeout: Duration::from_millis(self.probe_timeout_ms),
        }
    }
}

fn default_page_url() -> String {
    "https://www.python.org/downloads/windows/".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_python_command() -> String {
    "python".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    100
}

fn default_arch_suffix() -> String {
    "amd64.exe".to_string()
}

fn default_response_capacity() -> usize {
    models::RESPONSE_CAPACITY
}

fn default_truncation_margin() -> usize {
    models::TRUNCATION_MARGIN
}

fn default_max_records() -> usize {
    models::MAX_RECORDS
}

fn default_max_version_len() -> usize {
    models::MAX_VERSION_LEN
}

fn default_max_url_len() -> usize {
    models::MAX_URL_LEN
}

fn default_scan_margin() -> usize {
    models::SCAN_MARGIN
}

fn default_version_lookahead() -> usize {
    models::VERSION_LOOKAHEAD
}

fn default_suffix_lookahead() -> usize {
    models::SUFFIX_LOOKAHEAD
}
