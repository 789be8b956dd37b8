//! 发布记录表格输出。
//!
//! 版本号红色、地址绿色；与本机 Python 版本一致的行整行高亮。

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

use crate::base_system::version_probe::InstalledVersion;
use crate::release_parser::models::Catalog;

const VERSION_WIDTH: usize = 9;
const URL_WIDTH: usize = 68;

fn rule() -> String {
    "-".repeat(VERSION_WIDTH + URL_WIDTH + 7)
}

pub fn render_releases<W: Write>(
    out: &mut W,
    catalog: &Catalog,
    installed: Option<&InstalledVersion>,
    use_color: bool,
) -> io::Result<()> {
    writeln!(out, "{}", rule())?;
    let version_head = format!("{:<VERSION_WIDTH$}", "Version");
    let url_head = format!("{:<URL_WIDTH$}", "Download URL");
    if use_color {
        writeln!(out, "| {} | {} |", version_head.cyan(), url_head.cyan())?;
    } else {
        writeln!(out, "| {version_head} | {url_head} |")?;
    }
    writeln!(out, "{}", rule())?;

    for record in catalog {
        let version = format!("{:<VERSION_WIDTH$}", record.version);
        let url = format!("{:<URL_WIDTH$}", record.download_url);
        let is_installed = installed.is_some_and(|v| v.matches(&record.version));

        if !use_color {
            let mark = if is_installed { '*' } else { ' ' };
            writeln!(out, "|{mark}{version} | {url} |")?;
        } else if is_installed {
            let row = format!(" {version} | {url} ");
            writeln!(
                out,
                "|{}|",
                row.with(Color::Magenta).on(Color::White).bold()
            )?;
        } else {
            writeln!(out, "| {} | {} |", version.red(), url.green())?;
        }
    }
    writeln!(out, "{}", rule())?;
    Ok(())
}

pub fn render_summary<W: Write>(
    out: &mut W,
    catalog: &Catalog,
    installed: Option<&InstalledVersion>,
) -> io::Result<()> {
    writeln!(out, "共解析 {} 个稳定版本。", catalog.len())?;
    match installed {
        Some(v) if catalog.iter().any(|r| v.matches(&r.version)) => {
            writeln!(out, "本机版本: {}（已在列表中高亮）", v.raw)
        }
        Some(v) => writeln!(out, "本机版本: {}（不在列表中）", v.raw),
        None => writeln!(out, "未检测到本机 Python。"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release_parser::models::ReleaseRecord;

    fn catalog() -> Catalog {
        let mut c = Catalog::try_with_capacity(8).unwrap();
        for v in ["3.12.1", "3.10.11"] {
            c.push(ReleaseRecord {
                version: v.to_string(),
                download_url: format!("https://www.python.org/ftp/python/{v}/python-{v}-amd64.exe"),
            })
            .unwrap();
        }
        c
    }

    fn render_plain(installed: Option<&InstalledVersion>) -> String {
        let mut buf = Vec::new();
        render_releases(&mut buf, &catalog(), installed, false).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn installed_version_row_is_marked() {
        let installed = InstalledVersion::parse("Python 3.10.11").unwrap();
        let text = render_plain(Some(&installed));
        let marked: Vec<_> = text.lines().filter(|l| l.starts_with("|*")).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("python-3.10.11-amd64.exe"));
    }

    #[test]
    fn absent_version_renders_without_highlight() {
        let text = render_plain(None);
        assert!(!text.contains("|*"));
        assert_eq!(text.lines().count(), 3 + 2 + 1);
        let widths: Vec<_> = text.lines().map(str::len).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn summary_mentions_missing_probe() {
        let mut buf = Vec::new();
        render_summary(&mut buf, &catalog(), None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("共解析 2 个稳定版本"));
        assert!(text.contains("未检测到本机 Python"));
    }

    #[test]
    fn colored_output_contains_escape_sequences() {
        let installed = InstalledVersion::parse("Python 3.12.1").unwrap();
        let mut buf = Vec::new();
        render_releases(&mut buf, &catalog(), Some(&installed), true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("python-3.12.1-amd64.exe"));
    }
}
