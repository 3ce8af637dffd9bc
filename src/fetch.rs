//! Where a dataset comes from, and how its rows are obtained.
//!
//! A source is fetched once at startup. Network sources get a single blocking
//! request with a 30 s timeout; a failure aborts initialization.

use crate::error::{FetchError, LoadError};
use crate::load::{self, RawRows};
use log::info;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::path::PathBuf;
use std::time::Duration;

const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d";

// Sheet names may contain spaces and punctuation; keep only unreserved chars.
const SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Any `http(s)` URL returning CSV.
    Url(String),
    /// Published spreadsheet, exported as CSV.
    Sheet { id: String, sheet: Option<String> },
    Xlsx(PathBuf),
    Csv(PathBuf),
}

impl Source {
    /// Parse a command-line source: URL, `sheet:<id>[/<name>]`, `.xlsx` or CSV path.
    pub fn parse(input: &str) -> Result<Source, FetchError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(FetchError::Unsupported(input.to_string()));
        }
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Source::Url(input.to_string()));
        }
        if let Some(rest) = input.strip_prefix("sheet:") {
            let (id, sheet) = match rest.split_once('/') {
                Some((id, name)) => (id, Some(name.to_string()).filter(|n| !n.is_empty())),
                None => (rest, None),
            };
            if id.is_empty() {
                return Err(FetchError::Unsupported(input.to_string()));
            }
            return Ok(Source::Sheet {
                id: id.to_string(),
                sheet,
            });
        }
        if lower.contains("://") {
            return Err(FetchError::Unsupported(input.to_string()));
        }
        if lower.ends_with(".xlsx") {
            Ok(Source::Xlsx(PathBuf::from(input)))
        } else {
            Ok(Source::Csv(PathBuf::from(input)))
        }
    }

    /// URL a network source is downloaded from.
    pub fn url(&self) -> Option<String> {
        match self {
            Source::Url(u) => Some(u.clone()),
            Source::Sheet { id, sheet } => {
                let mut u = format!("{SHEETS_BASE}/{id}/gviz/tq?tqx=out:csv");
                if let Some(name) = sheet {
                    u.push_str("&sheet=");
                    u.push_str(&percent_encoding::utf8_percent_encode(name, SAFE).to_string());
                }
                Some(u)
            }
            Source::Xlsx(_) | Source::Csv(_) => None,
        }
    }
}

fn http_client() -> Result<HttpClient, FetchError> {
    HttpClient::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .user_agent(concat!("periodviz/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| FetchError::Request {
            url: String::new(),
            source,
        })
}

/// Read the raw rows of `source`.
///
/// `sheet` selects a worksheet of an `.xlsx` file; other sources ignore it
/// (a spreadsheet's tab is part of [`Source::Sheet`]).
pub fn fetch_rows(source: &Source, sheet: Option<&str>) -> Result<RawRows, FetchError> {
    match source {
        Source::Csv(path) => Ok(load::read_csv_path(path)?),
        Source::Xlsx(path) => Ok(load::read_xlsx(path, sheet)?),
        Source::Url(_) | Source::Sheet { .. } => {
            let url = source
                .url()
                .ok_or_else(|| FetchError::Unsupported(format!("{source:?}")))?;
            let body = download(&url)?;
            let rows = load::read_csv(body.as_bytes()).map_err(FetchError::from)?;
            info!("fetched {} rows from {}", rows.len(), url);
            Ok(rows)
        }
    }
}

fn download(url: &str) -> Result<String, FetchError> {
    let request_err = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };
    let resp = http_client()?.get(url).send().map_err(request_err)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = resp.text().map_err(request_err)?;
    if body.trim().is_empty() {
        return Err(FetchError::Load(LoadError::MissingHeader));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_kind() {
        assert_eq!(
            Source::parse("https://example.com/data.csv").unwrap(),
            Source::Url("https://example.com/data.csv".into())
        );
        assert_eq!(
            Source::parse("sheet:abc123/Revenue Q").unwrap(),
            Source::Sheet {
                id: "abc123".into(),
                sheet: Some("Revenue Q".into())
            }
        );
        assert_eq!(
            Source::parse("sheet:abc123").unwrap(),
            Source::Sheet {
                id: "abc123".into(),
                sheet: None
            }
        );
        assert_eq!(
            Source::parse("data/Book.XLSX").unwrap(),
            Source::Xlsx("data/Book.XLSX".into())
        );
        assert_eq!(Source::parse("rev.csv").unwrap(), Source::Csv("rev.csv".into()));
    }

    #[test]
    fn rejects_empty_and_foreign_schemes() {
        assert!(Source::parse("  ").is_err());
        assert!(Source::parse("sheet:").is_err());
        assert!(Source::parse("ftp://host/file.csv").is_err());
    }

    #[test]
    fn sheet_url_encodes_tab_name() {
        let s = Source::parse("sheet:XYZ/Growth & Margin").unwrap();
        assert_eq!(
            s.url().unwrap(),
            "https://docs.google.com/spreadsheets/d/XYZ/gviz/tq?tqx=out:csv&sheet=Growth%20%26%20Margin"
        );
        assert!(Source::Csv("a.csv".into()).url().is_none());
    }

    #[test]
    fn local_csv_is_read_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("x.csv");
        std::fs::write(&p, "Quarter,A\n2020'Q1,1\n").unwrap();
        let rows = fetch_rows(&Source::Csv(p), None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "2020'Q1");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = fetch_rows(&Source::Csv("/definitely/not/here.csv".into()), None).unwrap_err();
        assert!(matches!(err, FetchError::Load(LoadError::Io(_))));
    }
}
