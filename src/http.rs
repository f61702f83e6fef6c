//! HTTP download adapter: fetches a URI with a blocking client and exposes
//! the response body as a `ByteSource`, deriving a filename from
//! `Content-Disposition` (falling back to the URI's last path segment).

use std::io::{self, Read};

use crate::source::ByteSource;
use crate::store::error::Error;

pub struct HttpSource {
    response: reqwest::blocking::Response,
    name: String,
    length_hint: Option<i64>,
}

impl HttpSource {
    /// Fetch `uri`, failing with `InvalidArgument` on a non-200 status, and
    /// resolve a filename hint from the response headers or the URI itself.
    pub fn fetch(uri: &str) -> Result<Self, Error> {
        let response = reqwest::blocking::get(uri)
            .map_err(|e| Error::IoFailure(io::Error::other(e)))?;

        if !response.status().is_success() {
            return Err(Error::InvalidArgument(format!(
                "non-200 status fetching {uri}: {}",
                response.status()
            )));
        }

        let length_hint = response.content_length().map(|n| n as i64);

        let name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(extract_filename)
            .transpose()?
            .flatten()
            .or_else(|| last_path_segment(uri))
            .ok_or_else(|| Error::InvalidArgument(format!("could not derive a filename for {uri}")))?;

        log::info!("fetched {uri} as '{name}' ({length_hint:?} bytes advertised)");

        Ok(Self {
            response,
            name,
            length_hint,
        })
    }
}

impl ByteSource for HttpSource {
    fn name_hint(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn length_hint(&self) -> Option<i64> {
        self.length_hint
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.response.read(buf)
    }
}

/// Extract `filename=` from a `Content-Disposition` header value.
///
/// Handles both the quoted form (`filename="NAME"`) and the unquoted form
/// (`filename=NAME`, terminated by `;` or end of string). A quoted value
/// that never closes is rejected rather than guessed at.
fn extract_filename(header_value: &str) -> Result<Option<String>, Error> {
    let Some(idx) = header_value.find("filename=") else {
        return Ok(None);
    };
    let rest = header_value[idx + "filename=".len()..].trim_start();

    if let Some(quoted) = rest.strip_prefix('"') {
        match quoted.find('"') {
            Some(end) => Ok(Some(quoted[..end].to_string())),
            None => Err(Error::InvalidArgument(
                "unterminated filename in Content-Disposition".into(),
            )),
        }
    } else {
        let end = rest.find(';').unwrap_or(rest.len());
        let value = rest[..end].trim();
        if value.is_empty() {
            Err(Error::InvalidArgument(
                "empty filename in Content-Disposition".into(),
            ))
        } else {
            Ok(Some(value.to_string()))
        }
    }
}

fn last_path_segment(uri: &str) -> Option<String> {
    let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
    let segment = without_query.rsplit('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_filename() {
        assert_eq!(
            extract_filename("attachment; filename=\"report.pdf\"").unwrap(),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn extracts_unquoted_filename() {
        assert_eq!(
            extract_filename("attachment; filename=report.pdf").unwrap(),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn unquoted_filename_stops_at_next_parameter() {
        assert_eq!(
            extract_filename("attachment; filename=report.pdf; size=123").unwrap(),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn rejects_unterminated_quote() {
        assert!(extract_filename("attachment; filename=\"report.pdf").is_err());
    }

    #[test]
    fn absent_filename_yields_no_hint() {
        assert_eq!(extract_filename("attachment").unwrap(), None);
    }

    #[test]
    fn falls_back_to_last_path_segment() {
        assert_eq!(
            last_path_segment("https://example.com/files/report.pdf"),
            Some("report.pdf".to_string())
        );
        assert_eq!(last_path_segment("https://example.com/"), None);
    }
}
