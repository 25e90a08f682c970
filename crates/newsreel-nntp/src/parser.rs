//! Status-line and response parsing.

use crate::error::NntpError;
use crate::model::Response;

/// Reply shape the issued command declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    SingleLine,
    MultiLine,
}

#[derive(Debug)]
pub struct ResponseParser {
    mode: ResponseMode,
    status: Option<(u16, String)>,
}

impl ResponseParser {
    pub fn new(mode: ResponseMode) -> Self {
        Self { mode, status: None }
    }

    /// Consumes the status line.
    ///
    /// Returns the finished response when no body follows: always in
    /// single-line mode, and in multi-line mode when the status is not one
    /// that announces a body.
    pub fn status_line(&mut self, line: &str) -> Result<Option<Response>, NntpError> {
        let (status, message) = parse_status_line(line)?;
        if self.mode == ResponseMode::SingleLine || !announces_body(status) {
            return Ok(Some(Response {
                status,
                message,
                lines: None,
            }));
        }
        self.status = Some((status, message));
        Ok(None)
    }

    /// Consumes the framed body of a multi-line response.
    pub fn body(&mut self, lines: Vec<String>) -> Result<Response, NntpError> {
        let (status, message) = self
            .status
            .take()
            .ok_or_else(|| NntpError::Parse("body received before status line".into()))?;
        Ok(Response {
            status,
            message,
            lines: Some(lines),
        })
    }
}

/// Multi-line bodies only follow 1xx and 2xx replies
/// ([RFC 3977 §3.2](https://datatracker.ietf.org/doc/html/rfc3977#section-3.2)).
pub fn announces_body(status: u16) -> bool {
    (100..300).contains(&status)
}

pub fn parse_status_line(line: &str) -> Result<(u16, String), NntpError> {
    let invalid = || NntpError::Parse(format!("invalid status line: {line:?}"));
    let code = line.get(..3).ok_or_else(invalid)?;
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let rest = &line[3..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(invalid());
    }
    let status = code.parse::<u16>().map_err(|_| invalid())?;
    Ok((status, rest.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_and_message() {
        let (code, message) = parse_status_line("200 Hello there ").unwrap();
        assert_eq!(code, 200);
        assert_eq!(message, "Hello there");
    }

    #[test]
    fn bare_code_has_empty_message() {
        assert_eq!(parse_status_line("205").unwrap(), (205, String::new()));
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in ["oops", "", "20", "2x0 nope", "2000 too long", "+20 sign", "€€ x"] {
            let err = parse_status_line(line).expect_err(line);
            assert!(matches!(err, NntpError::Parse(_)), "{line}");
        }
    }

    #[test]
    fn single_line_mode_completes_on_status() {
        let mut parser = ResponseParser::new(ResponseMode::SingleLine);
        let response = parser.status_line("223 1 <a@b>").unwrap().unwrap();
        assert_eq!(response.status, 223);
        assert_eq!(response.message, "1 <a@b>");
        assert_eq!(response.lines, None);
    }

    #[test]
    fn multi_line_mode_waits_for_body() {
        let mut parser = ResponseParser::new(ResponseMode::MultiLine);
        assert_eq!(parser.status_line("215 list follows").unwrap(), None);
        let response = parser.body(vec!["Subject:".into()]).unwrap();
        assert_eq!(response.status, 215);
        assert_eq!(response.lines, Some(vec!["Subject:".to_string()]));
    }

    #[test]
    fn multi_line_mode_error_status_has_no_body() {
        let mut parser = ResponseParser::new(ResponseMode::MultiLine);
        let response = parser.status_line("430 no such article").unwrap().unwrap();
        assert_eq!(response.status, 430);
        assert_eq!(response.lines, None);
    }

    #[test]
    fn body_without_status_is_an_error() {
        let mut parser = ResponseParser::new(ResponseMode::MultiLine);
        assert!(matches!(parser.body(Vec::new()), Err(NntpError::Parse(_))));
    }
}
