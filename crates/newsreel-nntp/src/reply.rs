//! Interpretation of successful replies into typed results.

use crate::error::NntpError;
use crate::model::{GroupInfo, OverviewFormat, OverviewRow};

/// Parses `<number> <message-id>` from an ARTICLE/HEAD/STAT status message
/// ([RFC 3977 §6.2](https://datatracker.ietf.org/doc/html/rfc3977#section-6.2)).
pub fn parse_article_ref(message: &str) -> Result<(u64, String), NntpError> {
    let mut tokens = message.split_whitespace();
    let number = tokens
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| NntpError::Parse(format!("invalid article reference: {message:?}")))?;
    let message_id = tokens.next().unwrap_or_default().to_string();
    Ok((number, message_id))
}

/// Splits article lines at the first blank line. The blank line itself
/// belongs to neither half.
pub fn split_article(mut lines: Vec<String>) -> (Vec<String>, Vec<String>) {
    match lines.iter().position(|line| line.is_empty()) {
        Some(pos) => {
            let body = lines.split_off(pos + 1);
            lines.truncate(pos);
            (lines, body)
        }
        None => (lines, Vec::new()),
    }
}

/// Parses a 211 reply: `count first last name [...]`
/// ([RFC 3977 §6.1.1](https://datatracker.ietf.org/doc/html/rfc3977#section-6.1.1)).
pub fn parse_group(message: &str) -> Result<GroupInfo, NntpError> {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(NntpError::Parse(format!(
            "expected 4 fields in group reply, got {}: {message:?}",
            tokens.len()
        )));
    }
    let number = |token: &str| {
        token
            .parse::<u64>()
            .map_err(|_| NntpError::Parse(format!("invalid number in group reply: {token:?}")))
    };
    Ok(GroupInfo {
        count: number(tokens[0])?,
        first: number(tokens[1])?,
        last: number(tokens[2])?,
        name: tokens[3].to_string(),
    })
}

/// Parses LIST OVERVIEW.FMT lines
/// ([RFC 3977 §8.4](https://datatracker.ietf.org/doc/html/rfc3977#section-8.4)).
///
/// `Subject:` is a short field, `Xref:full` a full one, and `:bytes` a
/// metadata item (short).
pub fn parse_overview_format(lines: &[String]) -> OverviewFormat {
    let mut format = OverviewFormat::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix(':') {
            format.push(name, false);
            continue;
        }
        match line.split_once(':') {
            Some((name, flag)) => format.push(name, flag.trim().eq_ignore_ascii_case("full")),
            None => format.push(line, false),
        }
    }
    format
}

/// Maps the tab-separated tokens of one overview line onto the format's
/// fields in order. Extra tokens are ignored; missing ones leave the field
/// out of the row.
pub fn parse_overview_line(line: &str, format: &OverviewFormat) -> OverviewRow {
    let mut row = OverviewRow::default();
    for (field, token) in format.fields().iter().zip(line.split('\t')) {
        let value = if field.full {
            match token.split_once(':') {
                Some((_, value)) => value.trim(),
                None => token.trim(),
            }
        } else {
            token
        };
        row.insert(field.name.clone(), value.to_string());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn group_reply_parses_four_fields() {
        let info = parse_group("3 100 102 misc.test").unwrap();
        assert_eq!(
            info,
            GroupInfo {
                name: "misc.test".into(),
                count: 3,
                first: 100,
                last: 102,
            }
        );
    }

    #[test]
    fn group_reply_ignores_extra_tokens() {
        let info = parse_group("3 100 102 misc.test group selected").unwrap();
        assert_eq!(info.name, "misc.test");
    }

    #[test]
    fn group_reply_with_too_few_tokens_fails() {
        assert!(matches!(parse_group("3 100 102"), Err(NntpError::Parse(_))));
        assert!(matches!(parse_group("x 100 102 a"), Err(NntpError::Parse(_))));
    }

    #[test]
    fn article_split_consumes_one_blank_line() {
        let (headers, body) = split_article(lines(&[
            "From: a@b",
            "Subject: hi",
            "",
            "para one",
            "",
            "para two",
        ]));
        assert_eq!(headers, lines(&["From: a@b", "Subject: hi"]));
        assert_eq!(body, lines(&["para one", "", "para two"]));
    }

    #[test]
    fn article_without_blank_line_is_all_headers() {
        let (headers, body) = split_article(lines(&["From: a@b"]));
        assert_eq!(headers, lines(&["From: a@b"]));
        assert!(body.is_empty());
    }

    #[test]
    fn article_ref_parses_number_and_id() {
        assert_eq!(
            parse_article_ref("0 <a@b> article follows").unwrap(),
            (0, "<a@b>".to_string())
        );
        assert!(parse_article_ref("<a@b>").is_err());
    }

    #[test]
    fn overview_format_flags() {
        let format = parse_overview_format(&lines(&[
            "Subject:",
            "From:",
            "Date:",
            ":bytes",
            ":lines",
            "Xref:full",
        ]));
        let names: Vec<&str> = format.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["subject", "from", "date", "bytes", "lines", "xref"]);
        assert_eq!(format.is_full("xref"), Some(true));
        assert_eq!(format.is_full("subject"), Some(false));
        assert_eq!(format.is_full("bytes"), Some(false));
    }

    #[test]
    fn overview_line_maps_fields_in_order() {
        let format: OverviewFormat = [("subject", false), ("from", true)].into_iter().collect();
        let row = parse_overview_line("Hello\tFrom: a@b", &format);
        assert_eq!(row.get("subject"), Some("Hello"));
        assert_eq!(row.get("from"), Some("a@b"));
    }

    #[test]
    fn overview_line_short_fields_are_verbatim() {
        let format: OverviewFormat = [("number", false), ("subject", false)].into_iter().collect();
        let row = parse_overview_line("42\t  Re: spaced  \textra", &format);
        assert_eq!(row.get("number"), Some("42"));
        assert_eq!(row.get("subject"), Some("  Re: spaced  "));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn overview_full_field_keeps_text_after_first_colon() {
        let format: OverviewFormat = [("xref", true)].into_iter().collect();
        let row = parse_overview_line("Xref: news.example.com misc.test:3", &format);
        assert_eq!(row.get("xref"), Some("news.example.com misc.test:3"));
    }

    #[test]
    fn overview_line_missing_tokens_are_absent() {
        let format: OverviewFormat = [("subject", false), ("from", true)].into_iter().collect();
        let row = parse_overview_line("only subject", &format);
        assert_eq!(row.get("from"), None);
        assert_eq!(row.len(), 1);
    }
}
