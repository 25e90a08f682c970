//! Byte-stream framing stages.
//!
//! [`StatusLineSplitter`] cuts the first CRLF-terminated line off a response,
//! and [`MultilineFramer`] collects a dot-terminated body
//! ([RFC 3977 §3.1.1](https://datatracker.ietf.org/doc/html/rfc3977#section-3.1.1)).
//! Both are push-driven: feed them chunks as they arrive and they stay silent
//! until a complete unit is available.

const CRLF: &[u8] = b"\r\n";
const TERMINATOR: &[u8] = b".\r\n";
const LINE_TERMINATOR: &[u8] = b"\r\n.\r\n";

#[derive(Debug, Default)]
pub struct StatusLineSplitter {
    buf: Vec<u8>,
}

impl StatusLineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status line (without CRLF) and whatever bytes followed it
    /// once a full line has been seen.
    pub fn push(&mut self, chunk: &[u8]) -> Option<(String, Vec<u8>)> {
        let search_from = self.buf.len().saturating_sub(1);
        self.buf.extend_from_slice(chunk);
        let pos = find_crlf(&self.buf[search_from..])? + search_from;
        let rest = self.buf.split_off(pos + CRLF.len());
        self.buf.truncate(pos);
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Some((line, rest))
    }
}

#[derive(Debug, Default)]
pub struct MultilineFramer {
    buf: Vec<u8>,
    done: bool,
}

impl MultilineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers `chunk` and, once the body terminator closes the buffer,
    /// returns every body line in order with dot-stuffing undone.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<String>> {
        if self.done {
            return None;
        }
        self.buf.extend_from_slice(chunk);
        if self.buf.as_slice() == TERMINATOR {
            self.done = true;
            return Some(Vec::new());
        }
        if !self.buf.ends_with(LINE_TERMINATOR) {
            return None;
        }
        self.done = true;
        let body = &self.buf[..self.buf.len() - LINE_TERMINATOR.len()];
        Some(split_lines(body))
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF)
}

fn split_lines(mut body: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = find_crlf(body) {
        lines.push(unstuff(&body[..pos]));
        body = &body[pos + CRLF.len()..];
    }
    lines.push(unstuff(body));
    lines
}

fn unstuff(line: &[u8]) -> String {
    let line = if line.starts_with(b"..") {
        &line[1..]
    } else {
        line
    };
    String::from_utf8_lossy(line).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_in_chunks(data: &[u8], sizes: &[usize]) -> Vec<String> {
        let mut framer = MultilineFramer::new();
        let mut rest = data;
        let mut sizes = sizes.iter().cycle();
        loop {
            let n = (*sizes.next().unwrap()).min(rest.len());
            let (chunk, tail) = rest.split_at(n);
            rest = tail;
            if let Some(lines) = framer.push(chunk) {
                assert!(rest.is_empty(), "framer finished before the terminator");
                return lines;
            }
            assert!(!rest.is_empty(), "framer never finished");
        }
    }

    #[test]
    fn frames_simple_body() {
        let lines = frame_in_chunks(b"line1\r\nline2\r\n.\r\n", &[1024]);
        assert_eq!(lines, vec!["line1", "line2"]);
    }

    #[test]
    fn chunk_boundaries_do_not_change_output() {
        let data = b"Subject: hi\r\n\r\n..dotted\r\nend.\r\nlast\r\n.\r\n";
        let expected = vec!["Subject: hi", "", ".dotted", "end.", "last"];
        for size in 1..data.len() {
            assert_eq!(frame_in_chunks(data, &[size]), expected, "chunk size {size}");
        }
        assert_eq!(frame_in_chunks(data, &[3, 1, 7, 2]), expected);
    }

    #[test]
    fn empty_body_yields_no_lines() {
        assert!(frame_in_chunks(b".\r\n", &[1]).is_empty());
        assert!(frame_in_chunks(b".\r\n", &[3]).is_empty());
    }

    #[test]
    fn single_blank_line_is_preserved() {
        assert_eq!(frame_in_chunks(b"\r\n.\r\n", &[2]), vec![""]);
    }

    #[test]
    fn line_ending_in_dot_is_not_a_terminator() {
        let mut framer = MultilineFramer::new();
        assert_eq!(framer.push(b"version 1.\r\n"), None);
        assert_eq!(framer.push(b".\r\n"), Some(vec!["version 1.".to_string()]));
    }

    #[test]
    fn unstuffs_one_leading_dot() {
        let lines = frame_in_chunks(b"..single\r\n...double\r\n..\r\n.\r\n", &[5]);
        assert_eq!(lines, vec![".single", "..double", "."]);
    }

    #[test]
    fn stuffed_dot_line_does_not_terminate() {
        let mut framer = MultilineFramer::new();
        assert_eq!(framer.push(b"a\r\n..\r\n"), None);
        assert!(!framer.done);
        assert_eq!(
            framer.push(b".\r\n"),
            Some(vec!["a".to_string(), ".".to_string()])
        );
    }

    #[test]
    fn unterminated_body_never_completes() {
        let mut framer = MultilineFramer::new();
        for _ in 0..100 {
            assert_eq!(framer.push(b"more data\r\n"), None);
        }
        assert!(!framer.done);
    }

    #[test]
    fn push_after_completion_is_ignored() {
        let mut framer = MultilineFramer::new();
        assert!(framer.push(b".\r\n").is_some());
        assert_eq!(framer.push(b"stray\r\n.\r\n"), None);
    }

    #[test]
    fn status_line_split_across_chunks() {
        let mut splitter = StatusLineSplitter::new();
        assert_eq!(splitter.push(b"211 3 100"), None);
        assert_eq!(splitter.push(b" 102 misc.test\r"), None);
        let (line, rest) = splitter.push(b"\nextra").unwrap();
        assert_eq!(line, "211 3 100 102 misc.test");
        assert_eq!(rest, b"extra");
    }

    #[test]
    fn status_line_keeps_following_body_bytes() {
        let mut splitter = StatusLineSplitter::new();
        let (line, rest) = splitter.push(b"220 0 <a@b>\r\nFrom: x\r\n.\r\n").unwrap();
        assert_eq!(line, "220 0 <a@b>");
        assert_eq!(rest, b"From: x\r\n.\r\n");
    }
}
