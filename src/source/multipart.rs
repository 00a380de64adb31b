//! Incremental splitter for `multipart/mixed` response bodies.
//!
//! The SensorBee server streams query results as a never-ending multipart
//! body, one JSON document per part. Chunks arrive at arbitrary boundaries,
//! so bytes are buffered until a whole part (up to the next delimiter) is
//! available.

/// Extract the boundary parameter from a `multipart/*` content type.
pub(crate) fn boundary(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let mime = params.next()?.trim();
    if !mime.to_ascii_lowercase().starts_with("multipart/") {
        return None;
    }
    params.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Index where the part body starts, after the part headers.
fn body_start(part: &[u8]) -> Option<usize> {
    if let Some(i) = find(part, b"\r\n\r\n") {
        return Some(i + 4);
    }
    find(part, b"\n\n").map(|i| i + 2)
}

fn trim_line_end(mut body: &[u8]) -> &[u8] {
    if let Some(rest) = body.strip_suffix(b"\n") {
        body = rest.strip_suffix(b"\r").unwrap_or(rest);
    }
    body
}

#[derive(Debug)]
pub(crate) struct PartSplitter {
    delimiter: Vec<u8>,
    buf: Vec<u8>,
    finished: bool,
}

impl PartSplitter {
    pub(crate) fn new(boundary: &str) -> Self {
        Self {
            delimiter: format!("--{}", boundary).into_bytes(),
            buf: Vec::new(),
            finished: false,
        }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) {
        if !self.finished {
            self.buf.extend_from_slice(chunk);
        }
    }

    /// True once the closing delimiter has been seen.
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pop the body of the next complete part, if one is buffered.
    pub(crate) fn next_part(&mut self) -> Option<Vec<u8>> {
        loop {
            if self.finished {
                return None;
            }
            let start = find(&self.buf, &self.delimiter)?;
            let after = start + self.delimiter.len();
            if self.buf.len() < after + 2 {
                return None;
            }
            if &self.buf[after..after + 2] == b"--" {
                self.finished = true;
                self.buf.clear();
                return None;
            }

            let end = after + find(&self.buf[after..], &self.delimiter)?;
            let part = &self.buf[after..end];
            let body = body_start(part).map(|i| trim_line_end(&part[i..]).to_vec());
            self.buf.drain(..end);

            // Parts without a header/body separator carry nothing
            if let Some(body) = body {
                return Some(body);
            }
        }
    }
}
