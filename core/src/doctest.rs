//! Parser for doctest-style case blocks.
//!
//! A block is a sequence of lines. Lines starting with `>>>` carry one
//! statement each; a statement beginning with `#` is a comment (shown to
//! the learner, never executed). Lines following a prompt are the expected
//! literal output of that prompt, up to the next prompt or the end of the
//! block. Indentation is insignificant.

pub const PROMPT_MARKER: &str = ">>>";
pub const COMMENT_MARKER: char = '#';

/// One executable check: a statement plus the output it must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Comment lines immediately preceding the prompt, marker stripped.
    pub comments: Vec<String>,
    /// The statement text after the prompt marker.
    pub source: String,
    /// Expected output, trimmed. Empty for statements run only for effect.
    pub expected: String,
    /// 1-based line number of the prompt within the block.
    pub line: usize,
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Expected-output text at line {0} has no preceding prompt")]
    OutputWithoutPrompt(usize),

    #[error("Block contains no executable prompt")]
    NoExecutablePrompt,
}

pub fn parse_block(code: &str) -> Result<Vec<Check>> {
    let mut checks: Vec<Check> = Vec::new();
    let mut pending_comments: Vec<String> = Vec::new();
    // expected-output lines of the check currently being collected
    let mut open_expected: Option<Vec<String>> = None;

    // `open_expected` is Some only while `checks` has a last element
    let flush = |checks: &mut Vec<Check>, expected: Option<Vec<String>>| {
        if let (Some(lines), Some(check)) = (expected, checks.last_mut()) {
            check.expected = lines.join("\n").trim().to_owned();
        }
    };

    for (i, raw) in code.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(PROMPT_MARKER) {
            flush(&mut checks, open_expected.take());
            let stmt = rest.trim();
            if stmt.is_empty() {
                continue;
            }
            if stmt.starts_with(COMMENT_MARKER) {
                pending_comments.push(stmt.trim_start_matches(COMMENT_MARKER).trim().to_owned());
            } else {
                checks.push(Check {
                    comments: std::mem::take(&mut pending_comments),
                    source: stmt.to_owned(),
                    expected: String::new(),
                    line: line_no,
                });
                open_expected = Some(Vec::new());
            }
        } else {
            match open_expected.as_mut() {
                Some(lines) => lines.push(line.to_owned()),
                None => return Err(ParseError::OutputWithoutPrompt(line_no)),
            }
        }
    }
    flush(&mut checks, open_expected.take());

    if checks.is_empty() {
        return Err(ParseError::NoExecutablePrompt);
    }
    Ok(checks)
}
