//! The prompt language: statements evaluated against a learner environment.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::{EvalError, Evaluator};
pub use parser::{parse_expr, parse_stmt, Expr, ParseError, Stmt};

/// Lines of a plain statement script (suite setup/teardown): one statement
/// per line; blank lines and `#` comments are skipped. Yields 1-based line
/// numbers.
pub fn script_lines(src: &str) -> impl Iterator<Item = (usize, &str)> {
    src.lines().enumerate().filter_map(|(i, line)| {
        let s = line.trim();
        (!s.is_empty() && !s.starts_with('#')).then_some((i + 1, s))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn script_lines_skip_blanks_and_comments() {
        let src = "\n# preamble\n  tol = 1e-6\n\n  ready = true\n";
        let lines: Vec<_> = script_lines(src).collect();
        assert_eq!(lines, vec![(3, "tol = 1e-6"), (5, "ready = true")]);
    }
}
