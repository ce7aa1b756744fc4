//! Layout of generated source.

/// Turns assembled, unindented source into its final layout.
pub trait SourceFormatter: Send + Sync {
    fn format(&self, source: &str) -> String;
}

/// Re-indents brace-delimited source and drops blank lines.
///
/// Unformatted:
/// ```text
/// start() {
/// if (ready) {
/// go();
/// } else {
/// }
/// }
/// ```
///
/// Formatted:
/// ```text
/// start() {
///     if (ready) {
///         go();
///     } else {
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct IndentFormatter {
    indent: String,
}

impl Default for IndentFormatter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl IndentFormatter {
    pub fn new(width: usize) -> Self {
        Self {
            indent: " ".repeat(width),
        }
    }
}

impl SourceFormatter for IndentFormatter {
    fn format(&self, source: &str) -> String {
        let mut out = Vec::new();
        let mut level: usize = 0;
        for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (opens, closes, leading) = braces(line);
            let depth = level.saturating_sub(leading);
            out.push(format!("{}{}", self.indent.repeat(depth), line));
            level = (level + opens).saturating_sub(closes);
        }
        out.join("\n")
    }
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl SourceFormatter for PlainFormatter {
    fn format(&self, source: &str) -> String {
        source.to_string()
    }
}

/// Counts `(opening, closing, leading closing)` braces outside string literals.
fn braces(line: &str) -> (usize, usize, usize) {
    let mut opens = 0;
    let mut closes = 0;
    let mut leading = 0;
    let mut at_start = true;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in line.chars() {
        if let Some(q) = quote {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => {
                quote = Some(ch);
                at_start = false;
            }
            '{' => {
                opens += 1;
                at_start = false;
            }
            '}' => {
                closes += 1;
                if at_start {
                    leading += 1;
                }
            }
            c if c.is_whitespace() => {}
            _ => at_start = false,
        }
    }
    (opens, closes, leading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_indents_nested_blocks() {
        let source = "start() {\nif (ready) {\ngo();\n} else {\n\nstop();\n}\n}";
        let expected = "start() {\n    if (ready) {\n        go();\n    } else {\n        stop();\n    }\n}";
        assert_eq!(IndentFormatter::default().format(source), expected);
    }

    #[test]
    fn test_ignores_braces_in_strings() {
        let source = "run() {\nlog(\"{ not a block\");\n}";
        let expected = "run() {\n    log(\"{ not a block\");\n}";
        assert_eq!(IndentFormatter::default().format(source), expected);
    }
}
