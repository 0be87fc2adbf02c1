// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! `%`-template prompt expansion. Directives:
//!
//! | Directive | Meaning |
//! |---|---|
//! | `%N`      | line number (base + continuation index) |
//! | `%M`      | missing token reported by the parser's EOF error |
//! | `%nPc`    | pad with `c` to width `n` |
//! | `%Pc`     | pad with `c` to the initial prompt's width |
//! | `%%`      | literal `%` |
//! | `%{…%}`   | zero-width region (escapes pass through, no column advance) |

use crate::{AttributedString, Style};

/// Inputs the template draws on.
#[derive(Debug, Default)]
pub struct PromptContext<'a> {
    /// Value `%N` renders: `line-offset` plus the continuation index.
    pub line_number: u64,
    /// Token `%M` renders, from the parser's EOF error.
    pub missing: &'a str,
    /// Width `%Pc` pads to: the initial prompt's first-line width.
    pub pad_to: u16,
}

/// Expansion result: attributed lines, overall column width of the last
/// line, and the column width of each template line (used to align
/// continuation prompts).
#[derive(Debug)]
pub struct ExpandedPrompt {
    pub lines: Vec<AttributedString>,
    pub columns: u16,
    pub line_widths: Vec<u16>,
}

impl ExpandedPrompt {
    /// The whole prompt as one attributed string with embedded newlines.
    #[must_use]
    pub fn to_attributed(&self) -> AttributedString {
        let mut out = AttributedString::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push_char('\n', Style::default());
            }
            out.extend(line);
        }
        out
    }
}

#[must_use]
pub fn expand_prompt(template: &str, ctx: &PromptContext<'_>) -> ExpandedPrompt {
    let mut lines: Vec<AttributedString> = vec![AttributedString::new()];
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\n' {
            lines.push(AttributedString::new());
            continue;
        }
        if ch != '%' {
            lines.last_mut().unwrap().push_char(ch, Style::default());
            continue;
        }
        // Directive. Collect an optional numeric count first.
        let mut count: Option<u16> = None;
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            count = Some(count.unwrap_or(0).saturating_mul(10).saturating_add(digit as u16));
            chars.next();
        }
        match chars.next() {
            Some('%') => lines.last_mut().unwrap().push_char('%', Style::default()),
            Some('N') => {
                let text = ctx.line_number.to_string();
                lines.last_mut().unwrap().push_str(&text, Style::default());
            }
            Some('M') => {
                lines.last_mut().unwrap().push_str(ctx.missing, Style::default());
            }
            Some('P') => {
                let target = count.unwrap_or(ctx.pad_to);
                let pad_char = chars.next().unwrap_or(' ');
                let line = lines.last_mut().unwrap();
                while line.width() < target {
                    line.push_char(pad_char, Style::default());
                }
            }
            Some('{') => {
                // Zero-width region: pass content through until %}.
                let mut region = String::new();
                while let Some(inner) = chars.next() {
                    if inner == '%' && chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                    region.push(inner);
                }
                lines.last_mut().unwrap().push_zero_width(&region, Style::default());
            }
            Some(other) => {
                // Unknown directive: emitted literally, like the original.
                let line = lines.last_mut().unwrap();
                line.push_char('%', Style::default());
                line.push_char(other, Style::default());
            }
            None => lines.last_mut().unwrap().push_char('%', Style::default()),
        }
    }

    let line_widths: Vec<u16> = lines.iter().map(AttributedString::width).collect();
    let columns = *line_widths.last().unwrap_or(&0);
    ExpandedPrompt {
        lines,
        columns,
        line_widths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expand(template: &str, ctx: &PromptContext<'_>) -> String {
        expand_prompt(template, ctx)
            .lines
            .iter()
            .map(AttributedString::to_plain_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_literal_and_percent() {
        let ctx = PromptContext::default();
        assert_eq!(expand("> ", &ctx), "> ");
        assert_eq!(expand("100%% ", &ctx), "100% ");
    }

    #[test]
    fn test_line_number_and_missing() {
        let ctx = PromptContext {
            line_number: 3,
            missing: "quote",
            pad_to: 0,
        };
        assert_eq!(expand("%N %M> ", &ctx), "3 quote> ");
    }

    #[test]
    fn test_pad_to_explicit_width() {
        let ctx = PromptContext::default();
        let expanded = expand_prompt("%6P.> ", &ctx);
        assert_eq!(expanded.lines[0].to_plain_string(), "......> ");
        assert_eq!(expanded.columns, 8);
    }

    #[test]
    fn test_pad_to_initial_prompt_width() {
        let ctx = PromptContext {
            pad_to: 4,
            ..PromptContext::default()
        };
        assert_eq!(expand("%P ", &ctx), "    ");
    }

    #[test]
    fn test_zero_width_region() {
        let ctx = PromptContext::default();
        let expanded = expand_prompt("%{\u{1b}[1m%}> ", &ctx);
        // Escapes are carried but add no columns.
        assert_eq!(expanded.columns, 2);
        assert!(expanded.lines[0].to_plain_string().contains('\u{1b}'));
    }

    #[test]
    fn test_multiline_width_map() {
        let ctx = PromptContext::default();
        let expanded = expand_prompt("one\n>> ", &ctx);
        assert_eq!(expanded.line_widths, vec![3, 3]);
        assert_eq!(expanded.columns, 3);
    }
}
