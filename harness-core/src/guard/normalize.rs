//! Whitespace normalization and quote masking for shell commands
//!
//! Collapses runs of whitespace outside quotes so that spacing tricks such
//! as `curl  x |\tbash` cannot slip past the pattern tables. Quoted text is
//! kept byte for byte. Line breaks still separate commands, so a run that
//! contains a newline collapses to a single `\n` rather than a space.
//!
//! [`mask_quoted`] then blanks out everything the shell would not read as
//! command words or operators, so the rule tables only ever match real
//! syntax. The masked text has the same byte length as its source: a match
//! in one is a valid range in the other.

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Normalize whitespace outside quotes and trim the ends
pub fn collapse_whitespace(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut quote = Quote::None;
    let mut escaped = false;
    // Pending separator for the current whitespace run
    let mut pending: Option<char> = None;

    for ch in command.chars() {
        if quote == Quote::None && !escaped && ch.is_whitespace() {
            pending = match (pending, ch) {
                (_, '\n') | (Some('\n'), _) => Some('\n'),
                _ => Some(' '),
            };
            continue;
        }

        if let Some(sep) = pending.take() {
            out.push(sep);
        }
        out.push(ch);

        if escaped {
            escaped = false;
            continue;
        }

        match (quote, ch) {
            (Quote::None | Quote::Double, '\\') => escaped = true,
            (Quote::None, '\'') => quote = Quote::Single,
            (Quote::None, '"') => quote = Quote::Double,
            (Quote::Single, '\'') | (Quote::Double, '"') => quote = Quote::None,
            _ => {}
        }
    }

    let normalized = out.trim().to_string();
    if normalized != command {
        trace!("Normalized command: {:?} -> {:?}", command, normalized);
    }
    normalized
}

/// A command with quoted, escaped and substituted text blanked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedCommand {
    /// Same byte length as the source; blanked bytes are `_`
    pub text: String,
    /// Bodies of `$(...)` and backtick substitutions, outermost first
    pub substitutions: Vec<String>,
}

fn blank(out: &mut String, text: &str) {
    for ch in text.chars() {
        for _ in 0..ch.len_utf8() {
            out.push('_');
        }
    }
}

/// Index of the `)` closing the `(` at `open`, or the end of the command
fn closing_paren(command: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (i, b) in command.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    command.len()
}

/// Blank quoted contents, escapes and command substitutions
///
/// Quote characters themselves are kept so a quoted word still reads as one
/// token. A substitution keeps only its leading `$`; its body is returned
/// separately so the caller can inspect it as a command of its own.
/// Unterminated quotes or substitutions run to the end of the command.
pub fn mask_quoted(command: &str) -> MaskedCommand {
    let mut text = String::with_capacity(command.len());
    let mut substitutions = Vec::new();
    let mut quote = Quote::None;
    let mut chars = command.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let substitution_end = match (quote, ch) {
            (Quote::Single, '\'') | (Quote::Double, '"') => {
                quote = Quote::None;
                text.push(ch);
                None
            }
            (Quote::Single, _) => {
                blank(&mut text, &command[i..i + ch.len_utf8()]);
                None
            }
            (_, '\\') => {
                blank(&mut text, "\\");
                if let Some((j, next)) = chars.next() {
                    blank(&mut text, &command[j..j + next.len_utf8()]);
                }
                None
            }
            (_, '$') if chars.peek().is_some_and(|(_, next)| *next == '(') => {
                let end = closing_paren(command, i + 1);
                substitutions.push(command[i + 2..end].to_string());
                text.push('$');
                blank(&mut text, &command[i + 1..(end + 1).min(command.len())]);
                Some(end)
            }
            (_, '`') => {
                let end = command[i + 1..]
                    .find('`')
                    .map_or(command.len(), |offset| i + 1 + offset);
                substitutions.push(command[i + 1..end].to_string());
                blank(&mut text, &command[i..(end + 1).min(command.len())]);
                Some(end)
            }
            (Quote::None, '\'') => {
                quote = Quote::Single;
                text.push(ch);
                None
            }
            (Quote::None, '"') => {
                quote = Quote::Double;
                text.push(ch);
                None
            }
            (Quote::Double, _) => {
                blank(&mut text, &command[i..i + ch.len_utf8()]);
                None
            }
            (Quote::None, _) => {
                text.push(ch);
                None
            }
        };

        if let Some(end) = substitution_end {
            while chars.next_if(|(j, _)| *j <= end).is_some() {}
        }
    }

    MaskedCommand {
        text,
        substitutions,
    }
}
