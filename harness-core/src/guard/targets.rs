//! Write-target extraction
//!
//! Runs every [`WRITE_RULES`] entry over the masked form of a command and
//! turns the captures into target paths according to each rule's
//! [`Selector`]. Words are split on the masked text and read back from the
//! original, so quoting is honoured and each word is judged on its own: a
//! word holding an expansion is dynamic, its neighbours are still static.
//! Substitution bodies are scanned as commands of their own. Glob targets
//! are reduced to their parent directory, so `rm harness/*` yields
//! `harness/`.

use std::ops::Range;
use tracing::trace;

use super::normalize::mask_quoted;
use super::patterns::{Selector, WriteRule, WRITE_RULES, WRITE_SHAPED};

/// A path some part of the command would write to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTarget {
    /// Label of the rule that found it
    pub rule: &'static str,
    pub path: String,
}

impl WriteTarget {
    /// Holds a shell expansion whose value is unknown before execution
    pub fn is_dynamic(&self) -> bool {
        is_dynamic(&self.path)
    }
}

/// `$VAR`, `${VAR}`, `$(...)` or backticks
pub fn is_dynamic(path: &str) -> bool {
    path.contains('`')
        || path
            .char_indices()
            .any(|(i, c)| c == '$' && path[i + 1..].starts_with(|n: char| n.is_alphanumeric() || matches!(n, '_' | '{' | '(')))
}

/// Everything the write rules found in one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteScan {
    /// Deduplicated, in discovery order
    pub targets: Vec<WriteTarget>,
    /// Write-shaped pipeline segments that yielded no target
    pub unresolved: Vec<String>,
}

impl WriteScan {
    fn push(&mut self, target: WriteTarget) {
        if !self.targets.iter().any(|t| t.path == target.path) {
            self.targets.push(target);
        }
    }
}

/// Extract write targets and note write-shaped segments that had none
pub fn scan_writes(command: &str) -> WriteScan {
    let masked = mask_quoted(command);
    let mut found: Vec<(usize, WriteTarget)> = Vec::new();

    for rule in WRITE_RULES.iter() {
        for captures in rule.pattern.captures_iter(&masked.text) {
            for word in select(rule, &captures, command) {
                if word.text.is_empty() || word.text == "-" {
                    continue;
                }
                let path = strip_glob_to_parent(&word.text);
                trace!("Rule `{}` extracted write target {}", rule.label, path);
                found.push((
                    word.offset,
                    WriteTarget {
                        rule: rule.label,
                        path,
                    },
                ));
            }
        }
    }

    let mut scan = WriteScan::default();
    for segment in segments(&masked.text) {
        let shaped = masked
            .text
            .get(segment.clone())
            .is_some_and(|text| WRITE_SHAPED.as_ref().is_some_and(|re| re.is_match(text)));
        if shaped && !found.iter().any(|(offset, _)| segment.contains(offset)) {
            if let Some(text) = command.get(segment) {
                scan.unresolved.push(text.trim().to_string());
            }
        }
    }

    for (_, target) in found {
        scan.push(target);
    }

    for body in &masked.substitutions {
        let inner = scan_writes(body);
        for target in inner.targets {
            scan.push(target);
        }
        scan.unresolved.extend(inner.unresolved);
    }

    scan
}

/// A shell word read back from the original command
#[derive(Debug, Clone, PartialEq, Eq)]
struct Word {
    /// Byte offset of the word in the command
    offset: usize,
    text: String,
}

fn select(rule: &WriteRule, captures: &regex::Captures<'_>, command: &str) -> Vec<Word> {
    if let Selector::Path = rule.selector {
        return captures
            .name("target")
            .and_then(|m| {
                command.get(m.range()).map(|raw| Word {
                    offset: m.start(),
                    text: literal(raw),
                })
            })
            .into_iter()
            .collect();
    }

    let Some(args) = captures.name("args") else {
        return Vec::new();
    };
    let words = split_words(args.as_str(), args.start(), command);

    match rule.selector {
        Selector::Path => Vec::new(),
        Selector::AllArgs => positional(&words, &[]),
        Selector::AllArgsAfterOptions(valued) => positional(&words, valued),
        Selector::AllButMode => after_mode(&words),
        Selector::LastArg => {
            let mut operands = positional(&words, &[]);
            if operands.len() < 2 {
                return Vec::new();
            }
            operands.pop().into_iter().collect()
        }
        Selector::InPlace => {
            if !words.iter().any(|w| is_in_place_flag(&w.text)) {
                return Vec::new();
            }
            positional(&words, &[]).pop().into_iter().collect()
        }
    }
}

/// Split on whitespace of the masked text, reading each word from `command`
fn split_words(masked: &str, base: usize, command: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    let ends = masked
        .char_indices()
        .chain(std::iter::once((masked.len(), ' ')));
    for (i, ch) in ends {
        match (start, ch.is_whitespace()) {
            (None, false) => start = Some(i),
            (Some(s), true) => {
                if let Some(raw) = command.get(base + s..base + i) {
                    words.push(Word {
                        offset: base + s,
                        text: literal(raw),
                    });
                }
                start = None;
            }
            _ => {}
        }
    }
    words
}

/// The value the shell would see; words with expansions stay verbatim
fn literal(raw: &str) -> String {
    if is_dynamic(raw) {
        return raw.to_string();
    }
    match shell_words::split(raw) {
        Ok(parts) => parts.concat(),
        Err(_) => raw.trim_matches(|c: char| c == '"' || c == '\'').to_string(),
    }
}

fn is_option(text: &str) -> bool {
    text.len() > 1 && text.starts_with('-')
}

/// Non-option words; `valued` options consume the word after them
fn positional(words: &[Word], valued: &[&str]) -> Vec<Word> {
    let mut out = Vec::new();
    let mut options_done = false;
    let mut skip_value = false;

    for word in words {
        if skip_value {
            skip_value = false;
            continue;
        }
        if !options_done && is_option(&word.text) {
            if word.text == "--" {
                options_done = true;
            } else if valued.contains(&word.text.as_str()) {
                skip_value = true;
            }
            continue;
        }
        out.push(word.clone());
    }
    out
}

/// chmod, chown and chgrp operands after the mode or owner
///
/// A symbolic mode such as `-x` looks like an option, so it is recognised
/// before option words are dropped.
fn after_mode(words: &[Word]) -> Vec<Word> {
    let mut mode_seen = words.iter().any(|w| w.text.starts_with("--reference"));
    let mut options_done = false;
    let mut out = Vec::new();

    for word in words {
        if !mode_seen && !options_done && is_symbolic_mode(&word.text) {
            mode_seen = true;
            continue;
        }
        if !options_done && is_option(&word.text) {
            options_done = word.text == "--";
            continue;
        }
        if !mode_seen {
            mode_seen = true;
            continue;
        }
        out.push(word.clone());
    }
    out
}

/// `-x`, `u+w`, `go-rwx,a+X`
fn is_symbolic_mode(text: &str) -> bool {
    !text.is_empty()
        && text.split(',').all(|clause| {
            let ops = clause.trim_start_matches(|c: char| matches!(c, 'u' | 'g' | 'o' | 'a'));
            let mut chars = ops.chars();
            matches!(chars.next(), Some('-' | '+' | '='))
                && chars.all(|c| "rwxXstugo".contains(c))
        })
}

/// `-i`, `-i.bak`, `-Ei`, `-pi` or `--in-place[=SUFFIX]`
///
/// Scanning a short group stops at an option that takes an argument, so
/// the `i` in `-es/x/i/` is not mistaken for the flag.
fn is_in_place_flag(text: &str) -> bool {
    if text == "--in-place" || text.starts_with("--in-place=") {
        return true;
    }
    let Some(group) = text.strip_prefix('-') else {
        return false;
    };
    if group.starts_with('-') {
        return false;
    }
    for c in group.chars() {
        match c {
            'i' => return true,
            'e' | 'f' | 'l' | 'M' | 'I' | 'm' => return false,
            c if c.is_ascii_alphanumeric() => continue,
            _ => return false,
        }
    }
    false
}

/// Byte ranges of the pipeline segments of masked `text`
///
/// `;`, newlines, `|` and `&` separate segments, except where they belong
/// to a redirect such as `>|`, `>&2` or `&>`.
fn segments(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + 1).copied();
        let separator = match b {
            b';' | b'\n' => true,
            b'|' => prev != Some(b'>'),
            b'&' => !matches!(prev, Some(b'>' | b'<')) && next != Some(b'>'),
            _ => false,
        };
        if separator {
            out.push(start..i);
            start = i + 1;
        }
    }
    out.push(start..bytes.len());
    out
}

/// `dir/*.txt` → `dir/`, `*.txt` → `.`; paths without globs are unchanged
fn strip_glob_to_parent(path: &str) -> String {
    let Some(glob) = path.find(['*', '?', '[']) else {
        return path.to_string();
    };
    match path[..glob].rfind('/') {
        Some(sep) => path[..=sep].to_string(),
        None => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn targets_of(command: &str) -> Vec<WriteTarget> {
        scan_writes(command).targets
    }

    fn paths(command: &str) -> Vec<String> {
        scan_writes(command)
            .targets
            .into_iter()
            .map(|t| t.path)
            .collect()
    }

    #[test]
    fn test_redirects() {
        assert_eq!(paths("echo bad > harness/core.sh"), vec!["harness/core.sh"]);
        assert_eq!(paths("date >>logs/out.txt"), vec!["logs/out.txt"]);
        assert_eq!(paths("make 2> err.log"), vec!["err.log"]);
        assert!(paths("ls -la 2>&1").is_empty());
    }

    #[test]
    fn test_quoted_targets_keep_spaces() {
        assert_eq!(paths("echo x > \"my dir/file.txt\""), vec!["my dir/file.txt"]);
        assert_eq!(paths("cp a.txt 'dest dir/b.txt'"), vec!["dest dir/b.txt"]);
    }

    #[test]
    fn test_cp_extracts_destination() {
        assert_eq!(paths("cp /src/file.txt /dst/file.txt"), vec!["/dst/file.txt"]);
        assert_eq!(paths("mv -f a b"), vec!["b"]);
        assert!(paths("cp onlyone").is_empty());
    }

    #[test]
    fn test_tee_extracts_file() {
        assert_eq!(paths("tee -a /tmp/log.txt"), vec!["/tmp/log.txt"]);
        assert_eq!(paths("echo x | tee hooks/a.sh"), vec!["hooks/a.sh"]);
    }

    #[test]
    fn test_rm_all_args_and_globs() {
        assert_eq!(paths("rm -rf build dist"), vec!["build", "dist"]);
        assert_eq!(paths("rm harness/*"), vec!["harness/"]);
        assert_eq!(paths("rm *.log"), vec!["."]);
    }

    #[test]
    fn test_sed_requires_in_place() {
        assert_eq!(paths("sed -i 's/a/b/' CLAUDE.md"), vec!["CLAUDE.md"]);
        assert_eq!(paths("sed -i.bak -e s/a/b/ conf.txt"), vec!["conf.txt"]);
        assert!(paths("sed 's/a/b/' CLAUDE.md").is_empty());
    }

    #[test]
    fn test_grouped_in_place_flags() {
        assert_eq!(
            paths("sed -Ei 's/block/warn/' architecture/rules.json"),
            vec!["architecture/rules.json"]
        );
        assert_eq!(paths("sed -ni.bak p notes.md"), vec!["notes.md"]);
        assert_eq!(paths("sed --in-place=.orig s/a/b/ x.txt"), vec!["x.txt"]);
        assert_eq!(paths("perl -pi -e 's/a/b/' hooks/pre-bash.sh"), vec!["hooks/pre-bash.sh"]);
        assert!(paths("sed -e s/i/j/ notes.md").is_empty());
        assert!(paths("perl -ne 'print' notes.md").is_empty());
    }

    #[test]
    fn test_chmod_skips_mode() {
        assert_eq!(paths("chmod -R 755 hooks/"), vec!["hooks/"]);
        assert_eq!(paths("chown user:group a b"), vec!["a", "b"]);
    }

    #[test]
    fn test_chmod_symbolic_modes() {
        assert_eq!(paths("chmod -x hooks/pre-bash.sh"), vec!["hooks/pre-bash.sh"]);
        assert_eq!(paths("chmod -R -w harness/"), vec!["harness/"]);
        assert_eq!(paths("chmod go-rwx,u+X a"), vec!["a"]);
        assert_eq!(paths("chmod --reference=ref.sh hooks/x.sh"), vec!["hooks/x.sh"]);
    }

    #[test]
    fn test_clobber_redirect_and_truncate() {
        assert_eq!(paths("echo x >| hooks/pre-bash.sh"), vec!["hooks/pre-bash.sh"]);
        assert_eq!(paths("truncate -s 0 hooks/pre-bash.sh"), vec!["hooks/pre-bash.sh"]);
        assert_eq!(paths("truncate -s0 a b"), vec!["a", "b"]);
        assert_eq!(paths("truncate --size 0 -r ref c"), vec!["c"]);
    }

    #[test]
    fn test_heredocs() {
        assert_eq!(paths("cat <<EOF > .claude/settings.json"), vec![".claude/settings.json"]);
        assert_eq!(paths("cat > CLAUDE.md <<'EOF'"), vec!["CLAUDE.md"]);
    }

    #[test]
    fn test_touch_ln_dd() {
        assert_eq!(paths("touch a b"), vec!["a", "b"]);
        assert_eq!(paths("ln -s target hooks/link"), vec!["hooks/link"]);
        assert_eq!(paths("dd if=/dev/zero of=harness/blob bs=1"), vec!["harness/blob"]);
    }

    #[test]
    fn test_rules_are_not_exclusive() {
        assert_eq!(
            paths("cp a b && echo done > out.txt"),
            vec!["out.txt", "b"]
        );
    }

    #[test]
    fn test_dynamic_targets() {
        let targets = targets_of("echo x > $FILE");
        assert_eq!(targets.len(), 1);
        assert!(targets[0].is_dynamic());

        assert!(is_dynamic("${OUT}/x"));
        assert!(is_dynamic("$(mktemp)"));
        assert!(is_dynamic("`pwd`/x"));
        assert!(!is_dynamic("price$"));
        assert!(!is_dynamic("harness/x.sh"));
    }

    #[test]
    fn test_command_substitution_args_are_kept_whole() {
        let targets = targets_of("rm $(cat list.txt)");
        assert_eq!(targets.len(), 1);
        assert!(targets[0].is_dynamic());
    }

    #[test]
    fn test_expansion_only_exempts_its_own_word() {
        let targets = targets_of("rm -rf hooks/ $(true)");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].path, "hooks/");
        assert!(!targets[0].is_dynamic());
        assert!(targets[1].is_dynamic());

        assert_eq!(paths("cp \"$(echo x)\" harness/core.sh"), vec!["harness/core.sh"]);
        assert_eq!(paths("rm hooks/pre-bash.sh `true`")[0], "hooks/pre-bash.sh");
    }

    #[test]
    fn test_substitution_bodies_are_scanned() {
        assert_eq!(paths("echo \"$(rm -rf hooks)\""), vec!["hooks"]);
        assert_eq!(paths("x=`touch CLAUDE.md`"), vec!["CLAUDE.md"]);
    }

    #[test]
    fn test_quoted_text_is_not_a_command() {
        assert!(paths("git commit -m 'do not touch hooks/'").is_empty());
        assert!(paths("git log --grep='> CLAUDE.md'").is_empty());
        assert!(paths("grep -n rm hooks/pre-bash.sh").is_empty());
        assert!(paths("echo \"a; rm -rf hooks\"").is_empty());
    }

    #[test]
    fn test_wrappers_keep_command_position() {
        assert_eq!(paths("sudo rm hooks/x"), vec!["hooks/x"]);
        assert_eq!(paths("find . -name x | xargs rm -f"), Vec::<String>::new());
        assert_eq!(paths("LC_ALL=C sed -i s/a/b/ f"), vec!["f"]);
        assert_eq!(paths("if true; then touch a; fi"), vec!["a"]);
    }

    #[test]
    fn test_unresolved_segments() {
        let scan = scan_writes("cp a b && truncate -s 0");
        assert_eq!(scan.targets.len(), 1);
        assert_eq!(scan.unresolved, vec!["truncate -s 0"]);

        assert!(scan_writes("ls -la 2>&1 && echo x >&2").unresolved.is_empty());
        assert!(scan_writes("echo x > out.txt; rm -rf build").unresolved.is_empty());
    }

    #[test]
    fn test_no_writes() {
        assert!(paths("ls -la /tmp").is_empty());
        assert!(paths("git status").is_empty());
    }
}
