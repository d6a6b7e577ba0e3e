//! Scrubbed source view
//!
//! Every recognizer works on the same `Source`: the snippet with comments
//! removed and string literal contents blanked (quotes are kept, so `s = ""`
//! still reads as a string initialization), split into a line table with
//! indentation and brace depth, plus the extents of every function
//! definition found in it.
//!
//! Global invariants enforced:
//! - The input text is never mutated; `Source` owns a scrubbed copy
//! - Line numbering of the scrubbed copy matches the input (newlines survive scrubbing)
//! - Nothing here fails: unbalanced braces or quotes degrade to shorter extents

use crate::language::Language;
use regex::Regex;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Compile a regex once, on first use.
macro_rules! re {
    ($pattern:expr) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).unwrap())
    }};
}
pub(crate) use re;

/// Keywords that look like calls or declarations in C-family syntax
const CONTROL_WORDS: &[&str] = &[
    "if", "for", "while", "switch", "return", "catch", "else", "new", "sizeof", "delete",
    "throw", "case", "do", "elif", "yield", "await", "in", "of", "not", "and", "or",
];

/// One line of scrubbed source
#[derive(Debug, Clone)]
pub struct Line {
    pub text: String,
    /// Leading whitespace width (tabs count as 4)
    pub indent: usize,
    /// Brace depth at the start of the line
    pub depth: usize,
    /// Brace depth after the line
    pub depth_after: usize,
    pub blank: bool,
}

/// A function definition and the line range of its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    /// Lowercased name with underscores removed (`two_sum` and `twoSum` agree)
    pub key: String,
    pub line: usize,
    pub end: usize,
}

/// A call of a named function, with its raw argument text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub line: usize,
    pub args: String,
}

#[derive(Debug, Clone)]
pub struct Source {
    language: Language,
    clean: String,
    lines: Vec<Line>,
    functions: Vec<FunctionSpan>,
    identifiers: BTreeSet<String>,
}

impl Source {
    pub fn new(text: &str, language: Language) -> Self {
        let language = if language == Language::Unknown {
            Language::infer(text)
        } else {
            language
        };
        let clean = scrub(text, language);
        let lines = line_table(&clean);
        let identifiers = re!(r"\b[A-Za-z_]\w*\b")
            .find_iter(&clean)
            .map(|m| normalize_ident(m.as_str()))
            .collect();

        let mut source = Source {
            language,
            clean,
            lines,
            functions: Vec::new(),
            identifiers,
        };
        source.functions = source.find_functions();
        source
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Scrubbed text
    pub fn clean(&self) -> &str {
        &self.clean
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Scrubbed text of one line (empty past the end)
    pub fn line(&self, idx: usize) -> &str {
        self.lines.get(idx).map(|l| l.text.as_str()).unwrap_or("")
    }

    pub fn functions(&self) -> &[FunctionSpan] {
        &self.functions
    }

    /// Nothing but whitespace after scrubbing
    pub fn is_empty(&self) -> bool {
        self.clean.trim().is_empty()
    }

    pub fn is_match(&self, re: &Regex) -> bool {
        re.is_match(&self.clean)
    }

    /// Lines containing at least one match of `re`
    pub fn matching_lines(&self, re: &Regex) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| re.is_match(&l.text))
            .map(|(i, _)| i)
            .collect()
    }

    /// Any identifier in the snippet equals one of `names` (normalized)
    pub fn mentions(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.identifiers.contains(*n))
    }

    /// Any defined function's normalized name contains one of `keys`
    pub fn defines(&self, keys: &[&str]) -> bool {
        self.functions
            .iter()
            .any(|f| keys.iter().any(|k| f.key.contains(k)))
    }

    /// Normalized identifiers occurring in the snippet
    pub fn identifiers(&self) -> &BTreeSet<String> {
        &self.identifiers
    }

    /// Index of the last line belonging to the block opened at `idx`.
    ///
    /// Off-side languages extend over more-indented lines; brace languages
    /// extend to the matching close brace. A header without a brace owns the
    /// next statement, unless it ends in `;` (the body is inline).
    pub fn block_end(&self, idx: usize) -> usize {
        let Some(head) = self.lines.get(idx) else {
            return idx;
        };

        if self.language.is_offside() {
            let mut end = idx;
            for (j, line) in self.lines.iter().enumerate().skip(idx + 1) {
                if line.blank {
                    continue;
                }
                if line.indent > head.indent {
                    end = j;
                } else {
                    break;
                }
            }
            return end;
        }

        if head.depth_after > head.depth {
            return self.close_of(idx, head.depth);
        }
        if head.text.trim_end().ends_with(';') || head.text.trim_end().ends_with('}') {
            return idx;
        }
        match self.next_code_line(idx) {
            Some(j) if self.lines[j].text.trim_start().starts_with('{') => {
                self.close_of(j, self.lines[j].depth)
            }
            Some(j) => j,
            None => idx,
        }
    }

    fn close_of(&self, idx: usize, depth: usize) -> usize {
        let mut end = idx;
        for (j, line) in self.lines.iter().enumerate().skip(idx + 1) {
            if line.depth > depth {
                end = j;
            } else {
                break;
            }
        }
        end
    }

    fn next_code_line(&self, idx: usize) -> Option<usize> {
        (idx + 1..self.lines.len()).find(|&j| !self.lines[j].blank)
    }

    /// Call sites of `func` inside its own body.
    ///
    /// On the signature line only the text after the name counts, so the
    /// definition itself is never mistaken for a call.
    pub fn self_calls(&self, func: &FunctionSpan) -> Vec<CallSite> {
        let mut sites = Vec::new();
        for idx in func.line..=func.end.min(self.lines.len().saturating_sub(1)) {
            let text = self.line(idx);
            let text = if idx == func.line {
                match find_word(text, &func.name) {
                    Some(pos) => &text[pos + func.name.len()..],
                    None => continue,
                }
            } else {
                text
            };
            for args in call_args(text, &func.name) {
                sites.push(CallSite { line: idx, args });
            }
        }
        sites
    }

    fn find_functions(&self) -> Vec<FunctionSpan> {
        let mut functions = Vec::new();
        for (idx, line) in self.lines.iter().enumerate() {
            if line.blank {
                continue;
            }
            if let Some(name) = definition_name(&line.text, self.language) {
                functions.push(FunctionSpan {
                    key: normalize_ident(&name),
                    name,
                    line: idx,
                    end: self.block_end(idx),
                });
            }
        }
        functions
    }
}

/// Lowercase and drop underscores
pub fn normalize_ident(ident: &str) -> String {
    ident
        .chars()
        .filter(|c| *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Run one recognizer, turning a panic into `fallback()`.
///
/// A failing recognizer only loses its own signal; the rest of the pipeline
/// still runs.
pub fn isolate<T>(name: &str, fallback: impl FnOnce() -> T, detect: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(detect)) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(recognizer = name, "recognizer panicked; treating as not detected");
            fallback()
        }
    }
}

fn definition_name(text: &str, language: Language) -> Option<String> {
    let patterns: Vec<&Regex> = match language {
        Language::Python | Language::Ruby => vec![re!(r"^\s*(?:async\s+)?def\s+(?:self\.)?(\w+[?!]?)")],
        Language::JavaScript | Language::TypeScript => vec![
            re!(r"\bfunction\s*\*?\s*(\w+)\s*[(<]"),
            re!(
                r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|\w+\s*=>)"
            ),
            re!(
                r"^\s*(?:(?:public|private|protected|static|async|override)\s+)*(\w+)\s*\([^)]*\)\s*(?::[^{]+)?\{\s*$"
            ),
        ],
        Language::Rust => vec![re!(r"\bfn\s+(\w+)")],
        Language::Go | Language::Swift => vec![re!(r"\bfunc\s+(?:\([^)]*\)\s*)?(\w+)")],
        Language::Kotlin => vec![re!(r"\bfun\s+(?:<[^>]*>\s*)?(?:\w+\.)?(\w+)\s*\(")],
        Language::Java | Language::Cpp | Language::C | Language::CSharp | Language::Unknown => vec![
            re!(
                r"^\s*(?:(?:public|private|protected|static|final|inline|virtual|override|synchronized|abstract|const|unsigned|async|extern)\s+)*([\w:<>,\[\]*&]+)[\s*&]+(\w+)\s*\([^;]*$"
            ),
        ],
    };

    for (i, pattern) in patterns.iter().enumerate() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let c_like = matches!(
            language,
            Language::Java | Language::Cpp | Language::C | Language::CSharp | Language::Unknown
        );
        let name = if c_like {
            let ty = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if CONTROL_WORDS.contains(&ty) {
                continue;
            }
            caps.get(2)
        } else {
            caps.get(1)
        };
        let Some(name) = name.map(|m| m.as_str().to_string()) else {
            continue;
        };
        // JS method shorthand shares its shape with `if (x) {`
        if (c_like || i == 2) && CONTROL_WORDS.contains(&name.as_str()) {
            continue;
        }
        return Some(name);
    }
    None
}

/// Byte offset of `word` as a whole identifier
fn find_word(text: &str, word: &str) -> Option<usize> {
    text.match_indices(word)
        .map(|(pos, _)| pos)
        .find(|&pos| is_word_at(text, pos, word.len()))
}

fn is_word_at(text: &str, pos: usize, len: usize) -> bool {
    let ident = |c: char| c.is_alphanumeric() || c == '_';
    let before = text[..pos].chars().next_back();
    let after = text[pos + len..].chars().next();
    !before.is_some_and(ident) && !after.is_some_and(ident)
}

/// Argument text of every call `name(...)` in `text`
pub fn call_args(text: &str, name: &str) -> Vec<String> {
    let mut calls = Vec::new();
    for (pos, _) in text.match_indices(name) {
        if !is_word_at(text, pos, name.len()) {
            continue;
        }
        let rest = text[pos + name.len()..].trim_start();
        let Some(inner) = rest.strip_prefix('(') else {
            continue;
        };
        let mut depth = 1usize;
        let mut end = inner.len();
        for (i, c) in inner.char_indices() {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = i;
                        break;
                    }
                }
                _ => {}
            }
        }
        calls.push(inner[..end].to_string());
    }
    calls
}

fn starts_with(chars: &[char], at: usize, token: &str) -> bool {
    let mut i = at;
    for t in token.chars() {
        if chars.get(i) != Some(&t) {
            return false;
        }
        i += 1;
    }
    true
}

/// Remove comments and blank string contents, keeping every newline.
fn scrub(text: &str, language: Language) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if language.has_block_comments() && starts_with(&chars, i, "/*") {
            i += 2;
            while i < chars.len() && !starts_with(&chars, i, "*/") {
                if chars[i] == '\n' {
                    out.push('\n');
                }
                i += 1;
            }
            i += 2;
            continue;
        }

        if language
            .line_comments()
            .iter()
            .any(|token| starts_with(&chars, i, token))
        {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if language == Language::Python
            && (starts_with(&chars, i, "\"\"\"") || starts_with(&chars, i, "'''"))
        {
            let closing: String = std::iter::repeat(c).take(3).collect();
            out.push(c);
            out.push(c);
            i += 3;
            while i < chars.len() && !starts_with(&chars, i, &closing) {
                if chars[i] == '\n' {
                    out.push('\n');
                }
                i += 1;
            }
            i += 3;
            continue;
        }

        let is_quote = c == '"' || c == '`' || (c == '\'' && language.single_quote_strings());
        if is_quote {
            out.push(c);
            i += 1;
            while i < chars.len() {
                let d = chars[i];
                if d == '\\' {
                    i += 2;
                    continue;
                }
                if d == c {
                    break;
                }
                if d == '\n' {
                    if c == '`' {
                        out.push('\n');
                        i += 1;
                        continue;
                    }
                    break;
                }
                i += 1;
            }
            if chars.get(i) == Some(&c) {
                out.push(c);
                i += 1;
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

fn line_table(clean: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut depth: usize = 0;
    for raw in clean.split('\n') {
        let text = raw.trim_end().to_string();
        let indent = text
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(|c| if c == '\t' { 4 } else { 1 })
            .sum();
        let before = depth;
        for ch in text.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        lines.push(Line {
            blank: text.trim().is_empty(),
            text,
            indent,
            depth: before,
            depth_after: depth,
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_python_comments_and_strings() {
        let src = Source::new(
            "x = \"for i in range(n)\"  # while True\ny = 'a#b'\n",
            Language::Python,
        );
        assert_eq!(src.line(0).trim_end(), "x = \"\"");
        assert_eq!(src.line(1), "y = ''");
    }

    #[test]
    fn test_scrub_block_comments_keep_lines() {
        let code = "int a = 1; /* for (;;)\n   while (x) */ int b = 2;\n// loop\nint c;";
        let src = Source::new(code, Language::Java);
        assert_eq!(src.lines().len(), 4);
        assert!(!src.clean().contains("for"));
        assert!(!src.clean().contains("while"));
        assert!(src.line(1).contains("int b = 2;"));
        assert!(src.line(2).trim().is_empty());
    }

    #[test]
    fn test_scrub_python_docstring() {
        let code = "def f(n):\n    \"\"\"\n    for x in y\n    \"\"\"\n    return n\n";
        let src = Source::new(code, Language::Python);
        assert!(!src.clean().contains("for x"));
        assert_eq!(src.lines().len(), code.split('\n').count());
    }

    #[test]
    fn test_rust_lifetimes_are_not_strings() {
        let src = Source::new("fn f<'a>(x: &'a str) -> usize { x.len() }", Language::Rust);
        assert!(src.clean().contains("x.len()"));
    }

    #[test]
    fn test_block_end_offside() {
        let code = "def f(a):\n    for x in a:\n        print(x)\n\n        y = 1\n    return 0\n";
        let src = Source::new(code, Language::Python);
        assert_eq!(src.block_end(1), 4);
        assert_eq!(src.block_end(0), 5);
    }

    #[test]
    fn test_block_end_braces() {
        let code = "for (int i = 0; i < n; i++) {\n  a++;\n  if (x) {\n    b++;\n  }\n}\nc++;";
        let src = Source::new(code, Language::Java);
        assert_eq!(src.block_end(0), 5);
        assert_eq!(src.block_end(2), 4);
    }

    #[test]
    fn test_block_end_braceless_and_inline() {
        let code = "for (int i = 0; i < n; i++)\n  total += a[i];\nreturn total;";
        let src = Source::new(code, Language::Cpp);
        assert_eq!(src.block_end(0), 1);

        let src = Source::new("for (int i = 0; i < n; i++) { total += i; }\nx++;", Language::C);
        assert_eq!(src.block_end(0), 0);
    }

    #[test]
    fn test_functions_across_languages() {
        let py = Source::new("def two_sum(nums, target):\n    return []\n", Language::Python);
        assert_eq!(py.functions()[0].name, "two_sum");
        assert_eq!(py.functions()[0].key, "twosum");

        let js = Source::new(
            "const fib = (n) => n < 2 ? n : fib(n - 1) + fib(n - 2);\nfunction go(x) {\n  return x;\n}\n",
            Language::JavaScript,
        );
        let names: Vec<_> = js.functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["fib", "go"]);

        let java = Source::new(
            "class S {\n  public int[] twoSum(int[] nums, int target) {\n    if (x) {\n    }\n    return null;\n  }\n}\n",
            Language::Java,
        );
        assert_eq!(java.functions().len(), 1);
        assert_eq!(java.functions()[0].name, "twoSum");
        assert_eq!(java.functions()[0].end, 5);
    }

    #[test]
    fn test_self_calls_skip_signature() {
        let code = "def fib(n):\n    if n < 2:\n        return n\n    return fib(n - 1) + fib(n - 2)\n";
        let src = Source::new(code, Language::Python);
        let calls = src.self_calls(&src.functions()[0]);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, "n - 1");
        assert_eq!(calls[1].args, "n - 2");

        let js = Source::new(
            "const fib = (n) => n < 2 ? n : fib(n - 1) + fib(n - 2);",
            Language::JavaScript,
        );
        assert_eq!(js.self_calls(&js.functions()[0]).len(), 2);
    }

    #[test]
    fn test_call_args_nested_parens() {
        assert_eq!(
            call_args("x = solve(a[:mid], max(b, c)) + solver(q)", "solve"),
            vec!["a[:mid], max(b, c)".to_string()]
        );
    }

    #[test]
    fn test_mentions_and_defines() {
        let src = Source::new(
            "def mergeSort(arr):\n    pivot_idx = 0\n    return arr\n",
            Language::Python,
        );
        assert!(src.defines(&["mergesort"]));
        assert!(!src.defines(&["quicksort"]));
        assert!(src.mentions(&["pivotidx"]));
    }

    #[test]
    fn test_isolate_recovers_from_panic() {
        let value = isolate("boom", || 7, || -> i32 { panic!("recognizer bug") });
        assert_eq!(value, 7);
        assert_eq!(isolate("fine", || 0, || 3), 3);
    }

    #[test]
    fn test_empty_source() {
        let src = Source::new("   \n// only a comment\n", Language::Go);
        assert!(src.is_empty());
        assert!(src.functions().is_empty());
    }
}
