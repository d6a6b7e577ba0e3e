//! Loop scanning
//!
//! Finds every loop-like construct (keyword loops, iteration calls such as
//! `.forEach(`, Python comprehensions), recovers its extent, nesting, header
//! variable, bound symbols and growth rate, and credits nesting depth.
//! Inner loops recognized as amortized (stack drains, window shrinks) sit
//! inside their parent without adding a level.

use super::LoopFeatures;
use crate::shapes::{self, Amortization};
use crate::source::{re, Source};
use regex::Captures;
use serde::Serialize;
use std::collections::BTreeSet;

/// How the loop variable approaches its bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopGrowth {
    #[default]
    Linear,
    /// Multiplicative or dividing update (`i *= 2`, `n //= 10`)
    Logarithmic,
    /// Bounded by a square root (`i * i <= n`)
    Sqrt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    While,
    /// `loop {}` / `do {}`
    Unbounded,
    /// `.forEach(`, `.map(`, `.times` and friends
    Iteration,
    /// Python comprehension `for`
    Comprehension,
}

#[derive(Debug, Clone)]
pub struct LoopInfo {
    pub kind: LoopKind,
    pub line: usize,
    pub end: usize,
    /// Order among loops starting on the same line
    pub column: usize,
    pub var: Option<String>,
    pub condition: String,
    pub bounds: Vec<String>,
    pub growth: LoopGrowth,
    pub early_exit: bool,
    pub parent: Option<usize>,
    /// Raw nesting depth (1 = outermost)
    pub depth: usize,
    /// Nesting depth counting only non-amortized loops
    pub credited_depth: usize,
    pub amortized: Option<Amortization>,
}

impl LoopInfo {
    /// `line` lies in the body (not the header)
    pub fn contains_line(&self, line: usize) -> bool {
        line > self.line && line <= self.end
    }

    /// Body line range (empty for inline bodies)
    pub fn body(&self) -> std::ops::RangeInclusive<usize> {
        self.line + 1..=self.end
    }

    fn contains(&self, other: &LoopInfo) -> bool {
        if self.line == other.line {
            return self.kind == LoopKind::Comprehension
                && other.kind == LoopKind::Comprehension
                && self.column < other.column;
        }
        self.contains_line(other.line)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoopScan {
    pub loops: Vec<LoopInfo>,
}

impl LoopScan {
    /// Raw maximum nesting depth
    pub fn max_depth(&self) -> usize {
        self.loops.iter().map(|l| l.depth).max().unwrap_or(0)
    }

    pub fn max_credited_depth(&self) -> usize {
        self.loops.iter().map(|l| l.credited_depth).max().unwrap_or(0)
    }

    /// Line sits inside the body of some loop
    pub fn in_loop(&self, line: usize) -> bool {
        self.loops.iter().any(|l| l.contains_line(line))
    }

    /// Loops whose body contains `line`, outermost first
    pub fn enclosing(&self, line: usize) -> impl Iterator<Item = &LoopInfo> {
        self.loops.iter().filter(move |l| l.contains_line(line))
    }

    /// Loop nested somewhere inside loop `idx`
    pub fn has_child(&self, idx: usize) -> bool {
        self.loops.iter().any(|l| l.parent == Some(idx))
    }
}

/// Header fields recovered from a loop's first line
#[derive(Debug, Default)]
struct Header {
    var: Option<String>,
    condition: String,
    update: String,
}

const NOT_BOUNDS: &[&str] = &[
    "len", "size", "length", "range", "xrange", "and", "or", "not", "true", "false", "True",
    "False", "null", "None", "nil", "int", "math", "Math", "sqrt", "isqrt", "self", "this",
    "enumerate", "zip", "reversed", "sorted", "items", "keys", "values", "is", "empty",
    "isEmpty", "let", "const", "var", "auto", "in", "of", "mut", "iter", "chars", "count",
    "floor", "ceil", "abs", "min", "max", "undefined", "step_by", "rev", "Integer", "long",
];

pub fn scan(src: &Source) -> LoopScan {
    let mut loops = detect(src);

    for b in 0..loops.len() {
        let parent = (0..b).rev().find(|&a| loops[a].contains(&loops[b]));
        loops[b].parent = parent;
        loops[b].depth = parent.map(|p| loops[p].depth + 1).unwrap_or(1);
    }

    shapes::mark_amortized(src, &mut loops);

    for b in 0..loops.len() {
        let step = usize::from(loops[b].amortized.is_none());
        loops[b].credited_depth = match loops[b].parent {
            Some(p) => loops[p].credited_depth + step,
            None => 1,
        };
    }

    LoopScan { loops }
}

pub fn summarize(scan: &LoopScan) -> LoopFeatures {
    let counted = || scan.loops.iter().filter(|l| l.amortized.is_none());
    let max_depth = scan.max_credited_depth();

    let keyword_loops: Vec<&LoopInfo> = scan
        .loops
        .iter()
        .filter(|l| !matches!(l.kind, LoopKind::Iteration | LoopKind::Comprehension))
        .collect();

    LoopFeatures {
        single_loops: counted().filter(|l| l.credited_depth == 1).count(),
        nested_loops: counted().filter(|l| l.credited_depth >= 2).count(),
        max_nesting_depth: max_depth,
        growth_type: dominant_growth(scan, max_depth),
        bounds: scan
            .loops
            .iter()
            .flat_map(|l| l.bounds.iter().cloned())
            .collect(),
        early_exit: !keyword_loops.is_empty()
            && keyword_loops.len() == scan.loops.len()
            && keyword_loops.iter().all(|l| l.early_exit),
        total_loops: scan.loops.len(),
    }
}

/// Growth of the heaviest chain among the deepest loops.
///
/// Chains are weighed linear > sqrt > logarithmic so that a log loop beside
/// a linear loop of the same depth does not understate the work.
fn dominant_growth(scan: &LoopScan, max_depth: usize) -> LoopGrowth {
    let weight = |g: LoopGrowth| match g {
        LoopGrowth::Linear => 3,
        LoopGrowth::Sqrt => 2,
        LoopGrowth::Logarithmic => 1,
    };

    let mut best: Option<(usize, Vec<LoopGrowth>)> = None;
    for (idx, lp) in scan.loops.iter().enumerate() {
        if lp.credited_depth != max_depth || lp.amortized.is_some() {
            continue;
        }
        let mut chain = Vec::new();
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            if scan.loops[i].amortized.is_none() {
                chain.push(scan.loops[i].growth);
            }
            cursor = scan.loops[i].parent;
        }
        let score = chain.iter().map(|g| weight(*g)).sum::<usize>();
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, chain));
        }
    }

    match best {
        Some((_, chain)) if chain.contains(&LoopGrowth::Logarithmic) => LoopGrowth::Logarithmic,
        Some((_, chain)) if chain.contains(&LoopGrowth::Sqrt) => LoopGrowth::Sqrt,
        _ => LoopGrowth::Linear,
    }
}

fn detect(src: &Source) -> Vec<LoopInfo> {
    let python = src.language() == crate::language::Language::Python;
    let mut loops = Vec::new();

    for (idx, line) in src.lines().iter().enumerate() {
        if line.blank {
            continue;
        }
        let text = line.text.trim();
        let mut column = 0;
        let mut keyword_at_start = false;

        if let Some(kind) = keyword_kind(text, python) {
            keyword_at_start = kind != LoopKind::Comprehension;
            let end = if kind == LoopKind::Comprehension {
                idx
            } else {
                src.block_end(idx)
            };
            loops.push(build(src, idx, end, column, kind, text));
            column += 1;
        }

        if python {
            let fors = re!(r"\bfor\b").find_iter(text).count();
            let already = usize::from(column > 0);
            for _ in already..fors {
                loops.push(build(src, idx, idx, column, LoopKind::Comprehension, text));
                column += 1;
            }
        }

        if !keyword_at_start && column == 0 {
            let calls = re!(
                r"\.(?:forEach|map|filter|reduce|reduceRight|flatMap|each|each_with_index|each_char|times|for_each|fold|some|every|indexOf|includes)\b\s*(?:[({]|do\b)|\.(?:each|times)\s*$|\brepeat\s*\(\s*\w+\s*\)\s*\{"
            )
            .find_iter(text)
            .count();
            let opens = line.depth_after > line.depth || re!(r"\bdo\b\s*(?:\|[^|]*\|)?\s*$").is_match(text);
            for _ in 0..calls {
                let end = if opens { src.block_end(idx) } else { idx };
                loops.push(build(src, idx, end, column, LoopKind::Iteration, text));
                column += 1;
            }
        }
    }

    loops
}

fn keyword_kind(text: &str, python: bool) -> Option<LoopKind> {
    let caps = re!(r"^(?:\}\s*)?(?:\w+\s*:\s*)?(for|foreach|while|until|loop|do)\b(.*)$").captures(text)?;
    let keyword = caps.get(1)?.as_str();
    let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    match keyword {
        "for" | "foreach" => {
            if python && !text.contains(':') {
                // continuation line of a multi-line comprehension
                Some(LoopKind::Comprehension)
            } else {
                Some(LoopKind::For)
            }
        }
        "while" | "until" => {
            let do_while_tail =
                text.starts_with('}') || (text.ends_with(';') && !text.contains('{'));
            (!do_while_tail).then_some(LoopKind::While)
        }
        "loop" | "do" => {
            (rest.is_empty() || rest.starts_with('{') || rest.starts_with("do")).then_some(LoopKind::Unbounded)
        }
        _ => None,
    }
}

fn build(src: &Source, line: usize, end: usize, column: usize, kind: LoopKind, text: &str) -> LoopInfo {
    let header = match kind {
        LoopKind::For | LoopKind::Comprehension => parse_for(text),
        LoopKind::While => parse_while(text),
        LoopKind::Unbounded => Header::default(),
        LoopKind::Iteration => parse_iteration(text),
    };

    let bounds = bound_symbols(&header.condition, header.var.as_deref());
    let growth = growth(src, line, end, &header, &bounds);
    let early_exit = matches!(kind, LoopKind::For | LoopKind::While)
        && early_exit(src, line, end, header.var.as_deref(), &bounds);

    LoopInfo {
        kind,
        line,
        end,
        column,
        var: header.var,
        condition: header.condition,
        bounds,
        growth,
        early_exit,
        parent: None,
        depth: 1,
        credited_depth: 1,
        amortized: None,
    }
}

fn cap(caps: &Captures<'_>, i: usize) -> String {
    caps.get(i).map(|m| m.as_str().trim().to_string()).unwrap_or_default()
}

fn parse_for(text: &str) -> Header {
    if let Some(c) = re!(
        r"for\s*\(\s*(?:[\w<>\[\]:]+\s+)?(\w+)\s*=\s*[^;]*;\s*([^;]*);\s*([^)]*(?:\([^)]*\)[^)]*)*)\)"
    )
    .captures(text)
    {
        return Header { var: Some(cap(&c, 1)), condition: cap(&c, 2), update: cap(&c, 3) };
    }
    if let Some(c) = re!(r"for\s+(\w+)\s*:=\s*[^;]*;\s*([^;]*);\s*([^{]*)").captures(text) {
        return Header { var: Some(cap(&c, 1)), condition: cap(&c, 2), update: cap(&c, 3) };
    }
    if let Some(c) = re!(r"for\s+(\w+)\s+in\s+x?range\s*\((.*)\)\s*:").captures(text) {
        let args = split_args(&cap(&c, 2));
        let condition = match args.len() {
            0 => String::new(),
            1 => args[0].clone(),
            _ => args[1].clone(),
        };
        let update = args.get(2).cloned().unwrap_or_default();
        return Header { var: Some(cap(&c, 1)), condition, update };
    }
    if let Some(c) = re!(r"for\s+(\w+)\s+in\s+\(?\s*([\w.]+)\s*\.\.=?\s*([^{]*)").captures(text) {
        return Header { var: Some(cap(&c, 1)), condition: cap(&c, 3), update: String::new() };
    }
    if let Some(c) = re!(r"for\s+(\w+)(?:\s*,\s*\w+)?\s*:=\s*range\s+(.+?)\s*\{").captures(text) {
        return Header { var: Some(cap(&c, 1)), condition: cap(&c, 2), update: String::new() };
    }
    if let Some(c) = re!(
        r"for\s*(?:each\s*)?\(?\s*(?:[\w<>\[\]&]+\s+)?\(?\s*(\w+)(?:\s*,\s*\w+)*\s*\)?\s*(?:\bin\b|\bof\b|:)\s*(.+)$"
    )
    .captures(text)
    {
        let iterable = cap(&c, 2)
            .trim_end_matches(&['{', ':'][..])
            .trim_end()
            .trim_end_matches(')')
            .to_string();
        return Header { var: Some(cap(&c, 1)), condition: iterable, update: String::new() };
    }
    if let Some(c) = re!(r"^for\s+([^{;]+?)\s*\{").captures(text) {
        return Header { var: None, condition: cap(&c, 1), update: String::new() };
    }
    Header::default()
}

fn parse_while(text: &str) -> Header {
    let condition = re!(r"(?:while|until)\b\s*(.*)$")
        .captures(text)
        .map(|c| cap(&c, 1))
        .unwrap_or_default();
    let condition = condition
        .trim_end_matches(&['{', ':'][..])
        .trim_end()
        .trim_end_matches(" do")
        .trim();
    let condition = condition
        .strip_prefix('(')
        .and_then(|c| c.strip_suffix(')'))
        .unwrap_or(condition);
    Header { var: None, condition: condition.to_string(), update: String::new() }
}

fn parse_iteration(text: &str) -> Header {
    let receiver = re!(r"\b(\w+)\s*(?:\)\s*)?\.(?:forEach|map|filter|reduce|each|times|for_each|fold|some|every|indexOf|includes|iter)")
        .captures(text)
        .map(|c| cap(&c, 1))
        .unwrap_or_default();
    Header { var: None, condition: receiver, update: String::new() }
}

/// Split a call's argument list on top-level commas
fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in args.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

fn bound_symbols(condition: &str, var: Option<&str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    re!(r"\b[A-Za-z_]\w*\b")
        .find_iter(condition)
        .map(|m| m.as_str())
        .filter(|w| Some(*w) != var && !NOT_BOUNDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

fn growth(src: &Source, line: usize, end: usize, header: &Header, bounds: &[String]) -> LoopGrowth {
    let cond = &header.condition;
    let squared = re!(r"\b(\w+)\s*\*\s*(\w+)\s*<=?")
        .captures_iter(cond)
        .any(|c| c.get(1).map(|m| m.as_str()) == c.get(2).map(|m| m.as_str()));
    if squared || re!(r"\*\*\s*0?\.5|\bi?sqrt\s*\(|\.sqrt\(\)|\*\*\s*2\s*<=?").is_match(cond) {
        return LoopGrowth::Sqrt;
    }

    let mut vars: Vec<&str> = bounds.iter().map(String::as_str).collect();
    if let Some(v) = header.var.as_deref() {
        vars.push(v);
    }
    // Condition variables that are not bounds (`while i < n` keeps `i`)
    let cond_vars: Vec<&str> = re!(r"\b[A-Za-z_]\w*\b")
        .find_iter(cond)
        .map(|m| m.as_str())
        .collect();
    vars.extend(cond_vars);

    let mut texts: Vec<&str> = vec![header.update.as_str()];
    texts.extend((line + 1..=end).map(|i| src.line(i)));
    if end == line {
        texts.push(src.line(line));
    }

    let shrinks = texts.iter().any(|t| shrinking_update(t, &vars));
    if shrinks {
        LoopGrowth::Logarithmic
    } else {
        LoopGrowth::Linear
    }
}

/// A geometric update of one of `vars`: `*=`, `/=`, `>>=`, `v = v * k`,
/// or a Euclid step `b = a % b`.
fn shrinking_update(text: &str, vars: &[&str]) -> bool {
    let tracked = |name: &str| vars.contains(&name);

    if re!(r"\b(\w+)\s*(?:\*=|/=|//=|>>=|<<=|>>>=)\s*\w+")
        .captures_iter(text)
        .any(|c| c.get(1).is_some_and(|m| tracked(m.as_str())))
    {
        return true;
    }
    if re!(r"\b(\w+)\s*=\s*(\w+)\s*(?:\*|//|/|>>|<<)\s*\w+")
        .captures_iter(text)
        .any(|c| {
            let lhs = c.get(1).map(|m| m.as_str());
            lhs == c.get(2).map(|m| m.as_str()) && lhs.is_some_and(tracked)
        })
    {
        return true;
    }
    if re!(r"\b(\w+)\s*=\s*[^=;%]*%\s*(\w+)\b")
        .captures_iter(text)
        .any(|c| {
            let lhs = c.get(1).map(|m| m.as_str());
            lhs == c.get(2).map(|m| m.as_str()) && lhs.is_some_and(tracked)
        })
    {
        return true;
    }
    re!(r"\b(\w+)\s*,\s*(\w+)\s*=\s*(\w+)\s*,\s*(\w+)\s*%\s*(\w+)")
        .captures_iter(text)
        .any(|c| {
            let g = |i: usize| c.get(i).map(|m| m.as_str()).unwrap_or("");
            g(3) == g(2) && g(4) == g(1) && g(5) == g(2) && (tracked(g(1)) || tracked(g(2)))
        })
}

/// First body statement is an unconditional `break`/`return`, or the body
/// pins the loop variable to its bound.
fn early_exit(src: &Source, line: usize, end: usize, var: Option<&str>, bounds: &[String]) -> bool {
    if end == line {
        return re!(r"(?::|\)|\{)\s*(?:break|return)\b").is_match(src.line(line));
    }

    let first = (line + 1..=end)
        .map(|i| src.line(i).trim())
        .find(|t| !t.is_empty() && *t != "{");
    if first.is_some_and(|t| re!(r"^(?:break|return)\b").is_match(t)) {
        return true;
    }

    let Some(var) = var else {
        return false;
    };
    (line + 1..=end).any(|i| {
        re!(r"^\s*(\w+)\s*=\s*(\w+)\s*;?\s*$")
            .captures(src.line(i))
            .is_some_and(|c| {
                c.get(1).map(|m| m.as_str()) == Some(var)
                    && c.get(2).is_some_and(|m| bounds.iter().any(|b| b == m.as_str()))
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn scan_of(code: &str, language: Language) -> LoopScan {
        scan(&Source::new(code, language))
    }

    #[test]
    fn test_single_python_loop() {
        let s = scan_of("for x in nums:\n    total += x\n", Language::Python);
        assert_eq!(s.loops.len(), 1);
        assert_eq!(s.loops[0].kind, LoopKind::For);
        assert_eq!(s.loops[0].bounds, vec!["nums".to_string()]);
        assert_eq!(s.loops[0].growth, LoopGrowth::Linear);
    }

    #[test]
    fn test_nested_c_loops() {
        let code = "for (int i = 0; i < n; i++) {\n  for (int j = 0; j < n; j++) {\n    s += a[i] * a[j];\n  }\n}\n";
        let s = scan_of(code, Language::Java);
        assert_eq!(s.loops.len(), 2);
        assert_eq!(s.loops[1].parent, Some(0));
        assert_eq!(s.max_credited_depth(), 2);
        assert_eq!(s.loops[0].var.as_deref(), Some("i"));
        assert_eq!(s.loops[0].condition, "i < n");
    }

    #[test]
    fn test_sequential_loops_are_not_nested() {
        let code = "for x in a:\n    s += x\nfor y in b:\n    s += y\n";
        let f = summarize(&scan_of(code, Language::Python));
        assert_eq!(f.single_loops, 2);
        assert_eq!(f.max_nesting_depth, 1);
    }

    #[test]
    fn test_logarithmic_growth() {
        let s = scan_of("i = 1\nwhile i < n:\n    i *= 2\n", Language::Python);
        assert_eq!(s.loops[0].growth, LoopGrowth::Logarithmic);

        let s = scan_of("for (int i = n; i > 0; i /= 2) {\n  c++;\n}\n", Language::Cpp);
        assert_eq!(s.loops[0].growth, LoopGrowth::Logarithmic);

        let s = scan_of("while b:\n    a, b = b, a % b\n", Language::Python);
        assert_eq!(s.loops[0].growth, LoopGrowth::Logarithmic);
    }

    #[test]
    fn test_sqrt_growth() {
        let s = scan_of("i = 2\nwhile i * i <= n:\n    i += 1\n", Language::Python);
        assert_eq!(s.loops[0].growth, LoopGrowth::Sqrt);

        let s = scan_of("for d in range(2, int(n ** 0.5) + 1):\n    pass\n", Language::Python);
        assert_eq!(s.loops[0].growth, LoopGrowth::Sqrt);
    }

    #[test]
    fn test_comprehension_counts_as_loop() {
        let s = scan_of("pairs = [(x, y) for x in a for y in b]\n", Language::Python);
        assert_eq!(s.loops.len(), 2);
        assert_eq!(s.loops[1].parent, Some(0));
        assert_eq!(s.max_depth(), 2);
    }

    #[test]
    fn test_chained_iteration_calls_are_sequential() {
        let s = scan_of("const out = xs.filter(x => x > 0).map(x => x * 2);\n", Language::JavaScript);
        assert_eq!(s.loops.len(), 2);
        assert_eq!(s.max_depth(), 1);
    }

    #[test]
    fn test_foreach_with_block_body() {
        let code = "nums.forEach((x) => {\n  for (const y of nums) {\n    s += x * y;\n  }\n});\n";
        let s = scan_of(code, Language::JavaScript);
        assert_eq!(s.loops.len(), 2);
        assert_eq!(s.max_depth(), 2);
    }

    #[test]
    fn test_do_while_tail_is_not_a_loop() {
        let code = "do {\n  i++;\n} while (i < n);\n";
        let s = scan_of(code, Language::Java);
        assert_eq!(s.loops.len(), 1);
        assert_eq!(s.loops[0].kind, LoopKind::Unbounded);
    }

    #[test]
    fn test_early_exit() {
        let f = summarize(&scan_of("for x in nums:\n    return x\n", Language::Python));
        assert!(f.early_exit);

        let f = summarize(&scan_of(
            "for (int i = 0; i < n; i++) {\n  if (a[i] == t) {\n    return i;\n  }\n}\n",
            Language::Java,
        ));
        assert!(!f.early_exit);

        let f = summarize(&scan_of(
            "for (int i = 0; i < n; i++) {\n  x += a[i];\n  i = n;\n}\n",
            Language::Java,
        ));
        assert!(f.early_exit);
    }

    #[test]
    fn test_mixed_growth_prefers_linear_chain() {
        let code = "while n > 0:\n    n //= 2\nfor x in arr:\n    s += x\n";
        let f = summarize(&scan_of(code, Language::Python));
        assert_eq!(f.growth_type, LoopGrowth::Linear);
    }

    #[test]
    fn test_nested_log_inside_linear() {
        let code = "for i in range(n):\n    j = 1\n    while j < n:\n        j *= 2\n";
        let f = summarize(&scan_of(code, Language::Python));
        assert_eq!(f.max_nesting_depth, 2);
        assert_eq!(f.growth_type, LoopGrowth::Logarithmic);
    }
}
