//! Algorithm family recognition
//!
//! Sorting, binary search, recursion shape, memoization and DP tables,
//! backtracking, graph traversals, divide and conquer, monotonic stacks,
//! sieves and Euclid's algorithm. Recursion is found per function by
//! counting self-call sites; the function with the most sites decides the
//! branching factor and how its arguments shrink.

use super::loops::{LoopKind, LoopScan};
use super::{AlgorithmFeatures, DataStructures, RecursionArgs};
use crate::shapes::{self, Amortization};
use crate::source::{call_args, re, CallSite, FunctionSpan, Source};

/// Shape of the dominant recursive function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecursionInfo {
    /// Distinct self-call sites that can run in one activation
    pub branching: usize,
    pub args: RecursionArgs,
    /// 2 for tables indexed by two keys, 1 for one key, 0 without DP
    pub dp_dimensions: u8,
}

struct Recursive<'a> {
    func: &'a FunctionSpan,
    sites: Vec<CallSite>,
    branching: usize,
}

pub fn detect(
    src: &Source,
    scan: &LoopScan,
    ds: &DataStructures,
) -> (AlgorithmFeatures, RecursionInfo) {
    let recursive = recursive_function(src);
    let branching = recursive.as_ref().map_or(0, |r| r.branching);
    let recursion = branching > 0;
    let args = recursive
        .as_ref()
        .map_or(RecursionArgs::Linear, |r| classify_args(&r.sites, &midpoint_names(src, r.func)));
    let recursion_in_loop = recursive.as_ref().is_some_and(|r| {
        r.sites
            .iter()
            .any(|s| loop_within(scan, s.line, r.func.line, r.func.end))
    });

    let (sorting, sort_in_loop) = sorting(src, scan);
    let (binary_search, binary_search_in_loop) = binary_search(src, scan, recursive.as_ref());

    let memoization = src.is_match(re!(
        r"(?i)@(?:functools\.)?(?:lru_)?cache\b|\bmemo\w*\b|\bcache\b|\bcached\b|\bmemoize\w*\b"
    ));
    let dp = src.is_match(re!(r"(?i)\bdp\w*\b"));
    let dp_dimensions = if dp || memoization {
        if two_dimensional(src) {
            2
        } else {
            1
        }
    } else {
        0
    };

    let swaps = has_swap(src);
    let library_permutations = src.is_match(re!(r"\bpermutations\s*\("));
    let keyword_backtracking = src.defines(&[
        "backtrack", "permut", "subset", "combination", "nqueen", "solvequeens",
    ]) || src.mentions(&["backtrack"])
        || library_permutations;
    let choose_unchoose = src.is_match(re!(r"\.(?:append|push|push_back|add|addLast)\s*\("))
        && src.is_match(re!(r"\.(?:pop|pop_back|removeLast|remove|pollLast)\s*\("));
    let backtracking = keyword_backtracking
        || (recursion && swaps && branching <= 2 && recursion_in_loop)
        || (recursion_in_loop && choose_unchoose);

    let is_permutation = src.is_match(re!(r"(?i)permut"))
        || (backtracking
            && (swaps
                || src.mentions(&["used"])
                || src.is_match(re!(
                    r"\bin\s+(?:path|curr?|current|perm)\b|\b(?:path|curr?|current|perm)\.(?:contains|includes)\s*\("
                ))));

    let accumulates_results = src.is_match(re!(
        r#"\.append\(\s*\w+\s*\[\s*:\s*\]\s*\)|\.append\(\s*list\(\s*\w+\s*\)\s*\)|\blist\(\s*path\s*\)|new\s+ArrayList<[^>]*>\(\s*\w+\s*\)|\[\s*\.\.\.\s*\w+\s*\]|\.clone\(\)|\.to_vec\(\)|append\(\s*\[\]\w+\{\}\s*,\s*\w+\s*\.\.\.\s*\)|\blist\(\s*(?:itertools\.)?permutations\(|\.copy\(\)\s*\)|\.append\(\s*(?:""|'')\.join\("#
    ));

    let bfs = src.mentions(&["bfs"]) || queue_drain(src, scan);

    let grid_like = ds.graph || ds.tree || src.mentions(&["grid", "board"]);
    let divide_conquer = recursion
        && branching >= 2
        && (args == RecursionArgs::Divide || src.mentions(&["partition", "pivot"]))
        && !backtracking;
    let dfs = src.mentions(&["dfs"])
        || ((ds.graph || ds.tree) && stack_drain(src, scan))
        || (recursion && grid_like && !divide_conquer && !backtracking);

    let monotonic_stack = scan
        .loops
        .iter()
        .any(|l| l.amortized == Some(Amortization::StackDrain));

    let sieve = is_sieve(src, scan);

    let heapify = src.is_match(re!(
        r"\bheapify\s*\(|\bmake_heap\s*\(|\bBinaryHeap::from\b|\bheap\.Init\s*\("
    ));

    let gcd = recursive.as_ref().is_some_and(|r| {
        r.branching == 1 && r.sites.iter().any(|s| s.args.contains('%'))
    }) || (src.defines(&["gcd", "hcf"]) && src.clean().contains('%'));

    let features = AlgorithmFeatures {
        sorting,
        sort_in_loop,
        binary_search,
        binary_search_in_loop,
        recursion,
        recursion_in_loop,
        memoization,
        dp,
        backtracking,
        bfs,
        dfs,
        divide_conquer,
        monotonic_stack,
        sieve,
        gcd,
        is_permutation,
        accumulates_results,
        heapify,
    };
    let info = RecursionInfo { branching, args, dp_dimensions };
    (features, info)
}

/// Function with the most self-call sites
fn recursive_function(src: &Source) -> Option<Recursive<'_>> {
    let mut best: Option<Recursive<'_>> = None;
    for func in src.functions() {
        let sites = src.self_calls(func);
        if sites.is_empty() {
            continue;
        }
        if best.as_ref().map_or(true, |b| sites.len() > b.sites.len()) {
            let branching = if exclusive_returns(src, func, &sites) {
                1
            } else {
                sites.len()
            };
            best = Some(Recursive { func, sites, branching });
        }
    }
    best
}

/// Every call sits alone on its own `return f(...)` line, so at most one
/// runs per activation (`if t < a[mid]: return go(lo, mid)` / `else: ...`).
pub(crate) fn exclusive_returns(src: &Source, func: &FunctionSpan, sites: &[CallSite]) -> bool {
    if sites.len() < 2 {
        return false;
    }
    let mut lines: Vec<usize> = sites.iter().map(|s| s.line).collect();
    lines.dedup();
    lines.len() == sites.len()
        && lines.iter().all(|&i| {
            let text = src.line(i);
            re!(r"\breturn\s+(?:self\.|this\.)?\w+\s*\(.*\)\s*;?\s*$").is_match(text)
                && call_args(text, &func.name).len() == 1
        })
}

/// Names bound to a halved value inside `func`, whatever they are called
fn midpoint_names(src: &Source, func: &FunctionSpan) -> Vec<String> {
    (func.line..=func.end)
        .filter_map(|i| shapes::midpoint_name(src.line(i)))
        .collect()
}

fn classify_args(sites: &[CallSite], midpoints: &[String]) -> RecursionArgs {
    let divides = re!(
        r"\bmid\w*\b|\bmiddle\b|//\s*\d|/\s*\d|>>\s*\d|\bhalf\w*\b|\bpivot\w*\s*[+-]\s*1|\b(?:p|pi|q)\s*[+-]\s*1\b"
    );
    let splits_at_midpoint = |args: &str| {
        args.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| midpoints.iter().any(|m| m == word))
    };
    if sites.iter().any(|s| divides.is_match(&s.args) || splits_at_midpoint(&s.args)) {
        RecursionArgs::Divide
    } else if sites.iter().any(|s| re!(r"[+-]\s*\d+").is_match(&s.args)) {
        RecursionArgs::Step
    } else {
        RecursionArgs::Linear
    }
}

/// `line` is executed once per iteration of some loop inside `first..=last`
fn loop_within(scan: &LoopScan, line: usize, first: usize, last: usize) -> bool {
    scan.loops.iter().any(|l| {
        (first..=last).contains(&l.line)
            && (l.contains_line(line) || (l.line == line && l.end == line && runs_inline(l.kind)))
    })
}

/// `line` is executed once per iteration of any loop
fn in_any_loop(scan: &LoopScan, line: usize) -> bool {
    scan.loops
        .iter()
        .any(|l| l.contains_line(line) || (l.line == line && l.end == line && runs_inline(l.kind)))
}

/// Loops whose header line also holds their body
fn runs_inline(kind: LoopKind) -> bool {
    matches!(kind, LoopKind::Comprehension | LoopKind::Iteration)
}

fn sorting(src: &Source, scan: &LoopScan) -> (bool, bool) {
    let library = re!(
        r"\bsorted\s*\(|\.sort\s*\(|\bsort\.(?:Ints|Slice|SliceStable|Strings|Sort|Float64s)\s*\(|\bArrays\.sort\b|\bCollections\.sort\b|\bstd::sort\b|\.sort_by\w*\s*\(|\.sort_unstable\w*\s*\(|\.sorted\s*\(|\.sortBy\w*\s*\(|\.OrderBy\w*\s*\(|\bArray\.Sort\b|\bqsort\s*\("
    );
    let mut lines = src.matching_lines(library);
    let defines_sort = src.functions().iter().any(|f| f.key == "sort");
    if !defines_sort {
        lines.extend(src.matching_lines(re!(r"(?:^|[^.\w])sort\s*\(")));
    }
    let in_loop = lines.iter().any(|&i| in_any_loop(scan, i));
    (!lines.is_empty(), in_loop)
}

fn binary_search(
    src: &Source,
    scan: &LoopScan,
    recursive: Option<&Recursive<'_>>,
) -> (bool, bool) {
    let bound_to_mid = re!(
        r"\b(?:lo|hi|low|high|left|right|l|r|start|end|begin)\s*=\s*(?:mid|middle|m|pivot)\b"
    );
    let searching_loop = scan.loops.iter().find(|lp| {
        let conditional = lp.kind == LoopKind::While || (lp.kind == LoopKind::For && lp.var.is_none());
        conditional
            && re!(r"\b[A-Za-z_]\w*\s*(?:\+\s*1\s*)?<=?\s*[A-Za-z_]\w*\b").is_match(&lp.condition)
            && lp.body().any(|i| {
                let text = src.line(i);
                shapes::is_midpoint(text) || bound_to_mid.is_match(text)
            })
    });
    if let Some(lp) = searching_loop {
        let in_loop = lp.parent.is_some()
            || src
                .functions()
                .iter()
                .filter(|f| f.line <= lp.line && lp.end <= f.end)
                .any(|f| called_in_loop(src, scan, f));
        return (true, in_loop);
    }

    let library = src.matching_lines(re!(
        r"\bbisect(?:_left|_right)?\s*\(|\bbisect\.\w+\s*\(|\bbinarySearch\s*\(|\blower_bound\s*\(|\bupper_bound\s*\(|\.binary_search(?:_by\w*)?\s*\(|\bsort\.Search\w*\s*\(|\.partition_point\s*\("
    ));
    if !library.is_empty() {
        return (true, library.iter().any(|&i| in_any_loop(scan, i)));
    }

    if let Some(r) = recursive {
        let halves = (r.func.line..=r.func.end).any(|i| shapes::is_midpoint(src.line(i)));
        if r.branching == 1 && halves {
            return (true, called_in_loop(src, scan, r.func));
        }
    }
    (false, false)
}

/// `func` is called from a loop body outside its own definition
fn called_in_loop(src: &Source, scan: &LoopScan, func: &FunctionSpan) -> bool {
    src.lines().iter().enumerate().any(|(i, line)| {
        !(func.line..=func.end).contains(&i)
            && !call_args(&line.text, &func.name).is_empty()
            && in_any_loop(scan, i)
    })
}

/// DP table or memo keyed by two values
fn two_dimensional(src: &Source) -> bool {
    if src.is_match(re!(
        r"\bdp\w*\s*\[[^\]\n]*\]\s*\[|\bmemo\w*\s*\[\s*\(?\s*\w+\s*,\s*\w+|\(\s*\w+\s*,\s*\w+\s*\)\s+(?:not\s+)?in\s+memo\w*|\[\s*\[[^\]\n]*\]\s*\*\s*[^\]\n]+\s+for\s+|new\s+\w+\s*\[[^\]\n]+\]\s*\[[^\]\n]+\]|\bvector<\s*vector<|\bvec!\[\s*vec!\[|make\(\s*\[\]\[\]"
    )) {
        return true;
    }
    // `@cache` over a function of two or more parameters
    src.matching_lines(re!(r"@(?:functools\.)?(?:lru_)?cache\b"))
        .iter()
        .filter_map(|&d| src.functions().iter().find(|f| f.line > d))
        .any(|f| {
            call_args(src.line(f.line), &f.name)
                .first()
                .map(|params| {
                    params
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty() && *p != "self")
                        .count()
                        >= 2
                })
                .unwrap_or(false)
        })
}

/// `swap(...)` or `a[i], a[j] = a[j], a[i]`
pub(crate) fn has_swap(src: &Source) -> bool {
    if src.is_match(re!(r"\bswap\s*\(|\.swap\s*\(|\bstd::swap\b|\bCollections\.swap\b")) {
        return true;
    }
    re!(
        r"(\w+)\[([^\]\n]+)\]\s*,\s*(\w+)\[([^\]\n]+)\]\s*\]?\s*=\s*\[?\s*(\w+)\[([^\]\n]+)\]\s*,\s*(\w+)\[([^\]\n]+)\]"
    )
    .captures_iter(src.clean())
    .any(|c| {
        let g = |i: usize| c.get(i).map(|m| m.as_str().trim()).unwrap_or("");
        g(1) == g(3) && g(1) == g(5) && g(1) == g(7) && g(2) == g(8) && g(4) == g(6) && g(2) != g(4)
    })
}

/// A conditional loop that runs while a queue is non-empty and dequeues
fn queue_drain(src: &Source, scan: &LoopScan) -> bool {
    scan.loops.iter().any(|lp| {
        let conditional = lp.kind == LoopKind::While || (lp.kind == LoopKind::For && lp.var.is_none());
        conditional
            && re!(r"(?i)\b(?:q|dq|queue\w*|\w+queue|deque|frontier|bfs\w*)\b").is_match(&lp.condition)
            && std::iter::once(lp.line).chain(lp.body()).any(|i| {
                re!(
                    r"\.(?:popleft|poll|shift|pop_front|dequeue|removeFirst|pollFirst)\s*\(|\.pop\(\s*0\s*\)|\.remove\(\s*0\s*\)|=\s*\w+\[\s*1\s*:\s*\]"
                )
                .is_match(src.line(i))
            })
    })
}

/// A top-level loop draining an explicit stack
fn stack_drain(src: &Source, scan: &LoopScan) -> bool {
    scan.loops.iter().any(|lp| {
        lp.parent.is_none()
            && matches!(lp.kind, LoopKind::While | LoopKind::For)
            && re!(r"(?i)\b(?:stack\w*|\w+stack|stk|st)\b").is_match(&lp.condition)
            && std::iter::once(lp.line)
                .chain(lp.body())
                .any(|i| re!(r"\.(?:pop|pop_back|removeLast|pollLast)\s*\(\s*\)").is_match(src.line(i)))
    })
}

/// Inner loop starting at the square of the outer variable (`j = i * i`)
pub(crate) fn is_sieve(src: &Source, scan: &LoopScan) -> bool {
    let squares = |text: &str, var: &str| {
        re!(r"\b(\w+)\s*\*\s*(\w+)\b")
            .captures_iter(text)
            .any(|c| &c[1] == var && &c[2] == var)
            || re!(r"\b(\w+)\s*\*\*\s*2\b").captures_iter(text).any(|c| &c[1] == var)
    };
    let marked = scan.loops.iter().any(|lp| {
        let Some(parent) = lp.parent else {
            return false;
        };
        let Some(var) = scan.loops[parent].var.as_deref() else {
            return false;
        };
        let previous = lp.line.checked_sub(1).map(|i| src.line(i)).unwrap_or("");
        squares(src.line(lp.line), var) || squares(previous, var)
    });
    marked || (src.is_match(re!(r"(?i)sieve")) && scan.max_depth() >= 2)
}
