//! Hazard recognizers
//!
//! A curated table of canonical algorithms that generic structural rules
//! get wrong (a merge sort read as exponential tree recursion, a monotonic
//! stack read as two nested loops). Each entry is a name, a declared
//! verdict and a predicate over the scrubbed source. The first predicate
//! that holds produces a terminal result; nothing else runs.
//!
//! Predicates carry their own exclusion guards so that at most one entry
//! should fire per snippet. Table order is the tie-break.

use crate::complexity::ComplexityClass;
use crate::features::algorithms::{exclusive_returns, has_swap, is_sieve};
use crate::features::loops::{self, LoopGrowth, LoopKind, LoopScan};
use crate::features::structures;
use crate::features::DataStructures;
use crate::result::ComplexityResult;
use crate::shapes;
use crate::source::{isolate, re, CallSite, FunctionSpan, Source};
use regex::Regex;

use ComplexityClass as C;

/// Everything a predicate may look at, computed once per snippet
pub struct Snippet<'a> {
    pub src: &'a Source,
    pub scan: LoopScan,
    pub ds: DataStructures,
}

impl<'a> Snippet<'a> {
    pub fn new(src: &'a Source) -> Self {
        let scan = isolate("hazard_loops", LoopScan::default, || loops::scan(src));
        let (ds, _) = isolate("hazard_structures", Default::default, || structures::detect(src));
        Snippet { src, scan, ds }
    }

    fn defines(&self, keys: &[&str]) -> bool {
        self.src.defines(keys)
    }

    fn mentions(&self, names: &[&str]) -> bool {
        self.src.mentions(names)
    }

    fn is_match(&self, re: &Regex) -> bool {
        self.src.is_match(re)
    }

    /// Raw loop nesting depth
    fn depth(&self) -> usize {
        self.scan.max_depth()
    }

    /// First function whose key contains one of `keys` and calls itself
    fn recursive(&self, keys: &[&str]) -> Option<(&'a FunctionSpan, Vec<CallSite>)> {
        self.src
            .functions()
            .iter()
            .filter(|f| keys.iter().any(|k| f.key.contains(k)))
            .map(|f| (f, self.src.self_calls(f)))
            .find(|(_, sites)| !sites.is_empty())
    }

    fn any_recursion(&self) -> bool {
        self.src.functions().iter().any(|f| !self.src.self_calls(f).is_empty())
    }

    /// A function making two or more recursive calls per activation
    fn branching_recursion(&self, args: Option<&Regex>) -> bool {
        self.src.functions().iter().any(|f| {
            let sites = self.src.self_calls(f);
            sites.len() >= 2
                && !exclusive_returns(self.src, f, &sites)
                && args.map_or(true, |re| sites.iter().any(|s| re.is_match(&s.args)))
        })
    }

    fn sorts(&self) -> bool {
        self.is_match(re!(
            r"\bsorted\s*\(|\.sort\s*\(|\bsort\.(?:Ints|Slice|Strings)\s*\(|\bArrays\.sort\b|\bsort\s*\(\s*\w+\.begin|\.sort_unstable\w*\s*\("
        ))
    }

    fn memoized(&self) -> bool {
        self.is_match(re!(r"(?i)@(?:functools\.)?(?:lru_)?cache\b|\bmemo\w*\b|\bcache\b"))
    }
}

pub struct Hazard {
    pub name: &'static str,
    pub time: ComplexityClass,
    pub space: ComplexityClass,
    pub confidence: f64,
    pub reason: &'static str,
    pub predicate: fn(&Snippet<'_>) -> bool,
}

impl Hazard {
    pub fn result(&self) -> ComplexityResult {
        ComplexityResult::new(
            self.time,
            self.reason,
            self.space,
            self.reason,
            format!("hazard:{}", self.name),
            self.confidence,
        )
        .with_pattern(self.name)
    }
}

macro_rules! hazard {
    ($name:ident, $time:expr, $space:expr, $confidence:expr, $reason:expr) => {
        Hazard {
            name: stringify!($name),
            time: $time,
            space: $space,
            confidence: $confidence,
            reason: $reason,
            predicate: $name,
        }
    };
}

pub static HAZARDS: &[Hazard] = &[
    hazard!(n_queens, C::Factorial, C::Linear, 0.92, "N-Queens places one queen per row, pruning columns and diagonals"),
    hazard!(generate_parentheses, C::KExponential, C::Linear, 0.9, "well-formed parentheses grow with the Catalan numbers"),
    hazard!(permutations, C::NFactorial, C::Linear, 0.93, "n! permutations, each copied in O(n)"),
    hazard!(subsets, C::NExponential, C::Linear, 0.93, "2^n subsets, each copied in O(n)"),
    hazard!(tower_of_hanoi, C::Exponential, C::Linear, 0.95, "Tower of Hanoi makes 2^n - 1 moves"),
    hazard!(fibonacci_memo, C::Linear, C::Linear, 0.95, "memoized Fibonacci computes each value once"),
    hazard!(fibonacci_naive, C::Exponential, C::Linear, 0.95, "naive Fibonacci recursion branches twice per call"),
    hazard!(fibonacci_iterative, C::Linear, C::Constant, 0.93, "iterative Fibonacci keeps two running values"),
    hazard!(factorial_recursive, C::Linear, C::Linear, 0.93, "factorial recursion descends one step per call"),
    hazard!(fast_power_recursive, C::Log, C::Log, 0.92, "exponentiation by squaring halves the exponent per call"),
    hazard!(fast_power_iterative, C::Log, C::Constant, 0.92, "exponentiation by squaring halves the exponent per step"),
    hazard!(gcd_recursive, C::Log, C::Log, 0.95, "Euclid's algorithm shrinks its arguments geometrically"),
    hazard!(gcd_iterative, C::Log, C::Constant, 0.95, "Euclid's algorithm shrinks its arguments geometrically"),
    hazard!(sieve_of_eratosthenes, C::NLogLogN, C::Linear, 0.95, "each composite is crossed off once per prime factor"),
    hazard!(prime_trial_division, C::Sqrt, C::Constant, 0.9, "trial division stops at the square root"),
    hazard!(quickselect, C::Linear, C::Constant, 0.88, "quickselect recurses into one partition only (average case)"),
    hazard!(merge_sort, C::NLogN, C::Linear, 0.95, "merge sort halves the input and merges in linear time"),
    hazard!(quick_sort, C::NLogN, C::Log, 0.9, "quicksort partitions around a pivot (average case)"),
    hazard!(heap_sort, C::NLogN, C::Constant, 0.93, "heap sort sifts each element down a heap of height log n"),
    hazard!(counting_sort, C::Linear, C::Linear, 0.9, "counting sort tallies keys in one pass"),
    hazard!(radix_sort, C::Linear, C::Linear, 0.88, "radix sort makes a fixed number of digit passes"),
    hazard!(bucket_sort, C::Linear, C::Linear, 0.85, "bucket sort distributes elements into buckets (average case)"),
    hazard!(bubble_sort, C::Quadratic, C::Constant, 0.93, "bubble sort compares adjacent pairs over n passes"),
    hazard!(insertion_sort, C::Quadratic, C::Constant, 0.93, "insertion sort shifts each element past the sorted prefix"),
    hazard!(selection_sort, C::Quadratic, C::Constant, 0.93, "selection sort scans the unsorted suffix for each position"),
    hazard!(four_sum, C::Cubic, C::Constant, 0.9, "two fixed indices plus a two-pointer scan over sorted input"),
    hazard!(three_sum, C::Quadratic, C::Constant, 0.9, "one fixed index plus a two-pointer scan over sorted input"),
    hazard!(two_sum_hash, C::Linear, C::Linear, 0.9, "single pass with constant-time complement lookups"),
    hazard!(binary_search_recursive, C::Log, C::Log, 0.92, "recursive binary search halves the range per call"),
    hazard!(binary_search_iterative, C::Log, C::Constant, 0.92, "binary search halves the range per step"),
    hazard!(kadane, C::Linear, C::Constant, 0.92, "Kadane's algorithm extends or restarts the running sum"),
    hazard!(boyer_moore_vote, C::Linear, C::Constant, 0.9, "majority vote keeps one candidate and a counter"),
    hazard!(dutch_national_flag, C::Linear, C::Constant, 0.9, "three-way partition in one pass"),
    hazard!(floyd_cycle, C::Linear, C::Constant, 0.93, "tortoise and hare meet within one lap"),
    hazard!(reverse_linked_list, C::Linear, C::Constant, 0.92, "pointer reversal visits each node once"),
    hazard!(dijkstra, C::NLogN, C::VPlusE, 0.9, "Dijkstra pops each vertex from a binary heap"),
    hazard!(heap_top_k, C::NLogN, C::BoundedK, 0.88, "heap bounded to k elements"),
    hazard!(bellman_ford, C::Quadratic, C::Linear, 0.88, "Bellman-Ford relaxes every edge V - 1 times"),
    hazard!(floyd_warshall, C::Cubic, C::Quadratic, 0.93, "Floyd-Warshall relaxes every pair through every intermediate vertex"),
    hazard!(topological_sort, C::VPlusE, C::VPlusE, 0.9, "Kahn's algorithm removes each vertex and edge once"),
    hazard!(union_find, C::Linear, C::Linear, 0.88, "union-find with path compression is near constant per operation"),
    hazard!(kmp, C::Linear, C::Linear, 0.93, "KMP never re-reads matched text thanks to the prefix table"),
    hazard!(rabin_karp, C::Linear, C::Constant, 0.85, "rolling hash updates in constant time per shift (expected)"),
    hazard!(z_function, C::Linear, C::Linear, 0.9, "Z-function reuses the rightmost match window"),
    hazard!(manacher, C::Linear, C::Linear, 0.92, "Manacher's algorithm mirrors palindrome radii"),
    hazard!(matrix_multiplication, C::Cubic, C::Quadratic, 0.93, "schoolbook matrix multiplication over three indices"),
    hazard!(prefix_sum, C::Linear, C::Linear, 0.88, "prefix sums built in one pass"),
    hazard!(tree_traversal, C::Linear, C::Linear, 0.9, "depth-first traversal visits each node once; stack grows to the height"),
    hazard!(level_order, C::Linear, C::Linear, 0.9, "level-order traversal enqueues each node once"),
    hazard!(kernighan_bit_count, C::Log, C::Constant, 0.9, "each step clears the lowest set bit"),
    hazard!(counter_comparison, C::Linear, C::BoundedK, 0.88, "character counts over a bounded alphabet"),
    hazard!(valid_parentheses, C::Linear, C::Linear, 0.9, "each bracket is pushed and popped at most once"),
    hazard!(trie, C::Linear, C::Linear, 0.85, "trie operations walk one node per character"),
    hazard!(lru_cache, C::Constant, C::BoundedK, 0.88, "hash map plus linked order gives constant-time get and put"),
];

/// Names of every recognizer, for configuration validation
pub fn is_known(name: &str) -> bool {
    HAZARDS.iter().any(|h| h.name == name)
}

/// First matching recognizer's terminal verdict, skipping `disabled` names.
pub fn match_hazard(src: &Source, disabled: &[String]) -> Option<ComplexityResult> {
    if src.is_empty() {
        return None;
    }
    let snippet = Snippet::new(src);
    HAZARDS
        .iter()
        .filter(|h| !disabled.iter().any(|d| d == h.name))
        .find(|h| isolate(h.name, || false, || (h.predicate)(&snippet)))
        .map(|h| {
            tracing::debug!(hazard = h.name, time = %h.time, space = %h.space, "hazard matched");
            h.result()
        })
}

// Backtracking

fn n_queens(p: &Snippet<'_>) -> bool {
    (p.defines(&["nqueen", "queens"]) || p.mentions(&["queens", "nqueens"])) && p.any_recursion()
}

fn generate_parentheses(p: &Snippet<'_>) -> bool {
    p.defines(&["generateparenthes"])
}

fn permutations(p: &Snippet<'_>) -> bool {
    p.defines(&["permut"])
        && !p.defines(&["nextpermutation", "permutationinstring", "checkinclusion"])
        && (p.any_recursion() || p.is_match(re!(r"\bpermutations\s*\(")))
}

fn subsets(p: &Snippet<'_>) -> bool {
    p.defines(&["subset", "powerset"])
        && !p.defines(&["subsetsum", "partition"])
        && (p.any_recursion() || !p.scan.loops.is_empty())
}

// Small recurrences

fn tower_of_hanoi(p: &Snippet<'_>) -> bool {
    p.defines(&["hanoi"]) && p.any_recursion()
}

fn fibonacci_memo(p: &Snippet<'_>) -> bool {
    p.recursive(&["fib"]).is_some() && p.memoized()
}

fn fibonacci_naive(p: &Snippet<'_>) -> bool {
    p.recursive(&["fib"]).is_some_and(|(_, sites)| sites.len() >= 2) && !p.memoized()
}

fn fibonacci_iterative(p: &Snippet<'_>) -> bool {
    p.defines(&["fib"])
        && p.recursive(&["fib"]).is_none()
        && !p.scan.loops.is_empty()
        && !p.is_match(re!(r"\[\s*0\s*\]\s*\*|\bnew\s+\w+\s*\[|\bdp\b|\.append\(|\.push\(|\bvec!\["))
}

fn factorial_recursive(p: &Snippet<'_>) -> bool {
    p.recursive(&["factorial", "fact"])
        .is_some_and(|(_, sites)| sites.len() == 1 && re!(r"-\s*1\b").is_match(&sites[0].args))
}

fn halving_args() -> &'static Regex {
    re!(r"//\s*2\b|/\s*2\b|>>\s*1\b|\bhalf\b")
}

fn fast_power_recursive(p: &Snippet<'_>) -> bool {
    !p.defines(&["powerset"])
        && p.recursive(&["pow"])
            .is_some_and(|(_, sites)| sites.iter().any(|s| halving_args().is_match(&s.args)))
}

fn fast_power_iterative(p: &Snippet<'_>) -> bool {
    p.defines(&["pow"])
        && !p.defines(&["powerset"])
        && p.recursive(&["pow"]).is_none()
        && p.is_match(re!(r"\b\w+\s*(?://=|>>=|/=)\s*[12]\b|\b\w+\s*=\s*\w+\s*(?://|>>|/)\s*[12]\b"))
}

fn gcd_recursive(p: &Snippet<'_>) -> bool {
    p.recursive(&["gcd", "hcf"])
        .is_some_and(|(_, sites)| sites.iter().any(|s| s.args.contains('%')))
}

fn gcd_iterative(p: &Snippet<'_>) -> bool {
    p.defines(&["gcd", "hcf"])
        && p.recursive(&["gcd", "hcf"]).is_none()
        && !p.scan.loops.is_empty()
        && p.src.clean().contains('%')
}

// Number theory

fn sieve_of_eratosthenes(p: &Snippet<'_>) -> bool {
    is_sieve(p.src, &p.scan)
}

fn prime_trial_division(p: &Snippet<'_>) -> bool {
    p.defines(&["prime"])
        && !p.scan.loops.is_empty()
        && p.depth() == 1
        && p.scan.loops.iter().any(|l| l.growth == LoopGrowth::Sqrt)
}

// Sorting and selection

fn quickselect(p: &Snippet<'_>) -> bool {
    p.defines(&["quickselect"])
        || (p.defines(&["partition"])
            && p.mentions(&["pivot"])
            && p.defines(&["kth", "findkth", "select"])
            && !p.branching_recursion(None))
}

fn merge_sort(p: &Snippet<'_>) -> bool {
    let halves = re!(r"\bmid\w*\b|//\s*2\b|/\s*2\b|>>\s*1\b");
    !p.mentions(&["pivot"])
        && (p.defines(&["mergesort"])
            || (p.defines(&["merge", "sortlist", "sortarray"]) && p.branching_recursion(Some(halves))))
}

fn quick_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["quicksort", "qsort"]) || (p.mentions(&["pivot"]) && p.branching_recursion(None))
}

fn heap_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["heapsort"]) || (p.defines(&["heapify", "siftdown"]) && p.defines(&["sort"]))
}

fn counting_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["countingsort", "countsort"])
}

fn radix_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["radixsort"])
}

fn bucket_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["bucketsort"])
}

fn bubble_sort(p: &Snippet<'_>) -> bool {
    let adjacent = re!(r"\w+\s*\[\s*(\w+)\s*\]\s*>\s*\w+\s*\[\s*(\w+)\s*\+\s*1\s*\]")
        .captures_iter(p.src.clean())
        .any(|c| c[1] == c[2]);
    p.defines(&["bubblesort"])
        || (p.depth() >= 2 && adjacent && (has_swap(p.src) || p.mentions(&["temp", "tmp"])))
}

fn insertion_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["insertionsort"])
}

fn selection_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["selectionsort"])
}

// Sum problems

fn two_pointer_inside_for(p: &Snippet<'_>, outer_fors: usize) -> bool {
    p.scan.loops.iter().any(|lp| {
        let mut fors = 0;
        let mut cursor = lp.parent;
        while let Some(i) = cursor {
            if p.scan.loops[i].kind == LoopKind::For {
                fors += 1;
            }
            cursor = p.scan.loops[i].parent;
        }
        lp.kind == LoopKind::While && fors == outer_fors
    })
}

fn four_sum(p: &Snippet<'_>) -> bool {
    p.sorts() && p.is_match(re!(r"(?i)four_?sum|\b4_?sum")) && two_pointer_inside_for(p, 2)
}

fn three_sum(p: &Snippet<'_>) -> bool {
    let named = p.is_match(re!(r"(?i)three|3_?sum|triplet"));
    let resets = shapes::pointer_resets(p.src, &p.scan.loops, &["left", "l", "lo", "j", "low"]);
    p.sorts()
        && !p.is_match(re!(r"(?i)four|4_?sum|quadruplet"))
        && p.depth() == 2
        && two_pointer_inside_for(p, 1)
        && (named || resets)
}

fn two_sum_hash(p: &Snippet<'_>) -> bool {
    let lookup = p.is_match(re!(r"\w+\s*-\s*[\w\[\]]+\s+(?:not\s+)?in\s+\w+"))
        || p.is_match(re!(
            r"\.(?:containsKey|has|contains_key|count|find|get)\s*\(\s*&?\s*(?:\w+\s*-\s*[\w\[\]]+|complement|diff|need)\s*\)"
        ))
        || (p.mentions(&["complement"])
            && p.is_match(re!(r"\bcomplement\s+in\b|\(\s*&?complement\s*\)")));
    (p.ds.hash_map || p.ds.hash_set)
        && p.mentions(&["target"])
        && p.depth() == 1
        && !p.sorts()
        && lookup
}

// Searching

fn binary_search_recursive(p: &Snippet<'_>) -> bool {
    p.src.functions().iter().any(|f| {
        let sites = p.src.self_calls(f);
        let single = sites.len() == 1 || exclusive_returns(p.src, f, &sites);
        let halves = (f.line..=f.end).any(|i| shapes::is_midpoint(p.src.line(i)));
        let midpoints: Vec<String> = (f.line..=f.end).filter_map(|i| shapes::midpoint_name(p.src.line(i))).collect();
        let looped = p.scan.loops.iter().any(|l| f.line <= l.line && l.line <= f.end);
        !sites.is_empty()
            && single
            && halves
            && !looped
            && sites.iter().any(|s| {
                re!(r"\bmid\w*\b").is_match(&s.args)
                    || s.args
                        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                        .any(|word| midpoints.iter().any(|m| m == word))
            })
    })
}

fn binary_search_iterative(p: &Snippet<'_>) -> bool {
    let [lp] = p.scan.loops.as_slice() else {
        return false;
    };
    let conditional = lp.kind == LoopKind::While || (lp.kind == LoopKind::For && lp.var.is_none());
    conditional
        && !p.any_recursion()
        && !p.sorts()
        && lp.body().any(|i| shapes::is_midpoint(p.src.line(i)))
}

// Linear scans

fn kadane(p: &Snippet<'_>) -> bool {
    let extends = re!(r"\bmax\s*\(\s*([\w\[\]]+)\s*,\s*(\w+)\s*\+\s*([\w\[\]]+)\s*\)")
        .captures_iter(p.src.clean())
        .any(|c| c[1] == c[3])
        || re!(r"\bmax\s*\(\s*(\w+)\s*\+\s*([\w\[\]]+)\s*,\s*([\w\[\]]+)\s*\)")
            .captures_iter(p.src.clean())
            .any(|c| c[2] == c[3]);
    extends && p.depth() <= 1
}

fn boyer_moore_vote(p: &Snippet<'_>) -> bool {
    p.mentions(&["candidate"]) && p.is_match(re!(r"\bcount\s*==\s*0\b")) && p.depth() <= 1
}

fn dutch_national_flag(p: &Snippet<'_>) -> bool {
    p.mentions(&["low"])
        && p.mentions(&["mid"])
        && p.mentions(&["high"])
        && p.is_match(re!(r"while\s*\(?\s*mid\s*<=\s*high\b"))
}

fn floyd_cycle(p: &Snippet<'_>) -> bool {
    p.mentions(&["slow"])
        && p.mentions(&["fast"])
        && p.is_match(re!(r"\bfast\.next\.next\b|\bfast\s*=\s*\w+\[\s*\w+\[\s*fast\s*\]\s*\]"))
}

fn reverse_linked_list(p: &Snippet<'_>) -> bool {
    p.mentions(&["prev"]) && p.is_match(re!(r"\.next\s*=\s*prev\b")) && !p.any_recursion()
}

// Graphs

fn dijkstra(p: &Snippet<'_>) -> bool {
    p.ds.heap
        && p.mentions(&["dist", "distance", "distances", "dis"])
        && (p.ds.graph || p.mentions(&["dijkstra"]))
}

fn heap_top_k(p: &Snippet<'_>) -> bool {
    p.is_match(re!(r"\bnlargest\s*\(|\bnsmallest\s*\("))
        || (p.ds.heap && p.is_match(re!(r"(?:len\(\s*\w+\s*\)|\.size\(\)|\.len\(\)|\.length)\s*>\s*k\b")))
}

fn bellman_ford(p: &Snippet<'_>) -> bool {
    p.defines(&["bellmanford"])
        || (!p.ds.heap
            && p.mentions(&["dist", "distance"])
            && p.mentions(&["edges"])
            && p.depth() >= 2
            && p.is_match(re!(r"\w+\s*-\s*1\s*\)|<\s*\w+\s*-\s*1\b")))
}

fn floyd_warshall(p: &Snippet<'_>) -> bool {
    p.depth() >= 3 && p.is_match(re!(r"\[\s*\w+\s*\]\s*\[\s*k\s*\]\s*\+\s*\w+\s*\[\s*k\s*\]\s*\["))
}

fn topological_sort(p: &Snippet<'_>) -> bool {
    p.defines(&["toposort", "topologicalsort"])
        || (p.mentions(&["indegree", "indeg", "indegrees"]) && p.ds.queue)
}

fn union_find(p: &Snippet<'_>) -> bool {
    p.ds.union_find
}

// Strings

fn kmp(p: &Snippet<'_>) -> bool {
    p.defines(&["kmp", "computelps", "buildlps", "prefixfunction"]) || p.is_match(re!(r"\blps\s*\["))
}

fn rabin_karp(p: &Snippet<'_>) -> bool {
    p.is_match(re!(r"(?i)rabin|karp|rolling_?hash"))
}

fn z_function(p: &Snippet<'_>) -> bool {
    p.defines(&["zfunction", "zalgorithm", "zarray", "computez", "getz"])
}

fn manacher(p: &Snippet<'_>) -> bool {
    p.is_match(re!(r"(?i)manacher"))
}

// Matrices and arrays

fn matrix_multiplication(p: &Snippet<'_>) -> bool {
    p.depth() >= 3
        && re!(
            r"\w+\s*\[\s*(\w+)\s*\]\s*\[\s*(\w+)\s*\]\s*\+=\s*\w+\s*\[\s*(\w+)\s*\]\s*\[\s*(\w+)\s*\]\s*\*\s*\w+\s*\[\s*(\w+)\s*\]\s*\[\s*(\w+)\s*\]"
        )
        .captures_iter(p.src.clean())
        .any(|c| c[1] == c[3] && c[4] == c[5] && c[2] == c[6])
}

fn prefix_sum(p: &Snippet<'_>) -> bool {
    p.depth() <= 1
        && re!(r"\b(\w+)\s*\[\s*(\w+)\s*\]\s*=\s*(\w+)\s*\[\s*\w+\s*-\s*1\s*\]\s*\+")
            .captures_iter(p.src.clean())
            .any(|c| {
                let key = c[1].to_lowercase();
                c[1] == c[3] && (key.contains("pre") || key.contains("cum") || key.contains("psum"))
            })
}

// Trees

fn tree_traversal(p: &Snippet<'_>) -> bool {
    p.defines(&["inorder", "preorder", "postorder"]) && p.any_recursion()
}

fn level_order(p: &Snippet<'_>) -> bool {
    p.defines(&["levelorder", "zigzag"]) && p.ds.queue
}

// Bits and counting

fn kernighan_bit_count(p: &Snippet<'_>) -> bool {
    let clean = p.src.clean();
    re!(r"\b(\w+)\s*&=\s*(\w+)\s*-\s*1\b").captures_iter(clean).any(|c| c[1] == c[2])
        || re!(r"\b(\w+)\s*=\s*(\w+)\s*&\s*\(\s*(\w+)\s*-\s*1\s*\)")
            .captures_iter(clean)
            .any(|c| c[1] == c[2] && c[2] == c[3])
}

fn counter_comparison(p: &Snippet<'_>) -> bool {
    p.is_match(re!(r"\bCounter\(\s*\w+\s*\)\s*==\s*Counter\("))
}

fn valid_parentheses(p: &Snippet<'_>) -> bool {
    p.defines(&["isvalid", "validparenthes", "balanced", "validbracket"]) && p.ds.stack && p.depth() <= 1
}

// Designed structures

fn trie(p: &Snippet<'_>) -> bool {
    p.is_match(re!(r"\bclass\s+Trie\b|\bstruct\s+Trie\b|\bTrieNode\b")) && !p.any_recursion()
}

fn lru_cache(p: &Snippet<'_>) -> bool {
    p.is_match(re!(r"(?i)\bLRUCache\b|move_to_end|\bLRU\b")) && p.defines(&["get"]) && p.defines(&["put"])
}
