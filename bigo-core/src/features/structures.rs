//! Data structure recognition
//!
//! Keyword sets per structure, plus a literal fallback for untyped code:
//! `x = {}` later indexed by a variable reads as a hash map, `x = []` later
//! grown reads as an auxiliary array.

use super::DataStructures;
use crate::source::{re, Source};

/// Empty containers created and then filled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Literals {
    pub maps: usize,
    pub arrays: usize,
}

pub fn detect(src: &Source) -> (DataStructures, Literals) {
    let literals = literal_containers(src);

    let queue = re!(
        r"(?i)\b\w*queue\w*\b|\bdeque\b|\bVecDeque\b|\bArrayDeque\b|\.popleft\(|\.poll\(|\.offer\(|\.shift\(\)|\.pop_front\(|\bq\s*=\s*(?:deque|\[)"
    )
    .find_iter(src.clean())
    .any(|m| {
        let word = m.as_str().to_lowercase();
        word != "priorityqueue" && word != "priority_queue"
    });

    let union_find = src.is_match(re!(r"\bUnionFind\b|\bDisjointSet\w*\b|\bDSU\b|\b[Uu]nion_?[Ff]ind\b"))
        || (src.is_match(re!(r"\bparents?\s*\["))
            && src.is_match(re!(r"\bfind\s*\("))
            && src.is_match(re!(r"\bunion\s*\(|\brank\s*\[|\bsize\s*\[")));

    let structures = DataStructures {
        hash_map: literals.maps > 0
            || src.is_match(re!(
                r"\b(?:HashMap|unordered_map|LinkedHashMap|TreeMap|BTreeMap|Dictionary|defaultdict|Counter|OrderedDict|dict|Hashtable)\b|\bnew\s+Map\b|\bMap<|\bmap\[\w+\]\w+|\bmap<|\bMap\(\)"
            )),
        hash_set: src.is_match(re!(
            r"\b(?:HashSet|unordered_set|LinkedHashSet|TreeSet|BTreeSet|frozenset)\b|(?:^|[^.\w])set\s*\(|\bnew\s+Set\b|\bSet<|\bset<|\bSet\(\)|\bmap\[\w+\](?:bool|struct\{\})"
        )),
        array: literals.arrays > 0
            || src.is_match(re!(
                r"\w\s*\[\s*[\w+\-* ]+\]|\bvec!\[|\bArrayList\b|\bnew\s+\w+\s*\[|\bvector<|\bmake\(\s*\[\]|\[\s*\]"
            )),
        heap: src.is_match(re!(
            r"(?i)\b(?:heapq|heappush|heappop|heapify|priorityqueue|priority_queue|binaryheap|minheap|maxheap|heap)\b|container/heap"
        )),
        stack: src.is_match(re!(r"(?i)\b\w*stack\w*\b|\bstk\b|\bst\s*[=.]")),
        queue,
        tree: src.is_match(re!(r"\bTreeNode\b|\.left\b|\.right\b|\broot\b|\bBinaryTree\b|\bBST\b")),
        graph: src.is_match(re!(
            r"(?i)\bgraph\b|\badj\w*\b|\bneighbou?rs?\b|\bedges?\b|\bin_?degrees?\b|\bvertices\b"
        )),
        linked_list: src.is_match(re!(r"\bListNode\b|\.next\b|\bLinkedList\b|\bhead\b")),
        trie: src.is_match(re!(r"(?i)\btrie\w*\b|\.children\b|\bchildren\s*\[|\bis_?end\b")),
        union_find,
        string_builder: src.is_match(re!(
            r"\bStringBuilder\b|\bStringBuffer\b|strings\.Builder|String::with_capacity|\.join\s*\(|io\.StringIO|\bpush_str\s*\(|stringstream"
        )),
    };

    (structures, literals)
}

fn literal_containers(src: &Source) -> Literals {
    let clean = src.clean();
    let mut literals = Literals::default();

    for c in re!(r"\b(\w+)\s*=\s*\{\s*\}").captures_iter(clean) {
        let name = &c[1];
        if indexed_by_variable(clean, name) {
            literals.maps += 1;
        }
    }

    for c in re!(
        r"\b(\w+)\s*(?::[^=\n]*)?:?=\s*(?:\[\s*\]|Vec::new\(\)|vec!\[\]|new\s+ArrayList<[^>]*>\(\)|new\s+LinkedList<[^>]*>\(\)|\[\]\w+\{\}|list\(\)|Array\(\)|new\s+Array\(\))"
    )
    .captures_iter(clean)
    {
        let name = &c[1];
        if grown(clean, name) {
            literals.arrays += 1;
        }
    }

    literals
}

/// `name[var]` somewhere in the text
fn indexed_by_variable(clean: &str, name: &str) -> bool {
    let needle = format!("{name}[");
    clean.match_indices(&needle).any(|(pos, _)| {
        let before_ok = clean[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        let after = clean[pos + needle.len()..].trim_start().chars().next();
        before_ok && after.is_some_and(|c| c.is_alphabetic() || c == '_')
    })
}

/// `name.append(`, `name.push(`, `name = append(name`, `name += [`
fn grown(clean: &str, name: &str) -> bool {
    let methods = [".append(", ".push(", ".push_back(", ".add(", ".addLast(", ".unshift(", ".insert("];
    methods.iter().any(|m| clean.contains(&format!("{name}{m}")))
        || clean.contains(&format!("{name} = append({name}"))
        || clean.contains(&format!("{name} += ["))
        || clean.contains(&format!("{name} << "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn structures_of(code: &str, language: Language) -> (DataStructures, Literals) {
        detect(&Source::new(code, language))
    }

    #[test]
    fn test_literal_map_fallback() {
        let (ds, lit) = structures_of(
            "seen = {}\nfor i, x in enumerate(nums):\n    seen[x] = i\n",
            Language::Python,
        );
        assert!(ds.hash_map);
        assert_eq!(lit.maps, 1);
    }

    #[test]
    fn test_literal_map_without_indexing_is_ignored() {
        let (ds, lit) = structures_of("opts = {}\nreturn opts\n", Language::Python);
        assert!(!ds.hash_map);
        assert_eq!(lit.maps, 0);
    }

    #[test]
    fn test_grown_array_literal() {
        let (ds, lit) = structures_of(
            "const res = [];\nfor (const x of xs) {\n  res.push(x);\n}\n",
            Language::JavaScript,
        );
        assert!(ds.array);
        assert_eq!(lit.arrays, 1);
    }

    #[test]
    fn test_keyword_structures() {
        let (ds, _) = structures_of(
            "import heapq\nfrom collections import deque\nq = deque([root])\nseen = set()\ncount = Counter(s)\n",
            Language::Python,
        );
        assert!(ds.heap);
        assert!(ds.queue);
        assert!(ds.hash_set);
        assert!(ds.hash_map);
        assert!(ds.tree);
    }

    #[test]
    fn test_priority_queue_is_not_a_queue() {
        let (ds, _) = structures_of(
            "PriorityQueue<Integer> pq = new PriorityQueue<>();\npq.add(1);\n",
            Language::Java,
        );
        assert!(ds.heap);
        assert!(!ds.queue);
    }

    #[test]
    fn test_js_map_set_call_is_not_a_hash_set() {
        let (ds, _) = structures_of("const m = new Map();\nm.set(k, v);\n", Language::JavaScript);
        assert!(ds.hash_map);
        assert!(!ds.hash_set);
    }

    #[test]
    fn test_union_find_shape() {
        let code = "\
def find(x):
    while parent[x] != x:
        x = parent[x]
    return x
def union(a, b):
    parent[find(a)] = find(b)
";
        let (ds, _) = structures_of(code, Language::Python);
        assert!(ds.union_find);
    }
}
