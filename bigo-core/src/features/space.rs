//! Auxiliary memory signals: sized buffers, maps and sets, hidden copies,
//! fixed-alphabet counting tables and quadratic string building.

use super::loops::LoopScan;
use super::structures::Literals;
use super::{DataStructures, SpaceUsage};
use crate::source::{re, Source};

pub fn detect(src: &Source, scan: &LoopScan, ds: &DataStructures, literals: &Literals) -> SpaceUsage {
    let aux_arrays = sized_allocations(src) + literals.arrays + comprehensions(src);
    let aux_maps = map_constructions(src) + literals.maps;
    let hidden_allocations = hidden_allocations(src);
    let fixed_key_domain = src.is_match(re!(
        r"\[\s*0\s*\]\s*\*\s*(?:26|52|128|256)\b|new\s+int\s*\[\s*(?:26|52|128|256)\s*\]|vec!\[\s*0\w*\s*;\s*(?:26|52|128|256)\s*\]|\[\s*(?:26|52|128|256)\s*\]int\b|\bint\s+\w+\s*\[\s*(?:26|52|128|256)\s*\]|\bord\(\s*\w+\s*\)\s*-\s*ord\(|-\s*b?'.?'"
    ));
    let string_concat_in_loop = !ds.string_builder
        && src.language().has_immutable_strings()
        && string_concat_in_loop(src, scan);

    SpaceUsage {
        aux_arrays,
        aux_maps,
        in_place: aux_arrays == 0 && aux_maps == 0 && !hidden_allocations,
        hidden_allocations,
        fixed_key_domain,
        string_concat_in_loop,
    }
}

/// Buffers whose length depends on the input (`[0] * n`, `new int[n]`)
fn sized_allocations(src: &Source) -> usize {
    let patterns = [
        re!(r"\[[^\[\]\n]*\]\s*\*\s*\(?\s*([^\n)\]]+)"),
        re!(r"\bnew\s+\w+(?:<[^>\n]*>)?\s*\[\s*([^\]\n]+)\]"),
        re!(r"\bvec!\[[^;\]\n]*;\s*([^\]\n]+)\]"),
        re!(r"\bmake\(\s*\[\][^,\n]+,\s*([^,)\n]+)"),
        re!(r"\bnew\s+Array\(\s*([^)\n]+)\)|\bArray\(\s*([^)\n]+)\)\.fill|\blength\s*:\s*([^}\n]+)\}"),
        re!(r"\bvector<[^>\n]*>+\s*\w+\s*\(\s*([^,)\n]+)"),
    ];
    let clean = src.clean();
    patterns
        .iter()
        .flat_map(|p| p.captures_iter(clean))
        .filter(|c| {
            c.iter()
                .skip(1)
                .flatten()
                .any(|m| m.as_str().chars().any(|ch| ch.is_ascii_alphabetic()))
        })
        .count()
}

/// Collections built by a comprehension or a mapping call
fn comprehensions(src: &Source) -> usize {
    re!(r"=\s*[\[{][^\]}\n]*\bfor\b|=\s*\w+\.(?:map|filter)\s*\(")
        .find_iter(src.clean())
        .count()
}

fn map_constructions(src: &Source) -> usize {
    re!(
        r"\bnew\s+(?:HashMap|HashSet|TreeMap|TreeSet|LinkedHashMap|LinkedHashSet|Map|Set|Dictionary|HashTable|Hashtable)\b|\b(?:HashMap|HashSet|BTreeMap|BTreeSet)::(?:new|with_capacity)\b|(?:^|[^.\w])(?:dict|set|defaultdict|Counter|OrderedDict|frozenset)\s*\(|\bmake\(\s*map\[|\bunordered_(?:map|set)<[^>\n]*>+\s*\w+|\bmap\[\w+\][\w{}]+\{\}|\bmutableMapOf\b|\bmutableSetOf\b|\bhashMapOf\b|\bhashSetOf\b"
    )
    .find_iter(src.clean())
    .count()
}

fn hidden_allocations(src: &Source) -> bool {
    if src.is_match(re!(
        r"\.substring\s*\(|\.substr\s*\(|\.slice\s*\(|\.split\s*\(|\.concat\s*\(|\.copy\(\)|\.clone\(\)|\.to_vec\(\)|\bArrays\.copyOf\w*\s*\(|(?:^|[^.\w])list\s*\(\s*\w|\bsorted\s*\(|\.toCharArray\(\)|\.collect::<Vec|\[\s*\.\.\.\s*\w+"
    )) {
        return true;
    }
    src.language().has_copying_slices()
        && src.is_match(re!(r"\w\s*\[\s*[\w+\-*/ ()]*\s*:\s*[\w+\-*/ ()]*\s*\]"))
}

/// A string variable grown with `+=` or `s = s + ...` inside a loop
fn string_concat_in_loop(src: &Source, scan: &LoopScan) -> bool {
    let names: Vec<String> = re!(
        r#"\b(\w+)\s*(?::\s*\w+\s*)?:?=\s*(?:""|''|String::new\(\)|String\(\)|new\s+String\(\)|str\(\))"#
    )
    .captures_iter(src.clean())
    .map(|c| c[1].to_string())
    .collect();
    if names.is_empty() {
        return false;
    }

    src.lines().iter().enumerate().any(|(i, line)| {
        if !scan.in_loop(i) {
            return false;
        }
        let appends = re!(r"\b(\w+)\s*\+=").captures_iter(&line.text).any(|c| names.contains(&c[1].to_string()));
        let rebuilds = re!(r"\b(\w+)\s*=\s*(\w+)\s*\+")
            .captures_iter(&line.text)
            .any(|c| c[1] == c[2] && names.contains(&c[1].to_string()));
        appends || rebuilds
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::loops::scan;
    use crate::features::structures;
    use crate::language::Language;

    fn space_of(code: &str, language: Language) -> SpaceUsage {
        let src = Source::new(code, language);
        let s = scan(&src);
        let (ds, literals) = structures::detect(&src);
        detect(&src, &s, &ds, &literals)
    }

    #[test]
    fn test_sized_buffer_is_auxiliary() {
        let s = space_of("int[] out = new int[n];\n", Language::Java);
        assert_eq!(s.aux_arrays, 1);
        assert!(!s.in_place);

        let s = space_of("counts = [0] * len(nums)\n", Language::Python);
        assert_eq!(s.aux_arrays, 1);
    }

    #[test]
    fn test_fixed_alphabet_is_not_sized() {
        let s = space_of(
            "count = [0] * 26\nfor c in s:\n    count[ord(c) - ord('a')] += 1\n",
            Language::Python,
        );
        assert_eq!(s.aux_arrays, 0);
        assert!(s.fixed_key_domain);
    }

    #[test]
    fn test_maps_and_sets() {
        let s = space_of(
            "Map<Integer, Integer> seen = new HashMap<>();\nSet<Integer> s = new HashSet<>();\n",
            Language::Java,
        );
        assert_eq!(s.aux_maps, 2);
        assert!(!s.in_place);
    }

    #[test]
    fn test_python_slice_is_hidden_copy() {
        let s = space_of("def f(a):\n    return f(a[1:])\n", Language::Python);
        assert!(s.hidden_allocations);

        let s = space_of("let t = &a[1..];\n", Language::Rust);
        assert!(!s.hidden_allocations);
    }

    #[test]
    fn test_string_concat_in_loop() {
        let code = "String s = \"\";\nfor (int i = 0; i < n; i++) {\n  s += words[i];\n}\n";
        assert!(space_of(code, Language::Java).string_concat_in_loop);

        let code = "StringBuilder sb = new StringBuilder();\nString s = \"\";\nfor (int i = 0; i < n; i++) {\n  sb.append(words[i]);\n}\n";
        assert!(!space_of(code, Language::Java).string_concat_in_loop);

        let code = "let mut s = String::new();\nfor w in words {\n    s += w;\n}\n";
        assert!(!space_of(code, Language::Rust).string_concat_in_loop);
    }

    #[test]
    fn test_in_place_swap() {
        let s = space_of(
            "def rev(a):\n    i, j = 0, len(a) - 1\n    while i < j:\n        a[i], a[j] = a[j], a[i]\n        i += 1\n        j -= 1\n",
            Language::Python,
        );
        assert!(s.in_place);
    }
}
