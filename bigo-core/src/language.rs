//! Language detection
//!
//! Languages are identified from a caller-supplied tag, a file extension, or
//! (as a last resort) from the snippet itself. Analysis never fails on an
//! unrecognized language: `Language::Unknown` gets C-family lexical rules.

use std::path::Path;

/// Languages the scrubber knows lexical rules for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    CSharp,
    Go,
    Rust,
    Kotlin,
    Swift,
    Ruby,
    Unknown,
}

impl Language {
    /// Map a free-form language tag (`"python3"`, `"C++"`, `"ts"`) to a language.
    ///
    /// Unrecognized tags map to `Language::Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        match tag.as_str() {
            "python" | "python3" | "py" | "py3" => Language::Python,
            "javascript" | "js" | "node" | "nodejs" | "jsx" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "c++" | "cpp" | "cxx" | "cc" => Language::Cpp,
            "c" => Language::C,
            "c#" | "csharp" | "cs" => Language::CSharp,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "kotlin" | "kt" => Language::Kotlin,
            "swift" => Language::Swift,
            "ruby" | "rb" => Language::Ruby,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file extension
    ///
    /// Returns `None` if the extension is not recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyw" => Some(Language::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" | "tsx" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Some(Language::Cpp),
            "c" | "h" => Some(Language::C),
            "cs" => Some(Language::CSharp),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "kt" | "kts" => Some(Language::Kotlin),
            "swift" => Some(Language::Swift),
            "rb" => Some(Language::Ruby),
            _ => None,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Guess the language of an untagged snippet from telltale syntax.
    pub fn infer(code: &str) -> Self {
        let has = |needle: &str| code.contains(needle);
        if has("fn ") && (has("let ") || has("->") || has("&mut")) {
            Language::Rust
        } else if has("func ") && (has(":=") || has("package ")) {
            Language::Go
        } else if has("def ") && has(":") && !has("{") {
            if has("end\n") || code.trim_end().ends_with("end") {
                Language::Ruby
            } else {
                Language::Python
            }
        } else if has("#include") || has("std::") || has("vector<") {
            Language::Cpp
        } else if has("System.out") || has("public class") || has("public int") {
            Language::Java
        } else if has("fun ") && has("val ") {
            Language::Kotlin
        } else if has("function") || has("=>") || has("const ") || has("let ") {
            Language::JavaScript
        } else {
            Language::Unknown
        }
    }

    /// Get display name for this language
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::C => "C",
            Language::CSharp => "C#",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Kotlin => "Kotlin",
            Language::Swift => "Swift",
            Language::Ruby => "Ruby",
            Language::Unknown => "Unknown",
        }
    }

    /// Blocks are delimited by indentation rather than braces.
    ///
    /// Ruby closes blocks with `end` at the opener's indentation, so the
    /// indentation rule recovers its extents too.
    pub fn is_offside(&self) -> bool {
        matches!(self, Language::Python | Language::Ruby)
    }

    /// Line comment introducers
    pub fn line_comments(&self) -> &'static [&'static str] {
        match self {
            Language::Python | Language::Ruby => &["#"],
            Language::Unknown => &["//", "# "],
            _ => &["//"],
        }
    }

    /// `/* ... */` block comments
    pub fn has_block_comments(&self) -> bool {
        !matches!(self, Language::Python | Language::Ruby)
    }

    /// Single quotes delimit string or char literals (not Rust lifetimes).
    pub fn single_quote_strings(&self) -> bool {
        !matches!(self, Language::Rust)
    }

    /// Python-style `a[i:j]` slices allocate a copy.
    pub fn has_copying_slices(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Strings are immutable, so `s += t` in a loop copies.
    pub fn has_immutable_strings(&self) -> bool {
        !matches!(self, Language::Rust | Language::Cpp | Language::Ruby)
    }
}
