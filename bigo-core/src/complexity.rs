//! Complexity classes
//!
//! A fixed, totally ordered enumeration of asymptotic classes. Every
//! dominance and override comparison in the engine goes through `Ord` on
//! this type, so variant declaration order IS the ranking.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComplexityClass {
    Constant,
    /// Fixed key domain (alphabet, window of size k).
    BoundedK,
    LogLog,
    Log,
    Sqrt,
    Linear,
    /// Graph traversal over vertices and edges.
    VPlusE,
    NLogLogN,
    NLogN,
    Quadratic,
    QuadraticLog,
    Cubic,
    Exponential,
    NExponential,
    KExponential,
    Factorial,
    NFactorial,
}

impl ComplexityClass {
    /// All classes in ascending order.
    pub const ALL: [ComplexityClass; 17] = [
        ComplexityClass::Constant,
        ComplexityClass::BoundedK,
        ComplexityClass::LogLog,
        ComplexityClass::Log,
        ComplexityClass::Sqrt,
        ComplexityClass::Linear,
        ComplexityClass::VPlusE,
        ComplexityClass::NLogLogN,
        ComplexityClass::NLogN,
        ComplexityClass::Quadratic,
        ComplexityClass::QuadraticLog,
        ComplexityClass::Cubic,
        ComplexityClass::Exponential,
        ComplexityClass::NExponential,
        ComplexityClass::KExponential,
        ComplexityClass::Factorial,
        ComplexityClass::NFactorial,
    ];

    /// Canonical notation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::BoundedK => "O(k)",
            ComplexityClass::LogLog => "O(log log n)",
            ComplexityClass::Log => "O(log n)",
            ComplexityClass::Sqrt => "O(√n)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::VPlusE => "O(V+E)",
            ComplexityClass::NLogLogN => "O(n log log n)",
            ComplexityClass::NLogN => "O(n log n)",
            ComplexityClass::Quadratic => "O(n²)",
            ComplexityClass::QuadraticLog => "O(n² log n)",
            ComplexityClass::Cubic => "O(n³)",
            ComplexityClass::Exponential => "O(2^n)",
            ComplexityClass::NExponential => "O(n·2^n)",
            ComplexityClass::KExponential => "O(k^n)",
            ComplexityClass::Factorial => "O(n!)",
            ComplexityClass::NFactorial => "O(n·n!)",
        }
    }

    /// Position in the total order (0 = O(1)).
    pub fn rank(&self) -> usize {
        *self as usize
    }

    /// True for O(2^n) and everything above it.
    pub fn is_exponential(&self) -> bool {
        *self >= ComplexityClass::Exponential
    }

    /// Class of `depth` nested linear loops, capped at cubic.
    pub fn polynomial(depth: usize) -> ComplexityClass {
        match depth {
            0 => ComplexityClass::Constant,
            1 => ComplexityClass::Linear,
            2 => ComplexityClass::Quadratic,
            _ => ComplexityClass::Cubic,
        }
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claimed complexity string that could not be mapped onto a class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized complexity notation: {0:?}")]
pub struct ParseComplexityError(pub String);

impl FromStr for ComplexityClass {
    type Err = ParseComplexityError;

    /// Lenient parse of claimed notation: `O(n^2)`, `O(N log N)`, `O(n*n)`,
    /// `Θ(V + E)`, `n!` and friends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = normalize(s);
        if body.is_empty() {
            return Err(ParseComplexityError(s.to_string()));
        }
        exact(&body)
            .or_else(|| structural(&body))
            .ok_or_else(|| ParseComplexityError(s.to_string()))
    }
}

/// Lowercase, drop whitespace and the `O(...)` wrapper, unify operators.
fn normalize(s: &str) -> String {
    let mut body: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    for prefix in ["o(", "θ(", "ω(", "big-o(", "bigo("] {
        if let Some(rest) = body.strip_prefix(prefix) {
            body = rest.strip_suffix(')').unwrap_or(rest).to_string();
            break;
        }
    }

    body.replace("²", "^2")
        .replace("³", "^3")
        .replace("**", "^")
        .replace(|c: char| matches!(c, '·' | '×' | '⋅'), "*")
        .replace("√n", "sqrt")
        .replace("sqrt(n)", "sqrt")
        .replace("(n)", "n")
        .replace("(v)", "v")
        .replace("(k)", "k")
}

fn exact(body: &str) -> Option<ComplexityClass> {
    use ComplexityClass::*;
    let class = match body {
        "1" | "c" | "constant" => Constant,
        "k" | "26" | "alphabet" | "sigma" | "σ" => BoundedK,
        "loglogn" => LogLog,
        "logn" | "lgn" | "log2n" | "log_2n" | "logk" | "logv" | "log(m+n)" | "log(n+m)"
        | "log(min(m,n))" => Log,
        "sqrt" | "n^0.5" | "n^(1/2)" => Sqrt,
        "n" | "m" | "2n" | "n+m" | "m+n" | "n+k" | "k+n" | "l" | "h" => Linear,
        "v+e" | "e+v" | "n+e" | "v+m" | "|v|+|e|" => VPlusE,
        "nloglogn" | "n*loglogn" => NLogLogN,
        "nlogn" | "n*logn" | "nlogk" | "n*logk" | "elogv" | "e*logv" | "(v+e)logv"
        | "(e+v)logv" | "mlogn" | "klogn" | "nlogm" => NLogN,
        "n^2" | "n*n" | "mn" | "nm" | "m*n" | "n*m" | "n*k" | "k*n" | "v^2" | "v*e" => {
            Quadratic
        }
        "n^2logn" | "n^2*logn" => QuadraticLog,
        "n^3" | "n*n*n" | "v^3" => Cubic,
        "2^n" | "exponential" => Exponential,
        "n*2^n" | "n2^n" | "2^n*n" => NExponential,
        "k^n" | "3^n" | "4^n" | "b^d" => KExponential,
        "n!" | "factorial" => Factorial,
        "n*n!" | "n!*n" | "(n+1)!" => NFactorial,
        _ => return None,
    };
    Some(class)
}

/// Shape-based fallback for notations outside the exact table.
fn structural(body: &str) -> Option<ComplexityClass> {
    use ComplexityClass::*;
    if body.contains('!') {
        return Some(if body.contains("n*") || body.contains("*n") {
            NFactorial
        } else {
            Factorial
        });
    }
    if let Some(pos) = body.find('^') {
        let base = body[..pos]
            .rsplit(|c: char| !c.is_ascii_alphanumeric())
            .next()
            .unwrap_or("");
        let exponent = body[pos + 1..].trim_start_matches('(');
        if exponent.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let has_factor = body[..pos].contains('*');
            return Some(match (base, has_factor) {
                ("2", true) => NExponential,
                ("2", false) => Exponential,
                _ => KExponential,
            });
        }
        if exponent.starts_with('3') {
            return Some(Cubic);
        }
        if exponent.starts_with('2') {
            return Some(if body.contains("log") {
                QuadraticLog
            } else {
                Quadratic
            });
        }
    }
    if let Some(pos) = body.find("loglog") {
        return Some(if pos > 0 { NLogLogN } else { LogLog });
    }
    if let Some(pos) = body.find("log") {
        return Some(if pos > 0 { NLogN } else { Log });
    }
    if body.contains("sqrt") {
        return Some(Sqrt);
    }
    let sum: Vec<&str> = body.split('+').collect();
    if sum.iter().all(|term| is_variable(term)) {
        return Some(Linear);
    }
    let product: Vec<&str> = body.split('*').collect();
    if product.iter().all(|term| is_variable(term)) {
        return Some(ComplexityClass::polynomial(product.len()));
    }
    None
}

/// A single size variable, optionally with a constant factor (`n`, `2m`).
fn is_variable(term: &str) -> bool {
    let term = term.trim_matches(|c: char| c == '(' || c == ')');
    let letters = term.trim_start_matches(|c: char| c.is_ascii_digit());
    letters.len() == 1 && letters.chars().all(|c| c.is_ascii_alphabetic())
}

impl Serialize for ComplexityClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComplexityClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
