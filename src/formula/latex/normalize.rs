// LaTeX source normalization
//
// Rewrites matrix-like environments into an explicit `\left..\right` pair
// around a bare `matrix`, and removes sizing and spacing commands
// that would otherwise hide stretchy delimiters from later stages.

use once_cell::sync::Lazy;
use regex::Regex;

static REWRITABLE_BEGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\{(bmatrix|pmatrix|Bmatrix|vmatrix|Vmatrix|smallmatrix|cases)\}")
        .expect("valid environment regex")
});

static MATRIX_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\{(?:[A-Za-z]*matrix|cases|array)\*?\}").expect("valid marker regex")
});

/// Opening and closing replacement text for a rewritable environment.
fn environment_wrap(name: &str) -> Option<(&'static str, &'static str)> {
    Some(match name {
        "bmatrix" => (r"\left[\begin{matrix}", r"\end{matrix}\right]"),
        "pmatrix" => (r"\left(\begin{matrix}", r"\end{matrix}\right)"),
        "Bmatrix" => (r"\left\{\begin{matrix}", r"\end{matrix}\right\}"),
        "vmatrix" => (r"\left|\begin{matrix}", r"\end{matrix}\right|"),
        "Vmatrix" => (r"\left\|\begin{matrix}", r"\end{matrix}\right\|"),
        "smallmatrix" => (r"\begin{matrix}", r"\end{matrix}"),
        "cases" => (r"\left\{\begin{matrix}", r"\end{matrix}\right."),
        _ => return None,
    })
}

/// Normalize LaTeX source for MathML regeneration.
///
/// Pure string transform; input that contains none of the handled
/// constructs is returned unchanged.
pub fn normalize_latex(src: &str) -> String {
    let rewritten = rewrite_environments(src);
    let sized = normalize_sizing(&rewritten);
    normalize_spacing(&sized)
}

/// Whether the source contains a matrix, cases or array environment.
pub fn has_matrix_environment(src: &str) -> bool {
    MATRIX_MARKER.is_match(src)
}

/// Rewrite environments innermost first until nothing changes.
///
/// The last opening marker is paired with the first closing marker of the
/// same name after it. Openings without a closing marker are left as is.
fn rewrite_environments(src: &str) -> String {
    let mut s = src.to_string();
    loop {
        let openings: Vec<(usize, usize, String)> = REWRITABLE_BEGIN
            .captures_iter(&s)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str().to_string();
                Some((whole.start(), whole.end(), name))
            })
            .collect();

        let mut rewritten = None;
        for (start, end, name) in openings.iter().rev() {
            let closing = format!("\\end{{{name}}}");
            let Some(rel) = s[*end..].find(&closing) else {
                continue;
            };
            let Some((open, close)) = environment_wrap(name) else {
                continue;
            };
            let close_start = end + rel;
            let close_end = close_start + closing.len();

            let mut next = String::with_capacity(s.len() + 32);
            next.push_str(&s[..*start]);
            next.push_str(open);
            next.push_str(&s[*end..close_start]);
            next.push_str(close);
            next.push_str(&s[close_end..]);
            rewritten = Some(next);
            break;
        }

        match rewritten {
            Some(next) => s = next,
            None => return s,
        }
    }
}

/// Apply `f` to every control word (`\name`); `Some` replaces the whole
/// control word. Control symbols such as `\\` or `\{` are copied through
/// unless `symbol` asks to drop them.
fn rewrite_commands(
    src: &str,
    mut word: impl FnMut(&str) -> Option<&'static str>,
    symbol: impl Fn(char) -> bool,
) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some((_, next)) if next.is_ascii_alphabetic() => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, n)) = chars.peek() {
                    if !n.is_ascii_alphabetic() {
                        break;
                    }
                    end = j + n.len_utf8();
                    chars.next();
                }
                let name = &src[start..end];
                match word(name) {
                    Some(replacement) => out.push_str(replacement),
                    None => {
                        out.push('\\');
                        out.push_str(name);
                    },
                }
            },
            Some((_, next)) => {
                chars.next();
                if !symbol(next) {
                    out.push('\\');
                    out.push(next);
                }
            },
            None => out.push('\\'),
        }
    }
    out
}

/// Names of the control words in `src`; control symbols are skipped.
fn control_words(src: &str) -> impl Iterator<Item = &str> {
    let bytes = src.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() {
            if bytes[i] != b'\\' {
                i += 1;
                continue;
            }
            let start = i + 1;
            let end = start + bytes[start..].iter().take_while(|b| b.is_ascii_alphabetic()).count();
            if end == start {
                i = start + 1;
                continue;
            }
            i = end;
            return Some(&src[start..end]);
        }
        None
    })
}

fn sizing_side(name: &str) -> Option<char> {
    let rest = name
        .strip_prefix("Bigg")
        .or_else(|| name.strip_prefix("bigg"))
        .or_else(|| name.strip_prefix("Big"))
        .or_else(|| name.strip_prefix("big"))?;
    match rest {
        "" => Some(' '),
        "l" => Some('l'),
        "r" => Some('r'),
        "m" => Some('m'),
        _ => None,
    }
}

/// Turn balanced `\bigl`/`\bigr` families into `\left`/`\right`; drop every
/// other sizing command and keep the delimiter it applied to.
fn normalize_sizing(src: &str) -> String {
    let (lefts, rights) = control_words(src).fold((0usize, 0usize), |(l, r), name| match sizing_side(name) {
        Some('l') => (l + 1, r),
        Some('r') => (l, r + 1),
        _ => (l, r),
    });
    let balanced = lefts == rights;

    rewrite_commands(
        src,
        |name| match sizing_side(name)? {
            'l' if balanced => Some(r"\left"),
            'r' if balanced => Some(r"\right"),
            _ => Some(""),
        },
        |_| false,
    )
}

/// Replace `\quad`/`\qquad` with one explicit space and drop thin spaces
/// and `\displaystyle`.
fn normalize_spacing(src: &str) -> String {
    rewrite_commands(
        src,
        |name| match name {
            "quad" | "qquad" => Some(r"\ "),
            "displaystyle" => Some(""),
            _ => None,
        },
        |c| matches!(c, ',' | ';' | '!'),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmatrix() {
        assert_eq!(
            normalize_latex(r"\begin{bmatrix}a&b\\c&d\end{bmatrix}"),
            r"\left[\begin{matrix}a&b\\c&d\end{matrix}\right]"
        );
    }

    #[test]
    fn test_delimited_variants() {
        assert_eq!(
            normalize_latex(r"\begin{pmatrix}1\end{pmatrix}"),
            r"\left(\begin{matrix}1\end{matrix}\right)"
        );
        assert_eq!(
            normalize_latex(r"\begin{Vmatrix}1\end{Vmatrix}"),
            r"\left\|\begin{matrix}1\end{matrix}\right\|"
        );
        assert_eq!(
            normalize_latex(r"\begin{smallmatrix}1\end{smallmatrix}"),
            r"\begin{matrix}1\end{matrix}"
        );
    }

    #[test]
    fn test_cases() {
        assert_eq!(
            normalize_latex(r"f(x)=\begin{cases}1&x>0\\0&x\le0\end{cases}"),
            r"f(x)=\left\{\begin{matrix}1&x>0\\0&x\le0\end{matrix}\right."
        );
    }

    #[test]
    fn test_nested_environments() {
        let src = r"\begin{pmatrix}\begin{bmatrix}a\end{bmatrix}&b\end{pmatrix}";
        assert_eq!(
            normalize_latex(src),
            r"\left(\begin{matrix}\left[\begin{matrix}a\end{matrix}\right]&b\end{matrix}\right)"
        );

        let same = r"\begin{pmatrix}\begin{pmatrix}a\end{pmatrix}\end{pmatrix}";
        let out = normalize_latex(same);
        assert_eq!(out.matches(r"\left(").count(), 2);
        assert_eq!(out.matches(r"\right)").count(), 2);
        assert!(!out.contains("pmatrix"));
    }

    #[test]
    fn test_unmatched_environment_untouched() {
        let src = r"\begin{bmatrix}a&b";
        assert_eq!(normalize_latex(src), src);
    }

    #[test]
    fn test_balanced_sizing() {
        assert_eq!(
            normalize_latex(r"\bigl(x\bigr) + \Biggl[y\Biggr]"),
            r"\left(x\right) + \left[y\right]"
        );
    }

    #[test]
    fn test_unbalanced_sizing_removed() {
        assert_eq!(normalize_latex(r"\bigl(x\Big)"), "(x)");
        assert_eq!(normalize_latex(r"\big| x \big|"), "| x |");
    }

    #[test]
    fn test_sizing_count_ignores_control_symbols() {
        assert_eq!(normalize_latex(r"a\\bigl(x\bigr)"), r"a\\bigl(x)");
        let words: Vec<&str> = control_words(r"\{x\bigl\\y\right.").collect();
        assert_eq!(words, ["bigl", "right"]);
    }

    #[test]
    fn test_spacing() {
        assert_eq!(normalize_latex(r"a\quad b\,c\;d\!e"), r"a\  bcde");
        assert_eq!(normalize_latex(r"\displaystyle\frac{1}{2}"), r"\frac{1}{2}");
        assert_eq!(normalize_latex(r"a\\b"), r"a\\b");
        assert_eq!(normalize_latex(r"\quadrant"), r"\quadrant");
    }

    #[test]
    fn test_matrix_marker() {
        assert!(has_matrix_environment(r"\begin{bmatrix}1\end{bmatrix}"));
        assert!(has_matrix_environment(r"\begin{cases}1\end{cases}"));
        assert!(has_matrix_environment(r"\begin{array}{cc}1\end{array}"));
        assert!(!has_matrix_environment(r"\frac{a}{b}"));
    }
}
