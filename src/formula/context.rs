// Per-document math context
//
// Every math element of a document is replaced by a placeholder token while
// the document body is generated; the finished OMML for each token is kept
// here until the serialized body is patched.

use memchr::memmem;
use std::collections::HashSet;
use std::fmt::Write as FmtWrite;

/// Prefix and suffix of a placeholder token.
pub const TOKEN_PREFIX: &str = "__MATH_";
pub const TOKEN_SUFFIX: &str = "__";

/// One pending splice: a token standing in for an OMML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathReplacement {
    /// Placeholder text, e.g. `__MATH_000001__`
    pub token: String,
    /// OMML fragment (`<m:oMath>...</m:oMath>`)
    pub omml: String,
    /// Whether the fragment is display math
    pub display: bool,
}

/// Math state for one document conversion.
///
/// Owned by a single export call and passed by `&mut` through the HTML
/// walker. Tokens are issued from a monotonically increasing counter and are
/// never reused within a context. Counter values whose token already occurs
/// in the document text are reserved and never issued.
#[derive(Debug, Default)]
pub struct MathContext {
    counter: u32,
    reserved: HashSet<u32>,
    replacements: Vec<MathReplacement>,
}

impl MathContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve every token-shaped string found in `text`.
    pub fn reserve_existing(&mut self, text: &str) {
        let bytes = text.as_bytes();
        for start in memmem::find_iter(bytes, TOKEN_PREFIX.as_bytes()) {
            let digits_start = start + TOKEN_PREFIX.len();
            let digits = bytes[digits_start..].iter().take_while(|b| b.is_ascii_digit()).count();
            if digits < 6 || !text[digits_start + digits..].starts_with(TOKEN_SUFFIX) {
                continue;
            }
            if let Ok(n) = text[digits_start..digits_start + digits].parse::<u32>() {
                self.reserved.insert(n);
            }
        }
    }

    /// Issue the next token without registering a fragment.
    pub fn next_token(&mut self) -> String {
        self.counter += 1;
        while self.reserved.contains(&self.counter) {
            self.counter += 1;
        }
        format_token(self.counter)
    }

    /// Register an OMML fragment and return the token that stands in for it.
    pub fn register(&mut self, omml: String, display: bool) -> String {
        let token = self.next_token();
        self.replacements.push(MathReplacement {
            token: token.clone(),
            omml,
            display,
        });
        token
    }

    /// Registered replacements in registration order.
    pub fn replacements(&self) -> &[MathReplacement] {
        &self.replacements
    }

    /// Number of registered fragments.
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Whether no fragment has been registered.
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Consume the context, yielding its replacements.
    pub fn into_replacements(self) -> Vec<MathReplacement> {
        self.replacements
    }
}

/// Format a token for a counter value: `__MATH_` + six digits + `__`.
pub fn format_token(n: u32) -> String {
    let mut token = String::with_capacity(TOKEN_PREFIX.len() + 6 + TOKEN_SUFFIX.len());
    token.push_str(TOKEN_PREFIX);
    let _ = write!(token, "{:06}", n);
    token.push_str(TOKEN_SUFFIX);
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        assert_eq!(format_token(1), "__MATH_000001__");
        assert_eq!(format_token(123456), "__MATH_123456__");
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut ctx = MathContext::new();
        let tokens: Vec<String> = (0..50)
            .map(|i| ctx.register(format!("<m:oMath>{i}</m:oMath>"), i % 2 == 0))
            .collect();
        let unique: HashSet<&String> = tokens.iter().collect();
        assert_eq!(unique.len(), 50);
        assert_eq!(ctx.len(), 50);
        assert_eq!(ctx.replacements()[0].token, "__MATH_000001__");
    }

    #[test]
    fn test_unregistered_tokens_are_not_reused() {
        let mut ctx = MathContext::new();
        let skipped = ctx.next_token();
        let registered = ctx.register(String::new(), false);
        assert_ne!(skipped, registered);
    }

    #[test]
    fn test_reserved_tokens_are_skipped() {
        let mut ctx = MathContext::new();
        ctx.reserve_existing("see __MATH_000001__ and __MATH_000003__, not __MATH_2__ or __MATH_000004_");
        assert_eq!(ctx.next_token(), "__MATH_000002__");
        assert_eq!(ctx.register(String::new(), false), "__MATH_000004__");
    }
}
