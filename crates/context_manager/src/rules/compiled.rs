use chat_core::{RegexRule, RuleLayer, Role};
use regex::{Regex, RegexBuilder};

use crate::error::RuleError;
use crate::rules::resolver::ResolvedRule;

/// Compiled patterns larger than this are rejected.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// A resolved rule ready to run
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: RegexRule,
    pub layer: RuleLayer,
    regex: Regex,
    replacement: String,
    global: bool,
}

impl CompiledRule {
    pub fn compile(resolved: &ResolvedRule<'_>) -> Result<Self, RuleError> {
        let rule = resolved.rule;
        let mut builder = RegexBuilder::new(&rule.regex);
        builder.size_limit(REGEX_SIZE_LIMIT);
        let mut global = false;

        for flag in rule.flags.chars() {
            match flag {
                'g' => global = true,
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                // Unicode is always on.
                'u' => {}
                other => {
                    return Err(RuleError::UnsupportedFlag {
                        rule_id: rule.id.clone(),
                        flag: other,
                    })
                }
            }
        }

        let regex = builder.build().map_err(|e| RuleError::InvalidPattern {
            rule_id: rule.id.clone(),
            reason: e.to_string(),
        })?;

        let groups = regex.captures_len().saturating_sub(1);
        Ok(Self {
            rule: rule.clone(),
            layer: resolved.layer,
            replacement: normalize_replacement(&rule.replacement, groups),
            regex,
            global,
        })
    }

    pub fn id(&self) -> &str {
        &self.rule.id
    }

    pub fn targets(&self, role: Role, depth: usize) -> bool {
        self.rule.matches_target(role, depth)
    }

    /// Rewrite `text`; every match with the `g` flag, the first otherwise.
    pub fn apply(&self, text: &str) -> String {
        let limit = if self.global { 0 } else { 1 };
        self.regex
            .replacen(text, limit, self.replacement.as_str())
            .into_owned()
    }
}

/// Compile every resolved rule, keeping failures apart so one bad rule does
/// not take the others down.
pub fn compile_rules(resolved: &[ResolvedRule<'_>]) -> (Vec<CompiledRule>, Vec<RuleError>) {
    let mut compiled = Vec::with_capacity(resolved.len());
    let mut failures = Vec::new();
    for rule in resolved {
        match CompiledRule::compile(rule) {
            Ok(rule) => compiled.push(rule),
            Err(e) => failures.push(e),
        }
    }
    (compiled, failures)
}

/// Translate `$&`, `$1` and `$<name>` references into the `${..}` form the
/// regex crate expects. Any other `$` is kept literally.
///
/// `groups` is the number of capture groups in the pattern. A two-digit
/// reference like `$10` names group 10 only when it exists; otherwise it is
/// group 1 followed by a literal `0`. References to missing groups stay
/// literal text.
pub fn normalize_replacement(replacement: &str, groups: usize) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some('&') => {
                chars.next();
                out.push_str("${0}");
            }
            Some(d) if d.is_ascii_digit() => {
                let first = d.to_digit(10).unwrap_or(0) as usize;
                let mut ahead = chars.clone();
                ahead.next();
                let two_digit = ahead
                    .peek()
                    .and_then(|c| c.to_digit(10))
                    .map(|second| first * 10 + second as usize)
                    .filter(|n| (1..=groups).contains(n));

                if let Some(group) = two_digit {
                    chars.next();
                    chars.next();
                    out.push_str(&format!("${{{group}}}"));
                } else if (1..=groups).contains(&first) {
                    chars.next();
                    out.push_str(&format!("${{{first}}}"));
                } else {
                    out.push_str("$$");
                }
            }
            Some('<') => {
                let rest: String = chars.clone().skip(1).collect();
                match rest.find('>') {
                    Some(end) if end > 0 => {
                        let name = rest[..end].to_string();
                        // '<' + name + '>'
                        for _ in 0..name.chars().count() + 2 {
                            chars.next();
                        }
                        out.push_str("${");
                        out.push_str(&name);
                        out.push('}');
                    }
                    _ => out.push_str("$$"),
                }
            }
            Some('{') => out.push('$'),
            _ => out.push_str("$$"),
        }
    }
    out
}
