use lazy_static::lazy_static;
use regex::Regex;

/// Precedence tiers, loosest-binding first. The discriminant is the binding
/// power used by the precedence-climbing loop.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub enum Tier {
    Arrow,
    Assignment,
    Sigil,
    Or,
    And,
    Comparison,
    Dot,
    Ampersand,
    Additive,
    Multiplicative,
    Dollar,
}

impl Tier {
    /// Binding power of this tier.
    pub fn power(&self) -> u8 {
        *self as u8
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Arity {
    Binary,
    /// `not` never accepts a left operand.
    UnaryOnly,
}

/// How a table row matches an operator spelling: an exact keyword, or a
/// pattern over the full spelling.
#[derive(Debug)]
pub enum Matcher {
    Exact(&'static str),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, spelling: &str) -> bool {
        match self {
            Matcher::Exact(word) => *word == spelling,
            Matcher::Pattern(regex) => regex.is_match(spelling),
        }
    }
}

/// One row of the classification table.
#[derive(Debug)]
pub struct OperatorSpec {
    pub matcher: Matcher,
    pub tier: Tier,
    pub assoc: Assoc,
    pub arity: Arity,
}

impl OperatorSpec {
    fn pattern(pattern: &str, tier: Tier, assoc: Assoc) -> OperatorSpec {
        OperatorSpec {
            matcher: Matcher::Pattern(Regex::new(pattern).unwrap()),
            tier,
            assoc,
            arity: Arity::Binary,
        }
    }

    fn keyword(word: &'static str, tier: Tier) -> OperatorSpec {
        OperatorSpec {
            matcher: Matcher::Exact(word),
            tier,
            assoc: Assoc::Left,
            arity: Arity::Binary,
        }
    }
}

// The full operator character class, as it appears inside the patterns.
const OP: &str = "[=+\\-*/<>@$~&%|!?^.:\\\\]";

lazy_static! {
    /// The ordered classification table. Consulted top to bottom; the first
    /// row whose matcher covers the full spelling wins, so the ordering
    /// itself encodes classification priority (arrow suffixes before
    /// assignment-like spellings before comparison-like ones).
    pub static ref OPERATOR_TABLE: Vec<OperatorSpec> = vec![
        // Arrow-like suffixes
        OperatorSpec::pattern(&format!("^{OP}*->$"), Tier::Arrow, Assoc::Left),
        OperatorSpec::pattern(&format!("^{OP}*=>$"), Tier::Arrow, Assoc::Left),
        OperatorSpec::pattern(&format!("^{OP}*~>$"), Tier::Arrow, Assoc::Left),
        // Assignment-like: ends in `=`, first char none of < > ! = ~ ?
        OperatorSpec::pattern(
            &format!("^[+\\-*/@$&%|^.:\\\\]{OP}*=$"),
            Tier::Assignment,
            Assoc::Left,
        ),
        // First char @ : ? (the bare character included)
        OperatorSpec::pattern(&format!("^[@:?]{OP}*$"), Tier::Sigil, Assoc::Left),
        OperatorSpec::keyword("or", Tier::Or),
        OperatorSpec::keyword("xor", Tier::Or),
        OperatorSpec::keyword("and", Tier::And),
        OperatorSpec::keyword("in", Tier::Comparison),
        OperatorSpec::keyword("notin", Tier::Comparison),
        OperatorSpec::keyword("is", Tier::Comparison),
        OperatorSpec::keyword("isnot", Tier::Comparison),
        OperatorSpec {
            matcher: Matcher::Exact("not"),
            tier: Tier::Comparison,
            assoc: Assoc::Left,
            arity: Arity::UnaryOnly,
        },
        OperatorSpec::keyword("of", Tier::Comparison),
        // Generic comparison: first char = < > !
        OperatorSpec::pattern(&format!("^[=<>!]{OP}*$"), Tier::Comparison, Assoc::Left),
        OperatorSpec::pattern(&format!("^\\.{OP}*$"), Tier::Dot, Assoc::Left),
        OperatorSpec::pattern(&format!("^&{OP}*$"), Tier::Ampersand, Assoc::Left),
        OperatorSpec::pattern(&format!("^[+\\-~|]{OP}*$"), Tier::Additive, Assoc::Left),
        OperatorSpec::pattern(
            &format!("^[*%\\\\/]{OP}*$"),
            Tier::Multiplicative,
            Assoc::Left,
        ),
        OperatorSpec::keyword("div", Tier::Multiplicative),
        OperatorSpec::keyword("mod", Tier::Multiplicative),
        OperatorSpec::keyword("shl", Tier::Multiplicative),
        OperatorSpec::keyword("shr", Tier::Multiplicative),
        OperatorSpec::pattern(&format!("^\\${OP}*$"), Tier::Dollar, Assoc::Left),
        // The ^ family is the one right-associative family in the table.
        OperatorSpec::pattern(&format!("^\\^{OP}*$"), Tier::Dollar, Assoc::Right),
    ];
}

/// Classifies an operator's literal spelling. Pure lookup: first matching
/// table row wins. Returns `None` for spellings no row covers.
pub fn classify(spelling: &str) -> Option<&'static OperatorSpec> {
    OPERATOR_TABLE.iter().find(|spec| spec.matcher.matches(spelling))
}
