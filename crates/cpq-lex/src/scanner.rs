//! Core scanner implementation.
//!
//! The rule table is built once and shared for the lifetime of the
//! process; the [`Lexer`] itself is a lightweight cursor over one source
//! string.

use cpq_util::Ty;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::{Token, TokenKind};

/// What to do with the lexeme a rule matched.
enum RuleAction {
    /// Discard the lexeme (whitespace, newlines, comments).
    Ignore,
    /// Keep the lexeme as an invalid-character token.
    Invalid,
    /// Produce a token of a fixed kind.
    Token(TokenKind),
    /// Produce a token whose kind depends on the lexeme.
    With(fn(&str) -> TokenKind),
}

/// One scanner rule: an anchored pattern and its action.
struct Rule {
    pattern: Regex,
    action: RuleAction,
}

impl Rule {
    fn new(pattern: &str, action: RuleAction) -> Self {
        let anchored = format!(r"\A(?:{pattern})");
        Self {
            // The table is static; a malformed pattern is a bug in this file.
            pattern: Regex::new(&anchored).expect("scanner rule pattern must compile"),
            action,
        }
    }
}

/// The ordered rule table.
///
/// Order is meaningful twice over: keywords precede the identifier rule so
/// they win length ties, and the single-character catch-all sits last so it
/// only fires when nothing else matches at all.
static RULES: Lazy<Vec<Rule>> = Lazy::new(build_rules);

fn build_rules() -> Vec<Rule> {
    use RuleAction::{Ignore, Invalid, Token, With};

    vec![
        // Keywords
        Rule::new("break", Token(TokenKind::Break)),
        Rule::new("case", Token(TokenKind::Case)),
        Rule::new("default", Token(TokenKind::Default)),
        Rule::new("else", Token(TokenKind::Else)),
        Rule::new("if", Token(TokenKind::If)),
        Rule::new("input", Token(TokenKind::Input)),
        Rule::new("output", Token(TokenKind::Output)),
        Rule::new("switch", Token(TokenKind::Switch)),
        Rule::new("while", Token(TokenKind::While)),
        // Operators
        Rule::new("==|!=|>=|<=|>|<", Token(TokenKind::Relop)),
        Rule::new(r"\+|-", Token(TokenKind::Addop)),
        Rule::new(r"\*|/", Token(TokenKind::Mulop)),
        Rule::new(r"\|\|", Token(TokenKind::Or)),
        Rule::new("&&", Token(TokenKind::And)),
        Rule::new("!", Token(TokenKind::Not)),
        // Punctuation
        Rule::new(r"\(", Token(TokenKind::LParen)),
        Rule::new(r"\)", Token(TokenKind::RParen)),
        Rule::new(r"\{", Token(TokenKind::LBrace)),
        Rule::new(r"\}", Token(TokenKind::RBrace)),
        Rule::new(",", Token(TokenKind::Comma)),
        Rule::new(":", Token(TokenKind::Colon)),
        Rule::new(";", Token(TokenKind::Semicolon)),
        Rule::new("=", Token(TokenKind::Assign)),
        // Casts before the type keywords and identifiers
        Rule::new("static_cast<(?:int|float)>", With(cast_kind)),
        // Type keywords before the identifier rule
        Rule::new("int", Token(TokenKind::Int)),
        Rule::new("float", Token(TokenKind::Float)),
        Rule::new("[a-zA-Z][a-zA-Z0-9]*", Token(TokenKind::Id)),
        // Numbers; longest match prefers the float form when a fraction follows
        Rule::new(r"\d+", Token(TokenKind::Num)),
        Rule::new(r"\d+\.\d+", Token(TokenKind::Num)),
        // Skipped input
        Rule::new("\n", Ignore),
        Rule::new(r"\s", Ignore),
        Rule::new(r"/\*(?:[^*]|\*+[^*/])*\*+/", Ignore),
        // Catch-all, last on purpose
        Rule::new(".", Invalid),
    ]
}

fn cast_kind(lexeme: &str) -> TokenKind {
    if lexeme.contains("int") {
        TokenKind::Cast(Ty::Int)
    } else {
        TokenKind::Cast(Ty::Float)
    }
}

/// Lexer for CPL source code.
///
/// Create one per source string and call [`Lexer::tokenize`]. The returned
/// stream holds every non-ignored token, `Invalid` tokens included, each
/// tagged with the line it starts on.
pub struct Lexer<'a> {
    source: &'a str,
    cursor: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            cursor: 0,
            line: 1,
        }
    }

    /// Scans the entire source and returns the token stream.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while self.cursor < self.source.len() {
            let rest = &self.source[self.cursor..];

            let lexeme = match self.longest_match(rest) {
                Some((rule, lexeme)) => {
                    match &rule.action {
                        RuleAction::Ignore => {}
                        RuleAction::Invalid => {
                            tokens.push(Token::new(TokenKind::Invalid, lexeme, self.line));
                        }
                        RuleAction::Token(kind) => {
                            tokens.push(Token::new(kind.clone(), lexeme, self.line));
                        }
                        RuleAction::With(build) => {
                            tokens.push(Token::new(build(lexeme), lexeme, self.line));
                        }
                    }
                    lexeme
                }
                // Unreachable while the catch-all rule exists; treat a gap
                // in the table as an invalid character rather than looping.
                None => {
                    let ch_len = rest.chars().next().map_or(1, char::len_utf8);
                    let lexeme = &rest[..ch_len];
                    tokens.push(Token::new(TokenKind::Invalid, lexeme, self.line));
                    lexeme
                }
            };

            self.line += lexeme.matches('\n').count() as u32;
            self.cursor += lexeme.len();
        }

        tokens
    }

    /// Finds the rule with the longest match at the cursor. Ties are broken
    /// by table order: the first rule to reach the maximum length wins.
    fn longest_match(&self, rest: &'a str) -> Option<(&'static Rule, &'a str)> {
        let mut best: Option<(&'static Rule, &'a str)> = None;

        for rule in RULES.iter() {
            if let Some(m) = rule.pattern.find(rest) {
                let longer = best.map_or(true, |(_, lexeme)| m.end() > lexeme.len());
                if longer {
                    best = Some((rule, &rest[..m.end()]));
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_win_length_ties() {
        assert_eq!(kinds("break"), vec![TokenKind::Break]);
        assert_eq!(kinds("while"), vec![TokenKind::While]);
        assert_eq!(kinds("int"), vec![TokenKind::Int]);
    }

    #[test]
    fn test_longer_identifier_beats_keyword_prefix() {
        assert_eq!(kinds("breaker"), vec![TokenKind::Id]);
        assert_eq!(kinds("ifx"), vec![TokenKind::Id]);
        assert_eq!(kinds("integer"), vec![TokenKind::Id]);
    }

    #[test]
    fn test_numbers_longest_match() {
        let tokens = Lexer::new("3 3.14").tokenize();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "3");
        assert_eq!(tokens[0].num_ty(), Ty::Int);
        assert_eq!(tokens[1].lexeme, "3.14");
        assert_eq!(tokens[1].num_ty(), Ty::Float);
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        // "3." scans as NUM 3 followed by an invalid '.'
        let tokens = Lexer::new("3.").tokenize();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Num);
        assert_eq!(tokens[0].lexeme, "3");
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].lexeme, ".");
    }

    #[test]
    fn test_cast_targets() {
        assert_eq!(
            kinds("static_cast<int> static_cast<float>"),
            vec![TokenKind::Cast(Ty::Int), TokenKind::Cast(Ty::Float)]
        );
    }

    #[test]
    fn test_compound_operators_scan_as_one_token() {
        let tokens = Lexer::new("== != >= <= > < || &&").tokenize();
        let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["==", "!=", ">=", "<=", ">", "<", "||", "&&"]);
        assert_eq!(tokens[0].kind, TokenKind::Relop);
        assert_eq!(tokens[6].kind, TokenKind::Or);
        assert_eq!(tokens[7].kind, TokenKind::And);
    }

    #[test]
    fn test_not_versus_not_equal() {
        assert_eq!(kinds("!"), vec![TokenKind::Not]);
        assert_eq!(kinds("!="), vec![TokenKind::Relop]);
    }

    #[test]
    fn test_addop_mulop_carry_operator_text() {
        let tokens = Lexer::new("+ - * /").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Addop);
        assert_eq!(tokens[1].lexeme, "-");
        assert_eq!(tokens[2].kind, TokenKind::Mulop);
        assert_eq!(tokens[3].lexeme, "/");
    }

    #[test]
    fn test_comment_counts_lines() {
        let tokens = Lexer::new("/* first\nsecond */\nx").tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Id);
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_comment_with_inner_stars() {
        assert_eq!(kinds("/* a * b ** c */ x"), vec![TokenKind::Id]);
    }

    #[test]
    fn test_invalid_character_retained_with_line() {
        let tokens = Lexer::new("a\n@b").tokenize();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[1].lexeme, "@");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = Lexer::new("a = 1;\nb = 2;").tokenize();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[4].line, 2);
    }

    #[test]
    fn test_program_smoke() {
        let source = "int a, b;\n{\n  input(a);\n  a = a + 1;\n}";
        let kinds = kinds(source);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Id,
                TokenKind::Comma,
                TokenKind::Id,
                TokenKind::Semicolon,
                TokenKind::LBrace,
                TokenKind::Input,
                TokenKind::LParen,
                TokenKind::Id,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Id,
                TokenKind::Assign,
                TokenKind::Id,
                TokenKind::Addop,
                TokenKind::Num,
                TokenKind::Semicolon,
                TokenKind::RBrace,
            ]
        );
    }
}
