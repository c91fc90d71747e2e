//! Predictive parser for the CPL grammar.
//!
//! One token of lookahead suffices for CPL: every statement and factor is
//! distinguished by its first token. On the first token the grammar cannot
//! accept, the parser reports a single `UnexpectedToken` diagnostic and
//! gives up; there is no recovery, matching the one-error contract of the
//! syntax phase.

use cpq_lex::{Token, TokenKind};
use cpq_util::{Diagnostic, Handler};

use crate::tree::{ParseChild, ParseNode, Production};

/// Marker: a syntax error has already been reported to the handler.
struct Reported;

type ParseResult<T> = Result<T, Reported>;

/// Parses a filtered token stream into a tree rooted at `start`.
///
/// Returns `None` after recording an `UnexpectedToken` diagnostic. The
/// stream must not contain `Invalid` tokens; the driver filters them.
pub fn parse(tokens: &[Token], handler: &Handler) -> Option<ParseNode> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        handler,
    };
    parser.parse_start().ok()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Token stream primitives
    // =========================================================================

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Consumes the current token. Callers check presence via `peek` first.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.peek() {
            Some(t) if t.kind == kind => Ok(self.advance()),
            _ => self.error(kind.describe()),
        }
    }

    fn error<T>(&self, expected: &str) -> ParseResult<T> {
        let (line, found) = match self.peek() {
            Some(t) => (t.line, t.lexeme.as_str()),
            None => (
                self.tokens.last().map_or(1, |t| t.line),
                "end of input",
            ),
        };
        self.handler
            .emit(Diagnostic::unexpected_token(line, found, expected));
        Err(Reported)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_start(&mut self) -> ParseResult<ParseNode> {
        let declarations = self.parse_declarations()?;
        let block = self.parse_stmt_block()?;
        if self.pos < self.tokens.len() {
            return self.error("end of input");
        }
        Ok(ParseNode::new(
            Production::Start,
            vec![ParseChild::Node(declarations), ParseChild::Node(block)],
        ))
    }

    fn parse_declarations(&mut self) -> ParseResult<ParseNode> {
        let mut list = ParseNode::new(
            Production::Declarations,
            vec![ParseChild::Node(ParseNode::epsilon())],
        );
        while matches!(self.peek_kind(), Some(TokenKind::Int | TokenKind::Float)) {
            let declaration = self.parse_declaration()?;
            list = ParseNode::new(
                Production::Declarations,
                vec![ParseChild::Node(list), ParseChild::Node(declaration)],
            );
        }
        Ok(list)
    }

    fn parse_declaration(&mut self) -> ParseResult<ParseNode> {
        let ty = self.parse_type()?;
        let ids = self.parse_idlist()?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(ParseNode::new(
            Production::Declaration,
            vec![
                ParseChild::Node(ty),
                ParseChild::Node(ids),
                ParseChild::Token(semi),
            ],
        ))
    }

    fn parse_type(&mut self) -> ParseResult<ParseNode> {
        match self.peek_kind() {
            Some(TokenKind::Int | TokenKind::Float) => {
                let keyword = self.advance();
                Ok(ParseNode::new(
                    Production::Type,
                    vec![ParseChild::Token(keyword)],
                ))
            }
            _ => self.error("'int' or 'float'"),
        }
    }

    fn parse_idlist(&mut self) -> ParseResult<ParseNode> {
        let id = self.expect(TokenKind::Id)?;
        let mut list = ParseNode::new(Production::Idlist, vec![ParseChild::Token(id)]);
        while self.at(&TokenKind::Comma) {
            let comma = self.advance();
            let id = self.expect(TokenKind::Id)?;
            list = ParseNode::new(
                Production::Idlist,
                vec![
                    ParseChild::Node(list),
                    ParseChild::Token(comma),
                    ParseChild::Token(id),
                ],
            );
        }
        Ok(list)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_stmt_block(&mut self) -> ParseResult<ParseNode> {
        let open = self.expect(TokenKind::LBrace)?;
        let list = self.parse_stmtlist()?;
        let close = self.expect(TokenKind::RBrace)?;
        Ok(ParseNode::new(
            Production::StmtBlock,
            vec![
                ParseChild::Token(open),
                ParseChild::Node(list),
                ParseChild::Token(close),
            ],
        ))
    }

    fn parse_stmtlist(&mut self) -> ParseResult<ParseNode> {
        let mut list = ParseNode::new(
            Production::Stmtlist,
            vec![ParseChild::Node(ParseNode::epsilon())],
        );
        while self.starts_stmt() {
            let stmt = self.parse_stmt()?;
            list = ParseNode::new(
                Production::Stmtlist,
                vec![ParseChild::Node(list), ParseChild::Node(stmt)],
            );
        }
        Ok(list)
    }

    fn starts_stmt(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::Id
                    | TokenKind::Input
                    | TokenKind::Output
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::Switch
                    | TokenKind::Break
                    | TokenKind::LBrace
            )
        )
    }

    fn parse_stmt(&mut self) -> ParseResult<ParseNode> {
        let inner = match self.peek_kind() {
            Some(TokenKind::Id) => self.parse_assignment_stmt()?,
            Some(TokenKind::Input) => self.parse_input_stmt()?,
            Some(TokenKind::Output) => self.parse_output_stmt()?,
            Some(TokenKind::If) => self.parse_if_stmt()?,
            Some(TokenKind::While) => self.parse_while_stmt()?,
            Some(TokenKind::Switch) => self.parse_switch_stmt()?,
            Some(TokenKind::Break) => self.parse_break_stmt()?,
            Some(TokenKind::LBrace) => self.parse_stmt_block()?,
            _ => return self.error("a statement"),
        };
        Ok(ParseNode::new(
            Production::Stmt,
            vec![ParseChild::Node(inner)],
        ))
    }

    fn parse_assignment_stmt(&mut self) -> ParseResult<ParseNode> {
        let id = self.expect(TokenKind::Id)?;
        let assign = self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(ParseNode::new(
            Production::AssignmentStmt,
            vec![
                ParseChild::Token(id),
                ParseChild::Token(assign),
                ParseChild::Node(value),
                ParseChild::Token(semi),
            ],
        ))
    }

    fn parse_input_stmt(&mut self) -> ParseResult<ParseNode> {
        let keyword = self.expect(TokenKind::Input)?;
        let open = self.expect(TokenKind::LParen)?;
        let id = self.expect(TokenKind::Id)?;
        let close = self.expect(TokenKind::RParen)?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(ParseNode::new(
            Production::InputStmt,
            vec![
                ParseChild::Token(keyword),
                ParseChild::Token(open),
                ParseChild::Token(id),
                ParseChild::Token(close),
                ParseChild::Token(semi),
            ],
        ))
    }

    fn parse_output_stmt(&mut self) -> ParseResult<ParseNode> {
        let keyword = self.expect(TokenKind::Output)?;
        let open = self.expect(TokenKind::LParen)?;
        let value = self.parse_expression()?;
        let close = self.expect(TokenKind::RParen)?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(ParseNode::new(
            Production::OutputStmt,
            vec![
                ParseChild::Token(keyword),
                ParseChild::Token(open),
                ParseChild::Node(value),
                ParseChild::Token(close),
                ParseChild::Token(semi),
            ],
        ))
    }

    fn parse_if_stmt(&mut self) -> ParseResult<ParseNode> {
        let keyword = self.expect(TokenKind::If)?;
        let open = self.expect(TokenKind::LParen)?;
        let condition = self.parse_boolexpr()?;
        let close = self.expect(TokenKind::RParen)?;
        let then_stmt = self.parse_stmt()?;
        let else_kw = self.expect(TokenKind::Else)?;
        let else_stmt = self.parse_stmt()?;
        Ok(ParseNode::new(
            Production::IfStmt,
            vec![
                ParseChild::Token(keyword),
                ParseChild::Token(open),
                ParseChild::Node(condition),
                ParseChild::Token(close),
                ParseChild::Node(then_stmt),
                ParseChild::Token(else_kw),
                ParseChild::Node(else_stmt),
            ],
        ))
    }

    fn parse_while_stmt(&mut self) -> ParseResult<ParseNode> {
        let keyword = self.expect(TokenKind::While)?;
        let open = self.expect(TokenKind::LParen)?;
        let condition = self.parse_boolexpr()?;
        let close = self.expect(TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        Ok(ParseNode::new(
            Production::WhileStmt,
            vec![
                ParseChild::Token(keyword),
                ParseChild::Token(open),
                ParseChild::Node(condition),
                ParseChild::Token(close),
                ParseChild::Node(body),
            ],
        ))
    }

    fn parse_switch_stmt(&mut self) -> ParseResult<ParseNode> {
        let keyword = self.expect(TokenKind::Switch)?;
        let open = self.expect(TokenKind::LParen)?;
        let selector = self.parse_expression()?;
        let close = self.expect(TokenKind::RParen)?;
        let lbrace = self.expect(TokenKind::LBrace)?;
        let cases = self.parse_caselist()?;
        let default_kw = self.expect(TokenKind::Default)?;
        let colon = self.expect(TokenKind::Colon)?;
        let default_body = self.parse_stmtlist()?;
        let rbrace = self.expect(TokenKind::RBrace)?;
        Ok(ParseNode::new(
            Production::SwitchStmt,
            vec![
                ParseChild::Token(keyword),
                ParseChild::Token(open),
                ParseChild::Node(selector),
                ParseChild::Token(close),
                ParseChild::Token(lbrace),
                ParseChild::Node(cases),
                ParseChild::Token(default_kw),
                ParseChild::Token(colon),
                ParseChild::Node(default_body),
                ParseChild::Token(rbrace),
            ],
        ))
    }

    fn parse_caselist(&mut self) -> ParseResult<ParseNode> {
        let mut list = ParseNode::new(
            Production::Caselist,
            vec![ParseChild::Node(ParseNode::epsilon())],
        );
        while self.at(&TokenKind::Case) {
            let keyword = self.advance();
            let value = self.expect(TokenKind::Num)?;
            let colon = self.expect(TokenKind::Colon)?;
            let body = self.parse_stmtlist()?;
            list = ParseNode::new(
                Production::Caselist,
                vec![
                    ParseChild::Node(list),
                    ParseChild::Token(keyword),
                    ParseChild::Token(value),
                    ParseChild::Token(colon),
                    ParseChild::Node(body),
                ],
            );
        }
        Ok(list)
    }

    fn parse_break_stmt(&mut self) -> ParseResult<ParseNode> {
        let keyword = self.expect(TokenKind::Break)?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(ParseNode::new(
            Production::BreakStmt,
            vec![ParseChild::Token(keyword), ParseChild::Token(semi)],
        ))
    }

    // =========================================================================
    // Boolean expressions
    // =========================================================================

    fn parse_boolexpr(&mut self) -> ParseResult<ParseNode> {
        let first = self.parse_boolterm()?;
        let mut node = ParseNode::new(Production::Boolexpr, vec![ParseChild::Node(first)]);
        while self.at(&TokenKind::Or) {
            let op = self.advance();
            let rhs = self.parse_boolterm()?;
            node = ParseNode::new(
                Production::Boolexpr,
                vec![
                    ParseChild::Node(node),
                    ParseChild::Token(op),
                    ParseChild::Node(rhs),
                ],
            );
        }
        Ok(node)
    }

    fn parse_boolterm(&mut self) -> ParseResult<ParseNode> {
        let first = self.parse_boolfactor()?;
        let mut node = ParseNode::new(Production::Boolterm, vec![ParseChild::Node(first)]);
        while self.at(&TokenKind::And) {
            let op = self.advance();
            let rhs = self.parse_boolfactor()?;
            node = ParseNode::new(
                Production::Boolterm,
                vec![
                    ParseChild::Node(node),
                    ParseChild::Token(op),
                    ParseChild::Node(rhs),
                ],
            );
        }
        Ok(node)
    }

    fn parse_boolfactor(&mut self) -> ParseResult<ParseNode> {
        if self.at(&TokenKind::Not) {
            let not = self.advance();
            let open = self.expect(TokenKind::LParen)?;
            let inner = self.parse_boolexpr()?;
            let close = self.expect(TokenKind::RParen)?;
            return Ok(ParseNode::new(
                Production::Boolfactor,
                vec![
                    ParseChild::Token(not),
                    ParseChild::Token(open),
                    ParseChild::Node(inner),
                    ParseChild::Token(close),
                ],
            ));
        }
        let lhs = self.parse_expression()?;
        let op = self.expect(TokenKind::Relop)?;
        let rhs = self.parse_expression()?;
        Ok(ParseNode::new(
            Production::Boolfactor,
            vec![
                ParseChild::Node(lhs),
                ParseChild::Token(op),
                ParseChild::Node(rhs),
            ],
        ))
    }

    // =========================================================================
    // Arithmetic expressions
    // =========================================================================

    fn parse_expression(&mut self) -> ParseResult<ParseNode> {
        let first = self.parse_term()?;
        let mut node = ParseNode::new(Production::Expression, vec![ParseChild::Node(first)]);
        while self.at(&TokenKind::Addop) {
            let op = self.advance();
            let rhs = self.parse_term()?;
            node = ParseNode::new(
                Production::Expression,
                vec![
                    ParseChild::Node(node),
                    ParseChild::Token(op),
                    ParseChild::Node(rhs),
                ],
            );
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> ParseResult<ParseNode> {
        let first = self.parse_factor()?;
        let mut node = ParseNode::new(Production::Term, vec![ParseChild::Node(first)]);
        while self.at(&TokenKind::Mulop) {
            let op = self.advance();
            let rhs = self.parse_factor()?;
            node = ParseNode::new(
                Production::Term,
                vec![
                    ParseChild::Node(node),
                    ParseChild::Token(op),
                    ParseChild::Node(rhs),
                ],
            );
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> ParseResult<ParseNode> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => {
                let open = self.advance();
                let inner = self.parse_expression()?;
                let close = self.expect(TokenKind::RParen)?;
                Ok(ParseNode::new(
                    Production::Factor,
                    vec![
                        ParseChild::Token(open),
                        ParseChild::Node(inner),
                        ParseChild::Token(close),
                    ],
                ))
            }
            Some(TokenKind::Cast(_)) => {
                let cast = self.advance();
                let open = self.expect(TokenKind::LParen)?;
                let inner = self.parse_expression()?;
                let close = self.expect(TokenKind::RParen)?;
                Ok(ParseNode::new(
                    Production::Factor,
                    vec![
                        ParseChild::Token(cast),
                        ParseChild::Token(open),
                        ParseChild::Node(inner),
                        ParseChild::Token(close),
                    ],
                ))
            }
            Some(TokenKind::Id) | Some(TokenKind::Num) => {
                let token = self.advance();
                Ok(ParseNode::new(
                    Production::Factor,
                    vec![ParseChild::Token(token)],
                ))
            }
            _ => self.error("an expression"),
        }
    }
}
