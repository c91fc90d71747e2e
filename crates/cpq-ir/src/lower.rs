//! Tree-directed translation from the parse tree to labeled quads.
//!
//! One post-order pass: each production reads its children's synthesized
//! attributes and emits its own. Expression-like nodes synthesize
//! `(code, value, type)`; statement-like nodes synthesize `(code, breaks)`.
//! After an upstream error a node's type is `None`, and dependent nodes
//! propagate silently instead of piling up follow-on diagnostics.

use cpq_lex::{Token, TokenKind};
use cpq_par::{ParseChild, ParseNode, Production};
use cpq_sem::{Symbol, SymbolTable};
use cpq_util::{Diagnostic, Handler, Ty};

use crate::quad::{Instr, LabelId, Opcode, Quad};

/// Synthesized attributes of one parse subtree.
#[derive(Default)]
struct Attr {
    /// Instruction sequence, possibly empty.
    code: Vec<Instr>,
    /// Name or literal holding the subtree's result (expressions only).
    value: String,
    /// Result type; `None` after an upstream error.
    ty: Option<Ty>,
    /// Break placeholders not yet claimed by a `while`/`switch`.
    breaks: Vec<BreakMark>,
}

/// An unresolved `break`: its source line and the position of its
/// placeholder jump inside the owning `code` vector.
struct BreakMark {
    line: u32,
    at: usize,
}

/// One `case` arm of a switch, in source order.
struct CaseArm {
    value: i64,
    body: Attr,
}

/// Appends `src` to `dst`, shifting break positions by the splice offset.
fn splice(dst: &mut Attr, src: Attr) {
    let offset = dst.code.len();
    dst.code.extend(src.code);
    dst.breaks.extend(src.breaks.into_iter().map(|mark| BreakMark {
        line: mark.line,
        at: mark.at + offset,
    }));
}

/// Appends `src` to `dst` and binds every break in `src` to `target`.
fn splice_bound(dst: &mut Attr, src: Attr, target: LabelId) {
    let offset = dst.code.len();
    dst.code.extend(src.code);
    for mark in src.breaks {
        dst.code[offset + mark.at] = Instr::Jump { target };
    }
}

/// Lowers a parse tree rooted at `start` into a labeled quad program
/// ending in `HALT`.
///
/// Semantic and symbol errors go to `handler`; the returned program is
/// only meaningful when the handler stays empty.
pub fn lower_program(root: &ParseNode, table: &SymbolTable, handler: &Handler) -> Vec<Instr> {
    IrBuilder {
        table,
        handler,
        next_temp: 0,
        next_label: 0,
    }
    .program(root)
}

/// Per-compilation lowering state: the temp and label counters plus the
/// inputs shared across the walk.
struct IrBuilder<'a> {
    table: &'a SymbolTable,
    handler: &'a Handler,
    next_temp: u32,
    next_label: u32,
}

impl<'a> IrBuilder<'a> {
    fn fresh_temp(&mut self) -> String {
        let name = format!("t{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    fn fresh_label(&mut self) -> LabelId {
        let label = LabelId(self.next_label);
        self.next_label += 1;
        label
    }

    /// Resolves a name, reporting a diagnostic on a miss.
    fn lookup(&self, token: &Token) -> Option<&'a Symbol> {
        match self.table.lookup(&token.lexeme) {
            Some(symbol) => Some(symbol),
            None => {
                self.handler
                    .emit(Diagnostic::symbol_undefined(token.line, &token.lexeme));
                None
            }
        }
    }

    // =========================================================================
    // Program and statements
    // =========================================================================

    fn program(&mut self, root: &ParseNode) -> Vec<Instr> {
        debug_assert!(root.is(Production::Start));
        let mut attr = self.stmt_block(root.node(1));
        attr.code.push(Instr::Op(Quad::new(Opcode::Halt, "", "", "")));

        // Breaks that no while/switch claimed.
        for mark in &attr.breaks {
            self.handler
                .emit(Diagnostic::semantic(mark.line, "break outside while/switch"));
        }

        attr.code
    }

    fn stmt_block(&mut self, node: &ParseNode) -> Attr {
        self.stmtlist(node.node(1))
    }

    fn stmtlist(&mut self, node: &ParseNode) -> Attr {
        if node.node(0).is(Production::Stmtlist) {
            let mut attr = self.stmtlist(node.node(0));
            let stmt = self.stmt(node.node(1));
            splice(&mut attr, stmt);
            attr
        } else {
            Attr::default()
        }
    }

    fn stmt(&mut self, node: &ParseNode) -> Attr {
        let inner = node.node(0);
        match inner.prod {
            Production::AssignmentStmt => self.assignment_stmt(inner),
            Production::InputStmt => self.input_stmt(inner),
            Production::OutputStmt => self.output_stmt(inner),
            Production::IfStmt => self.if_stmt(inner),
            Production::WhileStmt => self.while_stmt(inner),
            Production::SwitchStmt => self.switch_stmt(inner),
            Production::BreakStmt => self.break_stmt(inner),
            Production::StmtBlock => self.stmt_block(inner),
            other => panic!("statement node holds {other:?}"),
        }
    }

    fn assignment_stmt(&mut self, node: &ParseNode) -> Attr {
        let value = self.expression(node.node(2));
        let target = self.lookup(node.token(0));
        let assign_line = node.token(1).line;

        let (Some(symbol), Some(value_ty)) = (target, value.ty) else {
            return Attr {
                code: value.code,
                ..Attr::default()
            };
        };

        match (symbol.ty, value_ty) {
            (Ty::Int, Ty::Float) => {
                self.handler
                    .emit(Diagnostic::semantic(assign_line, "cannot assign float to int"));
                Attr::default()
            }
            (Ty::Float, Ty::Int) => {
                // Widen through a temporary, then store.
                let mut attr = Attr {
                    code: value.code,
                    ..Attr::default()
                };
                let tmp = self.fresh_temp();
                attr.code.push(Instr::Op(Quad::new(
                    Opcode::cast(Ty::Float),
                    tmp.clone(),
                    value.value,
                    "",
                )));
                attr.code.push(Instr::Op(Quad::new(
                    Opcode::assign(Ty::Float),
                    symbol.name.clone(),
                    tmp,
                    "",
                )));
                attr
            }
            (ty, _) => {
                let mut attr = Attr {
                    code: value.code,
                    ..Attr::default()
                };
                attr.code.push(Instr::Op(Quad::new(
                    Opcode::assign(ty),
                    symbol.name.clone(),
                    value.value,
                    "",
                )));
                attr
            }
        }
    }

    fn input_stmt(&mut self, node: &ParseNode) -> Attr {
        let Some(symbol) = self.lookup(node.token(2)) else {
            return Attr::default();
        };
        Attr {
            code: vec![Instr::Op(Quad::new(
                Opcode::input(symbol.ty),
                symbol.name.clone(),
                "",
                "",
            ))],
            ..Attr::default()
        }
    }

    fn output_stmt(&mut self, node: &ParseNode) -> Attr {
        let value = self.expression(node.node(2));
        let mut attr = Attr {
            code: value.code,
            ..Attr::default()
        };
        if let Some(ty) = value.ty {
            attr.code
                .push(Instr::Op(Quad::new(Opcode::output(ty), value.value, "", "")));
        }
        attr
    }

    fn if_stmt(&mut self, node: &ParseNode) -> Attr {
        let condition = self.boolexpr(node.node(2));
        let then_stmt = self.stmt(node.node(4));
        let else_stmt = self.stmt(node.node(6));

        let false_label = self.fresh_label();
        let end_label = self.fresh_label();

        let cond_value = condition.value.clone();
        let mut attr = Attr::default();
        splice(&mut attr, condition);
        attr.code.push(Instr::JumpZero {
            target: false_label,
            value: cond_value,
        });
        splice(&mut attr, then_stmt);
        attr.code.push(Instr::Jump { target: end_label });
        attr.code.push(Instr::Label(false_label));
        splice(&mut attr, else_stmt);
        attr.code.push(Instr::Label(end_label));
        attr
    }

    fn while_stmt(&mut self, node: &ParseNode) -> Attr {
        let condition = self.boolexpr(node.node(2));
        let body = self.stmt(node.node(4));

        let cond_label = self.fresh_label();
        let end_label = self.fresh_label();

        let cond_value = condition.value.clone();
        let mut attr = Attr::default();
        attr.code.push(Instr::Label(cond_label));
        splice(&mut attr, condition);
        attr.code.push(Instr::JumpZero {
            target: end_label,
            value: cond_value,
        });
        splice_bound(&mut attr, body, end_label);
        attr.code.push(Instr::Jump { target: cond_label });
        attr.code.push(Instr::Label(end_label));
        attr
    }

    fn switch_stmt(&mut self, node: &ParseNode) -> Attr {
        let switch_line = node.token(0).line;
        let selector = self.expression(node.node(2));
        let arms = self.caselist(node.node(5));
        let default_body = self.stmtlist(node.node(8));

        match selector.ty {
            Some(Ty::Int) => {}
            Some(Ty::Float) => {
                self.handler.emit(Diagnostic::semantic(
                    switch_line,
                    "switch condition must be integer",
                ));
                return Attr::default();
            }
            None => return Attr::default(),
        }

        let case_labels: Vec<LabelId> = arms.iter().map(|_| self.fresh_label()).collect();
        let default_label = self.fresh_label();
        let end_label = self.fresh_label();
        // One comparison temporary serves every case test.
        let test = self.fresh_temp();

        let selector_value = selector.value.clone();
        let mut attr = Attr::default();
        splice(&mut attr, selector);

        let arm_count = arms.len();
        for (i, arm) in arms.into_iter().enumerate() {
            attr.code.push(Instr::Label(case_labels[i]));
            attr.code.push(Instr::Op(Quad::new(
                Opcode::for_op("==", Ty::Int),
                test.clone(),
                selector_value.clone(),
                arm.value.to_string(),
            )));
            let miss = if i + 1 < arm_count {
                case_labels[i + 1]
            } else {
                default_label
            };
            attr.code.push(Instr::JumpZero {
                target: miss,
                value: test.clone(),
            });
            // Case bodies fall through into the next body unless a break
            // diverts to the end label.
            splice_bound(&mut attr, arm.body, end_label);
        }

        attr.code.push(Instr::Label(default_label));
        splice_bound(&mut attr, default_body, end_label);
        attr.code.push(Instr::Label(end_label));
        attr
    }

    fn caselist(&mut self, node: &ParseNode) -> Vec<CaseArm> {
        if !node.node(0).is(Production::Caselist) {
            return Vec::new();
        }
        let mut arms = self.caselist(node.node(0));
        let case_line = node.token(1).line;
        let num = node.token(2);
        let body = self.stmtlist(node.node(4));

        if num.num_ty() != Ty::Int {
            self.handler.emit(Diagnostic::semantic(
                case_line,
                "switch case value must be integer",
            ));
            return arms;
        }
        let value = match num.lexeme.parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.handler.emit(Diagnostic::semantic(
                    case_line,
                    "switch case value out of range",
                ));
                return arms;
            }
        };
        if arms.iter().any(|arm| arm.value == value) {
            self.handler
                .emit(Diagnostic::semantic(case_line, "duplicate switch case value"));
            return arms;
        }

        arms.push(CaseArm { value, body });
        arms
    }

    fn break_stmt(&mut self, node: &ParseNode) -> Attr {
        let line = node.token(0).line;
        Attr {
            code: vec![Instr::Jump {
                target: LabelId::UNBOUND,
            }],
            breaks: vec![BreakMark { line, at: 0 }],
            ..Attr::default()
        }
    }

    // =========================================================================
    // Arithmetic expressions
    // =========================================================================

    fn expression(&mut self, node: &ParseNode) -> Attr {
        if node.node(0).is(Production::Expression) {
            let lhs = self.expression(node.node(0));
            let rhs = self.term(node.node(2));
            self.binary(lhs, node.token(1), rhs)
        } else {
            self.term(node.node(0))
        }
    }

    fn term(&mut self, node: &ParseNode) -> Attr {
        if node.node(0).is(Production::Term) {
            let lhs = self.term(node.node(0));
            let rhs = self.factor(node.node(2));
            self.binary(lhs, node.token(1), rhs)
        } else {
            self.factor(node.node(0))
        }
    }

    fn factor(&mut self, node: &ParseNode) -> Attr {
        let first = match &node.children[0] {
            ParseChild::Token(token) => token,
            ParseChild::Node(_) => panic!("factor starts with a node"),
        };
        match &first.kind {
            TokenKind::Id => self.id_factor(first),
            TokenKind::Num => Attr {
                value: first.lexeme.clone(),
                ty: Some(first.num_ty()),
                ..Attr::default()
            },
            TokenKind::LParen => self.expression(node.node(1)),
            TokenKind::Cast(target) => self.cast_factor(*target, node.node(2)),
            other => panic!("factor starts with {other:?}"),
        }
    }

    fn id_factor(&mut self, token: &Token) -> Attr {
        match self.lookup(token) {
            Some(symbol) => Attr {
                value: symbol.name.clone(),
                ty: Some(symbol.ty),
                ..Attr::default()
            },
            None => Attr {
                value: token.lexeme.clone(),
                ..Attr::default()
            },
        }
    }

    fn cast_factor(&mut self, target: Ty, inner: &ParseNode) -> Attr {
        let value = self.expression(inner);
        let Some(value_ty) = value.ty else {
            return value;
        };

        let mut attr = Attr {
            code: value.code,
            ..Attr::default()
        };
        let tmp = self.fresh_temp();
        let quad = if target != value_ty {
            Quad::new(Opcode::cast(target), tmp.clone(), value.value, "")
        } else {
            // Same-type cast degenerates to an assignment.
            Quad::new(Opcode::assign(target), tmp.clone(), value.value, "")
        };
        attr.code.push(Instr::Op(quad));
        attr.value = tmp;
        attr.ty = Some(target);
        attr
    }

    /// Emits `dest = left op right` after operand coercion.
    fn binary(&mut self, lhs: Attr, op: &Token, rhs: Attr) -> Attr {
        let (mut attr, left, right, ty) = self.coerce(lhs, rhs);
        let Some(ty) = ty else {
            return attr;
        };
        let dest = self.fresh_temp();
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op(&op.lexeme, ty),
            dest.clone(),
            left,
            right,
        )));
        attr.value = dest;
        attr.ty = Some(ty);
        attr
    }

    /// Merges both operands' code. On mixed int/float operands the result
    /// is float and the integer side is widened through a fresh temporary;
    /// the rewritten operand values and the common type come back to the
    /// caller.
    fn coerce(&mut self, lhs: Attr, rhs: Attr) -> (Attr, String, String, Option<Ty>) {
        let lhs_ty = lhs.ty;
        let rhs_ty = rhs.ty;
        let lhs_value = lhs.value.clone();
        let rhs_value = rhs.value.clone();

        let mut attr = Attr::default();
        splice(&mut attr, lhs);
        splice(&mut attr, rhs);

        match (lhs_ty, rhs_ty) {
            (Some(l), Some(r)) if l != r => {
                let tmp = self.fresh_temp();
                let int_side = if l == Ty::Int { lhs_value.clone() } else { rhs_value.clone() };
                attr.code.push(Instr::Op(Quad::new(
                    Opcode::cast(Ty::Float),
                    tmp.clone(),
                    int_side,
                    "",
                )));
                let (left, right) = if l == Ty::Int {
                    (tmp, rhs_value)
                } else {
                    (lhs_value, tmp)
                };
                (attr, left, right, Some(Ty::Float))
            }
            (Some(l), Some(_)) => (attr, lhs_value, rhs_value, Some(l)),
            _ => (attr, lhs_value, rhs_value, None),
        }
    }

    // =========================================================================
    // Boolean expressions
    // =========================================================================
    //
    // CPL has no boolean type: every boolexpr/boolterm/boolfactor yields an
    // integer 0 or 1, whatever its operand types were.

    fn boolexpr(&mut self, node: &ParseNode) -> Attr {
        let mut attr = if node.node(0).is(Production::Boolexpr) {
            let lhs = self.boolexpr(node.node(0));
            let rhs = self.boolterm(node.node(2));
            self.or(lhs, rhs)
        } else {
            self.boolterm(node.node(0))
        };
        attr.ty = attr.ty.map(|_| Ty::Int);
        attr
    }

    fn boolterm(&mut self, node: &ParseNode) -> Attr {
        let mut attr = if node.node(0).is(Production::Boolterm) {
            let lhs = self.boolterm(node.node(0));
            let rhs = self.boolfactor(node.node(2));
            self.and(lhs, rhs)
        } else {
            self.boolfactor(node.node(0))
        };
        attr.ty = attr.ty.map(|_| Ty::Int);
        attr
    }

    fn boolfactor(&mut self, node: &ParseNode) -> Attr {
        let negated = node.children[0]
            .as_token()
            .map_or(false, |t| t.kind == TokenKind::Not);

        let mut attr = if negated {
            self.not(node.node(2))
        } else {
            let lhs = self.expression(node.node(0));
            let op = node.token(1);
            let rhs = self.expression(node.node(2));
            match op.lexeme.as_str() {
                ">=" => self.ordered_or_equal(lhs, rhs, ">"),
                "<=" => self.ordered_or_equal(lhs, rhs, "<"),
                _ => self.binary(lhs, op, rhs),
            }
        };
        attr.ty = attr.ty.map(|_| Ty::Int);
        attr
    }

    /// `a || b`: both inputs are 0/1, so their sum is positive exactly
    /// when at least one is set.
    fn or(&mut self, lhs: Attr, rhs: Attr) -> Attr {
        let (mut attr, left, right, ty) = self.coerce(lhs, rhs);
        let Some(ty) = ty else {
            return attr;
        };
        let sum = self.fresh_temp();
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op("+", ty),
            sum.clone(),
            left,
            right,
        )));
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op(">", ty),
            sum.clone(),
            sum.clone(),
            "0",
        )));
        attr.value = sum;
        attr.ty = Some(Ty::Int);
        attr
    }

    /// `a && b`: both are 1 exactly when `(a == 1)` equals `b`.
    fn and(&mut self, lhs: Attr, rhs: Attr) -> Attr {
        let (mut attr, left, right, ty) = self.coerce(lhs, rhs);
        let Some(ty) = ty else {
            return attr;
        };
        let first = self.fresh_temp();
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op("==", ty),
            first.clone(),
            left,
            "1",
        )));
        let result = self.fresh_temp();
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op("==", ty),
            result.clone(),
            right,
            first,
        )));
        attr.value = result;
        attr.ty = Some(Ty::Int);
        attr
    }

    /// `!(B)`: the operand is 0/1, so compare against 1 in place.
    fn not(&mut self, inner: &ParseNode) -> Attr {
        let mut attr = self.boolexpr(inner);
        let Some(ty) = attr.ty else {
            return attr;
        };
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op("!=", ty),
            attr.value.clone(),
            attr.value.clone(),
            "1",
        )));
        attr
    }

    /// `>=` and `<=`, composed from the primitive comparisons:
    /// `eq = (a == b); res = (a REL b); res = res + eq; res = res > 0`.
    fn ordered_or_equal(&mut self, lhs: Attr, rhs: Attr, strict_op: &str) -> Attr {
        let (mut attr, left, right, ty) = self.coerce(lhs, rhs);
        let Some(ty) = ty else {
            return attr;
        };
        let eq = self.fresh_temp();
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op("==", ty),
            eq.clone(),
            left.clone(),
            right.clone(),
        )));
        let result = self.fresh_temp();
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op(strict_op, ty),
            result.clone(),
            left,
            right,
        )));
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op("+", Ty::Int),
            result.clone(),
            result.clone(),
            eq,
        )));
        attr.code.push(Instr::Op(Quad::new(
            Opcode::for_op(">", Ty::Int),
            result.clone(),
            result.clone(),
            "0",
        )));
        attr.value = result;
        attr.ty = Some(Ty::Int);
        attr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpq_lex::Lexer;

    fn lower_source(source: &str) -> (Vec<Instr>, Handler) {
        let handler = Handler::new();
        let tokens = Lexer::new(source).tokenize();
        let tree = cpq_par::parse(&tokens, &handler).expect("parse should succeed");
        let table = cpq_sem::build_symbol_table(&tree, &handler);
        let ir = lower_program(&tree, &table, &handler);
        (ir, handler)
    }

    fn render(ir: &[Instr]) -> Vec<String> {
        ir.iter()
            .map(|instr| match instr {
                Instr::Op(quad) => quad.to_string(),
                Instr::Label(label) => format!("label {label}"),
                Instr::Jump { target } => format!("jump {target}"),
                Instr::JumpZero { target, value } => format!("jump_zero {target} {value}"),
            })
            .collect()
    }

    fn lower_ok(source: &str) -> Vec<String> {
        let (ir, handler) = lower_source(source);
        assert!(
            !handler.has_errors(),
            "unexpected errors: {:?}",
            handler.diagnostics()
        );
        render(&ir)
    }

    fn messages(handler: &Handler) -> Vec<String> {
        handler.diagnostics().into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn test_int_assignment() {
        assert_eq!(lower_ok("int a;\n{ a = 3; }"), vec!["IASN a 3", "HALT"]);
    }

    #[test]
    fn test_int_arithmetic_chain() {
        assert_eq!(
            lower_ok("int a;\n{ a = 3 + 2 * a; }"),
            vec!["IMLT t0 2 a", "IADD t1 3 t0", "IASN a t1", "HALT"]
        );
    }

    #[test]
    fn test_mixed_operands_widen_the_int_side() {
        assert_eq!(
            lower_ok("int a;\nfloat b;\n{ b = b + a; }"),
            vec!["ITOR t0 a", "RADD t1 b t0", "RASN b t1", "HALT"]
        );
    }

    #[test]
    fn test_float_from_int_assignment_casts() {
        assert_eq!(
            lower_ok("int a;\nfloat b;\n{ b = a; }"),
            vec!["ITOR t0 a", "RASN b t0", "HALT"]
        );
    }

    #[test]
    fn test_int_addition_stays_int_before_float_store() {
        assert_eq!(
            lower_ok("int a;\nfloat b;\n{ b = a + 1; }"),
            vec!["IADD t0 a 1", "ITOR t1 t0", "RASN b t1", "HALT"]
        );
    }

    #[test]
    fn test_int_from_float_assignment_rejected() {
        let (ir, handler) = lower_source("int a;\nfloat b;\n{ a = b; }");
        assert_eq!(messages(&handler), vec!["cannot assign float to int"]);
        assert_eq!(handler.diagnostics()[0].line, 3);
        // the bad assignment contributes no code
        assert_eq!(render(&ir), vec!["HALT"]);
    }

    #[test]
    fn test_cast_factor_narrows_explicitly() {
        assert_eq!(
            lower_ok("int a;\nfloat b;\n{ a = static_cast<int>(b); }"),
            vec!["RTOI t0 b", "IASN a t0", "HALT"]
        );
    }

    #[test]
    fn test_cast_to_same_type_is_assignment() {
        assert_eq!(
            lower_ok("float b, c;\n{ c = static_cast<float>(b); }"),
            vec!["RASN t0 b", "RASN c t0", "HALT"]
        );
    }

    #[test]
    fn test_input_output() {
        assert_eq!(
            lower_ok("int a;\n{ input(a); output(a); }"),
            vec!["IINP a", "IPRT a", "HALT"]
        );
    }

    #[test]
    fn test_output_of_float_expression() {
        assert_eq!(
            lower_ok("float b;\n{ output(b / 2.0); }"),
            vec!["RDIV t0 b 2.0", "RPRT t0", "HALT"]
        );
    }

    #[test]
    fn test_if_lowering() {
        assert_eq!(
            lower_ok("int a;\n{ if (a > 0) a = 1; else a = 2; }"),
            vec![
                "IGRT t0 a 0",
                "jump_zero _L0 t0",
                "IASN a 1",
                "jump _L1",
                "label _L0",
                "IASN a 2",
                "label _L1",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_while_lowering_with_break() {
        assert_eq!(
            lower_ok("int a;\n{ while (a > 0) { a = a - 1; break; } }"),
            vec![
                "label _L0",
                "IGRT t0 a 0",
                "jump_zero _L1 t0",
                "ISUB t1 a 1",
                "IASN a t1",
                "jump _L1",
                "jump _L0",
                "label _L1",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_switch_lowering_falls_through() {
        assert_eq!(
            lower_ok(
                "int x;\n{ switch (x) { case 1: output(x); break; case 2: x = 0; default: x = 9; } }"
            ),
            vec![
                "label _L0",
                "IEQL t0 x 1",
                "jump_zero _L1 t0",
                "IPRT x",
                "jump _L3",
                "label _L1",
                "IEQL t0 x 2",
                "jump_zero _L2 t0",
                "IASN x 0",
                "label _L2",
                "IASN x 9",
                "label _L3",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_or_lowering() {
        assert_eq!(
            lower_ok("int a, b;\n{ if (a > 0 || b > 0) a = 1; else a = 2; }"),
            vec![
                "IGRT t0 a 0",
                "IGRT t1 b 0",
                "IADD t2 t0 t1",
                "IGRT t2 t2 0",
                "jump_zero _L0 t2",
                "IASN a 1",
                "jump _L1",
                "label _L0",
                "IASN a 2",
                "label _L1",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_and_lowering() {
        assert_eq!(
            lower_ok("int a, b;\n{ if (a > 0 && b > 0) a = 1; else a = 2; }"),
            vec![
                "IGRT t0 a 0",
                "IGRT t1 b 0",
                "IEQL t2 t0 1",
                "IEQL t3 t1 t2",
                "jump_zero _L0 t3",
                "IASN a 1",
                "jump _L1",
                "label _L0",
                "IASN a 2",
                "label _L1",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_not_lowering() {
        assert_eq!(
            lower_ok("int a;\n{ if (!(a == 0)) a = 1; else a = 2; }"),
            vec![
                "IEQL t0 a 0",
                "INQL t0 t0 1",
                "jump_zero _L0 t0",
                "IASN a 1",
                "jump _L1",
                "label _L0",
                "IASN a 2",
                "label _L1",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_greater_or_equal_lowering() {
        assert_eq!(
            lower_ok("int a, b;\n{ if (a >= b) a = 1; else a = 2; }"),
            vec![
                "IEQL t0 a b",
                "IGRT t1 a b",
                "IADD t1 t1 t0",
                "IGRT t1 t1 0",
                "jump_zero _L0 t1",
                "IASN a 1",
                "jump _L1",
                "label _L0",
                "IASN a 2",
                "label _L1",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_mixed_comparison_widens() {
        assert_eq!(
            lower_ok("int a;\nfloat b;\n{ if (a < b) a = 1; else a = 2; }"),
            vec![
                "ITOR t0 a",
                "RLSS t1 t0 b",
                "jump_zero _L0 t1",
                "IASN a 1",
                "jump _L1",
                "label _L0",
                "IASN a 2",
                "label _L1",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_break_binds_to_nearest_enclosing_construct() {
        // The case-body break targets the switch end (_L2), not the
        // enclosing loop's end (_L4).
        assert_eq!(
            lower_ok(
                "int a;\n{ while (a > 0) { switch (a) { case 1: break; default: } a = a - 1; } }",
            ),
            vec![
                "label _L3",
                "IGRT t0 a 0",
                "jump_zero _L4 t0",
                "label _L0",
                "IEQL t1 a 1",
                "jump_zero _L1 t1",
                "jump _L2",
                "label _L1",
                "label _L2",
                "ISUB t2 a 1",
                "IASN a t2",
                "jump _L3",
                "label _L4",
                "HALT",
            ]
        );
    }

    #[test]
    fn test_break_outside_loop_or_switch_rejected() {
        let (_, handler) = lower_source("int a;\n{ break; }");
        assert_eq!(messages(&handler), vec!["break outside while/switch"]);
        assert_eq!(handler.diagnostics()[0].line, 2);
    }

    #[test]
    fn test_one_error_per_stray_break() {
        let (_, handler) = lower_source("int a;\n{ break;\nbreak; }");
        assert_eq!(
            messages(&handler),
            vec!["break outside while/switch", "break outside while/switch"]
        );
        assert_eq!(handler.diagnostics()[0].line, 2);
        assert_eq!(handler.diagnostics()[1].line, 3);
    }

    #[test]
    fn test_float_switch_condition_rejected() {
        let (ir, handler) = lower_source("float x;\n{ switch (x) { case 1: default: } }");
        assert_eq!(messages(&handler), vec!["switch condition must be integer"]);
        assert_eq!(render(&ir), vec!["HALT"]);
    }

    #[test]
    fn test_float_case_value_rejected() {
        let (_, handler) = lower_source("int x;\n{ switch (x) { case 1.5: default: } }");
        assert_eq!(messages(&handler), vec!["switch case value must be integer"]);
    }

    #[test]
    fn test_duplicate_case_value_rejected() {
        let (_, handler) =
            lower_source("int x;\n{ switch (x) { case 1: x = 1;\ncase 1: default: } }");
        assert_eq!(messages(&handler), vec!["duplicate switch case value"]);
        assert_eq!(handler.diagnostics()[0].line, 3);
    }

    #[test]
    fn test_undefined_symbol_reported_once() {
        let (_, handler) = lower_source("{ output(x); }");
        assert_eq!(messages(&handler), vec!["Undefined reference to symbol x"]);
    }

    #[test]
    fn test_undefined_operand_does_not_cascade() {
        let (_, handler) = lower_source("int a;\n{ a = x + 1; }");
        assert_eq!(messages(&handler), vec!["Undefined reference to symbol x"]);
    }

    #[test]
    fn test_halt_terminates_every_program() {
        let lines = lower_ok("int a;\n{ }");
        assert_eq!(lines, vec!["HALT"]);
    }
}
