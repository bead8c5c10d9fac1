//! Binds parsed expressions to a schema and type checks them.
//!
//! The checker walks the AST once, resolving every identifier against the
//! schema (then the built-in functions), checking operator and call kinds,
//! and lowering the tree into the node form a [`Program`] runs.

use std::collections::BTreeMap;

use crate::interpreter::error::compute_suggestions;
use crate::interpreter::program::{Node, TimeComponent};
use crate::interpreter::{
    CompileError, CompileErrorKind, EnvironmentSchema, FunctionRegistry, Program,
};
use crate::parser::{BinaryOp, Expr, ExprKind, Literal, Span, UnaryOp, parse_expression};
use crate::types::{Kind, Value};

/// Parse, bind, and type check `source` against `schema`.
pub(crate) fn compile_expression(
    source: &str,
    schema: &EnvironmentSchema,
    functions: &FunctionRegistry,
) -> Result<Program, CompileError> {
    let expr = parse_expression(source).map_err(|e| CompileError::from_parse(source, e))?;
    let mut checker = Checker {
        source,
        schema,
        functions,
        bindings: BTreeMap::new(),
    };
    let (root, kind) = checker.check(&expr)?;
    Ok(Program::new(source, root, kind, checker.bindings))
}

struct Checker<'a> {
    source: &'a str,
    schema: &'a EnvironmentSchema,
    functions: &'a FunctionRegistry,
    /// Schema entries the expression actually references.
    bindings: BTreeMap<String, Kind>,
}

impl Checker<'_> {
    fn error(&self, span: Span, cause: CompileErrorKind) -> CompileError {
        CompileError::new(self.source, span, cause)
    }

    fn fragment(&self, span: Span) -> String {
        self.source
            .get(span.start..span.end)
            .unwrap_or("")
            .to_string()
    }

    fn check(&mut self, expr: &Expr) -> Result<(Node, Kind), CompileError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(check_literal(literal)),
            ExprKind::Identifier(name) => self.check_identifier(name, expr.span),
            ExprKind::Member { object, field } => self.check_member(object, field, expr.span),
            ExprKind::Call { callee, args } => self.check_call(callee, args),
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, expr.span),
            ExprKind::Binary { op, left, right } => {
                self.check_binary(*op, left, right, expr.span)
            }
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => self.check_conditional(condition, then_branch, else_branch),
        }
    }

    fn check_identifier(&mut self, name: &str, span: Span) -> Result<(Node, Kind), CompileError> {
        if let Some(kind) = self.schema.get(name) {
            self.bindings.insert(name.to_string(), kind.clone());
            return Ok((Node::Var(name.to_string()), kind.clone()));
        }
        if self.functions.contains(name) {
            return Err(self.error(
                span,
                CompileErrorKind::BareFunction {
                    name: name.to_string(),
                },
            ));
        }
        let suggestions =
            compute_suggestions(name, self.schema.names().chain(self.functions.names()));
        Err(self.error(
            span,
            CompileErrorKind::UnknownIdentifier {
                name: name.to_string(),
                suggestions,
            },
        ))
    }

    fn check_member(
        &mut self,
        object: &Expr,
        field: &str,
        span: Span,
    ) -> Result<(Node, Kind), CompileError> {
        let (node, kind) = self.check(object)?;
        match kind {
            Kind::Record(fields) => match fields.get(field) {
                Some(field_kind) => Ok((
                    Node::Field {
                        object: Box::new(node),
                        field: field.to_string(),
                    },
                    field_kind.clone(),
                )),
                None => Err(self.error(
                    span,
                    CompileErrorKind::UnknownField {
                        object: self.fragment(object.span),
                        field: field.to_string(),
                        suggestions: compute_suggestions(field, fields.keys().map(String::as_str)),
                    },
                )),
            },
            Kind::Timestamp => match TimeComponent::from_name(field) {
                Some(component) => Ok((
                    Node::TimeField {
                        object: Box::new(node),
                        component,
                    },
                    Kind::Int,
                )),
                None => Err(self.error(
                    span,
                    CompileErrorKind::UnknownField {
                        object: self.fragment(object.span),
                        field: field.to_string(),
                        suggestions: compute_suggestions(
                            field,
                            TimeComponent::NAMES.iter().copied(),
                        ),
                    },
                )),
            },
            Kind::Any => Ok((
                Node::Field {
                    object: Box::new(node),
                    field: field.to_string(),
                },
                Kind::Any,
            )),
            other => Err(self.error(
                span,
                CompileErrorKind::NoFields {
                    kind: other,
                    field: field.to_string(),
                },
            )),
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<(Node, Kind), CompileError> {
        let function_name = self.fragment(callee.span);

        // Built-ins are only reachable in call position, and only when the
        // schema does not shadow the name.
        let (callee_node, callee_kind) = match &callee.kind {
            ExprKind::Identifier(name) if !self.schema.contains(name) => {
                match self.functions.get(name) {
                    Some(function) => (
                        Node::Const(Value::Function(function.clone())),
                        Kind::function(function.signature().clone()),
                    ),
                    None => self.check(callee)?,
                }
            }
            _ => self.check(callee)?,
        };

        let signature = match callee_kind {
            Kind::Function(signature) => signature,
            Kind::Any => {
                let mut arg_nodes = Vec::with_capacity(args.len());
                for arg in args {
                    arg_nodes.push(self.check(arg)?.0);
                }
                return Ok((
                    Node::Call {
                        callee: Box::new(callee_node),
                        args: arg_nodes,
                    },
                    Kind::Any,
                ));
            }
            other => {
                return Err(self.error(callee.span, CompileErrorKind::NotCallable { kind: other }));
            }
        };

        if !signature.accepts_arity(args.len()) {
            let expected = if signature.rest.is_some() {
                format!("at least {}", signature.params.len())
            } else {
                signature.params.len().to_string()
            };
            let span = args
                .iter()
                .fold(callee.span, |span, arg| span.to(arg.span));
            return Err(self.error(
                span,
                CompileErrorKind::ArgumentCount {
                    function: function_name,
                    expected,
                    got: args.len(),
                },
            ));
        }

        let mut arg_nodes = Vec::with_capacity(args.len());
        for (position, arg) in args.iter().enumerate() {
            let (node, found) = self.check(arg)?;
            let expected = signature.param(position).cloned().unwrap_or(Kind::Any);
            if !expected.accepts(&found) {
                return Err(self.error(
                    arg.span,
                    CompileErrorKind::ArgumentType {
                        function: function_name,
                        position: position + 1,
                        expected,
                        found,
                    },
                ));
            }
            arg_nodes.push(node);
        }

        Ok((
            Node::Call {
                callee: Box::new(callee_node),
                args: arg_nodes,
            },
            signature.returns.clone(),
        ))
    }

    fn check_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        span: Span,
    ) -> Result<(Node, Kind), CompileError> {
        let (node, kind) = self.check(operand)?;
        let result = match (op, &kind) {
            (UnaryOp::Not, Kind::Bool | Kind::Any) => Kind::Bool,
            (UnaryOp::Neg, Kind::Int | Kind::Float | Kind::Any) => kind.clone(),
            _ => {
                return Err(self.error(span, CompileErrorKind::InvalidUnary { op, operand: kind }));
            }
        };
        let node = match op {
            UnaryOp::Not => Node::Not(Box::new(node)),
            UnaryOp::Neg => Node::Neg(Box::new(node)),
        };
        Ok((node, result))
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> Result<(Node, Kind), CompileError> {
        let (left_node, left_kind) = self.check(left)?;
        let (right_node, right_kind) = self.check(right)?;
        let result = binary_result(op, &left_kind, &right_kind).ok_or_else(|| {
            self.error(
                span,
                CompileErrorKind::InvalidBinary {
                    op,
                    left: left_kind.clone(),
                    right: right_kind.clone(),
                },
            )
        })?;
        Ok((
            Node::Binary {
                op,
                left: Box::new(left_node),
                right: Box::new(right_node),
            },
            result,
        ))
    }

    fn check_conditional(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> Result<(Node, Kind), CompileError> {
        let (condition_node, condition_kind) = self.check(condition)?;
        if !matches!(condition_kind, Kind::Bool | Kind::Any) {
            return Err(self.error(
                condition.span,
                CompileErrorKind::ConditionNotBool {
                    found: condition_kind,
                },
            ));
        }
        let (then_node, then_kind) = self.check(then_branch)?;
        let (else_node, else_kind) = self.check(else_branch)?;

        let kind = if then_kind == else_kind {
            then_kind.clone()
        } else if then_kind.is_numeric() && else_kind.is_numeric() {
            then_kind.widen(&else_kind)
        } else if matches!(then_kind, Kind::Any) || matches!(else_kind, Kind::Any) {
            Kind::Any
        } else {
            return Err(self.error(
                then_branch.span.to(else_branch.span),
                CompileErrorKind::BranchMismatch {
                    then_kind,
                    else_kind,
                },
            ));
        };

        // Both branches yield the widened kind at run time.
        let widen_branch = |node: Node, branch_kind: &Kind| {
            if kind == Kind::Float && *branch_kind == Kind::Int {
                Node::ToFloat(Box::new(node))
            } else {
                node
            }
        };
        Ok((
            Node::Conditional {
                condition: Box::new(condition_node),
                then_branch: Box::new(widen_branch(then_node, &then_kind)),
                else_branch: Box::new(widen_branch(else_node, &else_kind)),
            },
            kind,
        ))
    }
}

fn check_literal(literal: &Literal) -> (Node, Kind) {
    match literal {
        Literal::Bool(b) => (Node::Const(Value::Bool(*b)), Kind::Bool),
        Literal::Int(n) => (Node::Const(Value::Int(*n)), Kind::Int),
        Literal::Float(f) => (Node::Const(Value::Float(*f)), Kind::Float),
        Literal::String(s) => (Node::Const(Value::String(s.clone())), Kind::String),
    }
}

/// Result kind of `left op right`, or `None` if the operator does not apply.
fn binary_result(op: BinaryOp, left: &Kind, right: &Kind) -> Option<Kind> {
    let either_any = matches!(left, Kind::Any) || matches!(right, Kind::Any);
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let logical = |k: &Kind| matches!(k, Kind::Bool | Kind::Any);
            (logical(left) && logical(right)).then_some(Kind::Bool)
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            (left.accepts(right) || right.accepts(left)).then_some(Kind::Bool)
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordered = (left.is_numeric() && right.is_numeric())
                || (matches!(left, Kind::String | Kind::Any)
                    && matches!(right, Kind::String | Kind::Any))
                || (matches!(left, Kind::Timestamp | Kind::Any)
                    && matches!(right, Kind::Timestamp | Kind::Any));
            ordered.then_some(Kind::Bool)
        }
        BinaryOp::Add => {
            if left.is_numeric() && right.is_numeric() {
                Some(left.widen(right))
            } else if matches!(left, Kind::String) && matches!(right, Kind::String) {
                Some(Kind::String)
            } else if either_any
                && [left, right]
                    .iter()
                    .all(|k| matches!(k, Kind::String | Kind::Any))
            {
                Some(Kind::Any)
            } else {
                None
            }
        }
        BinaryOp::Sub | BinaryOp::Mul => {
            (left.is_numeric() && right.is_numeric()).then(|| left.widen(right))
        }
        BinaryOp::Div => (left.is_numeric() && right.is_numeric()).then_some(Kind::Float),
        BinaryOp::Mod => {
            let integral = |k: &Kind| matches!(k, Kind::Int | Kind::Any);
            (integral(left) && integral(right)).then_some(Kind::Int)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_widens() {
        assert_eq!(binary_result(BinaryOp::Add, &Kind::Int, &Kind::Int), Some(Kind::Int));
        assert_eq!(binary_result(BinaryOp::Add, &Kind::Int, &Kind::Float), Some(Kind::Float));
        assert_eq!(binary_result(BinaryOp::Div, &Kind::Int, &Kind::Int), Some(Kind::Float));
        assert_eq!(binary_result(BinaryOp::Mod, &Kind::Float, &Kind::Int), None);
    }

    #[test]
    fn string_operators() {
        assert_eq!(
            binary_result(BinaryOp::Add, &Kind::String, &Kind::String),
            Some(Kind::String)
        );
        assert_eq!(binary_result(BinaryOp::Add, &Kind::String, &Kind::Int), None);
        assert_eq!(
            binary_result(BinaryOp::Lt, &Kind::String, &Kind::String),
            Some(Kind::Bool)
        );
        assert_eq!(binary_result(BinaryOp::Lt, &Kind::String, &Kind::Float), None);
    }

    #[test]
    fn equality_requires_compatible_kinds() {
        assert_eq!(binary_result(BinaryOp::Eq, &Kind::Int, &Kind::Float), Some(Kind::Bool));
        assert_eq!(binary_result(BinaryOp::Eq, &Kind::Bool, &Kind::Int), None);
    }
}
