//! Expression parser using winnow.
//!
//! Parses expressions such as `temperature < 20 && rain3h > 0` or
//! `'Wear ' + layer` into an AST. Handles:
//! - Number, string, and boolean literals
//! - Identifiers, member access (`forecast.maxTemp`), and calls (`rainIn(3)`)
//! - Unary `!`/`not` and `-`
//! - Binary operators by precedence, with `and`/`or` keyword spellings
//! - The `cond ? a : b` conditional

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, cut_err, delimited, opt, separated};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::LocatingSlice;
use winnow::token::{any, one_of, take_while};

use super::ast::*;
use super::error::ParseError;

type Input<'i> = LocatingSlice<&'i str>;

/// Words that cannot be used as identifiers.
const KEYWORDS: &[&str] = &["true", "false", "and", "or", "not"];

/// Parse an expression into an AST.
///
/// # Example
///
/// ```
/// use skycast::parser::{parse_expression, BinaryOp, ExprKind};
///
/// let expr = parse_expression("temperature < 20").unwrap();
/// assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
/// ```
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    delimited(ws, expression, ws)
        .parse(LocatingSlice::new(source))
        .map_err(|e| {
            let offset = e.offset();
            let (line, column) = calculate_position(source, offset);
            ParseError::Syntax {
                offset,
                line,
                column,
                message: describe(e.inner(), source.get(offset..).unwrap_or("")),
            }
        })
}

/// Build a readable message from winnow's context, falling back to the
/// offending character.
fn describe(error: &ContextError, remaining: &str) -> String {
    let context = error.to_string();
    if !context.is_empty() {
        return context;
    }
    match remaining.chars().next() {
        Some(c) => format!("unexpected character: '{c}'"),
        None => "unexpected end of expression".to_string(),
    }
}

/// Calculate line and column from the original input and a byte offset.
fn calculate_position(original: &str, offset: usize) -> (usize, usize) {
    let consumed = original.get(..offset).unwrap_or(original);
    let line = consumed.chars().filter(|&c| c == '\n').count() + 1;
    let column = match consumed.rfind('\n') {
        Some(pos) => consumed[pos + 1..].chars().count() + 1,
        None => consumed.chars().count() + 1,
    };
    (line, column)
}

fn expression(input: &mut Input<'_>) -> ModalResult<Expr> {
    conditional.parse_next(input)
}

/// `conditional = or_expr [ "?" conditional ":" conditional ]`
fn conditional(input: &mut Input<'_>) -> ModalResult<Expr> {
    let condition = or_expr.parse_next(input)?;
    ws(input)?;
    if opt('?').parse_next(input)?.is_none() {
        return Ok(condition);
    }
    ws(input)?;
    let then_branch = cut_err(conditional).parse_next(input)?;
    ws(input)?;
    cut_err(':'.context(StrContext::Expected(StrContextValue::CharLiteral(':'))))
        .parse_next(input)?;
    ws(input)?;
    let else_branch = cut_err(conditional).parse_next(input)?;
    let span = condition.span.to(else_branch.span);
    Ok(Expr::new(
        ExprKind::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
        span,
    ))
}

// ---------------------------------------------------------------------------
// Binary precedence levels (lowest to highest)
// ---------------------------------------------------------------------------

fn or_expr(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_level(input, and_expr, or_op)
}

fn and_expr(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_level(input, equality, and_op)
}

fn equality(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_level(input, comparison, equality_op)
}

fn comparison(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_level(input, additive, comparison_op)
}

fn additive(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_level(input, multiplicative, additive_op)
}

fn multiplicative(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_level(input, unary, multiplicative_op)
}

/// Parse `operand { operator operand }`, folding to the left.
fn binary_level<'i>(
    input: &mut Input<'i>,
    operand: fn(&mut Input<'i>) -> ModalResult<Expr>,
    operator: fn(&mut Input<'i>) -> ModalResult<BinaryOp>,
) -> ModalResult<Expr> {
    let mut left = operand(input)?;
    loop {
        ws(input)?;
        let Some(op) = opt(operator).parse_next(input)? else {
            break;
        };
        ws(input)?;
        let right = cut_err(operand).parse_next(input)?;
        let span = left.span.to(right.span);
        left = Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
    }
    Ok(left)
}

fn or_op(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt(("||".value(BinaryOp::Or), keyword("or").value(BinaryOp::Or))).parse_next(input)
}

fn and_op(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt(("&&".value(BinaryOp::And), keyword("and").value(BinaryOp::And))).parse_next(input)
}

fn equality_op(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt(("==".value(BinaryOp::Eq), "!=".value(BinaryOp::Ne))).parse_next(input)
}

fn comparison_op(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt((
        "<=".value(BinaryOp::Le),
        ">=".value(BinaryOp::Ge),
        "<".value(BinaryOp::Lt),
        ">".value(BinaryOp::Gt),
    ))
    .parse_next(input)
}

fn additive_op(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))).parse_next(input)
}

fn multiplicative_op(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt((
        '*'.value(BinaryOp::Mul),
        '/'.value(BinaryOp::Div),
        '%'.value(BinaryOp::Mod),
    ))
    .parse_next(input)
}

// ---------------------------------------------------------------------------
// Unary, postfix, and primary
// ---------------------------------------------------------------------------

/// `unary = ("!" | "not" | "-") unary | postfix`
fn unary(input: &mut Input<'_>) -> ModalResult<Expr> {
    let prefix = opt(alt((
        '!'.value(UnaryOp::Not),
        keyword("not").value(UnaryOp::Not),
        '-'.value(UnaryOp::Neg),
    ))
    .with_span())
    .parse_next(input)?;

    let Some((op, op_span)) = prefix else {
        return postfix.parse_next(input);
    };
    ws(input)?;
    let operand = cut_err(unary).parse_next(input)?;
    let span = Span::from(op_span).to(operand.span);
    Ok(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    ))
}

/// `postfix = primary { "." identifier | "(" args ")" }`
fn postfix(input: &mut Input<'_>) -> ModalResult<Expr> {
    let mut expr = primary.parse_next(input)?;
    loop {
        ws(input)?;
        if opt('.').parse_next(input)?.is_some() {
            ws(input)?;
            let (field, field_span) = cut_err(
                identifier.context(StrContext::Expected(StrContextValue::Description(
                    "field name",
                ))),
            )
            .with_span()
            .parse_next(input)?;
            let span = expr.span.to(field_span.into());
            expr = Expr::new(
                ExprKind::Member {
                    object: Box::new(expr),
                    field: field.to_string(),
                },
                span,
            );
        } else if opt('(').parse_next(input)?.is_some() {
            let args: Vec<Expr> =
                separated(0.., delimited(ws, expression, ws), ',').parse_next(input)?;
            ws(input)?;
            let (_, close) = cut_err(
                ')'.context(StrContext::Expected(StrContextValue::CharLiteral(')'))),
            )
            .with_span()
            .parse_next(input)?;
            let span = expr.span.to(close.into());
            expr = Expr::new(
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                },
                span,
            );
        } else {
            break;
        }
    }
    Ok(expr)
}

fn primary(input: &mut Input<'_>) -> ModalResult<Expr> {
    alt((
        number
            .with_span()
            .map(|(lit, span)| Expr::new(ExprKind::Literal(lit), span)),
        string_literal
            .with_span()
            .map(|(s, span)| Expr::new(ExprKind::Literal(Literal::String(s)), span)),
        keyword("true")
            .span()
            .map(|span| Expr::new(ExprKind::Literal(Literal::Bool(true)), span)),
        keyword("false")
            .span()
            .map(|span| Expr::new(ExprKind::Literal(Literal::Bool(false)), span)),
        parenthesized,
        name.with_span()
            .map(|(n, span)| Expr::new(ExprKind::Identifier(n.to_string()), span)),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn parenthesized(input: &mut Input<'_>) -> ModalResult<Expr> {
    '('.parse_next(input)?;
    ws(input)?;
    let inner = cut_err(expression).parse_next(input)?;
    ws(input)?;
    cut_err(')'.context(StrContext::Expected(StrContextValue::CharLiteral(')'))))
        .parse_next(input)?;
    Ok(inner)
}

/// Parse an integer or decimal literal.
fn number(input: &mut Input<'_>) -> ModalResult<Literal> {
    let text: &str = (digit1, opt(('.', digit1))).take().parse_next(input)?;
    let literal = if text.contains('.') {
        text.parse().ok().map(Literal::Float)
    } else {
        text.parse().ok().map(Literal::Int)
    };
    literal.ok_or_else(|| ErrMode::Cut(ContextError::new()))
}

/// Parse a single- or double-quoted string with backslash escapes.
fn string_literal(input: &mut Input<'_>) -> ModalResult<String> {
    let quote = one_of(['\'', '"']).parse_next(input)?;
    let mut out = String::new();
    loop {
        let c: char = cut_err(any.context(StrContext::Expected(
            StrContextValue::Description("closing quote"),
        )))
        .parse_next(input)?;
        if c == quote {
            return Ok(out);
        }
        if c == '\\' {
            let escaped: char = cut_err(any.context(StrContext::Expected(
                StrContextValue::Description("escape character"),
            )))
            .parse_next(input)?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
        } else {
            out.push(c);
        }
    }
}

/// Parse an identifier that is not a keyword.
fn name<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    identifier
        .verify(|ident: &str| !KEYWORDS.contains(&ident))
        .parse_next(input)
}

/// Parse an identifier: a letter or underscore, then alphanumerics.
fn identifier<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Match a whole-word keyword.
fn keyword<'i>(word: &'static str) -> impl Parser<Input<'i>, &'i str, ErrMode<ContextError>> {
    identifier.verify(move |ident: &str| ident == word)
}

/// Parse optional whitespace.
fn ws(input: &mut Input<'_>) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_counts_lines_and_columns() {
        assert_eq!(calculate_position("abc", 0), (1, 1));
        assert_eq!(calculate_position("abc", 2), (1, 3));
        assert_eq!(calculate_position("a\nbc", 3), (2, 2));
    }

    #[test]
    fn keyword_requires_word_boundary() {
        let mut input = LocatingSlice::new("notice");
        assert!(keyword("not").parse_next(&mut input).is_err());
        let mut input = LocatingSlice::new("not x");
        assert_eq!(keyword("not").parse_next(&mut input).unwrap(), "not");
    }

    #[test]
    fn describe_falls_back_to_character() {
        assert_eq!(
            describe(&ContextError::new(), "]x"),
            "unexpected character: ']'"
        );
        assert_eq!(
            describe(&ContextError::new(), ""),
            "unexpected end of expression"
        );
    }
}
