// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Arithmetic expressions in GDML attributes using pest

use crate::error::GdmlError;
use ahash::AHashMap;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use std::f64::consts::PI;
use std::sync::OnceLock;

#[derive(Parser)]
#[grammar_inline = r#"
WHITESPACE = _{ " " | "\t" | "\r" | "\n" }

expression = { SOI ~ expr ~ EOI }
expr       = { prefix* ~ primary ~ (infix ~ prefix* ~ primary)* }

infix = _{ add | sub | pow | mul | div }
add   = { "+" }
sub   = { "-" }
pow   = { "**" | "^" }
mul   = { "*" }
div   = { "/" }

prefix = _{ neg | pos }
neg    = { "-" }
pos    = { "+" }

primary = _{ call | number | ident | "(" ~ expr ~ ")" }
call    = { ident ~ "(" ~ (expr ~ ("," ~ expr)*)? ~ ")" }
number  = @{ (ASCII_DIGIT+ ~ ("." ~ ASCII_DIGIT*)? | "." ~ ASCII_DIGIT+) ~ (^"e" ~ ("+" | "-")? ~ ASCII_DIGIT+)? }
ident   = @{ (ASCII_ALPHA | "_") ~ (ASCII_ALPHANUMERIC | "_")* }
"#]
struct ExpressionParser;

fn pratt() -> &'static PrattParser<Rule> {
    static PRATT: OnceLock<PrattParser<Rule>> = OnceLock::new();
    PRATT.get_or_init(|| {
        PrattParser::new()
            .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
            .op(Op::infix(Rule::mul, Assoc::Left) | Op::infix(Rule::div, Assoc::Left))
            .op(Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
            .op(Op::infix(Rule::pow, Assoc::Right))
    })
}

/// Named values available to expressions, in internal units (mm, rad)
pub type Scope = AHashMap<String, f64>;

/// Unit and constant names understood without a definition
fn builtin(name: &str) -> Option<f64> {
    Some(match name {
        "pi" => PI,
        "twopi" => 2.0 * PI,
        "e" => std::f64::consts::E,
        "nm" => 1e-6,
        "um" => 1e-3,
        "mm" | "millimeter" => 1.0,
        "cm" | "centimeter" => 10.0,
        "m" | "meter" => 1000.0,
        "km" => 1e6,
        "rad" | "radian" => 1.0,
        "mrad" | "milliradian" => 1e-3,
        "deg" | "degree" => PI / 180.0,
        _ => return None,
    })
}

fn call(name: &str, args: &[f64]) -> Result<f64, String> {
    let unary = |f: fn(f64) -> f64| match args {
        [x] => Ok(f(*x)),
        _ => Err(format!("{}() takes one argument, got {}", name, args.len())),
    };
    match name {
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "asin" => unary(f64::asin),
        "acos" => unary(f64::acos),
        "atan" => unary(f64::atan),
        "sqrt" => unary(f64::sqrt),
        "abs" => unary(f64::abs),
        "exp" => unary(f64::exp),
        "log" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "pow" | "atan2" | "min" | "max" => match args {
            [a, b] => Ok(match name {
                "pow" => a.powf(*b),
                "atan2" => a.atan2(*b),
                "min" => a.min(*b),
                _ => a.max(*b),
            }),
            _ => Err(format!("{}() takes two arguments, got {}", name, args.len())),
        },
        _ => Err(format!("unknown function `{}`", name)),
    }
}

/// Evaluate an attribute expression.
///
/// Identifiers resolve to `scope` first, then to built-in constants and
/// units, so `2*cm` evaluates to 20.
pub fn evaluate(expression: &str, scope: &Scope) -> Result<f64, GdmlError> {
    let fail = |message: String| GdmlError::Expression {
        expression: expression.to_string(),
        message,
    };
    let mut pairs = ExpressionParser::parse(Rule::expression, expression)
        .map_err(|e| fail(e.variant.message().into_owned()))?;
    let expr = pairs
        .next()
        .and_then(|p| p.into_inner().next())
        .ok_or_else(|| fail("empty expression".into()))?;
    let value = eval_expr(expr.into_inner(), scope).map_err(fail)?;
    if !value.is_finite() {
        return Err(fail(format!("evaluates to {}", value)));
    }
    Ok(value)
}

fn eval_expr(pairs: Pairs<Rule>, scope: &Scope) -> Result<f64, String> {
    pratt()
        .map_primary(|primary| eval_primary(primary, scope))
        .map_prefix(|op, rhs| match op.as_rule() {
            Rule::neg => rhs.map(|v| -v),
            _ => rhs,
        })
        .map_infix(|lhs, op, rhs| {
            let (a, b) = (lhs?, rhs?);
            match op.as_rule() {
                Rule::add => Ok(a + b),
                Rule::sub => Ok(a - b),
                Rule::mul => Ok(a * b),
                Rule::div if b == 0.0 => Err("division by zero".to_string()),
                Rule::div => Ok(a / b),
                Rule::pow => Ok(a.powf(b)),
                rule => Err(format!("unexpected operator {:?}", rule)),
            }
        })
        .parse(pairs)
}

fn eval_primary(primary: Pair<Rule>, scope: &Scope) -> Result<f64, String> {
    match primary.as_rule() {
        Rule::number => primary
            .as_str()
            .parse::<f64>()
            .map_err(|e| format!("bad number `{}`: {}", primary.as_str(), e)),
        Rule::ident => {
            let name = primary.as_str();
            scope
                .get(name)
                .copied()
                .or_else(|| builtin(name))
                .ok_or_else(|| format!("undefined name `{}`", name))
        }
        Rule::call => {
            let mut inner = primary.into_inner();
            let name = inner.next().map(|p| p.as_str()).unwrap_or_default();
            let args = inner
                .map(|arg| eval_expr(arg.into_inner(), scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, &args)
        }
        Rule::expr => eval_expr(primary.into_inner(), scope),
        rule => Err(format!("unexpected token {:?}", rule)),
    }
}
