// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Evaluation of aperture macro bodies.

use std::collections::BTreeMap;
use fixedbitset::FixedBitSet;

use crate::ast::*;
use crate::util::num_to_int;
use super::error::ErrType;

/// Variables with a lower index than this are stored densely.
const DENSE_VARS: usize = 1024;

/// Macro variables `$1`, `$2`, ... of one instantiation.
///
/// Parameters and low-numbered variables live in a vector; any index is
/// valid, the rest go to a map.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: Vec<f64>,
    bound: FixedBitSet,
    sparse: BTreeMap<u32, f64>,
}

impl Vars {
    /// Bind `$1..$n` to the aperture definition's parameters.
    pub fn from_params(params: &[f64]) -> Self {
        let mut vars = Vars::default();
        for (i, &value) in params.iter().enumerate() {
            vars.set(i as u32 + 1, value);
        }
        vars
    }

    pub fn get(&self, n: u32) -> Result<f64, ErrType> {
        let i = n as usize;
        if self.bound.contains(i) {
            Ok(self.values[i])
        } else {
            self.sparse.get(&n).copied().ok_or(ErrType::UnboundVariable(n))
        }
    }

    pub fn set(&mut self, n: u32, value: f64) {
        let i = n as usize;
        if i >= self.values.len() {
            if i >= DENSE_VARS && i > self.values.len() {
                self.sparse.insert(n, value);
                return;
            }
            self.values.resize(i + 1, 0.0);
            self.bound.grow(i + 1);
        }
        self.values[i] = value;
        self.bound.insert(i);
    }
}

pub fn eval_expr(expr: &Expr, vars: &Vars) -> Result<f64, ErrType> {
    Ok(match &expr.kind {
        ExprKind::Num(n) => *n,
        ExprKind::Var(n) => vars.get(*n)?,
        ExprKind::Paren(arg) => eval_expr(arg, vars)?,
        ExprKind::UnOp(op, arg) => {
            let v = eval_expr(arg, vars)?;
            match op {
                UnOp::Plus => v,
                UnOp::Minus => -v,
            }
        }
        ExprKind::BinOp(op, lhs, rhs) => {
            let l = eval_expr(lhs, vars)?;
            let r = eval_expr(rhs, vars)?;
            match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => if r == 0.0 {
                    return Err(ErrType::DivByZero);
                } else {
                    l / r
                },
            }
        }
    })
}

/// Evaluate a macro body with the given parameters into concrete primitives.
pub fn instantiate(def: &MacroDefinition, params: &[f64]) -> Result<Vec<Primitive<f64>>, ErrType> {
    let mut vars = Vars::from_params(params);
    let mut primitives = vec![];
    for stmt in &def.body {
        match &stmt.node {
            MacroStatement::Comment(_) => (),
            MacroStatement::Assign(n, value) => {
                let v = eval_expr(value, &vars)?;
                vars.set(*n, v);
            }
            MacroStatement::Primitive(prim) => {
                let prim = prim.try_map(|e| eval_expr(e, &vars))?;
                check_primitive(&prim)?;
                primitives.push(prim);
            }
        }
    }
    Ok(primitives)
}

fn check_primitive(prim: &Primitive<f64>) -> Result<(), ErrType> {
    let invalid = |what: &str, v: f64| ErrType::InvalidPrimitive(format!("{} {}", what, v));
    match prim {
        Primitive::Outline { vertices, points, .. } => {
            let n = num_to_int(*vertices, 1, u32::MAX, |v| invalid("outline vertex count", v))?;
            // the start point is repeated at the end
            if points.len() != n as usize + 1 {
                return Err(ErrType::InvalidPrimitive(
                    format!("outline with {} vertices has {} points", n, points.len())));
            }
        }
        Primitive::Polygon { vertices, .. } => {
            num_to_int(*vertices, 3, 12, |v| invalid("polygon vertex count", v))?;
        }
        _ => (),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Spanned;

    #[test]
    fn variables() {
        let mut vars = Vars::from_params(&[1.5, 2.0]);
        assert_eq!(vars.get(2), Ok(2.0));
        assert_eq!(vars.get(3), Err(ErrType::UnboundVariable(3)));
        vars.set(7, 3.0);
        assert_eq!(vars.get(7), Ok(3.0));
        assert_eq!(vars.get(5), Err(ErrType::UnboundVariable(5)));

        vars.set(4_000_000_000, -1.0);
        assert_eq!(vars.get(4_000_000_000), Ok(-1.0));
        assert_eq!(vars.get(3_999_999_999), Err(ErrType::UnboundVariable(3_999_999_999)));
        vars.set(4_000_000_000, 2.5);
        assert_eq!(vars.get(4_000_000_000), Ok(2.5));
    }

    #[test]
    fn division_by_zero() {
        let expr = Expr::binop(Op::Div, Expr::num(1.0), Expr::binop(Op::Sub, Expr::var(1), Expr::var(1)));
        assert_eq!(eval_expr(&expr, &Vars::from_params(&[2.0])), Err(ErrType::DivByZero));
    }

    #[test]
    fn assignment_and_primitive() {
        let body = vec![
            MacroStatement::Comment("ring".into()),
            MacroStatement::Assign(2, Expr::binop(Op::Mul, Expr::var(1), Expr::num(2.0))),
            MacroStatement::Primitive(Primitive::Circle {
                exposure: Expr::num(1.0),
                diameter: Expr::var(2),
                center: (Expr::num(0.0), Expr::num(0.0)),
                rotation: None,
            }),
        ];
        let def = MacroDefinition { name: "RING".into(), body: body.into_iter().map(Spanned::bare).collect() };
        let prims = instantiate(&def, &[0.75]).unwrap();
        assert_eq!(prims, vec![Primitive::Circle {
            exposure: 1.0, diameter: 1.5, center: (0.0, 0.0), rotation: None,
        }]);
    }
}
