// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use gerberx3::ast::{ApertureId, Command, ExprKind, MacroStatement, Op};
use gerberx3::config::Config;
use gerberx3::coord::Point;
use gerberx3::eval::ErrType;
use gerberx3::finder::{state_at, NodeFinder, NodeRef};
use gerberx3::parse::parse;

const SOURCE: &str = "%FSLAX26Y26*%
%MOMM*%
%AMBOX*
21,1,$1,$2x2,0,0,0*
%
%ADD10BOX,1X0.5*%
D10*
X1000000Y0D03*
";

#[test]
fn test_find_commands() {
    let file = parse("test.gbr", SOURCE).unwrap();
    let finder = NodeFinder::new(&file);

    let found = finder.find(1, 3).unwrap();
    assert_eq!(found.index, 0);
    assert!(matches!(found.node, NodeRef::Command(c) if matches!(c.node, Command::FormatSpec(_))));

    let found = finder.find(8, 2).unwrap();
    assert_eq!(found.index, 5);
    assert!(matches!(found.node, NodeRef::Command(c) if matches!(c.node, Command::Flash(_))));

    // the closing percent sign still belongs to the macro
    let found = finder.find(5, 1).unwrap();
    assert_eq!(found.index, 2);
    assert!(matches!(found.node, NodeRef::Command(c) if matches!(c.node, Command::MacroDefine(_))));

    // between commands and past the end
    assert_eq!(finder.find(7, 5), None);
    assert_eq!(finder.find(20, 1), None);
}

#[test]
fn test_find_terminators() {
    let file = parse("test.gbr", "%FSLAX26Y26*MOMM*%\n").unwrap();
    let finder = NodeFinder::new(&file);
    // each command of a combined block owns its asterisk
    assert_eq!(finder.find(1, 11).map(|f| f.index), Some(0));
    assert_eq!(finder.find(1, 12).map(|f| f.index), Some(0));
    assert_eq!(finder.find(1, 13).map(|f| f.index), Some(1));
    assert_eq!(finder.find(1, 17).map(|f| f.index), Some(1));
    assert_eq!(finder.find(1, 18).map(|f| f.index), None);
}

#[test]
fn test_find_in_macro() {
    let file = parse("test.gbr", SOURCE).unwrap();
    let finder = NodeFinder::new(&file);

    // the primitive code is not part of any expression
    let found = finder.find(4, 1).unwrap();
    assert_eq!(found.index, 2);
    assert!(matches!(found.node, NodeRef::MacroStatement(s)
                     if matches!(s.node, MacroStatement::Primitive(_))));

    // "$2" inside "$2x2"
    let found = finder.find(4, 10).unwrap();
    match found.node {
        NodeRef::Expr(e) => assert_eq!(e.kind, ExprKind::Var(2)),
        other => panic!("expected expression, got {:?}", other),
    }
    let span = found.node.span();
    assert_eq!((span.line, span.column, span.end_column), (4, 9, 11));

    // the operator belongs to the product
    let found = finder.find(4, 11).unwrap();
    match found.node {
        NodeRef::Expr(e) => assert!(matches!(e.kind, ExprKind::BinOp(Op::Mul, _, _))),
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_state_at() {
    let file = parse("test.gbr", SOURCE).unwrap();
    let config = Config::default();

    let state = state_at(&file, 0, &config).unwrap();
    assert_eq!(state.format, None);

    let state = state_at(&file, 4, &config).unwrap();
    assert!(state.apertures.contains(ApertureId(10)));
    assert!(state.macros.contains_key("BOX"));
    assert_eq!(state.apertures.current_id(), None);

    let finder = NodeFinder::new(&file);
    let state = finder.state_at_position(8, 1, &config).unwrap().unwrap();
    assert_eq!(state.position, Point::from_mm(1.0, 0.0));
    assert_eq!(state.apertures.current_id(), Some(ApertureId(10)));
    assert!(finder.state_at_position(20, 1, &config).unwrap().is_none());

    // errors before the position are reported
    let file = parse("test.gbr", "%FSLAX26Y26*%\nD10*\n").unwrap();
    let err = state_at(&file, 2, &config).unwrap_err();
    assert_eq!(err.errtype, ErrType::ApertureNotFound(ApertureId(10)));
    assert_eq!(err.span.line, 2);
}
