// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use gerberx3::ast::{ApertureId, AxisSelect, Command, ImagePolarity, Mirroring, Primitive};
use gerberx3::config::{Config, OnError};
use gerberx3::coord::{CoordinateError, Offset, Point, Unit};
use gerberx3::eval::*;
use gerberx3::parse::parse;

const HEADER: &str = "%FSLAX26Y26*%\n%MOMM*%\n";

fn config(policy: OnError) -> Config {
    Config::with_policy(policy)
}

fn try_run(src: &str, config: &Config) -> Result<Output, EvalError> {
    let file = parse("test.gbr", &format!("{}{}", HEADER, src)).unwrap();
    interpret(&file, config)
}

fn run(src: &str) -> Output {
    try_run(src, &Config::default()).unwrap()
}

fn run_err(src: &str) -> ErrType {
    try_run(src, &Config::default()).unwrap_err().errtype
}

fn pt(x: f64, y: f64) -> Point {
    Point::from_mm(x, y)
}

fn mm(v: f64) -> Offset {
    Offset::from_mm(v)
}

fn flashes(out: &Output) -> Vec<(Point, Polarity)> {
    out.commands.iter().map(|cmd| match cmd {
        DrawCommand::Flash(f) => (f.position, f.polarity),
        other => panic!("expected flash, got {:?}", other),
    }).collect()
}

#[test]
fn test_single_line() {
    let out = run("%ADD10C,1.5*%\nD10*\nX0Y0D02*\nX1000000Y0D01*\nM02*\n");
    assert_eq!(out.commands.commands(), &[DrawCommand::Line(Line {
        aperture: Some(ApertureId(10)),
        start: pt(0., 0.),
        end: pt(1., 0.),
        width: mm(1.5),
        polarity: Polarity::Dark,
        attributes: Attributes::new(),
    })]);
    assert_eq!(out.state.position, pt(1., 0.));
    assert!(out.state.reached_end_of_file);

    let bbox = out.commands.bounding_box(&out.state.apertures).unwrap();
    assert_eq!(bbox.min, pt(-0.75, -0.75));
    assert_eq!(bbox.max, pt(1.75, 0.75));
    assert_eq!(bbox.width(), mm(2.5));
}

#[test]
fn test_undefined_aperture() {
    let src = "%ADD10C,1*%\nD10*\nD11*\nX0Y0D03*\nM02*\n";
    let err = try_run(src, &Config::default()).unwrap_err();
    assert_eq!(err.errtype, ErrType::ApertureNotFound(ApertureId(11)));
    assert_eq!(err.span.line, 5);

    // under the warn policy the select is skipped and D10 stays current
    for &policy in &[OnError::Warn, OnError::Ignore] {
        let out = try_run(src, &config(policy)).unwrap();
        assert_eq!(out.commands.len(), 1);
        match &out.commands.commands()[0] {
            DrawCommand::Flash(f) => assert_eq!(f.aperture, ApertureId(10)),
            other => panic!("expected flash, got {:?}", other),
        }
    }
}

#[test]
fn test_skipped_step() {
    let file = parse("test.gbr", "%FSLAX26Y26*%%MOMM*%X0Y0D03*").unwrap();
    let mut evaluator = Evaluator::new(&config(OnError::Ignore));
    assert_eq!(evaluator.eval_command(&file.commands[0]), Ok(Step::Continue));
    assert_eq!(evaluator.eval_command(&file.commands[1]), Ok(Step::Continue));
    match evaluator.eval_command(&file.commands[2]) {
        Ok(Step::Skipped(err)) => assert_eq!(err.errtype, ErrType::ApertureNotSelected),
        other => panic!("expected skipped step, got {:?}", other),
    }
    // a failed command leaves the state alone
    assert_eq!(evaluator.state().position, Point::ORIGIN);
    assert!(evaluator.finish().unwrap().commands.is_empty());
}

#[test]
fn test_macro_aperture() {
    let out = run("%AMCIRC*1,1,$1,0,0*%\n%ADD10CIRC,2.0*%\n");
    let aperture = out.state.apertures.get(ApertureId(10)).unwrap();
    assert_eq!(aperture.shape, Shape::Macro {
        name: "CIRC".into(),
        unit: Unit::Millimeters,
        primitives: vec![Primitive::Circle {
            exposure: 1.,
            diameter: 2.,
            center: (0., 0.),
            rotation: None,
        }],
    });
    // macros cannot stroke
    assert_eq!(aperture.shape.line_width(), None);

    assert_eq!(run_err("%ADD10NOPE,1*%"), ErrType::MacroNotFound("NOPE".into()));
    assert_eq!(run_err("%AMM*1,1,$2,0,0*%%ADD10M,1*%"), ErrType::UnboundVariable(2));
    assert_eq!(run_err("%AMM*1,1,1/$1,0,0*%%ADD10M,0*%"), ErrType::DivByZero);
    assert_eq!(run_err("%AMM*1,1,1,0,0*%%AMM*1,1,2,0,0*%"), ErrType::MacroRedefined("M".into()));
}

#[test]
fn test_step_repeat() {
    let out = run("%ADD10C,1*%\nD10*\n%SRX2Y1I5J0*%\nX0Y0D03*\n%SR*%\nM02*\n");
    assert_eq!(flashes(&out), vec![(pt(0., 0.), Polarity::Dark), (pt(5., 0.), Polarity::Dark)]);
    assert_eq!(out.state.step_repeat, None);

    // copies are laid out column by column
    let out = run("%ADD10C,1*%\nD10*\n%SRX2Y2I1J2*%\nX0Y0D03*\n%SR*%\n");
    let positions: Vec<_> = flashes(&out).into_iter().map(|f| f.0).collect();
    assert_eq!(positions, vec![pt(0., 0.), pt(0., 2.), pt(1., 0.), pt(1., 2.)]);
}

#[test]
fn test_step_repeat_restores_graphics() {
    let src = "%ADD10C,1*%%ADD11C,2*%D10*X1000000Y0D02*\n\
               %SRX1Y1I0J0*%%LPC*%D11*G03*X3000000Y3000000D02*%SR*%\n\
               X2000000D03*";
    let out = run(src);
    let state = &out.state;
    assert_eq!(state.polarity, Polarity::Dark);
    assert_eq!(state.draw_mode, DrawMode::Linear);
    assert_eq!(state.position, pt(2., 0.));
    assert_eq!(state.apertures.current_id(), Some(ApertureId(10)));
    match &out.commands.commands()[0] {
        DrawCommand::Flash(f) => assert_eq!(f.aperture, ApertureId(10)),
        other => panic!("expected flash, got {:?}", other),
    }
}

#[test]
fn test_step_repeat_limits() {
    // a huge grid over nothing produces nothing
    let out = run("%SRX200000Y200000I0J0*%%SR*%M02*");
    assert!(out.commands.is_empty());

    let src = "%ADD10C,1*%D10*%SRX200000Y200000I1J1*%X0Y0D03*%SR*%M02*";
    assert_eq!(run_err(src), ErrType::StepRepeatTooLarge {
        x_repeat: 200_000, y_repeat: 200_000, commands: 1, limit: 10_000_000,
    });

    let src = "%ADD10C,1*%D10*%SRX2Y2I1J1*%X0Y0D03*%SR*%\n%SRX3Y1I1J1*%X0Y0D03*%SR*%\nM02*";
    let mut limited = Config::default();
    limited.interpreter.max_step_repeat_commands = 4;
    let err = try_run(src, &limited).unwrap_err();
    assert_eq!(err.errtype, ErrType::StepRepeatTooLarge { x_repeat: 3, y_repeat: 1, commands: 1, limit: 4 });
    assert_eq!(err.span.line, 4);

    // the failed close leaves the step and repeat open until the end
    limited.interpreter.on_error = OnError::Warn;
    let out = try_run(src, &limited).unwrap();
    assert_eq!(out.commands.len(), 4);
    assert_eq!(out.state.step_repeat, None);
}

#[test]
fn test_unclosed_step_repeat() {
    let src = "%ADD10C,1*%%ADD11C,2*%D10*X1000000Y0D02*\n\
               %SRX2Y1I1J0*%%LPC*%D11*G03*X5000000Y5000000D03*\n";
    assert_eq!(run_err(src), ErrType::UnclosedAtEnd(FrameKind::StepRepeat));

    // the discarded step and repeat does not leak its graphics state
    for &policy in &[OnError::Warn, OnError::Ignore] {
        let out = try_run(src, &config(policy)).unwrap();
        assert!(out.commands.is_empty());
        let state = &out.state;
        assert_eq!(state.step_repeat, None);
        assert_eq!(state.position, pt(1., 0.));
        assert_eq!(state.polarity, Polarity::Dark);
        assert_eq!(state.draw_mode, DrawMode::Linear);
        assert_eq!(state.apertures.current_id(), Some(ApertureId(10)));
    }
}

#[test]
fn test_coordinate_range() {
    let overflow = |e: ErrType| matches!(e, ErrType::Coordinate(CoordinateError::Overflow(_)));

    // step too large to represent
    let src = "%ADD10C,1*%D10*%SRX3Y1I9300000000J0*%X1000000Y0D03*%SR*%";
    assert!(overflow(run_err(src)));
    let out = try_run(src, &config(OnError::Warn)).unwrap();
    assert_eq!(flashes(&out), vec![(pt(1., 0.), Polarity::Dark)]);

    // representable step, but the grid leaves the range
    let src = "%ADD10C,1*%D10*%SRX3Y1I600000000J0*%X1000000Y0D03*%SR*%";
    assert!(overflow(run_err(src)));

    // block flashed with a huge scale
    let src = "%ADD10C,1*%%ABD20*%D10*X1000000Y0D03*%AB*%D20*%LS1000000000000*%X0Y0D03*";
    assert!(overflow(run_err(src)));

    // aperture sizes
    assert!(overflow(run_err("%ADD10C,99999999999999999999*%")));

    // incremental positions accumulate until they leave the range
    let src = "%FSLIX26Y26*%%MOMM*%X900000000000000D02*X900000000000000D02*";
    let file = parse("test.gbr", src).unwrap();
    let mut lax = Config::default();
    lax.numeric.coordinate_digit_budget_enforcement = false;
    let err = interpret(&file, &lax).unwrap_err();
    assert!(overflow(err.errtype));
    let mut evaluator = Evaluator::new(&lax);
    assert_eq!(evaluator.eval_until(&file, |_| false).map_err(|e| e.span.line), Err(1));
    assert_eq!(evaluator.state().position.x, Offset(900_000_000_000_000_000));
}

#[test]
fn test_high_macro_variables() {
    let out = run("%AMM*$4000000000=2*1,1,$4000000000,0,0*%%ADD10M*%");
    match &out.state.apertures.get(ApertureId(10)).unwrap().shape {
        Shape::Macro { primitives, .. } => assert_eq!(primitives, &vec![Primitive::Circle {
            exposure: 1.,
            diameter: 2.,
            center: (0., 0.),
            rotation: None,
        }]),
        other => panic!("expected macro, got {:?}", other),
    }
    assert_eq!(run_err("%AMM*1,1,$4000000000,0,0*%%ADD10M*%"), ErrType::UnboundVariable(4_000_000_000));
}

#[test]
fn test_region() {
    let src = "%ADD10C,1*%D10*\nG36*\nX0Y0D02*\nX1000000Y0D01*\nY1000000D01*\nX0D01*\nY0D01*\nG37*\nM02*";
    let out = run(src);
    assert_eq!(out.commands.len(), 1);
    match &out.commands.commands()[0] {
        DrawCommand::Region(region) => {
            assert_eq!(region.polarity, Polarity::DarkRegion);
            assert_eq!(region.contours.len(), 1);
            let contour = &region.contours[0];
            assert_eq!(contour.start, pt(0., 0.));
            let ends: Vec<_> = contour.segments.iter().map(Segment::end).collect();
            assert_eq!(ends, vec![pt(1., 0.), pt(1., 1.), pt(0., 1.), pt(0., 0.)]);
        }
        other => panic!("expected region, got {:?}", other),
    }
    assert!(!out.state.region_active);

    // with outlines, each segment is also drawn, before the region itself
    let mut config = Config::default();
    config.interpreter.draw_region_outlines = true;
    let out = try_run(src, &config).unwrap();
    assert_eq!(out.commands.len(), 5);
    for cmd in &out.commands.commands()[..4] {
        match cmd {
            DrawCommand::Line(l) => {
                assert_eq!(l.polarity, Polarity::DarkRegion);
                assert_eq!(l.width, mm(1.));
            }
            other => panic!("expected outline, got {:?}", other),
        }
    }
    assert!(matches!(out.commands.commands()[4], DrawCommand::Region(_)));
}

#[test]
fn test_region_contours() {
    // D02 inside a region starts a new contour; clear polarity carries over
    let src = "%LPC*%G36*X0Y0D02*X1000000D01*Y1000000D01*X0Y0D01*\
               X5000000Y0D02*X6000000D01*Y1000000D01*X5000000Y0D01*G37*";
    let out = run(src);
    match &out.commands.commands()[0] {
        DrawCommand::Region(region) => {
            assert_eq!(region.polarity, Polarity::ClearRegion);
            assert_eq!(region.contours.len(), 2);
            assert_eq!(region.contours[1].start, pt(5., 0.));
        }
        other => panic!("expected region, got {:?}", other),
    }

    // a region without segments produces nothing
    assert!(run("G36*X0Y0D02*G37*").commands.is_empty());
}

#[test]
fn test_region_errors() {
    assert_eq!(run_err("%ADD10C,1*%D10*G36*X0Y0D03*G37*"), ErrType::NotAllowedInRegion("D03"));
    assert_eq!(run_err("G36*G36*"), ErrType::RegionAlreadyOpen);
    assert_eq!(run_err("G36*%ABD10*%"), ErrType::NotAllowedInRegion("AB"));
    assert_eq!(run_err("G36*%SRX2Y1I1J0*%"), ErrType::NotAllowedInRegion("SR"));
    assert_eq!(run_err("G37*"), ErrType::NotOpen(FrameKind::Region));
    assert_eq!(run_err("G36*X0Y0D02*X1D01*"), ErrType::UnclosedAtEnd(FrameKind::Region));
}

#[test]
fn test_nesting_errors() {
    assert_eq!(run_err("%SR*%"), ErrType::NotOpen(FrameKind::StepRepeat));
    assert_eq!(run_err("%AB*%"), ErrType::NotOpen(FrameKind::Block));
    assert_eq!(run_err("%SRX2Y1I1J0*%%SRX2Y1I1J0*%"), ErrType::StepRepeatNested);
    assert_eq!(run_err("%ABD20*%G36*%AB*%"),
               ErrType::MismatchedClose { closing: FrameKind::Block, open: FrameKind::Region });
    assert_eq!(run_err("%ABD20*%%ABD20*%"), ErrType::ApertureRedefined(ApertureId(20)));
    assert_eq!(run_err("%ABD20*%"), ErrType::UnclosedAtEnd(FrameKind::Block));

    // unclosed frames are discarded under the warn policy
    let out = try_run("%ADD10C,1*%D10*%SRX2Y1I1J0*%D03*", &config(OnError::Warn)).unwrap();
    assert!(out.commands.is_empty());
    assert_eq!(out.state.step_repeat, None);
}

#[test]
fn test_aperture_lifecycle() {
    assert_eq!(run_err("%ADD10C,1*%%ADD10R,1X1*%"), ErrType::ApertureRedefined(ApertureId(10)));
    assert_eq!(run_err("%ADD10C,1*%X0Y0D03*"), ErrType::ApertureNotSelected);
    assert_eq!(run_err("D12*"), ErrType::ApertureNotFound(ApertureId(12)));

    let file = parse("test.gbr", "%FSLAX26Y26*%%ADD10C,1*%").unwrap();
    let err = interpret(&file, &Config::default()).unwrap_err();
    assert_eq!(err.errtype, ErrType::UnitNotSet);

    let file = parse("test.gbr", "%MOMM*%X0Y0D02*").unwrap();
    let err = interpret(&file, &Config::default()).unwrap_err();
    assert_eq!(err.errtype, ErrType::FormatNotSet);

    assert_eq!(run_err("%FSLAX25Y25*%"), ErrType::FormatRedefined);
}

#[test]
fn test_block_flash() {
    let src = "%ADD10C,1*%\n\
               %ABD20*%\nD10*\nX0Y0D03*\nX1000000Y0D03*\n%AB*%\n\
               D20*\nX5000000Y5000000D03*\n\
               %LPC*%\nX0Y0D03*\nM02*\n";
    let out = run(src);
    assert_eq!(flashes(&out), vec![
        (pt(5., 5.), Polarity::Dark),
        (pt(6., 5.), Polarity::Dark),
        (pt(0., 0.), Polarity::Clear),
        (pt(1., 0.), Polarity::Clear),
    ]);
    match &out.state.apertures.get(ApertureId(20)).unwrap().shape {
        Shape::Block(buffer) => assert_eq!(buffer.len(), 2),
        other => panic!("expected block, got {:?}", other),
    }
    assert_eq!(out.state.block_depth, 0);
}

#[test]
fn test_block_flash_transformed() {
    let src = "%ADD10C,1*%%ABD20*%D10*X1000000Y0D03*%AB*%\
               %LR90*%D20*X5000000Y5000000D03*\
               %LR0*%%LMX*%X0Y0D03*";
    let out = run(src);
    let cmds = out.commands.commands();
    match (&cmds[0], &cmds[1]) {
        (DrawCommand::Flash(rotated), DrawCommand::Flash(mirrored)) => {
            assert_eq!(rotated.position, pt(5., 6.));
            assert_eq!(rotated.transform.rotation, 90.);
            assert_eq!(mirrored.position, pt(-1., 0.));
            assert_eq!(mirrored.transform.mirroring, Mirroring::X);
        }
        other => panic!("expected flashes, got {:?}", other),
    }
}

#[test]
fn test_nested_blocks() {
    let src = "%ADD10C,1*%\
               %ABD20*%%ABD21*%D10*X0Y0D03*%AB*%D21*X1000000Y0D03*X2000000Y0D03*%AB*%\
               D20*X0Y1000000D03*";
    let out = run(src);
    let positions: Vec<_> = flashes(&out).into_iter().map(|f| f.0).collect();
    assert_eq!(positions, vec![pt(1., 1.), pt(2., 1.)]);
}

#[test]
fn test_incremental() {
    let out = run("%ADD10C,1*%D10*G91*X1000000Y0D01*X1000000Y1000000D01*Y-500000D01*");
    let ends: Vec<_> = out.commands.iter().map(|cmd| match cmd {
        DrawCommand::Line(l) => (l.start, l.end),
        other => panic!("expected line, got {:?}", other),
    }).collect();
    assert_eq!(ends, vec![
        (pt(0., 0.), pt(1., 0.)),
        (pt(1., 0.), pt(2., 1.)),
        (pt(2., 1.), pt(2., 0.5)),
    ]);

    let file = parse("test.gbr", "%FSLIX26Y26*%%MOMM*%%ADD10C,1*%D10*X1000000D03*X1000000D03*").unwrap();
    let out = interpret(&file, &Config::default()).unwrap();
    assert_eq!(out.state.position, pt(2., 0.));
}

#[test]
fn test_arcs() {
    let out = run("%ADD10C,0.1*%D10*G75*G03*X1000000Y0D02*X0Y1000000I-1000000J0D01*\
                   X0Y1000000I0J-1000000D01*");
    match out.commands.commands() {
        [DrawCommand::Arc(quarter), DrawCommand::Arc(full)] => {
            assert_eq!(quarter.center, pt(0., 0.));
            assert_eq!(quarter.center_offset, pt(-1., 0.));
            assert_eq!(quarter.direction, ArcDirection::CounterClockwise);
            assert_eq!(quarter.quadrant, QuadrantMode::Multi);
            assert!((quarter.sweep - 90.0).abs() < 1e-9);
            assert_eq!(quarter.width, mm(0.1));
            assert_eq!(full.sweep, 360.0);
        }
        other => panic!("expected two arcs, got {:?}", other),
    }

    // single quadrant is the default, with unsigned offsets
    let out = run("%ADD10C,0.1*%D10*G02*X1000000Y0D02*X0Y1000000I0J1000000D01*");
    match &out.commands.commands()[0] {
        DrawCommand::Arc(arc) => {
            assert_eq!(arc.center, pt(1., 1.));
            assert_eq!(arc.direction, ArcDirection::Clockwise);
            assert_eq!(arc.quadrant, QuadrantMode::Single);
        }
        other => panic!("expected arc, got {:?}", other),
    }

    assert_eq!(run_err("%ADD10C,1*%D10*G75*G02*X1000000Y0D01*"), ErrType::InvalidArc);
}

#[test]
fn test_stroke_width() {
    let out = run("%ADD10R,2X0.5*%D10*%LS2*%X1000000D01*");
    match &out.commands.commands()[0] {
        DrawCommand::Line(l) => assert_eq!(l.width, mm(1.)),
        other => panic!("expected line, got {:?}", other),
    }
    // a block aperture strokes with zero width
    let out = run("%ADD10C,1*%%ABD20*%D10*D03*%AB*%D20*X1000000D01*");
    match &out.commands.commands()[0] {
        DrawCommand::Line(l) => assert_eq!(l.width, Offset::ZERO),
        other => panic!("expected line, got {:?}", other),
    }
}

#[test]
fn test_attributes() {
    let src = "%TF.FileFunction,Copper,L1,Top*%\
               %ADD10C,1*%D10*%TA.AperFunction,SMDPad,CuDef*%\
               %TO.N,GND*%%TO.C,R1*%X0Y0D03*\
               %TD.C*%X1000000D03*\
               %TD*%X2000000D03*";
    let out = run(src);
    assert_eq!(out.state.file_attributes[".FileFunction"], "Copper,L1,Top");
    let cmds = out.commands.commands();
    assert_eq!(cmds[0].attributes().len(), 2);
    assert_eq!(cmds[0].attributes()[".N"], "GND");
    assert_eq!(cmds[1].attributes().keys().collect::<Vec<_>>(), vec![".N"]);
    assert!(cmds[2].attributes().is_empty());
    // TD without a name also clears the current aperture's attributes
    assert!(out.state.apertures.get(ApertureId(10)).unwrap().attributes.is_empty());

    let out = run("%ADD10C,1*%D10*%TA.AperFunction,ViaPad*%");
    let aperture = out.state.apertures.get(ApertureId(10)).unwrap();
    assert_eq!(aperture.attributes[".AperFunction"], "ViaPad");
}

#[test]
fn test_legacy_commands() {
    let out = run("G70*%IPPOS*%%INboard*%%ASAXBY*%%LNtop*%%ADD10C,1*%G54D10*");
    let state = &out.state;
    assert_eq!(state.unit, Some(Unit::Inches));
    assert_eq!(state.image_polarity, Some(ImagePolarity::Positive));
    assert_eq!(state.image_name.as_deref(), Some("board"));
    assert_eq!(state.axis_select, Some(AxisSelect::AxBy));
    match &state.apertures.get(ApertureId(10)).unwrap().shape {
        Shape::Circle { diameter, .. } => assert_eq!(*diameter, Offset::from_mm(25.4)),
        other => panic!("expected circle, got {:?}", other),
    }
}

#[test]
fn test_stops_and_eval_until() {
    let src = format!("{}%ADD10C,1*%D10*M00*X0Y0D03*M01*X1000000Y0D03*M02*X2000000Y0D03*", HEADER);
    let file = parse("test.gbr", &src).unwrap();
    let mut evaluator = Evaluator::new(&Config::default());
    let count = evaluator.eval_until(&file, |state| state.reached_program_stop).unwrap();
    assert_eq!(count, 5);
    assert_eq!(evaluator.buffers().main().len(), 0);

    let mut evaluator = Evaluator::new(&Config::default());
    let count = evaluator.eval_until(&file, |state| state.reached_end_of_file).unwrap();
    assert_eq!(count, 9);
    let state = evaluator.state();
    assert!(state.reached_program_stop);
    assert!(state.reached_optional_stop);
    assert!(state.reached_end_of_file);
    assert_eq!(evaluator.buffers().main().len(), 2);

    let out = interpret(&file, &Config::default()).unwrap();
    assert_eq!(out.commands.len(), 3);
}

#[test]
fn test_json_output() {
    let out = run("%ADD10C,1*%D10*X0Y0D03*");
    let json = serde_json::to_value(&out.commands.commands()[0]).unwrap();
    assert_eq!(json["kind"], "Flash");
    assert_eq!(json["aperture"], 10);
    assert!(serde_json::to_string(&out.state).is_ok());
}

#[test]
fn test_ignored_commands() {
    let file = parse("test.gbr", "G04 nothing to see*G55*%IR0*%%OFA0B0*%").unwrap();
    let mut evaluator = Evaluator::new(&Config::default());
    for command in &file.commands {
        assert!(!matches!(command.node, Command::EndOfFile));
        assert_eq!(evaluator.eval_command(command), Ok(Step::Continue));
    }
}
