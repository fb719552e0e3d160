// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! A parsing and interpretation library for [Gerber X3] files, the format
//! used to describe PCB fabrication layers.
//!
//! [Gerber X3]: https://www.ucamco.com/en/gerber
//!
//! ## Basic usage
//!
//! Use `gerberx3::parse::parse` to get an AST, then work with the abstract
//! syntax tree datastructures from `gerberx3::ast`, or walk it with a
//! `gerberx3::visit::Visitor`.
//!
//! Feed the AST into the evaluator from `gerberx3::eval`, which resolves
//! coordinates, apertures, regions, blocks and step-and-repeats, and yields a
//! flat list of drawing commands with absolute coordinates.
//!
//! The following code (the same as the "gerber-parse" demo binary) takes a
//! file as an argument, parses it and outputs the display form, which is the
//! same Gerber code in a canonical layout.
//!
//! ```rust,no_run
//! use std::{env, fs};
//! use gerberx3::parse::parse;
//!
//! fn main() {
//!     let filename = env::args().nth(1).unwrap();
//!     let input = fs::read_to_string(&filename).unwrap();
//!
//!     match parse(&filename, &input) {
//!         Err(e) => eprintln!("Parse error: {}", e),
//!         Ok(file) => print!("{}", file),
//!     }
//! }
//! ```
//!
//! Interpretation is a single call:
//!
//! ```rust
//! use gerberx3::{config::Config, eval::{interpret, DrawCommand}, parse::parse};
//!
//! let src = "%FSLAX26Y26*%%MOMM*%%ADD10C,1.5*%D10*X0Y0D02*X1000000Y0D01*M02*";
//! let file = parse("example.gbr", src).unwrap();
//! let output = interpret(&file, &Config::default()).unwrap();
//! assert!(matches!(output.commands.commands()[0], DrawCommand::Line(_)));
//! assert!(output.state.reached_end_of_file);
//! ```
//!
//! ## Unsupported features
//!
//! Rendering the resolved commands to images is left to other crates.

pub mod ast;
pub mod config;
pub mod coord;
pub mod eval;
pub mod finder;
pub mod parse;
pub mod span;
pub mod visit;

// internal helpers
pub(crate) mod util;
