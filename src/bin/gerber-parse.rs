use std::{env, fs};
use gerberx3::config::Config;
use gerberx3::parse::parse_with;

fn main() {
    env_logger::init();
    let filename = env::args().nth(1).expect("file name required");
    let input = fs::read_to_string(&filename).unwrap();
    let config = match env::args().nth(2) {
        Some(path) => Config::from_toml(&fs::read_to_string(path).unwrap()).unwrap(),
        None => Config::default(),
    };

    match parse_with(&filename, &input, &config.grammar) {
        Err(e) => eprintln!("Parse error: {}", e),
        Ok(file) => print!("{}", file),
    }
}
