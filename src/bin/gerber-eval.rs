use std::{env, fs};
use gerberx3::config::Config;
use gerberx3::eval::interpret;
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
        Ok(file) => match interpret(&file, &config) {
            Err(e) => eprintln!("{}", e),
            Ok(output) => {
                for cmd in &output.commands {
                    println!("{}", serde_json::to_string(cmd).unwrap());
                }
                if let Some(bbox) = output.commands.bounding_box(&output.state.apertures) {
                    eprintln!("extents: {} to {}", bbox.min, bbox.max);
                }
            }
        }
    }
}
