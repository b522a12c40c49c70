use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use spellc::eval::ValueSource;
use spellc::ty::DataType;

/// Interactive value source: prompts on stdout and reads one line per
/// input statement.
struct StdinValues;

impl ValueSource for StdinValues {
  fn request(&mut self, name: &str, _data_type: DataType) -> String {
    print!("Enter value for {name}: ");
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line).ok();
    line.trim_end_matches(['\r', '\n']).to_string()
  }
}

fn main() {
  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("spellc");
    eprintln!("usage: {program} <source-file>");
    process::exit(1);
  }

  let source = match fs::read_to_string(&args[1]) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("{}: {err}", args[1]);
      process::exit(1);
    }
  };

  let mut values = StdinValues;
  match spellc::generate_assembly(&source, &mut values) {
    Ok(asm) => println!("{asm}"),
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
