use std::{env, fs, process::ExitCode, time::Instant};

use recurser::{frame::Context, parse};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "example.rec" };
    let code = match read_file(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let program = match parse(&code) {
        Ok(program) => program,
        Err(err) => {
            let (line, col, message) = err.envelope();
            eprintln!("parse error at {line}:{col}: {message}");
            return ExitCode::FAILURE;
        }
    };

    let mut context = Context::new();
    let result = program.execute(&mut context);
    let elapsed = start.elapsed();

    match result {
        Ok(value) => {
            let tree = context.root_call_node();
            let payload = match serde_json::to_string_pretty(&tree) {
                Ok(json) => json,
                Err(err) => {
                    eprintln!("error serializing call tree: {err}");
                    return ExitCode::FAILURE;
                }
            };
            eprintln!("success after: {elapsed:?}");
            if let Some(value) = &value {
                eprintln!("return value: {value}");
            }
            println!("{payload}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let (line, col, message) = err.envelope();
            eprintln!("error after: {elapsed:?}\n{line}:{col}: {message}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    eprintln!("Reading file: {file_path}");
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("Error: {file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("Error reading {file_path}: {err}"));
        }
    }
    match fs::read_to_string(file_path) {
        Ok(contents) => Ok(contents),
        Err(err) => Err(format!("Error reading file: {err}")),
    }
}
