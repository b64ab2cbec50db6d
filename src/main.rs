use std::{env, fs, io, process};

use lisplet::globals;

const DEMO: &str = r#"
; a short tour of the stock function table
(plus 1 2 3)
(minus 7)
(times (plus 1 2) (minus 10 6))
(greater_than 10 3)
(equal (plus 2 2) 4)
(concat "hello" ", " "world\n")
(length "déjà vu")
"#;

fn main() {
    let source = match env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("cannot read {path}: {err}");
                process::exit(1);
            }
        },
        None => DEMO.to_string(),
    };

    if let Err(err) = lisplet::run(&source, &globals::table(), io::stdout()) {
        eprintln!("{err}");
        process::exit(1);
    }
}
