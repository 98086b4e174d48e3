use std::process;

fn main() {
    match notesite_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("notesite error: {err}");
            process::exit(2);
        }
    }
}
