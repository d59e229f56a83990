use lsh::Interpreter;

fn main() {
    if let Err(err) = Interpreter::default().repl() {
        eprintln!("lsh: {err:#}");
        std::process::exit(1);
    }
}
