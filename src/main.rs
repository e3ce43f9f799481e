fn main() {
    if let Err(err) = diagram_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
