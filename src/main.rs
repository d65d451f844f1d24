fn main() {
    if let Err(err) = archsvg::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
