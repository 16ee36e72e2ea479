fn main() {
    if let Err(err) = histplot::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
