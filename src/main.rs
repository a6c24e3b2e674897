fn main() {
    if let Err(err) = multi_timeline::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
