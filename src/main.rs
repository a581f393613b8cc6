fn main() {
    if let Err(err) = record_merge::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
