fn main() {
    if let Err(err) = batched_deferred::run() {
        eprintln!("Application error: {err}");
        std::process::exit(1);
    }
}
