fn main() {
    if let Err(e) = campus_canteen_lib::run() {
        eprintln!("canteen: {e}");
        std::process::exit(1);
    }
}
