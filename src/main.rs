fn main() {
    if let Err(e) = bookshelf::app::run_cli() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
