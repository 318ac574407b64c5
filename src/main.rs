fn main() {
    if let Err(err) = daybook::entry() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
