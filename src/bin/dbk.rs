//! Alternate binary name (`dbk`) that forwards to the `daybook` library.
//! Keeping the alias as a real binary avoids shell alias requirements.

fn main() {
    if let Err(err) = daybook::entry() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
