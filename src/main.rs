fn main() {
    if let Err(e) = riskroster::app::run_cli() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
