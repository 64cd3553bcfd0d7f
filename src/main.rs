fn main() -> Result<(), Box<dyn std::error::Error>> {
    vellum::cli::main()
}
