fn main() -> anyhow::Result<()> {
    interchange::cli::run_cli()
}
