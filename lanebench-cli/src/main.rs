fn main() -> anyhow::Result<()> {
    lanebench_cli::run()
}
