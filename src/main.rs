fn main() -> anyhow::Result<()> {
    showroom::run(showroom::Config::default())
}
