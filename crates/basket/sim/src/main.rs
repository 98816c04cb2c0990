fn main() -> anyhow::Result<()> {
    basket_sim::run()?;
    Ok(())
}
