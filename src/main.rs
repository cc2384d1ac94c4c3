use anyhow::Context;

fn main() -> anyhow::Result<()> {
    formguide::run(std::env::args().skip(1)).context("formguide failed")?;
    Ok(())
}
