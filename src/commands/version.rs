use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("quakewatch version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
