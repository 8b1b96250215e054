use anyhow::Result;

fn main() -> Result<()> {
    siteupdate::cli::run()
}
