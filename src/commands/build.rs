use crate::BuildArgs;

use super::{cancel_on_ctrl_c, load_builder};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let (builder, config_path) = load_builder(args.config_file.as_deref())?;
    tracing::debug!(config = %config_path.display(), "using config");

    let builder = builder.include_drafts(args.drafts).jobs(args.jobs);
    let report = builder.build(cancel_on_ctrl_c()).await?;

    report.write_summary(&mut std::io::stderr().lock())?;

    if report.has_failures() {
        anyhow::bail!("{} page(s) failed to build", report.failures.len());
    }
    if report.was_cancelled() {
        anyhow::bail!("build cancelled");
    }

    println!("Built site to {}", builder.output_dir().display());
    Ok(())
}
