use crate::CheckArgs;

use super::{cancel_on_ctrl_c, load_builder};

pub async fn run(args: &CheckArgs) -> Result<(), anyhow::Error> {
    let (builder, _) = load_builder(args.config_file.as_deref())?;
    let report = builder
        .include_drafts(args.drafts)
        .check(cancel_on_ctrl_c())
        .await?;

    for page in &report.emitted {
        println!("{} -> {} ({})", page.path.display(), page.template, page.via);
    }
    for path in &report.skipped {
        println!("{} -> skipped (draft)", path.display());
    }

    report.write_summary(&mut std::io::stderr().lock())?;

    if report.has_failures() {
        anyhow::bail!("{} page(s) failed", report.failures.len());
    }
    Ok(())
}
