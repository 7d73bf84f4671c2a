use crate::CleanArgs;

use super::load_builder;

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let (builder, _) = load_builder(args.config_file.as_deref())?;

    // Delete the generated site folder, never one holding project files
    let site_path = builder.checked_output_dir()?;
    let site_path = site_path.canonicalize().unwrap_or(site_path);
    if !site_path.exists() {
        println!("Nothing to clean");
        return Ok(());
    }

    if args.dry_run {
        println!("Would delete {}", site_path.display());
    } else {
        tokio::fs::remove_dir_all(&site_path).await?;
        println!("Deleted {}", site_path.display());
    }

    Ok(())
}
