use anyhow::Context;
use img2pix::{count_colors, ProcessingParameters, SaveOptions, Session};
use log::info;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (input_path, output_path) = match (args.next(), args.next()) {
        (Some(input), Some(output)) => (PathBuf::from(input), PathBuf::from(output)),
        _ => anyhow::bail!("usage: pixelate <input> <output> [params.json]"),
    };

    let params = match args.next() {
        Some(path) => ProcessingParameters::from_json_file(&PathBuf::from(&path))
            .with_context(|| format!("reading parameters from {}", path))?,
        None => ProcessingParameters::default(),
    };
    info!("Parameters: {:?}", params);

    let mut session = Session::open(&input_path)?;
    let image_info = session.image_info();
    info!(
        "Source: {}x{}, alpha: {}, format: {}",
        image_info.width,
        image_info.height,
        image_info.has_alpha,
        image_info.source_format.as_deref().unwrap_or("unknown")
    );

    let processed = session.apply(&params)?;
    info!("Result uses {} colors", count_colors(processed));

    session.save_processed(&output_path, &SaveOptions::default())?;
    println!("Output saved to: {}", output_path.display());

    Ok(())
}
