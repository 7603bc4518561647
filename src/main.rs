use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use tariff_recon::config::ValidatorConfig;
use tariff_recon::utils;
use tariff_recon::validator::export::{
    export_csv, export_file_name, template_csv, template_file_name, TemplateRole,
};
use tariff_recon::validator::{
    Category, HistoryEntry, HistoryStore, ReconciliationEngine, ReportFilter,
};

#[derive(Parser)]
#[command(name = "tariff-recon")]
#[command(about = "Tariff Recon - validates IT tariff/cost exports against logistics master data")]
struct Args {
    #[arg(short, long, required_unless_present = "write_templates", help = "Master data CSV file")]
    master: Option<PathBuf>,

    #[arg(short, long, required_unless_present = "write_templates", help = "IT export CSV file to validate")]
    source: Option<PathBuf>,

    #[arg(short = 'k', long, value_enum, default_value = "tarif", help = "Validation category")]
    category: Category,

    #[arg(short, long, default_value = "config.json", help = "Configuration file path")]
    config: PathBuf,

    #[arg(short, long, value_enum, default_value = "all", help = "Report rows to export")]
    filter: ReportFilter,

    #[arg(short, long, help = "Write the filtered report CSV into this directory")]
    export_dir: Option<PathBuf>,

    #[arg(long, help = "Write the onboarding template CSVs into this directory and exit")]
    write_templates: Option<PathBuf>,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = if args.config.exists() {
        ValidatorConfig::from_file(&args.config)?
    } else {
        ValidatorConfig::default()
    };

    let verbosity = if args.verbose { "verbose" } else { &config.verbosity };
    utils::setup_logging(verbosity)?;

    if let Some(template_dir) = args.write_templates {
        return write_templates(&template_dir);
    }

    // Both flags are required unless templates were requested.
    let master = args.master.context("master file argument missing")?;
    let source = args.source.context("source file argument missing")?;

    for path in [&master, &source] {
        if !path.exists() {
            anyhow::bail!("Input file does not exist: {}", path.display());
        }
    }

    info!("Starting tariff validation");
    for (role, path) in [("Master", &master), ("Source", &source)] {
        let size = std::fs::metadata(path)?.len();
        info!("{} file: {} ({})", role, path.display(), utils::format_bytes(size));
    }
    info!("Category: {}", args.category);

    let engine = ReconciliationEngine::new(config.chunk_size_bytes());
    let start_time = Instant::now();

    let mut last_reported = 0u32;
    let result = engine
        .validate(&master, &source, args.category, |percent| {
            let step = percent as u32;
            if step >= last_reported + 10 {
                info!("Progress: {}%", step);
                last_reported = step;
            }
        })
        .await?;

    info!("Validation completed successfully!");
    info!("Total rows: {}", result.total_rows);
    info!("Matches: {}", result.matches);
    info!("Mismatches: {}", result.mismatches.len());
    info!("Without master data: {}", result.blanks);
    info!(
        "Processing time: {}",
        utils::format_duration(start_time.elapsed().as_secs_f64())
    );

    let store = HistoryStore::new(&config.history_file, config.history_capacity());
    let mut history = store.load()?;
    history.append(HistoryEntry::new(
        file_name(&master),
        file_name(&source),
        args.category,
        result.clone(),
    ));
    store.save(&history)?;
    info!(
        "History entry recorded ({} entries in {})",
        history.len(),
        config.history_file.display()
    );

    if let Some(export_dir) = args.export_dir {
        std::fs::create_dir_all(&export_dir)?;
        let rows = result.filtered(args.filter);
        let bytes = export_csv(&rows, args.category)?;
        let path = export_dir.join(export_file_name(args.category, utils::epoch_millis()));
        std::fs::write(&path, bytes)?;
        info!("Exported {} rows to {}", rows.len(), path.display());
    }

    Ok(())
}

fn write_templates(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for category in [Category::Tarif, Category::Biaya] {
        for role in [TemplateRole::It, TemplateRole::Master] {
            let path = dir.join(template_file_name(category, role));
            std::fs::write(&path, template_csv(category, role))?;
            info!("Template written: {}", path.display());
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
