use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use dermascan::{
    Assessment, HttpClassifierLoader, ModelSource, ScanStore, ScreeningPipeline, SymptomFlags,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the lesion photograph
    #[arg(short, long)]
    image: PathBuf,

    /// The spot has been actively itching
    #[arg(long)]
    itch: bool,

    /// The spot bleeds or crusts
    #[arg(long)]
    bleed: bool,

    /// The spot has grown rapidly
    #[arg(long)]
    growth: bool,

    /// Base URL of the classifier export (serves model.onnx and metadata.json)
    #[arg(long)]
    model_url: Option<String>,

    /// Force a fresh download of the classifier assets
    #[arg(short, long)]
    fresh: bool,

    /// Persistence endpoint; when set, the completed record is posted there
    #[arg(long)]
    store_url: Option<String>,

    /// Bearer token for the persistence endpoint
    #[arg(long)]
    store_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut source = ModelSource::from_env();
    if let Some(url) = args.model_url.clone() {
        source.base_url = url;
    }

    if args.fresh {
        info!("fresh download requested - removing cached classifier assets...");
        HttpClassifierLoader::new_default()?.remove_cached(&source)?;
    }

    let pipeline = ScreeningPipeline::new(source)?;

    let start = Instant::now();
    match pipeline.ensure_loaded().await {
        Ok(()) => info!("classifier ready (took {:.2?})", start.elapsed()),
        Err(err) => warn!("classifier unavailable ({err}); continuing with fallback base risk"),
    }

    let image = fs::read(&args.image)
        .with_context(|| format!("failed to read image {}", args.image.display()))?;
    let symptoms = SymptomFlags {
        itch: args.itch,
        bleed: args.bleed,
        growth: args.growth,
    };

    let assessment = pipeline.assess(&image, symptoms).await;
    print_report(&assessment);

    if let Some(url) = args.store_url {
        let mut store = ScanStore::new(url);
        if let Some(token) = args.store_token {
            store = store.with_token(token);
        }
        let record = assessment.record(args.image.display().to_string());
        let stored = store.create_scan(&record).await?;
        println!("\nSaved scan {}", stored.id);
    }

    Ok(())
}

fn print_report(assessment: &Assessment) {
    println!("\nResults:");

    if assessment.inference.succeeded {
        println!("  AI predictions (ranked):");
        for prediction in &assessment.inference.predictions {
            println!(
                "    {}: {:.1}%",
                prediction.label,
                prediction.probability * 100.0
            );
        }
    } else if let Some(error) = &assessment.inference.error {
        println!("  AI unavailable ({error}); fallback base risk used");
    }

    let symptoms = assessment.symptoms.descriptions();
    if symptoms.is_empty() {
        println!("  Symptoms: none reported");
    } else {
        println!("  Symptoms: {}", symptoms.join(", "));
    }

    println!("  Base risk:   {:.1}%", assessment.risk.base_risk * 100.0);
    println!("  Raw score:   {:.3}", assessment.risk.raw_score);
    if assessment.risk.override_applied {
        println!("  Critical symptom present: score floored at 0.75");
    }
    println!("  Final score: {:.1}%", assessment.risk.final_score * 100.0);
    println!(
        "  Assessment:  {} ({})",
        assessment.risk.tier.label(),
        assessment.risk.tier.action()
    );
}
