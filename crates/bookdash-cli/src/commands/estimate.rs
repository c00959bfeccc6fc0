//! Revenue estimation and narrative advice

use anyhow::Result;
use bookdash_core::{ConfidenceBand, Error, EstimateRequest, Pipeline};

use super::format_money;

pub async fn cmd_estimate(
    pipeline: &Pipeline,
    units: u64,
    rating: f64,
    genre: Option<String>,
    advise: bool,
) -> Result<()> {
    let request = EstimateRequest {
        target_units: units,
        target_rating: rating,
        target_genre: genre,
    };

    if advise {
        let (estimate, insight) = match pipeline.advise(&request).await {
            Ok(result) => result,
            Err(Error::InsufficientData(msg)) => {
                println!("❌ Cannot estimate: {}", msg);
                println!("   Add more varied sales records and try again.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        print_estimate(estimate.point_value, estimate.confidence_band);
        println!();
        if insight.generated {
            println!("💡 Insight");
        } else {
            println!("💡 Insight (generation unavailable)");
        }
        println!("   {}", insight.narrative.replace('\n', "\n   "));
        println!();
    } else {
        let estimate = match pipeline.estimate(&request).await {
            Ok(estimate) => estimate,
            Err(Error::InsufficientData(msg)) => {
                println!("❌ Cannot estimate: {}", msg);
                println!("   Add more varied sales records and try again.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        print_estimate(estimate.point_value, estimate.confidence_band);
        println!();
    }

    Ok(())
}

fn print_estimate(point_value: f64, band: ConfidenceBand) {
    let band_icon = match band {
        ConfidenceBand::Excellent => "🟢",
        ConfidenceBand::Good => "🟡",
        ConfidenceBand::AtRisk => "🔴",
    };

    println!();
    println!("💰 Estimated revenue: {}", format_money(point_value));
    println!("   {} Confidence band: {}", band_icon, band);
}
