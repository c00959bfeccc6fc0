//! Store/generation reachability command

use anyhow::Result;
use bookdash_core::Pipeline;

pub async fn cmd_status(pipeline: &Pipeline) -> Result<()> {
    let status = pipeline.status().await;

    println!();
    println!("📊 Bookdash Status");
    println!("   ─────────────────────────────────────────────");
    println!("   Store: {}", status.store_host);
    println!("   Table: {}", pipeline.table());
    if status.store_ok {
        println!("   ✅ Store reachable");
        match pipeline.snapshot().await {
            Ok(snapshot) => {
                println!(
                    "   Rows: {} clean, {} dropped of {} fetched",
                    snapshot.report.kept, snapshot.report.dropped, snapshot.report.raw_rows
                );
            }
            Err(e) => println!("   ❌ Snapshot failed: {}", e),
        }
    } else {
        println!("   ❌ Store unreachable");
    }
    println!();
    println!("   Model chain: {}", status.models.join(" -> "));
    if status.generation_ok {
        println!("   ✅ Generation service reachable");
    } else {
        println!("   ❌ Generation service unreachable (estimates still work)");
    }
    println!();

    Ok(())
}
