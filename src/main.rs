use std::{env, path::PathBuf, process};

use mixamo2sl::convert::{ConvertOptions, RigDocument, Severity, convert_rig};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: mixamo2sl <input-rig.json> <output-rig.json>");
        process::exit(2);
    }

    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);

    let mut doc = RigDocument::load(&input)?;
    let report = convert_rig(&mut doc, &ConvertOptions::default())?;
    doc.save(&output)?;

    println!(
        "Skeletons: {}, Meshes: {}",
        report.skeleton_count, report.mesh_count
    );
    println!(
        "Renamed bones: {} ({} skipped)",
        report.renamed, report.skipped
    );
    println!(
        "Hierarchy: {} added, {} reparented, {} connected",
        report.added, report.reparented, report.connected
    );
    println!("Cleaned weight entries: {}", report.cleaned_entries);
    for issue in &report.issues {
        let tag = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        println!("[{tag}] {}: {}", issue.code, issue.message);
    }

    Ok(())
}
