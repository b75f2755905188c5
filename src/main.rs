//! GradeForge: student performance analytics CLI
//!
//! This is the main entrypoint that orchestrates data loading, model
//! training, clustering, rule mining, visualization and prediction.

use anyhow::{Context, Result};
use clap::Parser;
use gradeforge::{viz, Args, Dataset, StageStatus, StudentPerformanceAnalyzer};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut analyzer = StudentPerformanceAnalyzer::new(args.pipeline_config());

    if let Some(features) = args.parse_feature_vector()? {
        run_prediction_mode(&args, &mut analyzer, &features)?;
    } else {
        run_full_pipeline(&args, &mut analyzer)?;
    }

    Ok(())
}

fn load_dataset(args: &Args, analyzer: &StudentPerformanceAnalyzer) -> Result<Dataset> {
    analyzer
        .load(&args.input, args.format.map(Into::into))
        .with_context(|| format!("loading {}", args.input.display()))
}

/// Train on the input and predict a single student
fn run_prediction_mode(args: &Args, analyzer: &mut StudentPerformanceAnalyzer, features: &[f64]) -> Result<()> {
    println!("=== Prediction Mode ===");
    println!("Input features: {:?}", features);

    let start_time = Instant::now();
    let dataset = load_dataset(args, analyzer)?;
    let outcome = analyzer.train(&dataset);

    if let Some(model) = analyzer.classifier() {
        let names: Vec<&str> = model.features().iter().map(|f| f.column_name()).collect();
        println!("Model features: {}", names.join(", "));
        println!("Held-out accuracy: {:.3}", outcome.accuracy());
    }

    let result = analyzer.predict(features)?;
    println!("\n✓ Predicted Category: {}", result.prediction);
    println!("  Confidence: {:.3}", result.confidence);
    if !result.is_available() {
        println!("  (classifier unavailable for this dataset)");
    }
    println!("  Processing time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Run the full analysis pipeline
fn run_full_pipeline(args: &Args, analyzer: &mut StudentPerformanceAnalyzer) -> Result<()> {
    println!("=== Student Performance Analysis ===\n");
    let start_time = Instant::now();

    let mut dataset = load_dataset(args, analyzer)?;
    println!(
        "✓ Data loaded: {} students, {} columns",
        dataset.n_rows(),
        dataset.n_columns()
    );

    let report = analyzer.run(&mut dataset);

    if let Some(distribution) = &report.distribution {
        println!("\n=== Performance Distribution ===");
        for (category, count) in distribution {
            println!("  {:<13} {}", category.as_str(), count);
        }
    }

    println!("\n=== Classification ===");
    match &report.classification {
        StageStatus::Done(evaluation) => {
            println!(
                "Accuracy: {:.3} ({} train / {} test rows)",
                evaluation.accuracy, evaluation.n_train, evaluation.n_test
            );
            println!("Feature importance:");
            for (field, importance) in &evaluation.importances {
                println!("  {:<18} {:5.1}%", field.column_name(), importance * 100.0);
            }
            println!("Confusion matrix (rows = actual):");
            for (class, row) in evaluation.classes.iter().zip(&evaluation.confusion) {
                println!("  {:<13} {:?}", class, row);
            }
        }
        StageStatus::Unavailable(reason) => println!("Unavailable: {}", reason),
    }

    match &report.clustering {
        StageStatus::Done(clustering) => {
            viz::print_cluster_statistics(clustering);
            if let Some(plot) = &args.plot {
                let written = viz::generate_visualization_report(clustering, plot)?;
                for path in written {
                    println!("Chart saved to: {}", path.display());
                }
            }
        }
        StageStatus::Unavailable(reason) => {
            println!("\n=== Cluster Statistics ===");
            println!("Unavailable: {}", reason);
        }
    }

    println!("\n=== Association Rules ===");
    if report.rules.is_empty() {
        println!("No rules could be evaluated on this dataset");
    }
    for rule in &report.rules {
        println!(
            "  {} -> {}: support {:.3}, confidence {:.3}, lift {:.3}",
            rule.antecedent, rule.consequent, rule.support, rule.confidence, rule.lift
        );
    }

    if let Some(dir) = &args.save_models {
        let written = analyzer.save(dir)?;
        println!("\nSaved {} model snapshot(s) to {}", written.len(), dir.display());
    }

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
