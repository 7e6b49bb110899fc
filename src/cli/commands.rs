//! Subcommand runners

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::args::{FineTuneArgs, GroupArgs, SampleArgs, StoreLookupArgs};
use crate::pipeline::{
    group_statistics, load_dataset, optimal_from_plan, progressive_sampling, rng, Allocation,
    FineTuneConfig, SamplingConfig, SearchConfig, StrataPlan,
};
use crate::report::{
    display_fine_tune, display_sampling, display_statistics, format_score, write_json,
    ExportMetadata, FineTuneExport, GroupingExport, SamplingExport,
};
use crate::store::{fine_tune_stored, load_required, GroupingStore, JsonDirStore};
use crate::utils::{
    create_spinner, display_path, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_info, print_step_header, print_success, print_warning,
};

/// `stratify group`
pub fn run_group(args: &GroupArgs) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&display_path(&args.input, 41), &args.layers, args.groups, args.seed);

    print_step_header(1, "Load Subjects");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading subject table...");
    let df = load_dataset(&args.input, args.infer_schema_length)?;
    finish_with_success(
        &spinner,
        &format!("Loaded {} subjects, {} columns", df.height(), df.width()),
    );
    print_info(&format!("Took {:.2?}", step_start.elapsed()));

    print_step_header(2, "Stratify");
    let plan = StrataPlan::prepare(&df, &args.layers)?;
    for ignored in plan.ignored_layers() {
        print_warning(&format!("Layer '{}' is not numeric and was ignored", ignored));
    }
    if plan.dropped_count() > 0 {
        print_warning(&format!(
            "{} subject(s) with missing layer values excluded",
            plan.dropped_count()
        ));
    }
    print_success(&format!(
        "{} usable subjects in {} strata",
        plan.usable_count(),
        plan.strata_count()
    ));
    let allocation = Allocation::resolve(args.explicit_sizes(), plan.usable_count(), args.groups)?;
    print_info(&format!("Group sizes: {:?}", allocation.sizes()));

    print_step_header(3, "Search");
    let step_start = Instant::now();
    let spinner = create_spinner(&format!("Running {} randomized attempts...", args.attempts));
    let config = SearchConfig {
        attempts: args.attempts,
        mode: args.mode,
    };
    config.validate()?;
    let mut stream = rng::from_optional_seed(args.seed);
    let Some(best) = optimal_from_plan(&plan, args.groups, args.explicit_sizes(), config, &mut stream)
    else {
        finish_with_warning(&spinner, "No attempt produced a grouping");
        anyhow::bail!("All {} grouping attempts failed", args.attempts);
    };
    finish_with_success(
        &spinner,
        &format!(
            "Best attempt #{} scored {}",
            best.attempt + 1,
            format_score(best.score)
        ),
    );
    print_info(&format!("Took {:.2?}", step_start.elapsed()));

    let layers = plan.layers().to_vec();
    let stats = group_statistics(&best.grouping, &layers);
    display_statistics(&best.grouping, &stats, &layers);

    let mut metadata = ExportMetadata::new("group", &layers, args.groups)
        .with_input(&args.input)
        .with_seed(args.seed);

    if !args.no_save {
        let store = JsonDirStore::open(&args.store)
            .with_context(|| format!("Failed to open result store: {}", args.store.display()))?;
        let record = store.save(&best.grouping, args.groups, &layers)?;
        println!();
        print_success(&format!(
            "Stored as {} in {}",
            style(&record.id).yellow().bold(),
            args.store.display()
        ));
        metadata = metadata.with_result_id(record.id);
    }

    if let Some(output) = &args.output {
        write_json(&GroupingExport::new(metadata, &best), output)?;
        print_success(&format!("Exported to {}", output.display()));
    }

    print_completion("Grouping complete!");
    Ok(())
}

/// `stratify fine-tune`
pub fn run_fine_tune(args: &FineTuneArgs) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    let store = JsonDirStore::open(&args.store)
        .with_context(|| format!("Failed to open result store: {}", args.store.display()))?;
    let config = FineTuneConfig {
        simulation_count: args.simulations,
        min_extract: args.min_extract,
        max_extract: args.max_extract,
    };
    config.validate()?;

    print_step_header(1, "Fine-Tune");
    let step_start = Instant::now();
    let spinner = create_spinner(&format!(
        "Sweeping extract counts {}..={} ({} trials each)...",
        args.min_extract, args.max_extract, args.simulations
    ));
    let (record, report) = fine_tune_stored(&store, &args.id, config)?;
    finish_with_success(&spinner, "Sweep complete");
    print_info(&format!("Took {:.2?}", step_start.elapsed()));

    display_fine_tune(&report);

    let layers = record.layer_names();
    let mut metadata =
        ExportMetadata::new("fine-tune", &layers, record.group_count).with_result_id(&record.id);

    match &report.best {
        Some(best) => {
            let stats = group_statistics(best, &layers);
            display_statistics(best, &stats, &layers);
            if args.save {
                let saved = store.save(best, record.group_count, &layers)?;
                println!();
                print_success(&format!(
                    "Improved grouping stored as {}",
                    style(&saved.id).yellow().bold()
                ));
                metadata = metadata.with_result_id(saved.id);
            }
        }
        None => {
            println!();
            print_info("No trial improved on the stored grouping; keeping the original");
        }
    }

    if let Some(output) = &args.output {
        write_json(
            &FineTuneExport {
                metadata,
                report: &report,
            },
            output,
        )?;
        print_success(&format!("Exported to {}", output.display()));
    }

    print_completion("Fine-tuning complete!");
    Ok(())
}

/// `stratify sample`
pub fn run_sample(args: &SampleArgs) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&display_path(&args.input, 41), &args.layers, args.groups, args.seed);

    print_step_header(1, "Load Subjects");
    let spinner = create_spinner("Reading subject table...");
    let df = load_dataset(&args.input, args.infer_schema_length)?;
    finish_with_success(&spinner, &format!("Loaded {} subjects", df.height()));

    print_step_header(2, "Progressive Sampling");
    let step_start = Instant::now();
    let config = SamplingConfig {
        simulation_count: args.simulations,
        sample_size: args.sample_size,
        iteration_count: args.iterations,
        group_count: args.groups,
        mode: args.mode,
    };
    config.validate()?;
    let spinner = create_spinner(&format!(
        "Sample sizes {}..={} ({} trials each)...",
        args.sample_size,
        config.last_sample_size()?,
        args.simulations
    ));
    let mut stream = rng::from_optional_seed(args.seed);
    let report = progressive_sampling(&df, &args.layers, config, &mut stream)?;
    finish_with_success(&spinner, "Sampling complete");
    print_info(&format!("Took {:.2?}", step_start.elapsed()));

    display_sampling(&report);

    if let Some(output) = &args.output {
        let metadata = ExportMetadata::new("sample", &args.layers, args.groups)
            .with_input(&args.input)
            .with_seed(args.seed);
        write_json(
            &SamplingExport {
                metadata,
                report: &report,
            },
            output,
        )?;
        print_success(&format!("Exported to {}", output.display()));
    }

    print_completion("Sampling complete!");
    Ok(())
}

/// `stratify stats`
pub fn run_stats(args: &StoreLookupArgs) -> Result<()> {
    let store = JsonDirStore::open(&args.store)
        .with_context(|| format!("Failed to open result store: {}", args.store.display()))?;
    let record = load_required(&store, &args.id)?;
    let layers = record.layer_names();

    println!(
        "\n    {} {} ({} groups, created {})",
        style("◆").cyan().bold(),
        style(&record.id).yellow().bold(),
        record.group_count,
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let stats = group_statistics(&record.data, &layers);
    display_statistics(&record.data, &stats, &layers);
    println!();
    Ok(())
}

/// `stratify list`
pub fn run_list(store_dir: &std::path::Path) -> Result<()> {
    let store = JsonDirStore::open(store_dir)
        .with_context(|| format!("Failed to open result store: {}", store_dir.display()))?;
    let ids = store.list()?;

    if ids.is_empty() {
        print_info(&format!("No stored results in {}", store_dir.display()));
        return Ok(());
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}
