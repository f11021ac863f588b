//! Shinkansen: passenger satisfaction prediction CLI
//!
//! Loads the travel and survey files of both splits, cleans and encodes them
//! with a policy fitted on training data, compares three tree ensembles on a
//! seeded validation split and writes test-split predictions.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use shinkansen::cli::{Cli, Commands, PipelineConfig, SchemaMode};
use shinkansen::model::{evaluate_candidates, select_best, ModelKind, ModelParams, SearchResult};
use shinkansen::pipeline::{
    align_columns, analyze_missing_values, assert_no_missing, category_counts, check_unique_ids,
    columns_with_missing, fit_ols_columns, get_column_names, load_split, predictions_frame,
    save_dataset, train_valid_split, Dataset, FeatureSchema, ImputationPolicy, LoadedSplit,
    OneHotEncoder, ARRIVAL_DELAY, DEPARTURE_DELAY,
};
use shinkansen::report::{
    display_category_counts, display_imputation, display_importances, display_missing_table,
    display_model_comparison, display_regression, export_run_report, rank_feature_importances,
    RowCounts, RunMetadata, RunReport, RunSummary,
};
use shinkansen::utils::{
    advance, create_progress_bar, create_spinner, finish_with_success, finish_with_warning,
    print_banner, print_completion, print_config, print_count, print_info, print_step_header,
    print_step_time, print_success, print_warning, ConfigCard,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(command) = &cli.command {
        return match command {
            Commands::Inspect { max_categories } => run_inspect(&cli, *max_categories),
        };
    }

    let config = cli.pipeline_config();
    if config.models.is_empty() {
        anyhow::bail!("At least one model must be selected with --models");
    }

    print_banner(env!("CARGO_PKG_VERSION"));

    let model_names: Vec<String> = config.models.iter().map(|m| m.to_string()).collect();
    let selection = config.selection.to_string();
    print_config(&ConfigCard {
        data_dir: &cli.data_dir,
        output: &config.output,
        seed: config.seed,
        seed_generated: config.seed_generated,
        valid_fraction: config.valid_fraction,
        models: &model_names,
        selection: &selection,
        tune: config.tuning.is_some(),
    });

    if config.seed_generated {
        print_warning(&format!(
            "No --seed given; using {}. Pass --seed {} to reproduce this run.",
            config.seed, config.seed
        ));
    }

    run_predict(&config)
}

fn report_join(split: &str, loaded: &LoadedSplit) {
    println!("\n    {} {} split:", style("✧").cyan(), split);
    println!("      Travel rows: {}", loaded.travel_rows);
    println!("      Survey rows: {}", loaded.survey_rows);
    println!("      Joined rows: {}", loaded.frame.height());
    println!("      Columns:     {}", loaded.frame.width());

    if loaded.left_unmatched + loaded.right_unmatched > 0 {
        print_warning(&format!(
            "Inner join dropped {} travel and {} survey row(s) without a matching {} record",
            loaded.left_unmatched, loaded.right_unmatched, split
        ));
    }
}

fn resolve_schema(config: &PipelineConfig, train: &LoadedSplit) -> Result<FeatureSchema> {
    let mut schema = match config.schema {
        SchemaMode::Fixed => FeatureSchema::travel_survey(),
        SchemaMode::Infer => {
            FeatureSchema::infer(&train.frame, &config.id_column, &config.label_column)?
        }
    };
    schema.id = config.id_column.clone();
    schema.label = config.label_column.clone();
    Ok(schema)
}

fn run_predict(config: &PipelineConfig) -> Result<()> {
    let mut summary = RunSummary::default();

    // Step 1: Load and join both splits
    print_step_header(1, "Load & Join");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading training files...");
    let train = load_split(&config.train, &config.id_column, config.infer_schema_length)
        .context("Failed to load the training split")?;
    spinner.set_message("Loading test files...");
    let test = load_split(&config.test, &config.id_column, config.infer_schema_length)
        .context("Failed to load the test split")?;
    finish_with_success(&spinner, "Both splits loaded and joined");

    report_join("train", &train);
    report_join("test", &test);
    summary.train_rows = train.frame.height();
    summary.train_dropped_by_join = train.left_unmatched + train.right_unmatched;
    summary.test_rows = test.frame.height();
    summary.test_dropped_by_join = test.left_unmatched + test.right_unmatched;

    let schema = resolve_schema(config, &train)?;
    schema.validate(&train.frame, true)?;
    schema.validate(&test.frame, false)?;
    print_info(&format!(
        "{} categorical and {} numeric column(s)",
        schema.categorical.len(),
        schema.numeric.len()
    ));
    let elapsed = step_start.elapsed();
    summary.record_step("Load & join", elapsed);
    print_step_time(elapsed);

    // Step 2: Imputation policy from the training split only
    print_step_header(2, "Missing Value Imputation");
    let step_start = Instant::now();
    let policy = ImputationPolicy::fit(&train.frame, &schema)?;
    let (train_clean, train_report) = policy.apply(&train.frame)?;
    let (test_clean, test_report) = policy.apply(&test.frame)?;

    let feature_columns: Vec<String> = schema.feature_columns().map(|s| s.to_string()).collect();
    assert_no_missing(&train_clean, &feature_columns)?;
    assert_no_missing(&test_clean, &feature_columns)?;

    print_count(
        "missing value(s) filled in training",
        train_report.total(),
        None,
    );
    print_count("missing value(s) filled in test", test_report.total(), None);
    display_imputation(&policy, &train_report);
    summary.values_imputed_train = train_report.total();
    summary.values_imputed_test = test_report.total();
    let elapsed = step_start.elapsed();
    summary.record_step("Imputation", elapsed);
    print_step_time(elapsed);

    // Step 3: One-hot encoding against the training domain
    print_step_header(3, "One-Hot Encoding");
    let step_start = Instant::now();
    let encoder = OneHotEncoder::fit(&train_clean, &schema)?;
    let train_encoded = encoder.transform(&train_clean)?;
    let test_encoded = encoder.transform(&test_clean)?;

    for (column, count) in &test_encoded.unseen {
        print_warning(&format!(
            "{} test value(s) of '{}' were not seen in training and encode as all zeros",
            count, column
        ));
    }
    summary.unseen_test_values = test_encoded.unseen_total();

    let feature_names = encoder.feature_names();
    let reference: Vec<String> = std::iter::once(schema.id.clone())
        .chain(feature_names.iter().cloned())
        .collect();
    let test_aligned = align_columns(&test_encoded.frame, &reference, &encoder.indicator_names())?;

    let train_data = Dataset::from_frame(
        &train_encoded.frame,
        &schema.id,
        &feature_names,
        Some(schema.label.as_str()),
    )?;
    let test_data = Dataset::from_frame(&test_aligned, &schema.id, &feature_names, None)?;
    print_success(&format!(
        "Encoded {} feature(s) ({} indicator column(s))",
        feature_names.len(),
        encoder.indicator_names().len()
    ));
    summary.n_features = feature_names.len();
    let elapsed = step_start.elapsed();
    summary.record_step("Encoding", elapsed);
    print_step_time(elapsed);

    // Step 4: Fit every candidate on the same split
    print_step_header(4, "Train & Compare Models");
    let step_start = Instant::now();
    let (fit_idx, valid_idx) =
        train_valid_split(train_data.n_rows(), config.valid_fraction, config.seed)?;
    let fit_set = train_data.take(&fit_idx)?;
    let valid_set = train_data.take(&valid_idx)?;
    summary.fit_rows = fit_set.n_rows();
    summary.valid_rows = valid_set.n_rows();
    print_info(&format!(
        "{} rows for fitting, {} held out",
        fit_set.n_rows(),
        valid_set.n_rows()
    ));

    let mut params = config.params.clone();
    let mut searches: Vec<SearchResult> = Vec::new();
    if let Some(search) = &config.tuning {
        for &kind in &config.models {
            let pb = create_progress_bar(search.n_iter as u64, &format!("Tuning {}", kind));
            let result = search.run(kind, &params, &fit_set.x, fit_set.labels()?, |i, trial| {
                advance(&pb, format!("trial {}: {:.5}", i + 1, trial.mean_score))
            })?;
            finish_with_success(
                &pb,
                &format!("{}: best CV {} {:.5}", kind, search.scoring, result.best_score),
            );
            params = merge_tuned(params, kind, &result.best_params);
            searches.push(result);
        }
    }

    let pb = create_progress_bar(config.models.len() as u64, "Fitting candidates");
    let candidates = evaluate_candidates(
        &config.models,
        &params,
        &fit_set.x,
        fit_set.labels()?,
        &valid_set.x,
        valid_set.labels()?,
        |score| {
            pb.println(format!(
                "    {} {}: log-loss {:.5}, accuracy {:.5}",
                style("✓").green(),
                score.kind,
                score.log_loss,
                score.accuracy
            ));
            advance(&pb, score.kind.to_string());
        },
    )?;
    finish_with_success(&pb, "All candidates fitted");

    let scores: Vec<_> = candidates.iter().map(|c| c.score.clone()).collect();
    let best = select_best(&scores, config.selection).context("No candidate model was fitted")?;
    display_model_comparison(&scores, Some(best));
    let winner = &candidates[best];
    print_success(&format!("Selected {}", winner.score.kind));
    summary.selected_model = Some(winner.score.kind.to_string());
    let elapsed = step_start.elapsed();
    summary.record_step("Training", elapsed);
    print_step_time(elapsed);

    // Step 5: Importance of the selected model
    print_step_header(5, "Feature Importance");
    let ranked = match winner.model.feature_importances() {
        Some(scores) => rank_feature_importances(&feature_names, &scores, config.top_features),
        None => Vec::new(),
    };
    if ranked.is_empty() {
        print_info("Selected model does not report feature importances");
    } else {
        display_importances(winner.model.name(), &ranked);
    }

    // Step 6: Predict the test split
    print_step_header(6, "Predict & Export");
    let step_start = Instant::now();
    let spinner = create_spinner("Predicting test split...");
    let labels = winner.model.predict(&test_data.x)?;
    let mut predictions =
        predictions_frame(&test_data.ids, &labels.to_vec(), &schema.id, &schema.label)?;
    save_dataset(&mut predictions, &config.output)?;
    let positives = labels.iter().filter(|&&l| l > 0.5).count();
    if predictions.height() == 0 {
        finish_with_warning(&spinner, "Test split is empty; wrote header only");
    } else {
        finish_with_success(
            &spinner,
            &format!(
                "Saved {} prediction(s) to {}",
                predictions.height(),
                config.output.display()
            ),
        );
    }
    print_info(&format!(
        "{} of {} passenger(s) predicted satisfied",
        positives,
        predictions.height()
    ));
    summary.output = Some(config.output.clone());

    if let Some(path) = &config.report {
        let report = RunReport {
            metadata: RunMetadata {
                train_travel: config.train.travel.display().to_string(),
                train_survey: config.train.survey.display().to_string(),
                test_travel: config.test.travel.display().to_string(),
                test_survey: config.test.survey.display().to_string(),
                output_file: config.output.display().to_string(),
                seed: config.seed,
                seed_generated: config.seed_generated,
                valid_fraction: config.valid_fraction,
                selection_rule: config.selection,
                ..RunMetadata::now(env!("CARGO_PKG_VERSION"))
            },
            rows: RowCounts {
                train_joined: train.frame.height(),
                train_travel_unmatched: train.left_unmatched,
                train_survey_unmatched: train.right_unmatched,
                test_joined: test.frame.height(),
                test_travel_unmatched: test.left_unmatched,
                test_survey_unmatched: test.right_unmatched,
                fit_rows: fit_set.n_rows(),
                valid_rows: valid_set.n_rows(),
            },
            imputation: policy.clone(),
            categories: encoder.domains().to_vec(),
            feature_names: feature_names.clone(),
            params: params.clone(),
            tuning: searches,
            candidates: scores.clone(),
            selected_model: winner.score.kind.to_string(),
            top_features: ranked.clone(),
        };
        export_run_report(path, &report)?;
        print_success(&format!("Run report written to {}", path.display()));
    }
    let elapsed = step_start.elapsed();
    summary.record_step("Predict & export", elapsed);
    print_step_time(elapsed);

    summary.display();
    print_completion("Predictions written. All aboard!");

    Ok(())
}

/// Replace the parameters of `kind` with the tuned ones
fn merge_tuned(mut params: ModelParams, kind: ModelKind, tuned: &ModelParams) -> ModelParams {
    match kind {
        ModelKind::LeafWiseBoosting => params.leaf_wise = tuned.leaf_wise.clone(),
        ModelKind::LevelWiseBoosting => params.level_wise = tuned.level_wise.clone(),
        ModelKind::RandomForest => params.forest = tuned.forest.clone(),
    }
    params
}

fn run_inspect(cli: &Cli, max_categories: usize) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    print_step_header(1, "Load & Join Training Data");
    let paths = cli.train_paths();
    for path in [&paths.travel, &paths.survey] {
        let names = get_column_names(path)?;
        print_info(&format!("{}: {} columns", path.display(), names.len()));
    }
    let spinner = create_spinner("Loading training files...");
    let train = load_split(&paths, &cli.id_column, cli.infer_schema_length)?;
    finish_with_success(&spinner, "Training split loaded and joined");
    report_join("train", &train);
    check_unique_ids(&train.frame, &cli.id_column)?;
    print_success(&format!("'{}' is unique across the joined rows", cli.id_column));

    print_step_header(2, "Missing Values");
    let missing = analyze_missing_values(&train.frame);
    let with_missing = columns_with_missing(&missing);
    if with_missing.is_empty() {
        print_info("No missing values");
    } else {
        print_count("column(s) with missing values", with_missing.len(), None);
        display_missing_table(&missing);
    }

    print_step_header(3, "Category Counts");
    let schema = FeatureSchema::infer(&train.frame, &cli.id_column, &cli.label_column)?;
    for name in &schema.categorical {
        let counts = category_counts(train.frame.column(name)?)?;
        display_category_counts(name, &counts, max_categories);
    }
    if let Ok(label) = train.frame.column(&cli.label_column) {
        let counts = category_counts(label)?;
        display_category_counts(&cli.label_column, &counts, max_categories);
    }

    print_step_header(4, "Delay Relationship");
    let has = |name: &str| train.frame.column(name).is_ok();
    if has(DEPARTURE_DELAY) && has(ARRIVAL_DELAY) {
        let fit = fit_ols_columns(&train.frame, DEPARTURE_DELAY, ARRIVAL_DELAY)?;
        display_regression(DEPARTURE_DELAY, ARRIVAL_DELAY, &fit);
        if (fit.slope - 1.0).abs() < 0.1 {
            print_success("Near 1:1 relationship; missing arrival delays take the departure delay");
        } else {
            print_warning("Delays are not close to 1:1; the arrival delay fill may be biased");
        }
    } else {
        print_info("Delay columns not present");
    }

    print_completion("Inspection complete");
    Ok(())
}
