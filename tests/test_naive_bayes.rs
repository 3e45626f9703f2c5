//! Tests for Naive Bayes learning and scoring

use tabstat::pipeline::bayes::{
    predict_table, probability_column_name, LearnerSettings, NaiveBayesModel, PredictorSettings,
};
use tabstat::pipeline::{
    CancelFlag, Cell, ColumnKind, ColumnSpec, LearnError, NoopMonitor, PredictError, RowSource,
    TableSpec,
};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::{assert_close, nominal, numeric, table, weather_table};

fn learn_weather() -> NaiveBayesModel {
    NaiveBayesModel::learn(&weather_table(), &LearnerSettings::new("play"), &NoopMonitor).unwrap()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_learn_weather_priors() {
    let model = learn_weather();

    assert_eq!(model.class_column(), "play");
    assert_eq!(model.total_rows(), 14);
    assert_eq!(model.sorted_class_values().unwrap(), vec!["no", "yes"]);
    assert_close(model.class_prior_probability("yes").unwrap(), 9.0 / 14.0, 1e-12);
    assert_close(model.class_prior_probability("no").unwrap(), 5.0 / 14.0, 1e-12);
    assert_eq!(model.attribute_names(), vec!["outlook", "temperature", "windy"]);
    assert!(!model.contains_skipped_attributes());
}

#[test]
fn test_unknown_class_prior_is_an_error() {
    let model = learn_weather();
    let err = model.class_prior_probability("maybe").unwrap_err();
    assert!(matches!(err, PredictError::UnknownClassValue(_)));
}

#[test]
fn test_class_probabilities_are_normalized() {
    let model = learn_weather();
    let classes = model.sorted_class_values().unwrap();
    let probs = model
        .class_probabilities(
            &names(&["outlook", "temperature", "windy"]),
            &[Cell::from("sunny"), Cell::Numeric(66.0), Cell::from("true")],
            &classes,
            true,
            0.0,
        )
        .unwrap();

    assert_eq!(probs.len(), 2);
    assert_close(probs.iter().sum::<f64>(), 1.0, 1e-12);
    assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn test_most_likely_class_matches_hand_computation() {
    let model = learn_weather();
    let classes = model.sorted_class_values().unwrap();

    // only outlook and windy: P(no) ~ 5/14 * 3/5 * 3/5, P(yes) ~ 9/14 * 2/9 * 3/9
    let row_names = names(&["outlook", "windy"]);
    let cells = [Cell::from("sunny"), Cell::from("true")];
    let probs = model
        .class_probabilities(&row_names, &cells, &classes, false, 0.0)
        .unwrap();
    assert_close(probs[0], 5.0 / 14.0 * 3.0 / 5.0 * 3.0 / 5.0, 1e-12);
    assert_close(probs[1], 9.0 / 14.0 * 2.0 / 9.0 * 3.0 / 9.0, 1e-12);
    assert_eq!(
        model.most_likely_class(&row_names, &cells, &classes, 0.0).unwrap(),
        "no"
    );

    // "no" never saw overcast
    let cells = [Cell::from("overcast"), Cell::from("true")];
    assert_eq!(
        model.most_likely_class(&row_names, &cells, &classes, 0.0).unwrap(),
        "yes"
    );
}

#[test]
fn test_all_zero_scores_fall_back_to_priors() {
    let model = learn_weather();
    let classes = model.sorted_class_values().unwrap();
    let row_names = names(&["outlook"]);
    let cells = [Cell::from("foggy")];

    let probs = model
        .class_probabilities(&row_names, &cells, &classes, true, 0.0)
        .unwrap();
    assert_close(probs[0], 5.0 / 14.0, 1e-12);
    assert_close(probs[1], 9.0 / 14.0, 1e-12);
    assert_eq!(
        model.most_likely_class(&row_names, &cells, &classes, 0.0).unwrap(),
        "yes"
    );
}

#[test]
fn test_laplace_corrector_avoids_zero_scores() {
    let model = learn_weather();
    let classes = model.sorted_class_values().unwrap();
    let probs = model
        .class_probabilities(&names(&["outlook"]), &[Cell::from("overcast")], &classes, false, 1.0)
        .unwrap();

    assert_close(probs[0], 5.0 / 14.0 * (0.0 + 1.0) / (5.0 + 3.0), 1e-12);
    assert_close(probs[1], 9.0 / 14.0 * (4.0 + 1.0) / (9.0 + 3.0), 1e-12);
}

#[test]
fn test_ties_go_to_the_last_class_value() {
    let source = table(vec![
        nominal("color", &[Some("red"), Some("red"), Some("blue"), Some("blue")]),
        nominal("class", &[Some("a"), Some("b"), Some("a"), Some("b")]),
    ]);
    let model =
        NaiveBayesModel::learn(&source, &LearnerSettings::new("class"), &NoopMonitor).unwrap();
    let classes = model.sorted_class_values().unwrap();

    let winner = model
        .most_likely_class(&names(&["color"]), &[Cell::from("red")], &classes, 0.0)
        .unwrap();
    assert_eq!(winner, "b");
}

#[test]
fn test_unknown_columns_are_ignored_when_scoring() {
    let model = learn_weather();
    let classes = model.sorted_class_values().unwrap();

    let with_extra = model
        .class_probabilities(
            &names(&["outlook", "humidity"]),
            &[Cell::from("sunny"), Cell::Numeric(90.0)],
            &classes,
            true,
            0.0,
        )
        .unwrap();
    let without = model
        .class_probabilities(&names(&["outlook"]), &[Cell::from("sunny")], &classes, true, 0.0)
        .unwrap();
    assert_eq!(with_extra, without);
}

#[test]
fn test_scoring_input_errors() {
    let model = learn_weather();
    let classes = model.sorted_class_values().unwrap();

    let err = model
        .class_probabilities(&names(&["outlook"]), &[], &classes, true, 0.0)
        .unwrap_err();
    assert!(matches!(err, PredictError::LengthMismatch { names: 1, cells: 0 }));

    let err = model
        .most_likely_class(&names(&["outlook"]), &[Cell::from("sunny")], &[], 0.0)
        .unwrap_err();
    assert!(matches!(err, PredictError::EmptyClassValues));

    let err = model
        .most_likely_class(&names(&["outlook"]), &[Cell::Numeric(1.0)], &classes, 0.0)
        .unwrap_err();
    assert!(matches!(err, PredictError::IncompatibleValue(_)));
}

#[test]
fn test_missing_class_value() {
    let source = table(vec![
        numeric("x", &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        nominal("class", &[Some("a"), None, Some("b"), Some("a")]),
    ]);

    let err = NaiveBayesModel::learn(&source, &LearnerSettings::new("class"), &NoopMonitor)
        .unwrap_err();
    assert!(matches!(err, LearnError::MissingClassValue { row: 1 }));

    let settings = LearnerSettings {
        skip_missing: true,
        ..LearnerSettings::new("class")
    };
    let model = NaiveBayesModel::learn(&source, &settings, &NoopMonitor).unwrap();
    assert_eq!(model.total_rows(), 3);
}

#[test]
fn test_learn_input_errors() {
    let source = weather_table();
    let err = NaiveBayesModel::learn(&source, &LearnerSettings::new("nope"), &NoopMonitor)
        .unwrap_err();
    assert!(matches!(err, LearnError::ClassColumnNotFound(_)));

    let empty = table(vec![nominal("class", &[])]);
    let err = NaiveBayesModel::learn(&empty, &LearnerSettings::new("class"), &NoopMonitor)
        .unwrap_err();
    assert!(matches!(err, LearnError::NoRows));
}

#[test]
fn test_too_many_values_skips_attribute() {
    let settings = LearnerSettings {
        max_nominal_values: 2,
        ..LearnerSettings::new("play")
    };
    let model = NaiveBayesModel::learn(&weather_table(), &settings, &NoopMonitor).unwrap();

    // outlook has three values, windy has two
    assert!(model.attribute_model("outlook").is_none());
    assert!(model.attribute_model("windy").is_some());
    assert_eq!(model.skipped_attributes().len(), 1);
    assert_eq!(
        model.skipped_attributes()[0].invalid_cause(),
        Some("Too many values")
    );
    assert_eq!(
        model.skipped_attributes_summary(10),
        "outlook (Too many values)"
    );
}

#[test]
fn test_too_many_class_values_is_fatal() {
    let settings = LearnerSettings {
        max_nominal_values: 2,
        ..LearnerSettings::new("outlook")
    };
    let err = NaiveBayesModel::learn(&weather_table(), &settings, &NoopMonitor).unwrap_err();
    assert!(matches!(
        err,
        LearnError::TooManyClassValues { limit: 2, .. }
    ));
}

#[test]
fn test_invalid_attribute_is_skipped() {
    let source = table(vec![
        numeric("x", &[Some(1.0), Some(2.0), None, None]),
        nominal("class", &[Some("a"), Some("a"), Some("b"), Some("b")]),
    ]);
    let model =
        NaiveBayesModel::learn(&source, &LearnerSettings::new("class"), &NoopMonitor).unwrap();

    assert!(model.attribute_model("x").is_none());
    assert_eq!(model.skipped_attributes()[0].name(), "x");
    assert_eq!(model.attributes_with_missing_values(), Vec::<&str>::new());
}

#[test]
fn test_attributes_with_missing_values() {
    let source = table(vec![
        numeric("x", &[Some(1.0), Some(2.0), None, Some(4.0), Some(3.0)]),
        nominal("y", &[Some("u"), Some("v"), Some("u"), Some("v"), Some("u")]),
        nominal("class", &[Some("a"), Some("a"), Some("b"), Some("b"), Some("b")]),
    ]);
    let model =
        NaiveBayesModel::learn(&source, &LearnerSettings::new("class"), &NoopMonitor).unwrap();
    assert_eq!(model.attributes_with_missing_values(), vec!["x"]);
}

#[test]
fn test_unknown_and_missing_columns() {
    let model = learn_weather();
    let spec = TableSpec::new(vec![
        ColumnSpec::new("outlook", ColumnKind::Nominal),
        ColumnSpec::new("temperature", ColumnKind::Nominal),
        ColumnSpec::new("humidity", ColumnKind::Numeric),
    ]);

    assert_eq!(model.unknown_columns(&spec), vec!["temperature", "humidity"]);
    // present but incompatible is not missing
    assert_eq!(model.missing_columns(&spec), vec!["windy"]);
}

#[test]
fn test_learning_can_be_canceled() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let err =
        NaiveBayesModel::learn(&weather_table(), &LearnerSettings::new("play"), &cancel)
            .unwrap_err();
    assert!(matches!(err, LearnError::Canceled(_)));
}

#[test]
fn test_model_persistence_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    let settings = LearnerSettings {
        max_nominal_values: 2,
        ..LearnerSettings::new("play")
    };
    let model = NaiveBayesModel::learn(&weather_table(), &settings, &NoopMonitor).unwrap();

    model.save_to_path(&path).unwrap();
    let loaded = NaiveBayesModel::load_from_path(&path).unwrap();

    assert_eq!(loaded, model);
    assert_eq!(loaded.skipped_attributes_summary(5), "outlook (Too many values)");
}

#[test]
fn test_predict_table() {
    let model = learn_weather();
    let source = weather_table();
    let settings = PredictorSettings {
        include_probabilities: true,
        ..PredictorSettings::default()
    };

    let result = predict_table(&model, &source, &settings, &NoopMonitor).unwrap();
    assert_eq!(result.class_values, vec!["no", "yes"]);
    assert_eq!(result.predictions.len(), source.row_count());

    let classes = model.sorted_class_values().unwrap();
    let row_names = names(&["outlook", "temperature", "windy"]);
    for (row, prediction) in source.rows().zip(&result.predictions) {
        let cells = &row.cells()[..3];
        let expected = model
            .most_likely_class(&row_names, cells, &classes, 0.0)
            .unwrap();
        assert_eq!(prediction.class_value, expected);
        let probabilities = prediction.probabilities.as_ref().unwrap();
        assert_close(probabilities.iter().sum::<f64>(), 1.0, 1e-9);
    }

    assert_eq!(probability_column_name("play", "yes"), "P(play=yes)");
}

#[test]
fn test_predict_table_skips_incompatible_columns() {
    let model = learn_weather();
    let source = table(vec![
        nominal("outlook", &[Some("sunny"), Some("overcast")]),
        nominal("temperature", &[Some("hot"), Some("cold")]),
    ]);

    let result =
        predict_table(&model, &source, &PredictorSettings::default(), &NoopMonitor).unwrap();
    assert_eq!(result.predictions.len(), 2);
    assert!(result.predictions[0].probabilities.is_none());
    assert_eq!(result.predictions[1].class_value, "yes");
}
