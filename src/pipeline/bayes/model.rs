//! Naive Bayes model: learning pass, validation and class scoring

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::pipeline::error::{
    AttributeError, ConfigError, LearnError, PredictError, TOO_MANY_VALUES_CAUSE,
};
use crate::pipeline::monitor::{row_fraction, ExecutionMonitor, SubProgress};
use crate::pipeline::settings::ConfigNode;
use crate::pipeline::table::{Cell, ColumnKind, RowSource, TableSpec};

use super::attribute::{AttributeKind, AttributeModel};

const CLASS_COLUMN_NAME: &str = "ClassColumnName";
const SKIP_MISSING_VALUES: &str = "skipMissingVals";

const SKIPPED_ATTRIBUTE_SECTION: &str = "SkippedAttributes";
const SKIPPED_ATTRIBUTE_COUNTER: &str = "SkippedAttributesCounter";
const SKIPPED_ATTRIBUTE_DATA: &str = "SkippedAttributeData_";

const MODEL_SECTION: &str = "AttributeModelSection";
const RECORD_COUNTER: &str = "RecordCounter";
const MODEL_COUNTER: &str = "AttributeModelCounter";
const MODEL_DATA: &str = "AttributeModelData_";

/// Default cap on distinct values of nominal attributes and of the class column
pub const DEFAULT_MAX_NOMINAL_VALUES: usize = 20;

/// Settings of a learning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSettings {
    pub class_column: String,
    /// Maximum number of distinct values per nominal attribute and class column
    pub max_nominal_values: usize,
    /// Ignore missing cells while learning and scoring instead of counting them
    pub skip_missing: bool,
}

impl Default for LearnerSettings {
    fn default() -> Self {
        Self {
            class_column: String::new(),
            max_nominal_values: DEFAULT_MAX_NOMINAL_VALUES,
            skip_missing: false,
        }
    }
}

impl LearnerSettings {
    pub fn new(class_column: impl Into<String>) -> Self {
        Self {
            class_column: class_column.into(),
            ..Self::default()
        }
    }
}

/// One line of the model statistics table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRow {
    pub attribute: String,
    pub model_type: &'static str,
    pub class_value: String,
    /// Attribute value for nominal attributes
    pub value: Option<String>,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

/// Learned Naive Bayes model.
///
/// Holds one valid attribute model per learned column, the class column's model
/// included, and the attributes that were dropped during learning with their
/// causes.
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveBayesModel {
    class_column: String,
    skip_missing: bool,
    total_rows: usize,
    models: BTreeMap<String, AttributeModel>,
    skipped: Vec<AttributeModel>,
}

impl NaiveBayesModel {
    /// Learn a model from a single pass over `source`.
    ///
    /// Columns of unsupported kind are ignored. A non-class attribute that
    /// exceeds its value limit or fails validation is moved to the skipped
    /// attributes; the same conditions on the class column abort learning.
    pub fn learn(
        source: &dyn RowSource,
        settings: &LearnerSettings,
        monitor: &dyn ExecutionMonitor,
    ) -> Result<Self, LearnError> {
        let row_count = source.row_count();
        if row_count == 0 {
            return Err(LearnError::NoRows);
        }
        let spec = source.spec();
        let class_index = spec
            .find_column_index(&settings.class_column)
            .ok_or_else(|| LearnError::ClassColumnNotFound(settings.class_column.clone()))?;
        if spec.column(class_index).kind == ColumnKind::Unsupported {
            return Err(LearnError::ClassColumnUnsupported(
                settings.class_column.clone(),
            ));
        }

        let mut active = create_models(spec, class_index, settings);
        let mut skipped: Vec<AttributeModel> = Vec::new();
        info!(
            rows = row_count,
            attributes = active.len() - 1,
            class_column = %settings.class_column,
            "learning naive bayes model"
        );

        let learn_monitor = SubProgress::new(monitor, 0.0, 0.9);
        let mut learned_rows = 0usize;
        let mut skipped_rows = 0usize;
        for (row_index, row) in source.rows().enumerate() {
            learn_monitor.check_canceled()?;
            learn_monitor.set_progress(row_fraction(row_index, row_count), "Building model");

            let class_cell = row.cell(class_index);
            if class_cell.is_missing() {
                if settings.skip_missing {
                    skipped_rows += 1;
                    continue;
                }
                return Err(LearnError::MissingClassValue { row: row_index });
            }
            let class_value = class_cell.to_string();

            let mut overflowed = Vec::new();
            for (position, (column, model)) in active.iter_mut().enumerate() {
                match model.add_value(&class_value, row.cell(*column)) {
                    Ok(()) => {}
                    Err(AttributeError::TooManyValues { limit, .. }) if model.is_class_model() => {
                        return Err(LearnError::TooManyClassValues {
                            column: model.name().to_string(),
                            limit,
                        });
                    }
                    Err(AttributeError::TooManyValues { .. }) => overflowed.push(position),
                    Err(source) => {
                        return Err(LearnError::IncompatibleValue {
                            row: row_index,
                            source,
                        })
                    }
                }
            }
            // remove back to front so the remaining positions stay valid
            for position in overflowed.into_iter().rev() {
                let (_, mut model) = active.remove(position);
                model.mark_invalid(TOO_MANY_VALUES_CAUSE);
                warn!(attribute = %model.name(), cause = TOO_MANY_VALUES_CAUSE, "attribute skipped");
                skipped.push(model);
            }
            learned_rows += 1;
        }
        if skipped_rows > 0 {
            debug!(rows = skipped_rows, "rows with missing class value skipped");
        }

        monitor.set_progress(0.9, "Validating model");
        monitor.check_canceled()?;
        let mut models = BTreeMap::new();
        for (_, mut model) in active {
            match model.validate() {
                Ok(()) => {
                    models.insert(model.name().to_string(), model);
                }
                Err(invalid) if model.is_class_model() => {
                    return Err(LearnError::InvalidClassModel {
                        column: model.name().to_string(),
                        cause: invalid.cause(),
                    });
                }
                Err(invalid) => {
                    warn!(attribute = %model.name(), cause = %invalid.cause(), "attribute skipped");
                    skipped.push(model);
                }
            }
        }
        monitor.set_progress(1.0, "Model validated");

        info!(
            rows = learned_rows,
            attributes = models.len() - 1,
            skipped = skipped.len(),
            "naive bayes model learned"
        );
        Ok(Self {
            class_column: settings.class_column.clone(),
            skip_missing: settings.skip_missing,
            total_rows: learned_rows,
            models,
            skipped,
        })
    }

    pub fn class_column(&self) -> &str {
        &self.class_column
    }

    pub fn skip_missing(&self) -> bool {
        self.skip_missing
    }

    /// Number of rows the model learned from
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Valid attribute models by name, the class model included
    pub fn attribute_models(&self) -> impl Iterator<Item = &AttributeModel> {
        self.models.values()
    }

    pub fn attribute_model(&self, name: &str) -> Option<&AttributeModel> {
        self.models.get(name)
    }

    /// Names of the valid non-class attributes
    pub fn attribute_names(&self) -> Vec<&str> {
        self.models
            .values()
            .filter(|m| !m.is_class_model())
            .map(AttributeModel::name)
            .collect()
    }

    fn class_model(&self) -> Result<&AttributeModel, PredictError> {
        self.models
            .get(&self.class_column)
            .filter(|m| m.is_class_model())
            .ok_or_else(|| PredictError::NoClassModel(self.class_column.clone()))
    }

    /// All class values in natural order
    pub fn sorted_class_values(&self) -> Result<Vec<String>, PredictError> {
        let model = self.class_model()?;
        Ok(model.class_values().into_iter().map(str::to_string).collect())
    }

    /// Prior probability `count(class) / total rows`
    pub fn class_prior_probability(&self, class_value: &str) -> Result<f64, PredictError> {
        let count = self
            .class_model()?
            .rows_for_class(class_value)
            .ok_or_else(|| PredictError::UnknownClassValue(class_value.to_string()))?;
        if self.total_rows == 0 {
            return Err(PredictError::NoRecords);
        }
        Ok(count as f64 / self.total_rows as f64)
    }

    /// Prior times the product of all attribute likelihoods of the row.
    ///
    /// Columns without a model, the class column and cells whose model skips
    /// missing values do not contribute a factor.
    fn combined_probability(
        &self,
        names: &[String],
        cells: &[Cell],
        class_value: &str,
        laplace_corrector: f64,
    ) -> Result<f64, PredictError> {
        let mut combined = self.class_prior_probability(class_value)?;
        for (name, cell) in names.iter().zip(cells) {
            let Some(model) = self.models.get(name) else {
                continue;
            };
            if model.is_class_model() {
                continue;
            }
            if let Some(probability) = model.probability(class_value, cell, laplace_corrector)? {
                combined *= probability;
            }
        }
        Ok(combined)
    }

    fn check_row(
        names: &[String],
        cells: &[Cell],
        class_values: &[String],
    ) -> Result<(), PredictError> {
        if class_values.is_empty() {
            return Err(PredictError::EmptyClassValues);
        }
        if names.len() != cells.len() {
            return Err(PredictError::LengthMismatch {
                names: names.len(),
                cells: cells.len(),
            });
        }
        Ok(())
    }

    /// Per-class scores of one row, in the order of `class_values`.
    ///
    /// If every combined score is 0 the priors are returned instead.
    /// Otherwise the scores are divided by their sum when `normalize` is set.
    pub fn class_probabilities(
        &self,
        names: &[String],
        cells: &[Cell],
        class_values: &[String],
        normalize: bool,
        laplace_corrector: f64,
    ) -> Result<Vec<f64>, PredictError> {
        Self::check_row(names, cells, class_values)?;
        let scores = class_values
            .iter()
            .map(|c| self.combined_probability(names, cells, c, laplace_corrector))
            .collect::<Result<Vec<f64>, _>>()?;
        let sum: f64 = scores.iter().sum();
        if sum == 0.0 {
            return class_values
                .iter()
                .map(|c| self.class_prior_probability(c))
                .collect();
        }
        if normalize {
            Ok(scores.into_iter().map(|p| p / sum).collect())
        } else {
            Ok(scores)
        }
    }

    /// Class value with the highest combined score.
    ///
    /// A later class with a score equal to the current maximum wins, so ties
    /// go to the last of the tied values in `class_values` order. When every
    /// score is 0 the class with the highest prior is chosen by the same rule.
    pub fn most_likely_class(
        &self,
        names: &[String],
        cells: &[Cell],
        class_values: &[String],
        laplace_corrector: f64,
    ) -> Result<String, PredictError> {
        Self::check_row(names, cells, class_values)?;
        let mut max = -1.0;
        let mut most_likely = &class_values[0];
        for class_value in class_values {
            let probability =
                self.combined_probability(names, cells, class_value, laplace_corrector)?;
            if probability >= max {
                max = probability;
                most_likely = class_value;
            }
        }
        if max == 0.0 {
            for class_value in class_values {
                let prior = self.class_prior_probability(class_value)?;
                if prior >= max {
                    max = prior;
                    most_likely = class_value;
                }
            }
        }
        Ok(most_likely.clone())
    }

    /// Attributes removed during learning; each carries its invalid cause
    pub fn skipped_attributes(&self) -> &[AttributeModel] {
        &self.skipped
    }

    pub fn contains_skipped_attributes(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// "name (cause)" list of skipped attributes, cut off after `max` entries
    pub fn skipped_attributes_summary(&self, max: usize) -> String {
        let mut parts: Vec<String> = self
            .skipped
            .iter()
            .take(max)
            .map(|m| format!("{} ({})", m.name(), m.invalid_cause().unwrap_or("unknown")))
            .collect();
        if self.skipped.len() > max {
            parts.push(format!("<{} more>...", self.skipped.len() - max));
        }
        parts.join(", ")
    }

    /// Attributes that saw at least one missing value while learning
    pub fn attributes_with_missing_values(&self) -> Vec<&str> {
        self.models
            .values()
            .filter(|m| m.missing_count() > 0)
            .map(AttributeModel::name)
            .collect()
    }

    /// Columns of `spec` the model cannot score, because there is no model
    /// for them or the column kind does not fit the model
    pub fn unknown_columns(&self, spec: &TableSpec) -> Vec<String> {
        spec.columns()
            .iter()
            .filter(|column| {
                self.models
                    .get(&column.name)
                    .map_or(true, |m| !m.is_compatible(column.kind))
            })
            .map(|column| column.name.clone())
            .collect()
    }

    /// Learned non-class attributes that `spec` does not contain
    pub fn missing_columns(&self, spec: &TableSpec) -> Vec<String> {
        self.models
            .values()
            .filter(|m| !m.is_class_model() && spec.column_by_name(m.name()).is_none())
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Flat per-attribute, per-class statistics of all valid models
    pub fn statistics_rows(&self) -> Vec<StatisticsRow> {
        let mut rows = Vec::new();
        for model in self.models.values() {
            let base = |class_value: &str| StatisticsRow {
                attribute: model.name().to_string(),
                model_type: model.model_type(),
                class_value: class_value.to_string(),
                value: None,
                count: 0,
                missing: 0,
                mean: None,
                std_dev: None,
            };
            match model.kind() {
                AttributeKind::Nominal(nominal) => {
                    for class_value in nominal.class_values() {
                        let Some(counts) = nominal.class_value(class_value) else {
                            continue;
                        };
                        for value in nominal.attribute_values() {
                            rows.push(StatisticsRow {
                                value: Some(value.clone()),
                                count: counts.count(value),
                                missing: counts.missing(),
                                ..base(class_value)
                            });
                        }
                    }
                }
                AttributeKind::Numerical(numerical) => {
                    for class_value in numerical.class_values() {
                        let Some(stats) = numerical.stats(class_value) else {
                            continue;
                        };
                        let fitted = numerical
                            .gaussian(class_value)
                            .copied()
                            .or_else(|| stats.finalize());
                        rows.push(StatisticsRow {
                            count: stats.non_missing(),
                            missing: stats.missing(),
                            mean: fitted.map(|g| g.mean),
                            std_dev: fitted.map(|g| g.std_dev),
                            ..base(class_value)
                        });
                    }
                }
                AttributeKind::Class(class) => {
                    for class_value in class.class_values() {
                        rows.push(StatisticsRow {
                            count: class.count(class_value).unwrap_or(0),
                            missing: model.missing_count(),
                            ..base(class_value)
                        });
                    }
                }
            }
        }
        rows
    }

    pub fn save(&self, config: &mut ConfigNode) {
        config.add_string(CLASS_COLUMN_NAME, self.class_column.as_str());
        config.add_bool(SKIP_MISSING_VALUES, self.skip_missing);

        let mut skipped = ConfigNode::new();
        skipped.add_count(SKIPPED_ATTRIBUTE_COUNTER, self.skipped.len());
        for (i, model) in self.skipped.iter().enumerate() {
            let mut section = ConfigNode::new();
            model.save(&mut section);
            skipped.add_section(&format!("{}{}", SKIPPED_ATTRIBUTE_DATA, i), section);
        }
        config.add_section(SKIPPED_ATTRIBUTE_SECTION, skipped);

        let mut models = ConfigNode::new();
        models.add_count(RECORD_COUNTER, self.total_rows);
        models.add_count(MODEL_COUNTER, self.models.len());
        for (i, model) in self.models.values().enumerate() {
            let mut section = ConfigNode::new();
            model.save(&mut section);
            models.add_section(&format!("{}{}", MODEL_DATA, i), section);
        }
        config.add_section(MODEL_SECTION, models);
    }

    /// Restore a saved model. Attributes that no longer validate are moved to
    /// the skipped attributes.
    pub fn load(config: &ConfigNode) -> Result<Self, ConfigError> {
        let class_column = config.get_string(CLASS_COLUMN_NAME)?.to_string();

        let skipped_section = config.get_section(SKIPPED_ATTRIBUTE_SECTION)?;
        let mut skipped = Vec::new();
        for i in 0..skipped_section.get_count(SKIPPED_ATTRIBUTE_COUNTER)? {
            let section =
                skipped_section.get_section(&format!("{}{}", SKIPPED_ATTRIBUTE_DATA, i))?;
            skipped.push(AttributeModel::load(section)?);
        }

        let model_section = config.get_section(MODEL_SECTION)?;
        let mut models = BTreeMap::new();
        for i in 0..model_section.get_count(MODEL_COUNTER)? {
            let section = model_section.get_section(&format!("{}{}", MODEL_DATA, i))?;
            let model = AttributeModel::load(section)?;
            if model.is_valid() {
                models.insert(model.name().to_string(), model);
            } else {
                skipped.push(model);
            }
        }
        if !models
            .get(&class_column)
            .is_some_and(AttributeModel::is_class_model)
        {
            return Err(ConfigError::Invalid(format!(
                "No model found for class column '{}'",
                class_column
            )));
        }

        Ok(Self {
            class_column,
            skip_missing: config.get_bool(SKIP_MISSING_VALUES)?,
            total_rows: model_section.get_count(RECORD_COUNTER)?,
            models,
            skipped,
        })
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let mut config = ConfigNode::new();
        self.save(&mut config);
        config.save_to_path(path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::load(&ConfigNode::load_from_path(path)?)
    }
}

/// One model per supported column, paired with its column index
fn create_models(
    spec: &TableSpec,
    class_index: usize,
    settings: &LearnerSettings,
) -> Vec<(usize, AttributeModel)> {
    spec.columns()
        .iter()
        .enumerate()
        .filter_map(|(index, column)| {
            let model = if index == class_index {
                AttributeModel::class(&column.name, settings.skip_missing, settings.max_nominal_values)
            } else {
                match column.kind {
                    ColumnKind::Numeric => {
                        AttributeModel::numerical(&column.name, settings.skip_missing)
                    }
                    ColumnKind::Nominal => AttributeModel::nominal(
                        &column.name,
                        settings.skip_missing,
                        settings.max_nominal_values,
                    ),
                    ColumnKind::Unsupported => {
                        debug!(column = %column.name, "column type not supported, ignored");
                        return None;
                    }
                }
            };
            Some((index, model))
        })
        .collect()
}
