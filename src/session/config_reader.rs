use crate::session::*;

use std::fs;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use tabular_summary::*;

/// One condition of the row selection. Exactly one of the condition
/// fields must be set.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub column: String,
    pub value: Option<String>,
    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<String>>,
    pub between: Option<(f64, f64)>,
    #[serde(rename = "dateBetween")]
    pub date_between: Option<(String, String)>,
}

impl FilterConfig {
    pub fn to_predicate(&self) -> SessionResult<Predicate> {
        let given = [
            self.value.is_some(),
            self.any_of.is_some(),
            self.between.is_some(),
            self.date_between.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if given != 1 {
            whatever!(
                "The filter on {:?} must carry exactly one of value, anyOf, between or dateBetween",
                self.column
            );
        }
        let predicate = if let Some(value) = self.value.clone() {
            Predicate::TextEquals {
                column: self.column.clone(),
                value,
            }
        } else if let Some(values) = self.any_of.clone() {
            Predicate::TextAnyOf {
                column: self.column.clone(),
                values,
            }
        } else if let Some((low, high)) = self.between {
            Predicate::NumberBetween {
                column: self.column.clone(),
                low,
                high,
            }
        } else {
            // The count above leaves only dateBetween.
            let (low, high) = self.date_between.clone().unwrap();
            Predicate::DateBetween {
                column: self.column.clone(),
                low: parse_date_bound(&low)?,
                high: parse_date_bound(&high)?,
            }
        };
        Ok(predicate)
    }
}

fn parse_date_bound(text: &str) -> SessionResult<NaiveDate> {
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(d) => Ok(d),
        Err(_) => whatever!("Cannot parse the date bound {:?}: expected YYYY-MM-DD", text),
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GroupValueConfig {
    #[serde(rename = "groupColumns")]
    pub group_columns: Vec<String>,
    #[serde(rename = "valueColumn")]
    pub value_column: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CrossTabConfig {
    #[serde(rename = "rowColumn")]
    pub row_column: String,
    #[serde(rename = "colColumn")]
    pub col_column: String,
    pub normalize: Option<bool>,
}

/// One aggregation to run. Exactly one of the aggregation fields must be
/// set; the chart fields are passed through to the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(rename = "countBy")]
    pub count_by: Option<String>,
    #[serde(rename = "sumBy")]
    pub sum_by: Option<GroupValueConfig>,
    #[serde(rename = "meanBy")]
    pub mean_by: Option<GroupValueConfig>,
    #[serde(rename = "crossTab")]
    pub cross_tab: Option<CrossTabConfig>,
    pub chart: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "xLabel")]
    pub x_label: Option<String>,
    #[serde(rename = "yLabel")]
    pub y_label: Option<String>,
}

impl ViewConfig {
    pub fn to_view(&self) -> SessionResult<(ViewSpec, ChartSpec)> {
        let given = [
            self.count_by.is_some(),
            self.sum_by.is_some(),
            self.mean_by.is_some(),
            self.cross_tab.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if given != 1 {
            whatever!("A view must carry exactly one of countBy, sumBy, meanBy or crossTab");
        }
        let (view, default_title) = if let Some(column) = self.count_by.clone() {
            let title = format!("Count by {}", column);
            (ViewSpec::CountBy { column }, title)
        } else if let Some(c) = self.sum_by.clone() {
            let title = format!("Sum of {} by {}", c.value_column, c.group_columns.join(", "));
            (
                ViewSpec::SumBy {
                    group_columns: c.group_columns,
                    value_column: c.value_column,
                },
                title,
            )
        } else if let Some(c) = self.mean_by.clone() {
            let title = format!(
                "Mean of {} by {}",
                c.value_column,
                c.group_columns.join(", ")
            );
            (
                ViewSpec::MeanBy {
                    group_columns: c.group_columns,
                    value_column: c.value_column,
                },
                title,
            )
        } else {
            let c = self.cross_tab.clone().unwrap();
            let title = format!("{} by {}", c.row_column, c.col_column);
            (
                ViewSpec::CrossTab {
                    row_column: c.row_column,
                    col_column: c.col_column,
                    normalize: c.normalize.unwrap_or(false),
                },
                title,
            )
        };
        let kind = match self.chart.as_deref() {
            None => ChartKind::Bar,
            Some(label) => parse_chart_kind(label)?,
        };
        let chart = ChartSpec {
            kind,
            title: self.title.clone().unwrap_or(default_title),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
        };
        Ok((view, chart))
    }
}

fn parse_chart_kind(label: &str) -> SessionResult<ChartKind> {
    let kind = match label {
        "bar" => ChartKind::Bar,
        "hbar" => ChartKind::HorizontalBar,
        "pie" => ChartKind::Pie,
        "line" => ChartKind::Line,
        "scatter" => ChartKind::Scatter,
        "choropleth" => ChartKind::Choropleth,
        x => whatever!("Unknown chart family {:?}", x),
    };
    Ok(kind)
}

/// The JSON description of one session: the dataset profile, the files
/// to load, the row selection and the views to produce.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub profile: String,
    pub input: Option<String>,
    #[serde(rename = "secondaryInput")]
    pub secondary_input: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    pub views: Option<Vec<ViewConfig>>,
    #[serde(rename = "previewRows")]
    pub preview_rows: Option<usize>,
}

impl SessionConfig {
    /// The implicit configuration of a run started with an input file
    /// only: preview the table under the generic profile.
    pub fn preview_only() -> SessionConfig {
        SessionConfig {
            profile: "generic".to_string(),
            input: None,
            secondary_input: None,
            filters: Vec::new(),
            views: None,
            preview_rows: None,
        }
    }
}

pub fn read_config(path: String) -> SessionResult<SessionConfig> {
    let config_str = fs::read_to_string(path.clone()).context(OpeningFileSnafu { path })?;
    let config: SessionConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> SessionResult<serde_json::Value> {
    let contents = fs::read_to_string(path.clone()).context(OpeningFileSnafu { path })?;
    let js: serde_json::Value =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
