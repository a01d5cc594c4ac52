use log::{debug, info, warn};

use snafu::{prelude::*, ErrorCompat, Snafu};
use tabular_summary::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::session::config_reader::*;
use crate::session::profiles::*;

pub mod config_reader;
pub mod profiles;

/// How many leading rows of the loaded table go into the summary when the
/// configuration does not say.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    MissingParentDir {},
    #[snafu(display("No input file: pass --input or set \"input\" in the configuration"))]
    MissingInput {},
    #[snafu(display(
        "The {profile} profile joins two sources: set \"secondaryInput\" in the configuration"
    ))]
    MissingSecondaryInput { profile: String },
    #[snafu(display("Unknown profile {name:?}"))]
    UnknownProfile { name: String },
    #[snafu(display(
        "The configuration refers to the column {column:?}, which the loaded table does not have"
    ))]
    UnknownColumn { column: String },
    #[snafu(display("{source}"))]
    Pipeline { source: TableError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

// ******** Summary document ********

fn preview_to_json(table: &Table) -> JSValue {
    let rows: Vec<JSValue> = table
        .rows
        .iter()
        .map(|row| json!(row.iter().map(|cell| cell.render()).collect::<Vec<String>>()))
        .collect();
    json!({"columns": table.columns, "rows": rows})
}

// Headline figures are rendered with two decimals, measures of the views
// with the shortest representation that round-trips. Strings keep the
// document byte-stable across platforms.
fn metrics_to_json(metrics: &[Metric], table: &Table) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for metric in metrics.iter() {
        let value = match metric.kind {
            MetricKind::Sum => Some(column_sum(table, metric.column)),
            MetricKind::Mean => column_mean(table, metric.column),
        };
        let rendered = match value {
            Some(x) => format!("{:.2}", x),
            None => String::new(),
        };
        m.insert(metric.label.to_string(), json!(rendered));
    }
    JSValue::Object(m)
}

fn summary_view_to_json(chart: &ChartSpec, summary: &SummaryTable) -> JSValue {
    let rows: Vec<JSValue> = summary
        .rows
        .iter()
        .map(|row| {
            json!({
                "keys": row.keys.iter().map(|k| k.render()).collect::<Vec<String>>(),
                "values": row.values.iter().map(|v| v.to_string()).collect::<Vec<String>>(),
            })
        })
        .collect();
    json!({
        "title": chart.title,
        "chart": chart.kind.label(),
        "xLabel": chart.x_label,
        "yLabel": chart.y_label,
        "keyColumns": summary.key_columns,
        "valueColumns": summary.value_columns,
        "rows": rows,
    })
}

// ******** Session driver ********

fn join_path(root: &Path, lpath: &str) -> String {
    let p: PathBuf = [root, Path::new(lpath)].iter().collect();
    p.as_path().display().to_string()
}

fn add_column(columns: &mut Vec<String>, name: &str) {
    if !columns.iter().any(|c| c == name) {
        columns.push(name.to_string());
    }
}

// The columns this run needs: the profile requirements first, then every
// column named by a filter or a view, without duplicates.
fn effective_required(
    profile: &Profile,
    predicates: &[Predicate],
    views: &[(ViewSpec, ChartSpec)],
) -> Vec<String> {
    let mut required: Vec<String> = profile
        .required_columns
        .iter()
        .map(|c| c.to_string())
        .collect();
    for p in predicates.iter() {
        add_column(&mut required, p.column());
    }
    for (view, _) in views.iter() {
        for column in view.columns() {
            add_column(&mut required, column);
        }
    }
    required
}

// The columns named by the configuration itself. The default views of the
// profile are not config input: a column they need but the data lacks is
// a data error, not a config mistake.
fn configured_columns(
    predicates: &[Predicate],
    views_from_config: bool,
    views: &[(ViewSpec, ChartSpec)],
) -> Vec<String> {
    let mut columns: Vec<String> = predicates.iter().map(|p| p.column().to_string()).collect();
    if views_from_config {
        for (view, _) in views.iter() {
            for column in view.columns() {
                add_column(&mut columns, column);
            }
        }
    }
    columns
}

fn ingest_file(path: String) -> SessionResult<Table> {
    let raw = fs::read(path.clone()).context(OpeningFileSnafu { path: path.clone() })?;
    info!("ingest_file: read {} bytes from {:?}", raw.len(), path);
    ingest(&raw).context(PipelineSnafu {})
}

pub fn run_session(
    config_path: Option<String>,
    input_override: Option<String>,
    out_path: Option<String>,
    check_summary_path: Option<String>,
) -> SessionResult<()> {
    // Without a configuration the session previews the input as-is.
    let (config, root) = match config_path {
        Some(cp) => {
            let config = read_config(cp.clone())?;
            let root = Path::new(cp.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (SessionConfig::preview_only(), PathBuf::new()),
    };
    info!("config: {:?}", config);

    let profile = match profile_by_name(config.profile.as_str()) {
        Some(profile) => profile,
        None => {
            return UnknownProfileSnafu {
                name: config.profile.clone(),
            }
            .fail()
        }
    };

    // The command line input takes precedence over the path in the
    // configuration. Paths in the configuration are relative to it.
    let primary_path = match (input_override, config.input.clone()) {
        (Some(p), _) => p,
        (None, Some(p)) => join_path(&root, &p),
        (None, None) => return MissingInputSnafu {}.fail(),
    };
    let table = ingest_file(primary_path)?;
    let ingested_rows = table.num_rows();

    let mut table = apply_shaping(table, &profile.primary_shaping, &IdentityStandardizer)?;

    if let Some(secondary) = profile.secondary.as_ref() {
        let lpath = match config.secondary_input.clone() {
            Some(lpath) => lpath,
            None => {
                return MissingSecondaryInputSnafu {
                    profile: profile.name,
                }
                .fail()
            }
        };
        let other = ingest_file(join_path(&root, &lpath))?;
        let other = apply_shaping(other, &secondary.shaping, &IdentityStandardizer)?;
        table = inner_join(&table, &other, &secondary.join_keys);
    }

    let preview = head(&table, config.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS));

    let predicates: Vec<Predicate> = config
        .filters
        .iter()
        .map(|f| f.to_predicate())
        .collect::<SessionResult<_>>()?;
    let views: Vec<(ViewSpec, ChartSpec)> = match config.views.as_ref() {
        Some(view_configs) => view_configs
            .iter()
            .map(|vc| vc.to_view())
            .collect::<SessionResult<_>>()?,
        None => profile.default_views.clone(),
    };

    // A configuration naming a column the table does not have is rejected
    // before the pipeline runs.
    for column in configured_columns(&predicates, config.views.is_some(), &views) {
        if table.column_index(column.as_str()).is_none() {
            return UnknownColumnSnafu { column }.fail();
        }
    }

    let required = effective_required(&profile, &predicates, &views);
    let validated = if required.is_empty() {
        // Nothing is required: the generic profile accepts any table.
        table.clone()
    } else {
        let names: Vec<&str> = required.iter().map(|s| s.as_str()).collect();
        validate_columns(&table, &names).context(PipelineSnafu {})?
    };

    let filtered = filter(&validated, &predicates);
    if filtered.num_rows() == 0 {
        warn!("run_session: the selection removed every row");
        return Err(TableError::EmptyResult).context(PipelineSnafu {});
    }

    let metrics_js = metrics_to_json(&profile.metrics, &filtered);

    let mut views_js: Vec<JSValue> = Vec::new();
    for (view, chart) in views.iter() {
        let summary = aggregate(&filtered, view).context(PipelineSnafu {})?;
        debug!(
            "run_session: view {:?} produced {} summary rows",
            chart.title,
            summary.rows.len()
        );
        views_js.push(summary_view_to_json(chart, &summary));
    }

    // Assemble the final json
    let result_js = json!({
        "config": { "profile": profile.name },
        "rowCounts": {
            "ingested": ingested_rows,
            "validated": validated.num_rows(),
            "filtered": filtered.num_rows(),
        },
        "preview": preview_to_json(&preview),
        "metrics": metrics_js,
        "views": views_js,
    });

    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    match out_path {
        Some(path) => {
            fs::write(path.clone(), pretty_js_stats.clone() + "\n")
                .context(WritingSummarySnafu { path: path.clone() })?;
            info!("run_session: summary written to {:?}", path);
        }
        None => {
            println!("summary:{}", pretty_js_stats);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary");
        }
    }

    Ok(())
}

fn run_session_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let test_dir = option_env!("TABSUM_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {}", test_name);
    let res = run_session(
        Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        None,
        None,
        Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
    );
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        panic!("Test {} did not produce the reference summary", test_name);
    }
}

pub fn test_wrapper(test_name: &str) {
    run_session_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
