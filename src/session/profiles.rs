use crate::session::*;

use log::debug;
use snafu::prelude::*;
use tabular_summary::*;

// ******** Dataset profiles ********

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Sum,
    Mean,
}

/// A headline figure computed over the filtered table.
#[derive(Debug, Clone)]
pub struct Metric {
    pub label: &'static str,
    pub column: &'static str,
    pub kind: MetricKind,
}

/// One reshaping step applied to a table right after loading.
#[derive(Debug, Clone)]
pub enum Shaping {
    /// Checks for the given columns and projects onto them.
    Validate { required: Vec<&'static str> },
    /// Renames a column in place.
    Rename {
        from: &'static str,
        to: &'static str,
    },
    /// Appends a numeric year column derived from a date column.
    DeriveYear {
        date_column: &'static str,
        year_column: &'static str,
    },
    /// Drops the rows before the given year.
    MinimumYear {
        year_column: &'static str,
        year: i32,
    },
    /// Passes the column through the name standardizer.
    Standardize { column: &'static str },
}

/// The second file of a two-source profile and how to combine it with the
/// primary one.
#[derive(Debug, Clone)]
pub struct SecondarySource {
    pub shaping: Vec<Shaping>,
    pub join_keys: Vec<&'static str>,
}

/// What is known in advance about a family of datasets: the columns a
/// file must provide, the reshaping after loading, and the views that run
/// when the session configuration does not list its own.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: &'static str,
    /// The columns required of the shaped table.
    pub required_columns: Vec<&'static str>,
    pub primary_shaping: Vec<Shaping>,
    pub secondary: Option<SecondarySource>,
    pub default_views: Vec<(ViewSpec, ChartSpec)>,
    pub metrics: Vec<Metric>,
}

pub fn apply_shaping(
    mut table: Table,
    steps: &[Shaping],
    standardizer: &dyn NameStandardizer,
) -> SessionResult<Table> {
    for step in steps.iter() {
        debug!("apply_shaping: {:?} over {} rows", step, table.num_rows());
        match step {
            Shaping::Validate { required } => {
                table = validate_columns(&table, required).context(PipelineSnafu {})?;
            }
            Shaping::Rename { from, to } => rename_column(&mut table, from, to),
            Shaping::DeriveYear {
                date_column,
                year_column,
            } => derive_year(&mut table, date_column, year_column),
            Shaping::MinimumYear { year_column, year } => {
                table = filter(
                    &table,
                    &[Predicate::NumberBetween {
                        column: year_column.to_string(),
                        low: *year as f64,
                        high: f64::MAX,
                    }],
                );
            }
            Shaping::Standardize { column } => standardize_column(&mut table, column, standardizer),
        }
    }
    Ok(table)
}

fn chart(kind: ChartKind, title: &str, x_label: Option<&str>, y_label: Option<&str>) -> ChartSpec {
    ChartSpec {
        kind,
        title: title.to_string(),
        x_label: x_label.map(|s| s.to_string()),
        y_label: y_label.map(|s| s.to_string()),
    }
}

fn count_by(column: &str) -> ViewSpec {
    ViewSpec::CountBy {
        column: column.to_string(),
    }
}

fn sum_by(group_columns: &[&str], value_column: &str) -> ViewSpec {
    ViewSpec::SumBy {
        group_columns: group_columns.iter().map(|c| c.to_string()).collect(),
        value_column: value_column.to_string(),
    }
}

fn mean_by(group_columns: &[&str], value_column: &str) -> ViewSpec {
    ViewSpec::MeanBy {
        group_columns: group_columns.iter().map(|c| c.to_string()).collect(),
        value_column: value_column.to_string(),
    }
}

// One row per registered candidate, as published by the electoral
// authority.
fn candidates_profile() -> Profile {
    Profile {
        name: "candidates",
        required_columns: vec!["DS_GRAU_INSTRUCAO", "DS_GENERO", "DS_COR_RACA", "SG_PARTIDO"],
        primary_shaping: vec![],
        secondary: None,
        default_views: vec![
            (
                count_by("DS_GRAU_INSTRUCAO"),
                chart(
                    ChartKind::Bar,
                    "Candidatos por Grau de Instrução",
                    None,
                    Some("Candidatos"),
                ),
            ),
            (
                count_by("DS_GENERO"),
                chart(ChartKind::Pie, "Candidatos por Gênero", None, None),
            ),
            (
                count_by("DS_COR_RACA"),
                chart(
                    ChartKind::Bar,
                    "Candidatos por Cor/Raça",
                    None,
                    Some("Candidatos"),
                ),
            ),
            (
                count_by("SG_PARTIDO"),
                chart(
                    ChartKind::HorizontalBar,
                    "Candidatos por Partido",
                    Some("Candidatos"),
                    None,
                ),
            ),
            (
                ViewSpec::CrossTab {
                    row_column: "SG_PARTIDO".to_string(),
                    col_column: "DS_GENERO".to_string(),
                    normalize: true,
                },
                chart(
                    ChartKind::Bar,
                    "Distribuição de Gênero por Partido (%)",
                    None,
                    Some("%"),
                ),
            ),
        ],
        metrics: vec![],
    }
}

// One row per purchase, as exported by a point-of-sale system.
fn sales_profile() -> Profile {
    Profile {
        name: "sales",
        required_columns: vec!["Date", "City", "Product line", "Total", "Payment", "Rating"],
        primary_shaping: vec![],
        secondary: None,
        default_views: vec![
            (
                sum_by(&["Date", "City"], "Total"),
                chart(
                    ChartKind::Bar,
                    "Faturamento Diário por Cidade",
                    Some("Data"),
                    Some("Faturamento"),
                ),
            ),
            (
                sum_by(&["Product line", "City"], "Total"),
                chart(
                    ChartKind::HorizontalBar,
                    "Faturamento por Linha de Produto e Cidade",
                    Some("Faturamento"),
                    Some("Linha de Produto"),
                ),
            ),
            (
                sum_by(&["City"], "Total"),
                chart(ChartKind::Bar, "Faturamento por Cidade", None, None),
            ),
            (
                sum_by(&["Payment"], "Total"),
                chart(ChartKind::Pie, "Faturamento por Tipo de Pagamento", None, None),
            ),
            (
                mean_by(&["City"], "Rating"),
                chart(ChartKind::Bar, "Avaliação Média por Cidade", None, None),
            ),
        ],
        metrics: vec![
            Metric {
                label: "Faturamento Total",
                column: "Total",
                kind: MetricKind::Sum,
            },
            Metric {
                label: "Avaliação Média",
                column: "Rating",
                kind: MetricKind::Mean,
            },
        ],
    }
}

// Monthly temperature readings joined with yearly emission records on
// (Country, Year). Readings before 1960 are too sparse to compare and
// are dropped.
fn climate_profile() -> Profile {
    Profile {
        name: "climate",
        required_columns: vec!["Country", "Year", "AverageTemperature", "CO2Emissions"],
        primary_shaping: vec![
            Shaping::Validate {
                required: vec!["dt", "AverageTemperature", "Country"],
            },
            Shaping::DeriveYear {
                date_column: "dt",
                year_column: "Year",
            },
            Shaping::MinimumYear {
                year_column: "Year",
                year: 1960,
            },
            Shaping::Standardize { column: "Country" },
        ],
        secondary: Some(SecondarySource {
            shaping: vec![
                Shaping::Validate {
                    required: vec!["Country", "Year", "Total"],
                },
                Shaping::Rename {
                    from: "Total",
                    to: "CO2Emissions",
                },
                Shaping::Standardize { column: "Country" },
            ],
            join_keys: vec!["Country", "Year"],
        }),
        default_views: vec![
            (
                mean_by(&["Country"], "AverageTemperature"),
                chart(
                    ChartKind::Choropleth,
                    "Temperatura Média por País",
                    None,
                    Some("Temperatura Média (°C)"),
                ),
            ),
            (
                sum_by(&["Country"], "CO2Emissions"),
                chart(
                    ChartKind::Pie,
                    "Participação nas Emissões Totais de CO₂",
                    None,
                    None,
                ),
            ),
            (
                mean_by(&["Country", "Year"], "AverageTemperature"),
                chart(
                    ChartKind::Line,
                    "Evolução da Temperatura Média",
                    Some("Year"),
                    Some("Temperatura Média (°C)"),
                ),
            ),
            (
                mean_by(&["Country", "Year"], "CO2Emissions"),
                chart(
                    ChartKind::Line,
                    "Evolução das Emissões de CO₂",
                    Some("Year"),
                    Some("Emissões (MtCO₂)"),
                ),
            ),
            (
                mean_by(&["Country", "CO2Emissions"], "AverageTemperature"),
                chart(
                    ChartKind::Scatter,
                    "Temperatura Média vs Emissões de CO₂",
                    Some("Emissões (MtCO₂)"),
                    Some("Temperatura Média (°C)"),
                ),
            ),
        ],
        metrics: vec![
            Metric {
                label: "Emissões Totais de CO₂ (MtCO₂)",
                column: "CO2Emissions",
                kind: MetricKind::Sum,
            },
            Metric {
                label: "Temperatura Média (°C)",
                column: "AverageTemperature",
                kind: MetricKind::Mean,
            },
        ],
    }
}

// Any delimited file: preview only.
fn generic_profile() -> Profile {
    Profile {
        name: "generic",
        required_columns: vec![],
        primary_shaping: vec![],
        secondary: None,
        default_views: vec![],
        metrics: vec![],
    }
}

pub fn profile_by_name(name: &str) -> Option<Profile> {
    match name {
        "candidates" => Some(candidates_profile()),
        "sales" => Some(sales_profile()),
        "climate" => Some(climate_profile()),
        "generic" => Some(generic_profile()),
        _ => None,
    }
}
