/*!

This is the long-form manual for `tabular_summary` and `tabsum`.

## Dataset profiles

A profile bundles what is known in advance about a family of datasets: the
columns a file must provide, how the table is reshaped after loading, and
the views that are produced when the session configuration does not list
its own. The following profiles are available:

* `candidates` election candidate registries
* `sales` point-of-sale exports
* `climate` temperature records joined with emission records
* `generic` any delimited file, preview only

### `candidates`

One row per registered candidate. The required columns are
`DS_GRAU_INSTRUCAO` (education level), `DS_GENERO` (gender),
`DS_COR_RACA` (race), and `SG_PARTIDO` (party). The default views count
candidates along each of these dimensions and cross-tabulate gender per
party, normalized to percentages.

### `sales`

One row per purchase, as exported by a point-of-sale system. The
required columns are `Date`, `City`, `Product line`, `Total`, `Payment`
and `Rating`. The default views sum the revenue by day and city, by
product line and city, by city, and by payment type, and average the
rating by city. Two headline metrics are reported: the total revenue and
the mean rating.

These files commonly use `;` as the delimiter and a decimal comma in the
numbers. Both are detected automatically, see the ingestion section.

### `climate`

Two files joined together. The primary file holds one temperature
reading per month, with columns `dt` (a date), `AverageTemperature` and
`Country`. A `Year` column is derived from `dt` and readings before 1960
are discarded, the early records being too sparse to compare. The
secondary file holds one emission record per year, with columns
`Country`, `Year` and `Total`; `Total` is renamed to `CO2Emissions`.
The two tables are joined on `(Country, Year)`, keeping the rows present
on both sides.

Country names on both sides pass through a name standardizer before the
join. The library ships an identity standardizer only; a host with a
reference country list can plug its own (see
[`NameStandardizer`](crate::NameStandardizer)).

### `generic`

No required columns, no reshaping, no default views. Useful to inspect
an arbitrary delimited file: the summary then contains the preview and
the row counts only.

## Ingestion

The input file is decoded and split by trying a fixed list of
combinations, in order:

| encoding     | delimiter |
|--------------|-----------|
| UTF-8        | `,`       |
| UTF-8        | `;`       |
| Windows-1252 | `,`       |
| Windows-1252 | `;`       |

The first combination that decodes the bytes and splits every row to the
width of the header row wins. A combination that yields at least two
columns is preferred over a clean single-column parse, so that a
semicolon-separated file is never mistaken for a one-column
comma-separated one. A leading UTF-8 byte order mark is removed. The
file is rejected when no combination works, when the header has a blank
or duplicate column name, or when the decoded text contains control
characters (a sign of a binary file).

Each cell is then typed independently:

* an empty or all-whitespace cell is a missing value;
* `1995`, `522.75`, `-3.5e2` and the decimal-comma form `522,75` are numbers;
* `1/5/2019` (month first) and `2019-01-05` are dates;
* anything else, including `1,045.81` with a thousands separator, is text.

## The session configuration

A session is described by a JSON document:

```text
{
    "profile": "sales",
    "input": "vendas.csv",
    "secondaryInput": null,
    "previewRows": 5,
    "filters": [
        {"column": "City", "anyOf": ["Yangon", "Mandalay"]},
        {"column": "Date", "dateBetween": ["2019-01-01", "2019-01-31"]}
    ],
    "views": [
        {"sumBy": {"groupColumns": ["City"], "valueColumn": "Total"},
         "chart": "bar", "title": "Faturamento por Cidade"}
    ]
}
```

* `profile` (mandatory): one of the profile names above.
* `input`: the file to load, relative to the configuration file. The
  `--input` command line flag takes precedence when given.
* `secondaryInput`: the second file for the profiles that join two
  sources. Mandatory for `climate`, ignored elsewhere.
* `previewRows`: how many leading rows of the loaded table are copied
  into the summary (10 when omitted).
* `filters`: a list of conditions, all of which must hold for a row to
  be kept. Each names a `column` and exactly one of:
  * `"value": "PT"` the cell equals the text;
  * `"anyOf": ["SP", "RJ"]` the cell equals one of the texts;
  * `"between": [6.0, 10.0]` the number lies in the inclusive range;
  * `"dateBetween": ["2019-01-01", "2019-01-31"]` the date lies in the
    inclusive range (bounds written as `YYYY-MM-DD`).

  A missing cell never satisfies a filter, and neither does a cell of
  the wrong type.
* `views`: the aggregations to run. When absent, the default views of
  the profile run instead. Each view carries exactly one of:
  * `"countBy": "DS_GENERO"` distinct-value counts, most frequent
    first;
  * `"sumBy": {"groupColumns": [...], "valueColumn": ...}` sums per
    group, ordered by the group key;
  * `"meanBy": {...}` same shape, arithmetic mean;
  * `"crossTab": {"rowColumn": ..., "colColumn": ..., "normalize":
    true}` a co-occurrence matrix, one summary column per distinct
    value of `colColumn`; with `normalize` every matrix row is rescaled
    to percentages summing to 100.

  A view may also carry a `chart` (`bar`, `hbar`, `pie`, `line`,
  `scatter` or `choropleth`), a `title`, an `xLabel` and a `yLabel`.
  These are passed through to the summary for a renderer to use.

A filter or a view naming a column that the loaded table does not have
is reported as a configuration mistake before anything is computed.

## The summary document

The outcome of a session is a single JSON document, written to the path
given with `--out` or printed on the standard output. It contains:

* `config`: the profile that ran;
* `rowCounts`: the number of rows after loading (`ingested`), after the
  required-column check (`validated`) and after the filters
  (`filtered`);
* `preview`: the first rows of the loaded table, cells rendered as text;
* `metrics`: the headline figures of the profile, computed over the
  filtered rows;
* `views`: one entry per aggregation, with the chart metadata, the key
  and value column names, and the summary rows.

Measures are rendered as strings rather than JSON numbers so that the
document is stable across platforms and can be compared byte by byte.

## Checking against a reference

With `--reference <file>`, the produced summary is compared against the
given document. Both sides are parsed and re-printed before the
comparison, so formatting and key order do not matter, values do. On a
mismatch a line diff is printed and the program exits with a failure
code. The test suite of this repository runs every scenario in
`tests/data` this way.

## Errors

Three data conditions halt a session and are reported to the user:

* the file could not be parsed under any (encoding, delimiter)
  combination;
* a required column is missing: the report lists every absent name, and
  nothing is aggregated from a file that failed the check;
* no rows are left after filtering, or a view observed no group at all.

Mistakes in the session configuration itself (an unknown profile, a
filter on a column the table does not have, a view without exactly one
aggregation) are reported separately, before the pipeline runs.

*/
