/*!

# Quick start

This example walks through a complete session on a small sales export.
Save the following as `vendas.csv` (note the `;` delimiter and the
decimal commas, both common in files produced by European and South
American spreadsheet software):

```text
Date;City;Product line;Total;Payment;Rating
1/5/2019;Yangon;Health and beauty;522,75;Ewallet;9,25
1/8/2019;Yangon;Food and beverages;76,5;Cash;7,75
1/12/2019;Mandalay;Health and beauty;324,25;Credit card;8,5
1/15/2019;Mandalay;Sports and travel;110,25;Ewallet;6,5
2/3/2019;Mandalay;Health and beauty;98,75;Cash;5,75
```

Then save a session configuration as `config.json`. It selects January
and asks for the revenue per city:

```text
{
    "profile": "sales",
    "input": "vendas.csv",
    "previewRows": 2,
    "filters": [
        {"column": "Date", "dateBetween": ["2019-01-01", "2019-01-31"]}
    ],
    "views": [
        {"sumBy": {"groupColumns": ["City"], "valueColumn": "Total"},
         "chart": "bar", "title": "Faturamento por Cidade"}
    ]
}
```

Run `tabsum` on it:

```bash
tabsum --config config.json --verbose
```

The log shows the pipeline at work: the delimiter detection, the
required-column check of the `sales` profile, and the filter:

```text
[2026-02-11T10:12:40Z DEBUG tabular_summary::ingest] ingest: adopting Utf8 with delimiter ';': 6 columns, 5 rows
[2026-02-11T10:12:40Z INFO  tabular_summary] validate_columns: kept 5 of 5 rows over ["Date", "City", "Product line", "Total", "Payment", "Rating"]
[2026-02-11T10:12:40Z INFO  tabular_summary] filter: 4 of 5 rows satisfy the 1 predicates
[2026-02-11T10:12:40Z INFO  tabular_summary] aggregate: SumBy { group_columns: ["City"], value_column: "Total" } produced 2 summary rows
```

and the summary document is printed at the end:

```text
summary:{
  "config": {
    "profile": "sales"
  },
  "metrics": {
    "Avaliação Média": "8.00",
    "Faturamento Total": "1033.75"
  },
  ...
  "views": [
    {
      "chart": "bar",
      "keyColumns": [
        "City"
      ],
      "rows": [
        {
          "keys": [
            "Mandalay"
          ],
          "values": [
            "434.5"
          ]
        },
        {
          "keys": [
            "Yangon"
          ],
          "values": [
            "599.25"
          ]
        }
      ],
      "title": "Faturamento por Cidade",
      "valueColumns": [
        "Total"
      ],
      "xLabel": null,
      "yLabel": null
    }
  ]
}
```

Pass `--out summary.json` to write the document to a file instead, and
`--reference expected.json` to compare the run against a saved summary
(the program exits with an error if they differ).

The same pipeline is available as a library, without any file or JSON
handling, through [`ingest`](crate::ingest()),
[`validate_columns`](crate::validate_columns), [`filter`](crate::filter)
and [`aggregate`](crate::aggregate). See
[`TableBuilder`](crate::builder::TableBuilder) for an example that
assembles a table in code.

*/
