use criterion::{black_box, criterion_group, criterion_main, Criterion};
use queryable_table::data::datatable_loaders::read_csv_to_datatable;
use queryable_table::data::query_engine::derive_view;
use queryable_table::{ColumnDescriptor, DataRow, DataTable, QueryState, QueryableTable, SortSpec, TableOptions};
use std::sync::Arc;

fn create_test_data(rows: usize) -> DataTable {
    let units = ["Centro", "Norte", "Sul", "Leste", "Oeste"];
    let levels = ["A1", "A2", "B1", "B2", "C1"];

    let rows = (0..rows)
        .map(|i| {
            DataRow::new()
                .with_id(i as i64)
                .with_value("name", format!("Student {}", i))
                .with_value("unit", units[i % units.len()])
                .with_value("level", levels[(i / 7) % levels.len()])
                .with_value("fee", (i % 500) as f64 * 1.5)
        })
        .collect();

    DataTable::from_rows("students", rows).unwrap()
}

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("name", "Name").sortable(true),
        ColumnDescriptor::new("unit", "Unit").sortable(true),
        ColumnDescriptor::new("level", "Level").sortable(true),
        ColumnDescriptor::new("fee", "Fee").sortable(true),
    ]
}

fn benchmark_derive(c: &mut Criterion) {
    let table_10k = create_test_data(10_000);
    let table_100k = create_test_data(100_000);
    let state = QueryState {
        search_term: "norte".to_string(),
        sort: Some(SortSpec::descending("fee")),
        ..QueryState::default()
    };

    let mut group = c.benchmark_group("derive_view");

    group.bench_function("10k_rows", |b| {
        b.iter(|| derive_view(black_box(&table_10k), &columns(), &state, true, "%Y-%m-%d"));
    });

    group.bench_function("100k_rows", |b| {
        b.iter(|| derive_view(black_box(&table_100k), &columns(), &state, true, "%Y-%m-%d"));
    });

    group.finish();
}

fn benchmark_page_change(c: &mut Criterion) {
    let rows = Arc::new(create_test_data(100_000));
    let mut table = QueryableTable::new(columns(), rows, TableOptions::default());
    table.set_search_term("student 1");
    table.set_sort("level").unwrap();

    // Page changes re-slice the cached order without sorting again
    c.bench_function("page_change_100k_rows", |b| {
        let mut page = 0;
        b.iter(|| {
            page = (page + 1) % 50;
            table.set_page(black_box(page));
        });
    });
}

fn create_csv(rows: usize) -> String {
    let mut csv = String::from("id,name,unit,fee\n");
    for i in 0..rows {
        csv.push_str(&format!("{},Student {},Centro,{}\n", i, i, (i % 500) as f64 * 1.5));
    }
    csv
}

fn benchmark_csv_load(c: &mut Criterion) {
    let csv_50k = create_csv(50_000);

    c.bench_function("csv_load_50k_rows", |b| {
        b.iter(|| read_csv_to_datatable(black_box(csv_50k.as_bytes()), "students").unwrap());
    });
}

criterion_group!(benches, benchmark_derive, benchmark_page_change, benchmark_csv_load);
criterion_main!(benches);
