//! Integration tests for dataset declarations and migration planning.

use std::collections::BTreeSet;

use gooddata_client::{
    Column, ColumnKind, Dataset, DatasetDiff, Error, Literal, MigrationAction, MigrationEngine,
    RowFilter, UploadMode,
};
use indexmap::IndexMap;

const DEPARTMENT: &str = r#"{
    "name": "Department",
    "columns": [
        {"name": "department", "ldmType": "CONNECTION_POINT", "title": "Department",
         "folder": "Department", "dataType": "VARCHAR(128)"},
        {"name": "name", "ldmType": "LABEL", "title": "Name", "reference": "department",
         "folder": "Department", "dataType": "VARCHAR(128)"},
        {"name": "city", "ldmType": "ATTRIBUTE", "title": "City",
         "folder": "Department", "dataType": "VARCHAR(20)"}
    ]
}"#;

fn department() -> Dataset {
    Dataset::from_json_str(DEPARTMENT).unwrap()
}

mod declarations {
    use super::*;

    #[test]
    fn json_round_trip() {
        let dataset = department();
        let reparsed = Dataset::from_json_str(&dataset.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, dataset);
    }

    #[test]
    fn maql_follows_dependency_order() {
        let maql = department().maql();
        let position = |needle: &str| {
            maql.find(needle)
                .unwrap_or_else(|| panic!("{needle} missing from:\n{maql}"))
        };

        let dataset = position("CREATE DATASET {dataset.department}");
        let city = position("CREATE ATTRIBUTE {attr.department.city}");
        let label = position("{label.department.department.name}");
        let sync = position("SYNCHRONIZE {dataset.department};");
        assert!(dataset < city);
        assert!(city < label);
        assert!(label < sync);
        assert!(maql.trim_end().ends_with("SYNCHRONIZE {dataset.department};"));
    }

    #[test]
    fn fact_table_gets_records_attribute() {
        let dataset = Dataset::new("Salary")
            .column("payment", Column::fact("Payment"))
            .column("payday", Column::date("Pay Day", "payment"));
        let maql = dataset.maql();
        assert!(maql.contains("CREATE ATTRIBUTE {attr.salary.factsof} VISUAL(TITLE \"Records of Salary\")"));
        assert!(maql.contains("ALTER ATTRIBUTE {payment.date} ADD KEYS {f_salary.dt_payday_id};"));
    }

    #[test]
    fn column_names_are_case_insensitive() {
        let dataset = department();
        assert_eq!(dataset.get("CITY"), dataset.get("city"));
        assert!(dataset.get("town").is_none());
    }
}

mod manifests {
    use super::*;

    #[test]
    fn dates_expand_with_time() {
        let date = Dataset::new("Salary").column("payday", Column::date("Pay Day", "payment"));
        let datetime =
            Dataset::new("Salary").column("payday", Column::date("Pay Day", "payment").with_time());

        assert_eq!(
            date.manifest(UploadMode::Full).column_names(),
            vec!["payday", "payday_dt"]
        );
        assert_eq!(
            datetime.manifest(UploadMode::Full).column_names(),
            vec!["payday", "payday_dt", "payday_tm", "tm_payday_id"]
        );
    }

    #[test]
    fn mode_does_not_change_columns() {
        let dataset = department();
        assert_eq!(
            dataset.manifest(UploadMode::Full).column_names(),
            dataset.manifest(UploadMode::Incremental).column_names()
        );
    }
}

mod planning {
    use super::*;

    #[test]
    fn declaration_against_itself_is_empty() {
        let dataset = department();
        let chain = MigrationEngine::plan(&dataset, &dataset.column_map()).unwrap();
        assert!(chain.is_empty());
        assert!(DatasetDiff::compute(&dataset.column_map(), &dataset.column_map()).is_empty());
    }

    #[test]
    fn declaration_matches_its_reconstruction() {
        // GoodData reports default types as undeclared and keeps no folders.
        let remote = Dataset::new("Department")
            .column("department", Column::connection_point("Department"))
            .column("name", Column::label("Name", "department"))
            .column("city", Column::attribute("City").with_data_type("VARCHAR(20)"))
            .column_map();
        let chain = MigrationEngine::plan(&department(), &remote).unwrap();
        assert!(chain.is_empty(), "unexpected migration:\n{}", chain.maql());
    }

    #[test]
    fn typed_reference_matches_its_reconstruction() {
        let remote = Dataset::new("Salary")
            .column("worker", Column::reference("", "worker", "worker"))
            .column_map();
        let local = Dataset::new("Salary").column(
            "worker",
            Column::reference("Worker", "worker", "Worker").with_data_type("VARCHAR(20)"),
        );
        assert!(MigrationEngine::plan(&local, &remote).unwrap().is_empty());
    }

    #[test]
    fn every_variant_drops_and_recreates_the_same_fields() {
        let variants = [
            ("department", Column::connection_point("Department")),
            ("color", Column::attribute("Color").with_data_type("VARCHAR(20)")),
            ("windows", Column::fact("Windows")),
            ("opened", Column::date("Opened", "opening")),
            ("paid", Column::date("Paid", "payment").with_time()),
            ("boss", Column::reference("Boss", "employee", "Employee")),
            ("nick", Column::label("Nick", "city")),
            ("site", Column::hyperlink("Site", "city")),
        ];
        let fields = |dataset: &Dataset| -> BTreeSet<String> {
            dataset
                .manifest(UploadMode::Full)
                .column_names()
                .into_iter()
                .map(String::from)
                .collect()
        };

        for (name, column) in variants {
            let without = Dataset::new("Department").column("city", Column::attribute("City"));
            let with = without.clone().column(name, column.clone());

            let dropped = MigrationEngine::plan(&without, &with.column_map()).unwrap();
            let recreated = MigrationEngine::plan(&with, &without.column_map()).unwrap();
            assert!(
                matches!(dropped.actions(), [MigrationAction::Delete { .. }]),
                "{name} was not dropped"
            );
            assert!(
                matches!(
                    recreated.actions(),
                    [MigrationAction::Add { .. } | MigrationAction::AddDate { .. }]
                ),
                "{name} was not recreated"
            );
            assert_eq!(dropped.actions()[0].column(), &column);
            assert_eq!(recreated.actions()[0].column(), &column);

            let own: BTreeSet<String> = column
                .manifest_parts(&with.scope(name), UploadMode::Full)
                .into_iter()
                .map(|part| part.column_name)
                .collect();
            assert!(!own.is_empty(), "{name} loads nothing");
            assert!(fields(&without).is_disjoint(&own), "{name}");
            let restored: BTreeSet<String> = fields(&without).union(&own).cloned().collect();
            assert_eq!(restored, fields(&with), "{name}");
        }
    }

    #[test]
    fn dropped_and_added_columns() {
        let remote = department().column_map();
        let local = Dataset::new("Department")
            .column("department", Column::connection_point("Department"))
            .column("name", Column::label("Name", "department"))
            .column("windows", Column::fact("Windows"));

        let chain = MigrationEngine::plan(&local, &remote).unwrap();
        let kinds: Vec<_> = chain
            .actions()
            .iter()
            .map(|action| match action {
                MigrationAction::Add { .. } => "add",
                MigrationAction::AddDate { .. } => "add_date",
                MigrationAction::Delete { .. } => "delete",
                MigrationAction::Alter { .. } => "alter",
            })
            .collect();
        assert_eq!(kinds, vec!["add", "delete"]);

        let maql = chain.maql();
        assert!(maql.contains("CREATE FACT {fact.department.windows}"));
        assert!(maql.contains("DROP ALL IN {attr.department.city} CASCADE;"));
        assert!(maql.ends_with("SYNCHRONIZE {dataset.department} PRESERVE DATA;\n"));
    }

    #[test]
    fn changed_data_type_alters_in_place() {
        let remote = department().column_map();
        let local = Dataset::new("Department")
            .column("department", Column::connection_point("Department"))
            .column("name", Column::label("Name", "department"))
            .column("city", Column::attribute("City").with_data_type("VARCHAR(64)"));

        let chain = MigrationEngine::plan(&local, &remote).unwrap();
        assert_eq!(chain.len(), 1);
        assert!(chain
            .maql()
            .contains("ALTER DATATYPE {d_department_city.nm_city} VARCHAR(64);"));
    }

    #[test]
    fn redirected_reference_is_refused() {
        let remote = Dataset::new("Salary")
            .column("employee", Column::reference("Employee", "employee", "Employee"))
            .column_map();
        let local = Dataset::new("Salary")
            .column("employee", Column::reference("Employee", "manager", "Manager"));

        let err = MigrationEngine::plan(&local, &remote).unwrap_err();
        assert!(matches!(err, Error::InvalidAlteration { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}

mod row_deletion {
    use super::*;

    #[test]
    fn values_match_the_connection_point() {
        let filter = RowFilter::Values(vec![Literal::Int(1), Literal::from("d2")]);
        assert_eq!(
            department().delete_rows_maql(None, &filter).unwrap(),
            "DELETE FROM {attr.department.department} WHERE {label.department.department} IN (1, \"d2\");"
        );
    }

    #[test]
    fn attribute_column_targets_its_label() {
        let filter = RowFilter::Clause("{label.department.city} = \"Prague\"".into());
        assert_eq!(
            department().delete_rows_maql(Some("city"), &filter).unwrap(),
            "DELETE FROM {label.department.city} WHERE {label.department.city} = \"Prague\";"
        );
    }

    #[test]
    fn facts_cannot_be_targeted() {
        let dataset = department().column("windows", Column::fact("Windows"));
        let err = dataset
            .delete_rows_maql(Some("windows"), &RowFilter::Clause("1 = 1".into()))
            .unwrap_err();
        assert!(matches!(err, Error::RowDeletion { .. }));
    }
}

mod diffing {
    use super::*;

    fn columns(columns: &[(&str, Column)]) -> IndexMap<String, Column> {
        columns
            .iter()
            .map(|(name, column)| (name.to_string(), column.clone()))
            .collect()
    }

    fn check(remote: &IndexMap<String, Column>, local: &IndexMap<String, Column>) -> DatasetDiff {
        let diff = DatasetDiff::compute(remote, local);
        let cp_added = diff
            .added
            .values()
            .any(|c| c.kind() == ColumnKind::ConnectionPoint);

        let keys: BTreeSet<&String> = remote.keys().chain(local.keys()).collect();
        for key in keys {
            let buckets = [
                diff.added.contains_key(key),
                diff.altered.contains_key(key),
                diff.deleted.contains_key(key),
            ];
            let found = buckets.iter().filter(|found| **found).count();
            let unchanged = matches!(
                (remote.get(key), local.get(key)),
                (Some(old), Some(new)) if old.is_equivalent(new)
            );
            let suppressed = key == "factsof" && !local.contains_key(key) && !cp_added;
            let expected = usize::from(!unchanged && !suppressed);
            assert_eq!(found, expected, "{key} is in {found} buckets");
        }
        for key in diff.added.keys().chain(diff.altered.keys()).chain(diff.deleted.keys()) {
            assert!(remote.contains_key(key) || local.contains_key(key), "{key}");
        }
        diff
    }

    #[test]
    fn buckets_partition_every_column() {
        let department = department().column_map();
        let factsof = ("factsof", Column::attribute("Records of Salary"));
        let payment = ("payment", Column::fact("Payment"));
        let cases: Vec<(IndexMap<String, Column>, IndexMap<String, Column>, usize)> = vec![
            (IndexMap::new(), department.clone(), 3),
            (department.clone(), IndexMap::new(), 3),
            (department.clone(), department.clone(), 0),
            (
                department.clone(),
                columns(&[
                    ("department", Column::connection_point("Department")),
                    ("name", Column::hyperlink("Name", "department")),
                    ("city", Column::attribute("Town").with_data_type("VARCHAR(20)")),
                    ("windows", Column::fact("Windows")),
                ]),
                3,
            ),
            (
                columns(&[factsof.clone(), payment.clone()]),
                columns(&[payment.clone(), ("paid", Column::date("Paid", "payment"))]),
                1,
            ),
            (
                columns(&[factsof.clone(), payment.clone()]),
                columns(&[("salary", Column::connection_point("Salary")), payment.clone()]),
                2,
            ),
            (
                columns(&[payment.clone()]),
                columns(&[("payment", Column::attribute("Payment"))]),
                1,
            ),
        ];

        for (remote, local, changed) in &cases {
            assert_eq!(check(remote, local).len(), *changed);
        }
    }
}
