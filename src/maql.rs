//! MAQL statement templates.
//!
//! MAQL is GoodData's DDL dialect. The grammar is reproduced verbatim here:
//! every function renders exactly one statement group with its trailing
//! newline, so callers concatenate them freely.
//!
//! Naming used in the parameters:
//! - `dataset`: dataset identifier (already lower-cased)
//! - `name`: column name inside the dataset
//! - `schema_ref`: identifier of another dataset or of a date dimension
//! - `folder`: a rendered folder clause (`, FOLDER {...}`) or empty

// === Creation ===

pub fn create_dataset(dataset: &str, title: &str) -> String {
    format!(
        "\n# CREATE DATASET. DATASET GROUPS ALL FOLLOWING LOGICAL MODEL ELEMENTS TOGETHER.\n\
         CREATE DATASET {{dataset.{dataset}}} VISUAL(TITLE \"{title}\");\n"
    )
}

pub fn create_attribute_folder(folder: &str, title: &str) -> String {
    format!("CREATE FOLDER {{folder.{folder}.attr}} VISUAL(TITLE \"{title}\") TYPE ATTRIBUTE;")
}

pub fn create_fact_folder(folder: &str, title: &str) -> String {
    format!("CREATE FOLDER {{folder.{folder}.fact}} VISUAL(TITLE \"{title}\") TYPE FACT;")
}

pub fn attribute_folder_clause(folder: &str) -> String {
    format!(", FOLDER {{folder.{folder}.attr}}")
}

pub fn fact_folder_clause(folder: &str) -> String {
    format!(", FOLDER {{folder.{folder}.fact}}")
}

pub fn attribute_create(
    dataset: &str,
    name: &str,
    title: &str,
    folder: &str,
    identifier: &str,
) -> String {
    format!(
        "CREATE ATTRIBUTE {{attr.{dataset}.{name}}} VISUAL(TITLE \"{title}\"{folder}) AS KEYS \
         {{d_{dataset}_{name}.id}} FULLSET, {{f_{dataset}.{name}_id}};\n\
         ALTER DATASET {{dataset.{dataset}}} ADD {{attr.{dataset}.{name}}};\n\
         ALTER ATTRIBUTE {{attr.{dataset}.{name}}} ADD LABELS {{label.{dataset}.{name}}} \
         VISUAL(TITLE \"{title}\") AS {{{identifier}}};\n"
    )
}

pub fn connection_point_create(dataset: &str, name: &str, title: &str, folder: &str) -> String {
    format!(
        "CREATE ATTRIBUTE {{attr.{dataset}.{name}}} VISUAL(TITLE \"{title}\"{folder}) AS KEYS \
         {{f_{dataset}.id}} FULLSET;\n\
         ALTER DATASET {{dataset.{dataset}}} ADD {{attr.{dataset}.{name}}};\n"
    )
}

pub fn connection_point_label(dataset: &str, name: &str, title: &str, identifier: &str) -> String {
    format!(
        "ALTER ATTRIBUTE {{attr.{dataset}.{name}}} ADD LABELS {{label.{dataset}.{name}}} \
         VISUAL(TITLE \"{title}\") AS {{{identifier}}};\n"
    )
}

pub fn fact_create(dataset: &str, name: &str, title: &str, folder: &str, identifier: &str) -> String {
    format!(
        "CREATE FACT {{fact.{dataset}.{name}}} VISUAL(TITLE \"{title}\"{folder}) AS {{{identifier}}};\n\
         ALTER DATASET {{dataset.{dataset}}} ADD {{fact.{dataset}.{name}}};\n"
    )
}

pub fn date_create(dataset: &str, name: &str, title: &str, folder: &str, schema_ref: &str) -> String {
    format!(
        "CREATE FACT {{dt.{dataset}.{name}}} VISUAL(TITLE \"{title} (Date)\"{folder})AS {{f_{dataset}.dt_{name}}};\n\
         ALTER DATASET {{dataset.{dataset}}} ADD {{dt.{dataset}.{name}}};\n\
         # CONNECT THE DATE TO THE DATE DIMENSION\n\
         ALTER ATTRIBUTE {{{schema_ref}.date}} ADD KEYS {{f_{dataset}.dt_{name}_id}};\n"
    )
}

pub fn time_create(dataset: &str, name: &str, title: &str, folder: &str, schema_ref: &str) -> String {
    format!(
        "CREATE FACT {{tm.dt.{dataset}.{name}}} VISUAL(TITLE \"{title} (Time)\"{folder}) AS {{f_{dataset}.tm_{name}}};\n\
         ALTER DATASET {{dataset.{dataset}}} ADD {{tm.dt.{dataset}.{name}}};\n\
         # CONNECT THE TIME TO THE TIME DIMENSION\n\
         ALTER ATTRIBUTE {{attr.time.second.of.day.{schema_ref}}} ADD KEYS {{f_{dataset}.tm_{name}_id}};\n"
    )
}

pub fn reference_create(schema_ref: &str, reference: &str, identifier: &str) -> String {
    format!(
        "# CONNECT THE REFERENCE TO THE APPROPRIATE DIMENSION\n\
         ALTER ATTRIBUTE {{attr.{schema_ref}.{reference}}} ADD KEYS {{{identifier}}};\n"
    )
}

pub fn label_create(
    dataset: &str,
    reference: &str,
    name: &str,
    title: &str,
    identifier: &str,
) -> String {
    format!(
        "# ADD LABELS\n\
         ALTER ATTRIBUTE {{attr.{dataset}.{reference}}} ADD LABELS \
         {{label.{dataset}.{reference}.{name}}} VISUAL(TITLE \"{title}\") AS {{{identifier}}};\n"
    )
}

pub fn label_default(dataset: &str, reference: &str, name: &str) -> String {
    format!(
        "ALTER ATTRIBUTE  {{attr.{dataset}.{reference}}} DEFAULT LABEL \
         {{label.{dataset}.{reference}.{name}}};\n"
    )
}

pub fn hyperlink_create(dataset: &str, reference: &str, name: &str) -> String {
    format!(
        "ALTER ATTRIBUTE {{attr.{dataset}.{reference}}} ALTER LABELS \
         {{label.{dataset}.{reference}.{name}}} HYPERLINK;\n"
    )
}

pub fn datatype(identifier: &str, data_type: &str) -> String {
    format!("ALTER DATATYPE {{{identifier}}} {data_type};\n")
}

pub fn factsof_create(dataset: &str, title: &str) -> String {
    format!(
        "CREATE ATTRIBUTE {{attr.{dataset}.factsof}} VISUAL(TITLE \"Records of {title}\") AS KEYS \
         {{f_{dataset}.id}} FULLSET;\n\
         ALTER DATASET {{dataset.{dataset}}} ADD {{attr.{dataset}.factsof}};"
    )
}

// === Deletion ===

/// Drops an attribute together with its labels.
pub fn attribute_drop(dataset: &str, name: &str) -> String {
    format!("DROP ALL IN {{attr.{dataset}.{name}}} CASCADE;\n")
}

pub fn fact_drop(dataset: &str, name: &str) -> String {
    format!("DROP {{fact.{dataset}.{name}}} CASCADE;\n")
}

pub fn date_drop(dataset: &str, name: &str, schema_ref: &str) -> String {
    format!(
        "ALTER ATTRIBUTE {{{schema_ref}.date}} DROP KEYS {{f_{dataset}.dt_{name}_id}};\n\
         DROP {{dt.{dataset}.{name}}} CASCADE;\n"
    )
}

pub fn time_drop(dataset: &str, name: &str, schema_ref: &str) -> String {
    format!(
        "ALTER ATTRIBUTE {{attr.time.second.of.day.{schema_ref}}} DROP KEYS {{f_{dataset}.tm_{name}_id}};\n\
         DROP {{tm.dt.{dataset}.{name}}} CASCADE;\n"
    )
}

pub fn reference_drop(schema_ref: &str, reference: &str, identifier: &str) -> String {
    format!("ALTER ATTRIBUTE {{attr.{schema_ref}.{reference}}} DROP KEYS {{{identifier}}};\n")
}

pub fn label_drop(dataset: &str, reference: &str, name: &str) -> String {
    format!(
        "ALTER ATTRIBUTE {{attr.{dataset}.{reference}}} DROP LABELS \
         {{label.{dataset}.{reference}.{name}}};\n"
    )
}

// === Alteration ===

pub fn attribute_alter_title(dataset: &str, name: &str, title: &str) -> String {
    format!("ALTER ATTRIBUTE {{attr.{dataset}.{name}}} VISUAL(TITLE \"{title}\");\n")
}

pub fn fact_alter_title(dataset: &str, name: &str, title: &str) -> String {
    format!("ALTER FACT {{fact.{dataset}.{name}}} VISUAL(TITLE \"{title}\");\n")
}

pub fn date_alter_title(dataset: &str, name: &str, title: &str) -> String {
    format!("ALTER FACT {{dt.{dataset}.{name}}} VISUAL(TITLE \"{title} (Date)\");\n")
}

pub fn time_alter_title(dataset: &str, name: &str, title: &str) -> String {
    format!("ALTER FACT {{tm.dt.{dataset}.{name}}} VISUAL(TITLE \"{title} (Time)\");\n")
}

pub fn label_alter_title(dataset: &str, reference: &str, name: &str, title: &str) -> String {
    format!(
        "ALTER ATTRIBUTE {{attr.{dataset}.{reference}}} ALTER LABELS \
         {{label.{dataset}.{reference}.{name}}} VISUAL(TITLE \"{title}\");\n"
    )
}

pub fn hyperlink_alter_title(dataset: &str, reference: &str, name: &str, title: &str) -> String {
    format!(
        "ALTER ATTRIBUTE {{attr.{dataset}.{reference}}} ALTER LABELS \
         {{label.{dataset}.{reference}.{name}}} HYPERLINK VISUAL(TITLE \"{title}\");\n"
    )
}

// === Synchronisation and data ===

pub fn synchronize(dataset: &str) -> String {
    format!(
        "# SYNCHRONIZE THE STORAGE AND DATA LOADING INTERFACES WITH THE NEW LOGICAL MODEL\n\
         SYNCHRONIZE {{dataset.{dataset}}};\n"
    )
}

/// Synchronise after a migration without wiping loaded data.
pub fn synchronize_preserve(dataset: &str) -> String {
    format!("SYNCHRONIZE {{dataset.{dataset}}} PRESERVE DATA;\n")
}

pub fn delete_rows(target: &str, clause: &str) -> String {
    format!("DELETE FROM {{{target}}} WHERE {clause};")
}
