use delta_catalog::{CatalogEntry, CatalogError, VersionCatalog};
use delta_select::{Constraint, ModelVariant, SelectError, SelectionConfig, select};

fn catalog(rows: &[(&str, &str, &str, &str)]) -> VersionCatalog {
    let mut c = VersionCatalog::empty("test");
    for (exp, var, model, real) in rows {
        c.insert(exp, var, "Amon", model, real, CatalogEntry::new("gn", "v1", None));
    }
    c
}

fn changes(var: &str) -> Vec<Constraint> {
    Constraint::grid(&["historical", "ssp585"], &[(var, "Amon")])
}

#[test]
fn tie_break_prefers_r1i1p1f1() {
    let c = catalog(&[
        ("historical", "pr", "A", "r1i1p1f1"),
        ("historical", "pr", "A", "r1i1p1f2"),
        ("ssp585", "pr", "A", "r1i1p1f1"),
        ("ssp585", "pr", "A", "r1i1p1f2"),
        ("historical", "pr", "B", "r2i1p1f1"),
        ("historical", "pr", "B", "r1i1p1f1"),
        ("ssp585", "pr", "B", "r2i1p1f1"),
        ("ssp585", "pr", "B", "r1i1p1f1"),
        ("historical", "pr", "C", "r3i1p1f1"),
        ("historical", "pr", "C", "r5i1p1f1"),
        ("ssp585", "pr", "C", "r3i1p1f1"),
        ("ssp585", "pr", "C", "r5i1p1f1"),
    ]);
    let set = select(&c, &changes("pr"), &SelectionConfig::default()).unwrap();
    assert_eq!(
        set.pairs(),
        &[
            ModelVariant::new("A", "r1i1p1f1"),
            ModelVariant::new("B", "r1i1p1f1"),
            ModelVariant::new("C", "r3i1p1f1"),
        ]
    );
}

#[test]
fn realization_must_be_common_to_experiments() {
    let c = catalog(&[
        ("historical", "pr", "A", "r1i1p1f1"),
        ("historical", "pr", "A", "r2i1p1f1"),
        ("ssp585", "pr", "A", "r2i1p1f1"),
        ("historical", "pr", "D", "r1i1p1f1"),
        ("ssp585", "pr", "D", "r4i1p1f1"),
    ]);
    let set = select(&c, &changes("pr"), &SelectionConfig::default()).unwrap();
    assert_eq!(set.pairs(), &[ModelVariant::new("A", "r2i1p1f1")]);
}

#[test]
fn model_missing_from_one_experiment_is_dropped() {
    let c = catalog(&[
        ("historical", "pr", "A", "r1i1p1f1"),
        ("ssp585", "pr", "A", "r1i1p1f1"),
        ("historical", "pr", "E", "r1i1p1f1"),
    ]);
    let set = select(&c, &changes("pr"), &SelectionConfig::default()).unwrap();
    assert_eq!(set.models(), vec!["A"]);
}

#[test]
fn control_run_does_not_constrain_realization() {
    let c = catalog(&[
        ("historical", "pr", "A", "r1i1p1f2"),
        ("ssp585", "pr", "A", "r1i1p1f2"),
        ("piControl", "pr", "A", "r1i1p1f1"),
        ("historical", "pr", "B", "r1i1p1f1"),
        ("ssp585", "pr", "B", "r1i1p1f1"),
    ]);
    let constraints = Constraint::grid(&["historical", "ssp585", "piControl"], &[("pr", "Amon")]);
    let set = select(&c, &constraints, &SelectionConfig::default()).unwrap();
    // B has no control run at all.
    assert_eq!(set.pairs(), &[ModelVariant::new("A", "r1i1p1f2")]);
}

#[test]
fn control_alone_picks_its_own_realization() {
    let c = catalog(&[
        ("piControl", "pr", "A", "r1i2p1f1"),
        ("piControl", "pr", "A", "r2i1p1f1"),
    ]);
    let constraints = vec![Constraint::new("piControl", "pr", "Amon")];
    let set = select(&c, &constraints, &SelectionConfig::default()).unwrap();
    assert_eq!(set.realization_of("A"), Some("r1i2p1f1"));
}

#[test]
fn every_variable_must_share_the_realization() {
    let c = catalog(&[
        ("historical", "pr", "A", "r1i1p1f1"),
        ("historical", "pr", "A", "r2i1p1f1"),
        ("historical", "evspsbl", "A", "r2i1p1f1"),
    ]);
    let constraints = Constraint::grid(&["historical"], &[("pr", "Amon"), ("evspsbl", "Amon")]);
    let set = select(&c, &constraints, &SelectionConfig::default()).unwrap();
    assert_eq!(set.realization_of("A"), Some("r2i1p1f1"));
}

#[test]
fn include_and_exclude_lists() {
    let rows: Vec<(&str, &str, &str, &str)> = ["A", "B", "C"]
        .iter()
        .flat_map(|m| [("historical", "pr", *m, "r1i1p1f1"), ("ssp585", "pr", *m, "r1i1p1f1")])
        .collect();
    let c = catalog(&rows);
    let config = SelectionConfig::default()
        .with_included(["A", "B"])
        .with_excluded(["B"]);
    let set = select(&c, &changes("pr"), &config).unwrap();
    assert_eq!(set.models(), vec!["A"]);
}

#[test]
fn absent_branch_is_not_found() {
    let c = catalog(&[("historical", "pr", "A", "r1i1p1f1")]);
    let err = select(&c, &changes("pr"), &SelectionConfig::default()).unwrap_err();
    assert_eq!(
        err,
        SelectError::Catalog(CatalogError::NotFound {
            level: "experiment",
            key: "ssp585".into(),
            path: "/".into()
        })
    );
}

#[test]
fn ambiguity_is_fatal() {
    let c = catalog(&[
        ("historical", "pr", "A", "r1i1p1f2"),
        ("historical", "pr", "A", "r1i1p1f3"),
        ("ssp585", "pr", "A", "r1i1p1f2"),
        ("ssp585", "pr", "A", "r1i1p1f3"),
    ]);
    let err = select(&c, &changes("pr"), &SelectionConfig::default()).unwrap_err();
    assert!(matches!(err, SelectError::AmbiguousVariant { ref model, .. } if model == "A"));
}

#[test]
fn selection_is_deterministic() {
    let rows: Vec<(&str, &str, &str, &str)> = ["Z", "M", "A", "Q"]
        .iter()
        .flat_map(|m| {
            [
                ("historical", "pr", *m, "r2i1p1f1"),
                ("historical", "pr", *m, "r7i1p1f1"),
                ("ssp585", "pr", *m, "r2i1p1f1"),
                ("ssp585", "pr", *m, "r7i1p1f1"),
            ]
        })
        .collect();
    let c = catalog(&rows);
    let first = select(&c, &changes("pr"), &SelectionConfig::default()).unwrap();
    for _ in 0..5 {
        assert_eq!(select(&c, &changes("pr"), &SelectionConfig::default()).unwrap(), first);
    }
    assert_eq!(first.models(), vec!["A", "M", "Q", "Z"]);
}

#[test]
fn empty_constraints_rejected() {
    let c = catalog(&[]);
    assert_eq!(
        select(&c, &[], &SelectionConfig::default()).unwrap_err(),
        SelectError::NoConstraints
    );
}

#[test]
fn unrecognised_realization_label_does_not_fail_the_ensemble() {
    let c = catalog(&[
        ("historical", "pr", "A", "r1i1p1f1"),
        ("historical", "pr", "A", "run1"),
        ("ssp585", "pr", "A", "r1i1p1f1"),
        ("ssp585", "pr", "A", "run1"),
        ("historical", "pr", "B", "ens-mean"),
        ("historical", "pr", "B", "r2i1p1f1"),
        ("ssp585", "pr", "B", "ens-mean"),
        ("ssp585", "pr", "B", "r2i1p1f1"),
    ]);
    let set = select(&c, &changes("pr"), &SelectionConfig::default()).unwrap();
    assert_eq!(
        set.pairs(),
        &[ModelVariant::new("A", "r1i1p1f1"), ModelVariant::new("B", "r2i1p1f1")]
    );
}
