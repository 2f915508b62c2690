use graph_unmarshal::{BudgetBreach, Error, Mapper, Options};
use indoc::indoc;

fn mapper_with(budget: graph_unmarshal::Budget) -> Mapper {
    Mapper::with_options(graph_unmarshal::options! {
        budget: Some(budget),
    })
}

#[test]
fn depth_limit_stops_deep_nesting() {
    let mapper = mapper_with(graph_unmarshal::budget! { max_depth: 3 });
    let xml = "<list><list><list><list/></list></list></list>";
    let err = mapper.from_str(xml).unwrap_err();
    assert!(matches!(
        err,
        Error::Budget {
            breach: BudgetBreach::Depth { depth: 4 },
            ..
        }
    ));
    assert!(mapper.from_str("<list><list><list/></list></list>").is_ok());
}

#[test]
fn node_limit_counts_every_converted_node() {
    let mapper = mapper_with(graph_unmarshal::budget! { max_nodes: 3 });
    let xml = indoc! {r#"
        <list>
          <int>1</int>
          <int>2</int>
          <int>3</int>
        </list>
    "#};
    let err = mapper.from_str(xml).unwrap_err();
    assert!(matches!(
        err,
        Error::Budget {
            breach: BudgetBreach::Nodes { nodes: 4 },
            ..
        }
    ));
    // the breach is reported at the node that crossed the limit
    assert_eq!(err.location().map(|l| l.line()), Some(4));
}

#[test]
fn reference_limit() {
    let mapper = mapper_with(graph_unmarshal::budget! { max_references: 1 });
    let xml = indoc! {r#"
        <list>
          <int>1</int>
          <int references="/list/int"/>
          <int references="/list/int"/>
        </list>
    "#};
    let err = mapper.from_str(xml).unwrap_err();
    assert!(matches!(
        err,
        Error::Budget {
            breach: BudgetBreach::References { references: 2 },
            ..
        }
    ));
}

#[test]
fn no_budget_means_no_limits() {
    let mapper = Mapper::with_options(graph_unmarshal::options! { budget: None });
    let depth = 250;
    let xml = format!("{}{}", "<list>".repeat(depth), "</list>".repeat(depth));
    assert!(mapper.from_str(&xml).is_ok());
}

#[test]
fn default_budget_allows_moderate_documents() {
    let mapper = Mapper::with_options(Options::default());
    let items: String = (0..1_000).map(|i| format!("<int>{i}</int>")).collect();
    let xml = format!("<list>{items}</list>");
    assert!(mapper.from_str(&xml).is_ok());
}
