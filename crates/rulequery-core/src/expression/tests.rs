use super::ExpressionCompiler;
use crate::catalog::{CategoryRecord, InMemoryCatalog};
use crate::models::{BoolOperator, ConditionNode, LeafType};

fn node(level: u32, leaf: LeafType, value: &str, operator: Option<BoolOperator>) -> ConditionNode {
    ConditionNode::new(level, leaf, value, operator)
}

fn compile(catalog: &InMemoryCatalog, conditions: &[ConditionNode]) -> String {
    ExpressionCompiler::new(catalog, "catA", "US").compile(conditions)
}

#[test]
fn empty_condition_list_compiles_to_empty_string() {
    assert_eq!(compile(&InMemoryCatalog::default(), &[]), "");
}

#[test]
fn nested_groups_open_with_their_first_operator() {
    let conditions = vec![
        node(1, LeafType::Brand, "88", None),
        node(2, LeafType::Category, "cat1", Some(BoolOperator::And)),
        node(2, LeafType::Category, "cat2", Some(BoolOperator::And)),
        node(3, LeafType::Brand, "77", Some(BoolOperator::Or)),
    ];
    assert_eq!(
        compile(&InMemoryCatalog::default(), &conditions),
        "brandId:88 AND (categoryId:cat1 AND categoryId:cat2 OR brandId:77)"
    );
}

#[test]
fn closing_a_group_joins_the_next_node_to_the_parent() {
    let conditions = vec![
        node(1, LeafType::Brand, "a", None),
        node(2, LeafType::Brand, "b", Some(BoolOperator::Or)),
        node(2, LeafType::Brand, "c", Some(BoolOperator::And)),
        node(1, LeafType::Brand, "d", Some(BoolOperator::AndNot)),
    ];
    assert_eq!(
        compile(&InMemoryCatalog::default(), &conditions),
        "brandId:a OR (brandId:b AND brandId:c) AND NOT brandId:d"
    );
}

#[test]
fn first_node_below_root_level_opens_balanced_groups() {
    let conditions = vec![
        node(3, LeafType::Brand, "a", None),
        node(3, LeafType::Brand, "b", Some(BoolOperator::Or)),
        node(1, LeafType::Brand, "c", Some(BoolOperator::And)),
    ];
    assert_eq!(
        compile(&InMemoryCatalog::default(), &conditions),
        "(brandId:a OR brandId:b) AND brandId:c"
    );
}

#[test]
fn multi_level_jump_collapses_single_item_groups() {
    let conditions = vec![
        node(1, LeafType::Brand, "a", None),
        node(3, LeafType::Brand, "b", Some(BoolOperator::Or)),
        node(3, LeafType::Brand, "c", Some(BoolOperator::And)),
    ];
    assert_eq!(
        compile(&InMemoryCatalog::default(), &conditions),
        "brandId:a OR (brandId:b AND brandId:c)"
    );
}

#[test]
fn missing_operator_on_later_node_defaults_to_and() {
    let conditions = vec![
        node(1, LeafType::Gender, "men", None),
        node(1, LeafType::PctOff, "40", None),
    ];
    assert_eq!(
        compile(&InMemoryCatalog::default(), &conditions),
        "gender:men AND discountPercentUS:[40 TO 100]"
    );
}

#[test]
fn category_leaves_use_search_tokens_of_current_catalog() {
    let catalog = InMemoryCatalog::new(vec![CategoryRecord {
        id: "cat1".to_string(),
        search_tokens: vec!["2.catA.Men.Jackets".to_string()],
        ..CategoryRecord::default()
    }]);
    let conditions = vec![
        node(1, LeafType::Category, "cat1", None),
        node(1, LeafType::Category, "cat2", Some(BoolOperator::Or)),
    ];
    assert_eq!(
        compile(&catalog, &conditions),
        "category:2.catA.Men.Jackets OR categoryId:cat2"
    );
}

#[test]
fn rule_category_unions_conditions_and_children_once() {
    let catalog = InMemoryCatalog::new(vec![
        CategoryRecord {
            id: "rc1".to_string(),
            children: vec!["rc2".to_string()],
            conditions: Some(vec![node(1, LeafType::Brand, "88", None)]),
            ..CategoryRecord::default()
        },
        CategoryRecord {
            id: "rc2".to_string(),
            children: vec!["rc1".to_string()],
            conditions: Some(vec![node(1, LeafType::Gender, "men", None)]),
            ..CategoryRecord::default()
        },
    ]);
    let compiler = ExpressionCompiler::new(&catalog, "catA", "US");
    assert_eq!(
        compiler.compile_rule_category("rc1"),
        "(categoryId:rc1) OR (brandId:88) OR ((categoryId:rc2) OR (gender:men))"
    );
    assert_eq!(compiler.compile_rule_category("plain"), "(categoryId:plain)");
}
