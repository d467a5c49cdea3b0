//! Schema resolution of parsed queries against an in-memory catalog.

mod common;

use common::*;
use sqltree_core::ast::{DataType, Identifier, QualifiedName, QueryBody, Relation};
use sqltree_core::builder::{col, select, table};
use sqltree_core::resolve::EmptyCatalog;
use sqltree_core::{
    resolve, resolve_query, MemoryCatalog, ResolutionContext, ResolutionError, ResolveOptions,
    Schema,
};

fn source(name: &str) -> Option<QualifiedName> {
    Some(QualifiedName::single(name))
}

/// Resolves the first FROM relation of a SELECT: the scope its items see.
fn resolve_from(sql: &str) -> Schema {
    init_tracing();
    let QueryBody::Select(select) = query(sql).body else {
        panic!("Expected a SELECT: {sql}");
    };
    let catalog = shop_catalog();
    resolve(&select.from[0], &ResolutionContext::new(&catalog))
        .unwrap_or_else(|e| panic!("Failed to resolve FROM of: {sql}\nError: {e}"))
}

// ===================================================================
// Base tables and aliases
// ===================================================================

#[test]
fn catalog_columns_are_attributed_to_the_name_used() {
    let schema = resolve_sql("select id, total from orders");
    assert_eq!(field_names(&schema), vec!["id", "total"]);
    assert_eq!(
        field_types(&schema),
        vec![DataType::Bigint, DataType::decimal(10, 2)]
    );
    assert!(schema.fields.iter().all(|field| field.source.is_none()));
    assert!(schema.relation_ids.is_empty());

    let scope = resolve_from("select id, total from orders");
    assert_eq!(scope.fields[0].source, source("orders"));
    assert_eq!(scope.relation_ids, vec![QualifiedName::single("orders")]);
}

#[test]
fn fully_qualified_table_name() {
    let schema = resolve_sql("select * from shop.customers");
    assert_eq!(field_names(&schema), vec!["customer_id", "name", "country"]);
    let scope = resolve_from("select * from shop.customers");
    assert!(scope.has_relation(&[Identifier::new("customers")]));
    assert!(scope.has_relation(&[Identifier::new("shop"), Identifier::new("customers")]));
}

#[test]
fn alias_becomes_the_source() {
    let schema = resolve_sql("select o.id from orders o");
    assert_eq!(field_names(&schema), vec!["id"]);
    let scope = resolve_from("select o.id from orders o");
    assert!(scope.fields.iter().all(|field| field.source == source("o")));
    assert_eq!(scope.relation_ids, vec![QualifiedName::single("o")]);
}

#[test]
fn column_aliases_rename_positionally() {
    let schema = resolve_sql("select * from customers as c (k, n, cc)");
    assert_eq!(field_names(&schema), vec!["k", "n", "cc"]);
    assert_eq!(schema.fields[2].data_type, DataType::Char(2));
}

#[test]
fn column_alias_arity_mismatch() {
    assert_eq!(
        resolve_err("select * from customers c (a, b)"),
        ResolutionError::ArityMismatch {
            relation: Identifier::new("c"),
            expected: 2,
            actual: 3,
        }
    );
}

#[test]
fn unknown_relation() {
    assert_eq!(
        resolve_err("select * from nowhere"),
        ResolutionError::UnknownRelation(QualifiedName::single("nowhere"))
    );
}

#[test]
fn unknown_relation_tolerated_when_allowed() {
    let options = ResolveOptions::default().with_allow_unknown_relations(true);
    let ctx = ResolutionContext::with_options(&EmptyCatalog, options);
    let schema = resolve_query(&query("select * from nowhere"), &ctx).unwrap();
    assert!(schema.is_empty());
    let table = resolve(&Relation::table(QualifiedName::single("nowhere")), &ctx).unwrap();
    assert!(table.is_empty());
    assert!(table.has_relation(&[Identifier::new("nowhere")]));
}

#[test]
fn duplicate_relation_identity() {
    assert_eq!(
        resolve_err("select * from orders, orders"),
        ResolutionError::DuplicateRelationAlias(QualifiedName::single("orders"))
    );
    assert_eq!(
        resolve_err("select * from orders o join customers o on true"),
        ResolutionError::DuplicateRelationAlias(QualifiedName::single("o"))
    );
    let schema = resolve_sql("select * from orders a join orders b on a.id = b.id");
    assert_eq!(schema.len(), 8);
}

#[test]
fn derived_table_hides_its_relations() {
    let schema = resolve_sql("select * from (select id from shop.orders) cross join shop.orders");
    assert_eq!(
        field_names(&schema),
        vec!["id", "id", "customer_id", "total", "placed_at"]
    );

    let scope = resolve_from("select * from (select id from shop.orders)");
    assert!(scope.relation_ids.is_empty());
    assert_eq!(scope.fields[0].source, None);

    let nested = resolve_sql("select * from (select * from orders) a, orders");
    assert_eq!(nested.len(), 8);
}

#[test]
fn tablesample_passes_schema_through() {
    assert_eq!(
        resolve_sql("select * from orders tablesample bernoulli (10)"),
        resolve_sql("select * from orders")
    );
    assert_eq!(
        resolve_from("select * from orders tablesample system (5)"),
        resolve_from("select * from orders")
    );
    let aliased = resolve_from("select * from orders as o tablesample system (5)");
    assert_eq!(aliased.relation_ids, vec![QualifiedName::single("o")]);
    assert_eq!(aliased.fields[2].data_type, DataType::decimal(10, 2));
}

// ===================================================================
// Select lists
// ===================================================================

#[test]
fn select_item_naming() {
    let schema = resolve_sql("select id, total * 2, customer_id as cust from orders");
    assert_eq!(field_names(&schema), vec!["id", "?", "cust"]);
    assert!(schema.fields.iter().all(|field| field.source.is_none()));
}

#[test]
fn qualified_wildcard() {
    let schema = resolve_sql("select c.* from orders o, customers c");
    assert_eq!(field_names(&schema), vec!["customer_id", "name", "country"]);
    assert_eq!(field_types(&schema)[2], DataType::Char(2));
}

#[test]
fn qualified_wildcard_with_aliases() {
    assert_eq!(
        resolve_err("select o.* as (a, b) from orders o"),
        ResolutionError::ArityMismatch {
            relation: Identifier::new("o"),
            expected: 2,
            actual: 4,
        }
    );
}

#[test]
fn wildcard_for_unknown_relation() {
    assert_eq!(
        resolve_err("select x.* from orders o"),
        ResolutionError::UnknownRelation(QualifiedName::single("x"))
    );
}

#[test]
fn ambiguous_column() {
    assert_eq!(
        resolve_err("select customer_id from orders o join customers c on true"),
        ResolutionError::AmbiguousColumn(Identifier::new("customer_id"))
    );
    let schema = resolve_sql("select c.customer_id from orders o join customers c on true");
    assert_eq!(field_types(&schema), vec![DataType::Bigint]);
}

#[test]
fn identifiers_compare_case_insensitively() {
    let schema = resolve_sql("select O.ID from ORDERS o");
    assert_eq!(field_types(&schema), vec![DataType::Bigint]);
}

// ===================================================================
// Joins
// ===================================================================

#[test]
fn join_on_concatenates_fields() {
    let schema =
        resolve_sql("select * from orders o join customers c on o.customer_id = c.customer_id");
    assert_eq!(
        field_names(&schema),
        vec!["id", "customer_id", "total", "placed_at", "customer_id", "name", "country"]
    );
}

#[test]
fn join_using_coalesces_shared_columns() {
    let schema = resolve_sql("select * from orders join customers using (customer_id)");
    assert_eq!(
        field_names(&schema),
        vec!["customer_id", "id", "total", "placed_at", "name", "country"]
    );
    assert_eq!(schema.fields[0].data_type, DataType::Bigint);
    assert_eq!(schema.fields[0].source, None);

    let unqualified = resolve_sql("select customer_id from orders join customers using (customer_id)");
    assert_eq!(field_types(&unqualified), vec![DataType::Bigint]);
}

#[test]
fn join_using_unknown_column() {
    assert_eq!(
        resolve_err("select * from orders join customers using (sku)"),
        ResolutionError::UnknownColumn(Identifier::new("sku"))
    );
}

#[test]
fn natural_join() {
    let natural = resolve_sql("select * from orders natural join customers");
    let using = resolve_sql("select * from orders join customers using (customer_id)");
    assert_eq!(natural, using);

    let disjoint = resolve_sql("select * from orders natural join items");
    assert_eq!(disjoint.len(), 7);
}

#[test]
fn natural_join_incompatible_types() {
    assert!(matches!(
        resolve_err("select * from (select 'x' as id) a natural join orders"),
        ResolutionError::TypeMismatch {
            left: DataType::Varchar(Some(1)),
            right: DataType::Bigint,
            ..
        }
    ));
}

#[test]
fn unnest_sees_the_left_side() {
    let schema = resolve_sql(
        "select * from items cross join unnest(tags) with ordinality as u (tag, n)",
    );
    assert_eq!(
        field_names(&schema),
        vec!["order_id", "sku", "tags", "tag", "n"]
    );
    assert_eq!(schema.fields[3].data_type, DataType::Varchar(None));
    assert_eq!(schema.fields[4].data_type, DataType::Bigint);
}

#[test]
fn lateral_sees_earlier_relations() {
    let lateral = resolve_sql("select l.n from customers c, lateral (select c.name as n) l");
    assert_eq!(field_types(&lateral), vec![DataType::Varchar(None)]);

    let plain = resolve_sql("select l.n from customers c, (select c.name as n) l");
    assert_eq!(field_types(&plain), vec![DataType::Unknown]);
}

// ===================================================================
// Subqueries and CTEs
// ===================================================================

#[test]
fn derived_table() {
    let schema = resolve_sql("select s.total from (select id, total from orders) s");
    assert_eq!(field_names(&schema), vec!["total"]);
    assert_eq!(schema.fields[0].data_type, DataType::decimal(10, 2));

    let scope = resolve_from("select s.total from (select id, total from orders) s");
    assert_eq!(field_names(&scope), vec!["id", "total"]);
    assert!(scope.fields.iter().all(|field| field.source == source("s")));
    assert_eq!(scope.relation_ids, vec![QualifiedName::single("s")]);
}

#[test]
fn scalar_subquery_sees_outer_scope() {
    let schema = resolve_sql(
        "select (select c.name from orders o limit 1) as n, \
         (select max(total) from orders) as top from customers c",
    );
    assert_eq!(field_names(&schema), vec!["n", "top"]);
    assert_eq!(
        field_types(&schema),
        vec![DataType::Varchar(None), DataType::decimal(10, 2)]
    );
}

#[test]
fn cte_binding() {
    let schema = resolve_sql(
        "with big as (select id, total from orders where total > 100) \
         select b.total from big b",
    );
    assert_eq!(field_types(&schema), vec![DataType::decimal(10, 2)]);
    let qualified = resolve_sql("with big as (select id from orders) select b.id from big b, big");
    assert_eq!(field_types(&qualified), vec![DataType::Bigint]);
    assert_eq!(
        resolve_err("with big as (select id from orders) select id from big b, big"),
        ResolutionError::AmbiguousColumn(Identifier::new("id"))
    );
}

#[test]
fn cte_column_list() {
    let schema = resolve_sql("with t (k, v) as (select id, total from orders) select * from t");
    assert_eq!(field_names(&schema), vec!["k", "v"]);
    let qualified = resolve_sql("with t (k, v) as (select id, total from orders) select t.k from t");
    assert_eq!(field_types(&qualified), vec![DataType::Bigint]);
}

#[test]
fn cte_columns_must_be_distinct() {
    assert!(matches!(
        resolve_err("with c as (select 1 as x, 2 as x) select * from c"),
        ResolutionError::DuplicateField(_)
    ));
    assert!(matches!(
        resolve_err("with c (k, k) as (select id, total from orders) select * from c"),
        ResolutionError::DuplicateField(_)
    ));
    let anonymous = resolve_sql("with c as (select 1, 2) select * from c");
    assert_eq!(field_names(&anonymous), vec!["?", "?"]);
}

#[test]
fn cte_shadows_catalog() {
    let schema = resolve_sql("with orders as (select 1 as one) select * from orders");
    assert_eq!(field_names(&schema), vec!["one"]);
    assert_eq!(field_types(&schema), vec![DataType::Integer]);
}

#[test]
fn later_cte_sees_earlier_ones() {
    let schema =
        resolve_sql("with a as (select 1 as x), b as (select x from a) select * from b");
    assert_eq!(field_names(&schema), vec!["x"]);
}

#[test]
fn duplicate_cte_name() {
    assert_eq!(
        resolve_err("with a as (select 1), a as (select 2) select * from a"),
        ResolutionError::DuplicateRelationAlias(QualifiedName::single("a"))
    );
}

// ===================================================================
// Set operations and VALUES
// ===================================================================

#[test]
fn set_operation_takes_left_names_and_widens() {
    let schema =
        resolve_sql("select customer_id as k from orders union all select customer_id from customers");
    assert_eq!(field_names(&schema), vec!["k"]);
    assert_eq!(field_types(&schema), vec![DataType::Bigint]);
    assert!(schema.relation_ids.is_empty());
}

#[test]
fn set_operation_column_count() {
    assert_eq!(
        resolve_err("select id, total from orders union select customer_id from customers"),
        ResolutionError::ColumnCountMismatch { left: 2, right: 1 }
    );
}

#[test]
fn set_operation_incompatible_types() {
    assert_eq!(
        resolve_err("select id from orders except select name from customers"),
        ResolutionError::IncompatibleSetOperationTypes {
            position: 0,
            left: DataType::Bigint,
            right: DataType::Varchar(None),
        }
    );
}

#[test]
fn values_relation() {
    let schema = resolve_sql("select * from (values (1, 'a'), (2, 'bc')) v");
    assert_eq!(field_names(&schema), vec!["_col0", "_col1"]);
    assert_eq!(
        field_types(&schema),
        vec![DataType::Integer, DataType::Varchar(Some(2))]
    );
    let scope = resolve_from("select * from (values (1, 'a'), (2, 'bc')) v");
    assert_eq!(scope.fields[0].source, source("v"));
}

#[test]
fn values_row_arity() {
    assert_eq!(
        resolve_err("select * from (values (1, 2), (3)) v"),
        ResolutionError::InconsistentRowArity {
            row: 1,
            expected: 2,
            actual: 1,
        }
    );
}

#[test]
fn values_type_mismatch() {
    assert!(matches!(
        resolve_err("values 1, 'a'"),
        ResolutionError::TypeMismatch {
            left: DataType::Integer,
            right: DataType::Varchar(Some(1)),
            ..
        }
    ));
}

// ===================================================================
// Expression types
// ===================================================================

#[test]
fn literal_and_function_types() {
    let schema = resolve_sql(
        "select count(*), sum(customer_id), avg(total), now(), current_date, \
         1, 3000000000, 1.50, 'abc' from orders",
    );
    assert_eq!(
        field_types(&schema),
        vec![
            DataType::Bigint,
            DataType::Bigint,
            DataType::decimal(10, 2),
            DataType::Timestamp {
                precision: 3,
                with_time_zone: true,
            },
            DataType::Date,
            DataType::Integer,
            DataType::Bigint,
            DataType::decimal(3, 2),
            DataType::Varchar(Some(3)),
        ]
    );
}

#[test]
fn operator_types() {
    let schema = resolve_sql(
        "select id + customer_id, total * 2, sku || 'x', order_id > 1, \
         tags[1] from items, orders",
    );
    assert_eq!(
        field_types(&schema),
        vec![
            DataType::Bigint,
            DataType::decimal(12, 2),
            DataType::Varchar(None),
            DataType::Boolean,
            DataType::Varchar(None),
        ]
    );
}

#[test]
fn temporal_arithmetic() {
    let schema = resolve_sql(
        "select placed_at + interval '1' day, placed_at - placed_at from orders",
    );
    assert_eq!(
        field_types(&schema),
        vec![DataType::timestamp(3), DataType::IntervalDayToSecond]
    );
}

#[test]
fn case_branches_widen() {
    let schema =
        resolve_sql("select case when id > 1 then customer_id else id end from orders");
    assert_eq!(field_types(&schema), vec![DataType::Bigint]);
}

#[test]
fn arithmetic_type_mismatch() {
    assert!(matches!(
        resolve_err("select name + 1 from customers"),
        ResolutionError::TypeMismatch {
            left: DataType::Varchar(None),
            right: DataType::Integer,
            ..
        }
    ));
}

// ===================================================================
// Builder and catalog configuration
// ===================================================================

#[test]
fn built_query_resolves() {
    let query = select(vec![col("id")])
        .from(table("orders"))
        .limit(1)
        .build()
        .unwrap();
    let catalog = shop_catalog();
    let schema = resolve_query(&query, &ResolutionContext::new(&catalog)).unwrap();
    assert_eq!(field_names(&schema), vec!["id"]);
}

#[test]
fn catalog_from_json() {
    let catalog = MemoryCatalog::from_json(
        r#"{"tables": [{"name": ["db", "events"], "columns": [
            {"name": "id", "type": "Bigint"},
            {"name": "day", "type": "Date"}
        ]}]}"#,
    )
    .unwrap();
    assert_eq!(catalog.len(), 1);
    let schema =
        resolve_query(&query("select day from events"), &ResolutionContext::new(&catalog)).unwrap();
    assert_eq!(field_types(&schema), vec![DataType::Date]);
}

// ===================================================================
// Determinism
// ===================================================================

#[test]
fn resolution_is_repeatable() {
    let sql = "with t (k) as (select customer_id from orders) \
               select c.name, t.k from customers c join t on c.customer_id = t.k";
    assert_eq!(try_resolve(sql), try_resolve(sql));

    let failing = "select * from orders join customers using (sku)";
    assert_eq!(try_resolve(failing), try_resolve(failing));
    assert!(try_resolve(failing).is_err());
}
