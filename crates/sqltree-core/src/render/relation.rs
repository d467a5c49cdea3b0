//! Relation rendering.

use super::expr::identifier_list;
use super::printer::{pad, parenthesize};
use super::Renderer;
use crate::ast::{Join, JoinCriteria, Relation};

/// Binding strength of relation syntax, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RelationTier {
    Join,
    Sampled,
    Aliased,
    Primary,
}

fn tier(relation: &Relation) -> RelationTier {
    match relation {
        Relation::Join(_) => RelationTier::Join,
        Relation::TableSample(_) => RelationTier::Sampled,
        Relation::Aliased(_) => RelationTier::Aliased,
        _ => RelationTier::Primary,
    }
}

impl Renderer {
    /// Renders a relation as it appears in a FROM clause.
    #[must_use]
    pub fn relation(&self, relation: &Relation) -> String {
        match relation {
            Relation::Table(table) => table.name.to_sql(),
            Relation::Aliased(aliased) => {
                let mut sql = format!(
                    "{} AS {}",
                    self.relation_above(&aliased.relation, RelationTier::Aliased),
                    aliased.alias.to_sql()
                );
                if !aliased.columns.is_empty() {
                    sql.push_str(&format!(" ({})", identifier_list(&aliased.columns)));
                }
                sql
            }
            Relation::Join(join) => self.join(join),
            Relation::SetOperation(operation) => parenthesize(&self.set_operation(operation)),
            Relation::Query(query) => parenthesize(&self.query(query)),
            Relation::Values(values) => parenthesize(&self.values(values.rows())),
            Relation::Unnest(unnest) => {
                let mut sql = format!("UNNEST({})", self.expr_list(unnest.args()));
                if unnest.with_ordinality {
                    sql.push_str(" WITH ORDINALITY");
                }
                sql
            }
            Relation::Lateral(lateral) => {
                format!("LATERAL {}", parenthesize(&self.query(&lateral.query)))
            }
            Relation::TableSample(sample) => format!(
                "{} TABLESAMPLE {} ({})",
                self.relation_above(&sample.relation, RelationTier::Sampled),
                sample.method.as_str(),
                self.expr(&sample.percentage)
            ),
        }
    }

    /// Renders `relation`, parenthesized unless it binds tighter than `floor`.
    fn relation_above(&self, relation: &Relation, floor: RelationTier) -> String {
        let sql = self.relation(relation);
        if tier(relation) <= floor {
            parenthesize(&sql)
        } else {
            sql
        }
    }

    fn join(&self, join: &Join) -> String {
        // Joins chain to the left, so only the right input needs grouping.
        let left = self.relation(&join.left);
        let right = self.relation_above(&join.right, RelationTier::Join);
        let keyword = match (&join.criteria, join.join_type) {
            (JoinCriteria::Natural, join_type) => format!("NATURAL {}", join_type.as_str()),
            (_, join_type) => String::from(join_type.as_str()),
        };
        let separator = self.break_or_space();
        let mut sql = format!("{left}{separator}{keyword} {right}");
        match &join.criteria {
            JoinCriteria::On(condition) => {
                sql.push_str(separator);
                sql.push_str("ON ");
                sql.push_str(&pad(&self.expr(condition), 3));
            }
            JoinCriteria::Using(columns) => {
                sql.push_str(separator);
                sql.push_str(&format!("USING ({})", identifier_list(columns)));
            }
            JoinCriteria::Natural | JoinCriteria::None => {}
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        Expr, Identifier, JoinType, QualifiedName, Query, SampleMethod, Select, SelectItem, Unnest,
        ValuesQuery,
    };
    use crate::config::PrintOptions;

    fn sql(relation: &Relation) -> String {
        Renderer::default().relation(relation)
    }

    fn table(name: &str) -> Relation {
        Relation::table(QualifiedName::single(name))
    }

    #[test]
    fn test_table_and_alias() {
        let name = QualifiedName::from_dotted("c.s.t").unwrap();
        assert_eq!(sql(&Relation::table(name)), "\"c\".\"s\".\"t\"");
        let aliased = table("t").alias_with_columns(
            "a",
            vec![Identifier::new("x"), Identifier::new("y")],
        );
        assert_eq!(sql(&aliased), "\"t\" AS \"a\" (\"x\", \"y\")");
    }

    #[test]
    fn test_join_forms() {
        let on = table("a")
            .join(
                table("b"),
                JoinType::Inner,
                JoinCriteria::On(Expr::qualified_column("a", "x").eq(Expr::qualified_column("b", "x"))),
            )
            .unwrap();
        assert_eq!(
            sql(&on),
            "\"a\" INNER JOIN \"b\" ON \"a\".\"x\" = \"b\".\"x\""
        );

        let using = table("a")
            .join(
                table("b"),
                JoinType::Left,
                JoinCriteria::Using(vec![Identifier::new("x")]),
            )
            .unwrap();
        assert_eq!(sql(&using), "\"a\" LEFT JOIN \"b\" USING (\"x\")");

        let natural = table("a")
            .join(table("b"), JoinType::Inner, JoinCriteria::Natural)
            .unwrap();
        assert_eq!(sql(&natural), "\"a\" NATURAL INNER JOIN \"b\"");
        assert_eq!(sql(&table("a").cross_join(table("b"))), "\"a\" CROSS JOIN \"b\"");
    }

    #[test]
    fn test_join_grouping() {
        let left_chain = table("a").cross_join(table("b")).cross_join(table("c"));
        assert_eq!(
            sql(&left_chain),
            "\"a\" CROSS JOIN \"b\" CROSS JOIN \"c\""
        );
        let right_nested = table("a").cross_join(table("b").cross_join(table("c")));
        assert_eq!(
            sql(&right_nested),
            "\"a\" CROSS JOIN (\"b\" CROSS JOIN \"c\")"
        );
        let aliased_join = table("a").cross_join(table("b")).alias("j");
        assert_eq!(sql(&aliased_join), "(\"a\" CROSS JOIN \"b\") AS \"j\"");
    }

    #[test]
    fn test_sample_unnest_lateral_values() {
        let sampled = table("t").sample(SampleMethod::Bernoulli, Expr::integer(50));
        assert_eq!(sql(&sampled), "\"t\" TABLESAMPLE BERNOULLI (50)");

        let aliased_sample = table("t")
            .alias("x")
            .sample(SampleMethod::System, Expr::integer(10));
        assert_eq!(
            sql(&aliased_sample),
            "\"t\" AS \"x\" TABLESAMPLE SYSTEM (10)"
        );

        let unnest = Relation::Unnest(
            Unnest::new(vec![Expr::Array(vec![Expr::integer(1)])], true).unwrap(),
        );
        assert_eq!(sql(&unnest), "UNNEST(ARRAY[1]) WITH ORDINALITY");

        let select = Select::new(vec![SelectItem::expr(Expr::integer(1))]).unwrap();
        assert_eq!(
            sql(&Relation::lateral(Query::select(select))),
            "LATERAL (SELECT 1)"
        );

        let values = ValuesQuery::new(vec![Expr::integer(1), Expr::integer(2)]).unwrap();
        assert_eq!(sql(&Relation::Values(values)), "(VALUES 1, 2)");
    }

    #[test]
    fn test_pretty_join_breaks_lines() {
        let join = table("a")
            .join(
                table("b"),
                JoinType::Inner,
                JoinCriteria::On(Expr::column("x").eq(Expr::column("y"))),
            )
            .unwrap();
        assert_eq!(
            Renderer::new(PrintOptions::pretty()).relation(&join),
            "\"a\"\nINNER JOIN \"b\"\nON \"x\" = \"y\""
        );
    }
}
