//! Reader for the line-oriented static cost-table format.
//!
//! ```text
//! I<name> <createCost> <dropCost> <storageCost>
//! Q<name> <costWithoutIndex> <comma-separated relevant index names>
//! U<name> <costWithoutIndex> <comma-separated relevant index names>
//! SEQ <comma-separated query names>
//! SOURCE <comma-separated index names>
//! DESTINATION <comma-separated index names>
//! STORAGE-CONSTRIANT <number>
//! COST
//! <queryName> <comma-separated index names> <cost>
//! ```
//!
//! Index names start with `I`; query names with `Q` or `U` (updates are
//! scheduled like any other statement here). The `COST` marker switches to
//! per-query cost rows for the remainder of the stream. `SEQ` permutes the
//! workload and must mention every declared query exactly once; absent, the
//! declaration order is the workload order. Absent `SOURCE`/`DESTINATION`
//! lists mean the empty configuration, and a non-positive
//! `STORAGE-CONSTRIANT` (spelled as the format spells it) means
//! unconstrained. Malformed or duplicate declarations and references to
//! undeclared names are fatal parse errors.

use std::io::BufRead;

use rustc_hash::FxHashMap;

use crate::builder::CostModelBuilder;
use crate::cost::CostModel;
use crate::error::ParseError;
use crate::model::{Cost, IndexId};

/// Parse a cost table from a string.
pub fn parse_cost_table(text: &str) -> Result<CostModel, ParseError> {
    read_cost_table(text.as_bytes())
}

/// Parse a cost table from a buffered reader.
pub fn read_cost_table<R: BufRead>(reader: R) -> Result<CostModel, ParseError> {
    let mut parser = Parser::default();
    for (number, line) in reader.lines().enumerate() {
        parser.line(number + 1, &line?)?;
    }
    parser.finish()
}

#[derive(Debug, Clone)]
struct IndexDecl {
    name: String,
    create_cost: Cost,
    drop_cost: Cost,
    storage_cost: Cost,
}

#[derive(Debug, Clone)]
struct QueryDecl {
    name: String,
    cost_without_index: Cost,
    relevant: Vec<IndexId>,
    rows: Vec<(Vec<IndexId>, Cost)>,
}

#[derive(Default)]
struct Parser {
    indexes: Vec<IndexDecl>,
    index_names: FxHashMap<String, IndexId>,
    queries: Vec<QueryDecl>,
    query_names: FxHashMap<String, usize>,
    sequence: Option<Vec<usize>>,
    source: Vec<IndexId>,
    destination: Vec<IndexId>,
    storage_constraint: Cost,
    in_cost_rows: bool,
}

impl Parser {
    fn line(&mut self, number: usize, raw: &str) -> Result<(), ParseError> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if self.in_cost_rows {
            return self.cost_row(number, &tokens);
        }
        match tokens[0] {
            "SEQ" => self.seq(number, &tokens),
            "SOURCE" => {
                self.source = self.index_list(number, &tokens)?;
                Ok(())
            }
            "DESTINATION" => {
                self.destination = self.index_list(number, &tokens)?;
                Ok(())
            }
            "STORAGE-CONSTRIANT" => {
                if tokens.len() != 2 {
                    return Err(ParseError::malformed(
                        number,
                        "expected `STORAGE-CONSTRIANT <number>`",
                    ));
                }
                self.storage_constraint = parse_number(number, tokens[1])?;
                Ok(())
            }
            "COST" => {
                self.in_cost_rows = true;
                Ok(())
            }
            word if word.starts_with('I') => self.index_decl(number, &tokens),
            word if word.starts_with('Q') || word.starts_with('U') => {
                self.query_decl(number, &tokens)
            }
            word => Err(ParseError::malformed(
                number,
                format!("unrecognized line starting with `{word}`"),
            )),
        }
    }

    fn index_decl(&mut self, number: usize, tokens: &[&str]) -> Result<(), ParseError> {
        if tokens.len() != 4 {
            return Err(ParseError::malformed(
                number,
                "expected `I<name> <createCost> <dropCost> <storageCost>`",
            ));
        }
        let name = tokens[0].to_string();
        if self.index_names.contains_key(&name) {
            return Err(ParseError::DuplicateIndex { line: number, name });
        }
        let create_cost = parse_number(number, tokens[1])?;
        let drop_cost = parse_number(number, tokens[2])?;
        let storage_cost = parse_number(number, tokens[3])?;
        if create_cost < 0.0 || drop_cost < 0.0 || storage_cost < 0.0 {
            return Err(ParseError::malformed(number, "index costs must be non-negative"));
        }
        self.index_names.insert(name.clone(), self.indexes.len());
        self.indexes.push(IndexDecl {
            name,
            create_cost,
            drop_cost,
            storage_cost,
        });
        Ok(())
    }

    fn query_decl(&mut self, number: usize, tokens: &[&str]) -> Result<(), ParseError> {
        if tokens.len() != 2 && tokens.len() != 3 {
            return Err(ParseError::malformed(
                number,
                "expected `<name> <costWithoutIndex> [<relevant index names>]`",
            ));
        }
        let name = tokens[0].to_string();
        if self.query_names.contains_key(&name) {
            return Err(ParseError::DuplicateQuery { line: number, name });
        }
        let cost_without_index = parse_number(number, tokens[1])?;
        let relevant = if tokens.len() == 3 {
            self.resolve_indexes(number, tokens[2])?
        } else {
            Vec::new()
        };
        self.query_names.insert(name.clone(), self.queries.len());
        self.queries.push(QueryDecl {
            name,
            cost_without_index,
            relevant,
            rows: Vec::new(),
        });
        Ok(())
    }

    fn seq(&mut self, number: usize, tokens: &[&str]) -> Result<(), ParseError> {
        if tokens.len() != 2 {
            return Err(ParseError::malformed(
                number,
                "expected `SEQ <comma-separated query names>`",
            ));
        }
        let mut order = Vec::new();
        let mut seen = vec![false; self.queries.len()];
        for name in tokens[1].split(',') {
            let qi = *self
                .query_names
                .get(name)
                .ok_or_else(|| ParseError::UnknownQuery {
                    line: number,
                    name: name.to_string(),
                })?;
            if seen[qi] {
                return Err(ParseError::malformed(
                    number,
                    format!("query `{name}` listed twice in SEQ"),
                ));
            }
            seen[qi] = true;
            order.push(qi);
        }
        if order.len() != self.queries.len() {
            return Err(ParseError::malformed(
                number,
                "SEQ must mention every declared query",
            ));
        }
        self.sequence = Some(order);
        Ok(())
    }

    fn cost_row(&mut self, number: usize, tokens: &[&str]) -> Result<(), ParseError> {
        if tokens.len() != 3 {
            return Err(ParseError::malformed(
                number,
                "expected `<queryName> <comma-separated index names> <cost>`",
            ));
        }
        let qi = *self
            .query_names
            .get(tokens[0])
            .ok_or_else(|| ParseError::UnknownQuery {
                line: number,
                name: tokens[0].to_string(),
            })?;
        let indexes = self.resolve_indexes(number, tokens[1])?;
        let cost = parse_number(number, tokens[2])?;
        self.queries[qi].rows.push((indexes, cost));
        Ok(())
    }

    /// Optional trailing comma-separated index-name list.
    fn index_list(&self, number: usize, tokens: &[&str]) -> Result<Vec<IndexId>, ParseError> {
        match tokens.len() {
            1 => Ok(Vec::new()),
            2 => self.resolve_indexes(number, tokens[1]),
            _ => Err(ParseError::malformed(
                number,
                format!("expected `{} [<comma-separated index names>]`", tokens[0]),
            )),
        }
    }

    fn resolve_indexes(&self, number: usize, list: &str) -> Result<Vec<IndexId>, ParseError> {
        list.split(',')
            .map(|name| {
                self.index_names
                    .get(name)
                    .copied()
                    .ok_or_else(|| ParseError::UnknownIndex {
                        line: number,
                        name: name.to_string(),
                    })
            })
            .collect()
    }

    fn finish(self) -> Result<CostModel, ParseError> {
        let order = self
            .sequence
            .unwrap_or_else(|| (0..self.queries.len()).collect());
        let mut builder = CostModelBuilder::new();
        for decl in &self.indexes {
            builder.add_index(
                decl.name.clone(),
                decl.create_cost,
                decl.drop_cost,
                decl.storage_cost,
            );
        }
        for &qi in &order {
            let decl = &self.queries[qi];
            let position = builder.add_query(
                decl.name.clone(),
                decl.cost_without_index,
                decl.relevant.clone(),
            );
            for (indexes, cost) in &decl.rows {
                builder.add_cost_row(position, indexes.clone(), *cost);
            }
        }
        Ok(builder
            .with_storage_constraint(self.storage_constraint)
            .with_source(self.source)
            .with_destination(self.destination)
            .build())
    }
}

fn parse_number(number: usize, token: &str) -> Result<Cost, ParseError> {
    token
        .parse::<Cost>()
        .map_err(|_| ParseError::malformed(number, format!("invalid number `{token}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
I0 10 2 5
I1 8 1 5
Q0 100 I0,I1
SEQ Q0
SOURCE
DESTINATION
STORAGE-CONSTRIANT 8
COST
Q0 I0 40
Q0 I1 60
Q0 I0,I1 35
";

    #[test]
    fn parses_the_worked_example() {
        let model = parse_cost_table(FIXTURE).unwrap();
        assert_eq!(model.indexes().len(), 2);
        assert_eq!(model.indexes()[0].create_cost, 10.0);
        assert_eq!(model.queries().len(), 1);
        assert_eq!(model.queries()[0].relevant, vec![0, 1]);
        assert_eq!(model.queries()[0].cost_rows.len(), 3);
        assert_eq!(model.storage_constraint(), 8.0);
        assert!(model.space().members(model.source()).is_empty());
    }

    #[test]
    fn seq_reorders_the_workload() {
        let text = "\
I0 1 1 1
QA 10 I0
QB 20 I0
SEQ QB,QA
";
        let model = parse_cost_table(text).unwrap();
        assert_eq!(model.queries()[0].name, "QB");
        assert_eq!(model.queries()[1].name, "QA");
        assert_eq!(model.queries()[1].id, 1);
    }

    #[test]
    fn update_statements_declare_queries_too() {
        let text = "\
I0 1 1 1
U0 30 I0
";
        let model = parse_cost_table(text).unwrap();
        assert_eq!(model.queries()[0].name, "U0");
    }

    #[test]
    fn duplicate_index_is_fatal() {
        let text = "I0 1 1 1\nI0 2 2 2\n";
        match parse_cost_table(text) {
            Err(ParseError::DuplicateIndex { line: 2, name }) => assert_eq!(name, "I0"),
            other => panic!("expected duplicate index error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_query_is_fatal() {
        let text = "Q0 10\nQ0 20\n";
        match parse_cost_table(text) {
            Err(ParseError::DuplicateQuery { line: 2, name }) => assert_eq!(name, "Q0"),
            other => panic!("expected duplicate query error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_index_reference_is_fatal() {
        let text = "I0 1 1 1\nQ0 10 I9\n";
        match parse_cost_table(text) {
            Err(ParseError::UnknownIndex { line: 2, name }) => assert_eq!(name, "I9"),
            other => panic!("expected unknown index error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_query_in_cost_row_is_fatal() {
        let text = "I0 1 1 1\nQ0 10 I0\nCOST\nQ9 I0 5\n";
        match parse_cost_table(text) {
            Err(ParseError::UnknownQuery { line: 4, name }) => assert_eq!(name, "Q9"),
            other => panic!("expected unknown query error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_number_is_fatal() {
        let text = "I0 1 abc 1\n";
        match parse_cost_table(text) {
            Err(ParseError::Malformed { line: 1, message }) => {
                assert!(message.contains("abc"));
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn seq_must_cover_every_query() {
        let text = "Q0 10\nQ1 20\nSEQ Q0\n";
        match parse_cost_table(text) {
            Err(ParseError::Malformed { line: 3, .. }) => {}
            other => panic!("expected malformed error, got {other:?}"),
        }
    }
}
