use std::collections::BTreeSet;

use wikidex_core::{DocId, Field, Normalizer};

/// One line of the query file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryLine {
    /// The `quit` sentinel: stop processing the batch.
    Quit,
    Search(Query),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Token groups per field, indexed by `Field::index()`.
    Fielded([Vec<String>; 4]),
    Unfielded(Vec<String>),
}

impl QueryLine {
    pub fn parse(line: &str, normalizer: &Normalizer) -> QueryLine {
        if line.trim() == "quit" {
            return QueryLine::Quit;
        }
        QueryLine::Search(Query::parse(line, normalizer))
    }
}

impl Query {
    pub fn parse(line: &str, normalizer: &Normalizer) -> Query {
        let line = line.trim().to_lowercase();
        if !line.contains(':') {
            return Query::Unfielded(normalizer.normalize(&line));
        }

        let mut groups: [Vec<String>; 4] = Default::default();
        for part in line.split_whitespace() {
            let (field, term) = match part.split_once(':') {
                Some((prefix, term)) => match Field::from_alias(prefix) {
                    Some(field) => (Some(field), term),
                    None => (None, part),
                },
                None => (None, part),
            };
            let tokens = normalizer.normalize(term);
            match field {
                Some(field) => groups[field.index()].extend(tokens),
                // an unscoped word must match in every field
                None => {
                    for group in groups.iter_mut() {
                        group.extend(tokens.iter().cloned());
                    }
                }
            }
        }
        Query::Fielded(groups)
    }

    /// Compute the matching doc ids. `lookup(term, field)` returns the docs
    /// whose `field` posting list contains `term` (empty if it has none).
    pub fn evaluate<F, E>(&self, mut lookup: F) -> Result<BTreeSet<DocId>, E>
    where
        F: FnMut(&str, Field) -> Result<BTreeSet<DocId>, E>,
    {
        match self {
            Query::Fielded(groups) => {
                let mut result: Option<BTreeSet<DocId>> = None;
                for field in Field::ALL {
                    let tokens = &groups[field.index()];
                    if tokens.is_empty() {
                        continue;
                    }
                    let mut field_docs: Option<BTreeSet<DocId>> = None;
                    for token in tokens {
                        let docs = lookup(token, field)?;
                        field_docs = Some(intersect(field_docs, docs));
                    }
                    if let Some(docs) = field_docs {
                        result = Some(intersect(result, docs));
                    }
                }
                Ok(result.unwrap_or_default())
            }
            Query::Unfielded(tokens) => {
                let mut result: Option<BTreeSet<DocId>> = None;
                for token in tokens {
                    let mut token_docs = BTreeSet::new();
                    for field in Field::ALL {
                        token_docs.extend(lookup(token, field)?);
                    }
                    result = Some(intersect(result, token_docs));
                }
                Ok(result.unwrap_or_default())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Query::Fielded(groups) => groups.iter().all(Vec::is_empty),
            Query::Unfielded(tokens) => tokens.is_empty(),
        }
    }
}

fn intersect(acc: Option<BTreeSet<DocId>>, docs: BTreeSet<DocId>) -> BTreeSet<DocId> {
    match acc {
        None => docs,
        Some(acc) => acc.intersection(&docs).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::convert::Infallible;

    fn groups(query: &Query) -> &[Vec<String>; 4] {
        match query {
            Query::Fielded(groups) => groups,
            Query::Unfielded(_) => panic!("expected fielded query"),
        }
    }

    fn index(entries: &[(&str, Field, &[DocId])]) -> HashMap<(String, Field), BTreeSet<DocId>> {
        entries
            .iter()
            .map(|(term, field, docs)| ((term.to_string(), *field), docs.iter().copied().collect()))
            .collect()
    }

    fn run(query: &Query, idx: &HashMap<(String, Field), BTreeSet<DocId>>) -> Vec<DocId> {
        query
            .evaluate(|term, field| {
                Ok::<_, Infallible>(idx.get(&(term.to_string(), field)).cloned().unwrap_or_default())
            })
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn quit_sentinel() {
        let n = Normalizer::default();
        assert_eq!(QueryLine::parse("quit\n", &n), QueryLine::Quit);
        assert!(matches!(QueryLine::parse("quitting", &n), QueryLine::Search(_)));
    }

    #[test]
    fn classifies_by_colon() {
        let n = Normalizer::default();
        assert!(matches!(Query::parse("general relativity", &n), Query::Unfielded(_)));
        assert!(matches!(Query::parse("title:einstein", &n), Query::Fielded(_)));
    }

    #[test]
    fn scoped_terms_route_to_their_field() {
        let n = Normalizer::default();
        let q = Query::parse("Title:Einstein category:physics ref:journal", &n);
        let g = groups(&q);
        assert_eq!(g[Field::Title.index()], vec!["einstein"]);
        assert_eq!(g[Field::Category.index()], vec!["physic"]);
        assert_eq!(g[Field::Body.index()], vec!["journal"]);
        assert!(g[Field::Infobox.index()].is_empty());
    }

    #[test]
    fn unscoped_terms_join_every_field() {
        let n = Normalizer::default();
        let q = Query::parse("title:einstein relativity", &n);
        let g = groups(&q);
        let rel = n.normalize("relativity");
        assert_eq!(g[Field::Title.index()], [vec!["einstein".to_string()], rel.clone()].concat());
        for field in [Field::Category, Field::Infobox, Field::Body] {
            assert_eq!(g[field.index()], rel);
        }
    }

    #[test]
    fn unknown_prefix_is_treated_as_plain_term() {
        let n = Normalizer::default();
        let q = Query::parse("links:rocket", &n);
        let g = groups(&q);
        for field in Field::ALL {
            assert_eq!(g[field.index()], vec!["link", "rocket"]);
        }
    }

    #[test]
    fn fielded_and_within_and_across_fields() {
        let idx = index(&[
            ("einstein", Field::Title, &[0, 3]),
            ("albert", Field::Title, &[0, 5]),
            ("physic", Field::Category, &[0, 1, 3]),
        ]);
        let mut groups: [Vec<String>; 4] = Default::default();
        groups[Field::Title.index()] = vec!["einstein".into(), "albert".into()];
        assert_eq!(run(&Query::Fielded(groups.clone()), &idx), vec![0]);

        groups[Field::Title.index()] = vec!["einstein".into()];
        groups[Field::Category.index()] = vec!["physic".into()];
        assert_eq!(run(&Query::Fielded(groups.clone()), &idx), vec![0, 3]);

        // a term absent from a field empties that field's match set
        groups[Field::Infobox.index()] = vec!["physic".into()];
        assert!(run(&Query::Fielded(groups), &idx).is_empty());
    }

    #[test]
    fn unscoped_fielded_term_must_match_all_four_fields() {
        let idx = index(&[
            ("einstein", Field::Title, &[0]),
            ("physic", Field::Body, &[0, 1]),
            ("physic", Field::Category, &[0, 1]),
        ]);
        let n = Normalizer::default();
        // "physic" is missing from title and infobox, so nothing matches
        let q = Query::parse("title:einstein physics", &n);
        assert!(run(&q, &idx).is_empty());

        // the same word unfielded matches in any field
        let q = Query::parse("einstein physics", &n);
        assert_eq!(run(&q, &idx), vec![0]);
    }

    #[test]
    fn unfielded_unions_fields_then_intersects_terms() {
        let idx = index(&[
            ("graviti", Field::Title, &[2]),
            ("graviti", Field::Body, &[1, 4]),
            ("newton", Field::Body, &[1, 2]),
        ]);
        let q = Query::Unfielded(vec!["graviti".into(), "newton".into()]);
        assert_eq!(run(&q, &idx), vec![1, 2]);
        let q = Query::Unfielded(vec!["graviti".into(), "absent".into()]);
        assert!(run(&q, &idx).is_empty());
    }

    #[test]
    fn empty_queries_match_nothing() {
        let n = Normalizer::default();
        let idx = index(&[("the", Field::Body, &[0])]);
        for line in ["", "the of and", "title:the", "to be or not"] {
            let q = Query::parse(line, &n);
            assert!(q.is_empty(), "{line}");
            assert!(run(&q, &idx).is_empty(), "{line}");
        }
    }
}
