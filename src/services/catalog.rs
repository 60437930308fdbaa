//! Problem catalog collaborator.
//!
//! The catalog is read-only from this service's point of view: problems are
//! listed and filtered here, never created or graded.

use futures::future::BoxFuture;
use serde::Deserialize;

use crate::{dao::models::ProblemRefEntity, error::ServiceError};

/// Read-only source of contest problems.
pub trait ProblemCatalog: Send + Sync {
    /// Every problem the catalog knows about.
    fn list_problems(&self) -> BoxFuture<'static, Result<Vec<ProblemRefEntity>, ServiceError>>;

    /// Problems overlapping any of `topics` with a difficulty in
    /// `difficulties`. The default implementation filters the full list.
    fn problems_matching(
        &self,
        topics: Vec<String>,
        difficulties: Vec<String>,
    ) -> BoxFuture<'static, Result<Vec<ProblemRefEntity>, ServiceError>> {
        let all = self.list_problems();
        Box::pin(async move { Ok(filter_problems(all.await?, &topics, &difficulties)) })
    }
}

/// Keep problems whose topic set intersects `topics` and whose difficulty is
/// listed in `difficulties`. Comparison is case-insensitive.
fn filter_problems(
    problems: Vec<ProblemRefEntity>,
    topics: &[String],
    difficulties: &[String],
) -> Vec<ProblemRefEntity> {
    problems
        .into_iter()
        .filter(|problem| {
            difficulties
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(&problem.difficulty))
                && problem
                    .topics
                    .iter()
                    .any(|tag| topics.iter().any(|wanted| wanted.eq_ignore_ascii_case(tag)))
        })
        .collect()
}

/// Catalog backed by an HTTP problem service.
pub struct HttpProblemCatalog {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CatalogProblem {
    id: String,
    name: String,
    difficulty: String,
    #[serde(default)]
    topics: Vec<String>,
}

impl From<CatalogProblem> for ProblemRefEntity {
    fn from(value: CatalogProblem) -> Self {
        Self {
            id: value.id,
            name: value.name,
            difficulty: value.difficulty,
            topics: value.topics,
        }
    }
}

impl HttpProblemCatalog {
    /// Catalog client pointing at `base_url`.
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    async fn fetch_all(client: reqwest::Client, url: String) -> Result<Vec<ProblemRefEntity>, ServiceError> {
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|err| ServiceError::CatalogError(format!("catalog unreachable: {err}")))?;

        let problems: Vec<CatalogProblem> = response
            .error_for_status()
            .map_err(|err| ServiceError::CatalogError(err.to_string()))?
            .json()
            .await
            .map_err(|err| ServiceError::CatalogError(format!("malformed payload: {err}")))?;

        Ok(problems.into_iter().map(Into::into).collect())
    }
}

impl ProblemCatalog for HttpProblemCatalog {
    fn list_problems(&self) -> BoxFuture<'static, Result<Vec<ProblemRefEntity>, ServiceError>> {
        let client = self.client.clone();
        let url = format!("{}/problems", self.base_url);
        Box::pin(Self::fetch_all(client, url))
    }
}

/// Catalog backed by a fixed in-memory problem list.
///
/// Used when no catalog service is configured, and by the service tests.
pub struct StaticCatalog {
    problems: Vec<ProblemRefEntity>,
}

impl StaticCatalog {
    /// Catalog serving exactly `problems`.
    pub fn new(problems: Vec<ProblemRefEntity>) -> Self {
        Self { problems }
    }

    /// The problem set shipped with the binary.
    pub fn builtin() -> Self {
        fn problem(id: &str, name: &str, difficulty: &str, topics: &[&str]) -> ProblemRefEntity {
            ProblemRefEntity {
                id: id.to_owned(),
                name: name.to_owned(),
                difficulty: difficulty.to_owned(),
                topics: topics.iter().map(|tag| (*tag).to_owned()).collect(),
            }
        }

        Self::new(vec![
            problem("two-sum", "Two Sum", "easy", &["arrays", "hash-table"]),
            problem("valid-anagram", "Valid Anagram", "easy", &["strings", "hash-table"]),
            problem("merge-intervals", "Merge Intervals", "medium", &["arrays", "sorting"]),
            problem(
                "longest-substring",
                "Longest Substring Without Repeating Characters",
                "medium",
                &["strings", "sliding-window"],
            ),
            problem("three-sum", "3Sum", "medium", &["arrays", "two-pointers"]),
            problem(
                "binary-tree-level-order",
                "Binary Tree Level Order Traversal",
                "medium",
                &["trees", "bfs"],
            ),
            problem("coin-change", "Coin Change", "medium", &["dynamic-programming"]),
            problem("word-ladder", "Word Ladder", "hard", &["graphs", "bfs"]),
            problem(
                "median-sorted-arrays",
                "Median of Two Sorted Arrays",
                "hard",
                &["arrays", "binary-search"],
            ),
            problem(
                "trapping-rain-water",
                "Trapping Rain Water",
                "hard",
                &["arrays", "two-pointers"],
            ),
            problem("course-schedule", "Course Schedule", "medium", &["graphs", "topological-sort"]),
            problem("climbing-stairs", "Climbing Stairs", "easy", &["dynamic-programming"]),
        ])
    }
}

impl ProblemCatalog for StaticCatalog {
    fn list_problems(&self) -> BoxFuture<'static, Result<Vec<ProblemRefEntity>, ServiceError>> {
        let problems = self.problems.clone();
        Box::pin(async move { Ok(problems) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn filter_requires_topic_overlap_and_listed_difficulty() {
        let catalog: Arc<dyn ProblemCatalog> = Arc::new(StaticCatalog::builtin());

        let matches = catalog
            .problems_matching(
                vec!["arrays".to_owned()],
                vec!["easy".to_owned(), "medium".to_owned()],
            )
            .await
            .unwrap();

        assert!(!matches.is_empty());
        for problem in &matches {
            assert!(problem.topics.iter().any(|tag| tag == "arrays"));
            assert!(problem.difficulty == "easy" || problem.difficulty == "medium");
        }
    }

    #[tokio::test]
    async fn filter_is_case_insensitive() {
        let catalog: Arc<dyn ProblemCatalog> = Arc::new(StaticCatalog::builtin());

        let matches = catalog
            .problems_matching(vec!["Arrays".to_owned()], vec!["EASY".to_owned()])
            .await
            .unwrap();

        assert!(matches.iter().any(|problem| problem.id == "two-sum"));
    }

    #[tokio::test]
    async fn disjoint_filter_yields_nothing() {
        let catalog: Arc<dyn ProblemCatalog> = Arc::new(StaticCatalog::builtin());

        let matches = catalog
            .problems_matching(vec!["geometry".to_owned()], vec!["easy".to_owned()])
            .await
            .unwrap();

        assert!(matches.is_empty());
    }
}
