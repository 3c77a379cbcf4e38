//! Directory lookups over the Graph users collection.

use async_trait::async_trait;

use super::{Collection, GraphClient};
use crate::error::GatewayError;
use crate::gateway::DirectoryGateway;
use crate::types::Identity;
use crate::util::{is_cyrillic, transliterate};

const USER_FIELDS: &str = "id,displayName,mail,userPrincipalName,givenName,surname,jobTitle,department";

/// Production `DirectoryGateway` backed by the Graph users API.
pub struct GraphDirectory {
    client: GraphClient,
}

impl GraphDirectory {
    pub fn new(client: GraphClient) -> Self {
        GraphDirectory { client }
    }

    /// Query candidates for a term: the term itself, plus a Latin
    /// transliteration when the input is Cyrillic. The directory stores
    /// Latin-script names, so "Петренко" also has to be searched as
    /// "petrenko".
    fn term_candidates(term: &str) -> Vec<String> {
        let mut candidates = vec![term.to_string()];
        if is_cyrillic(term) {
            let latin = transliterate(term);
            if !latin.is_empty() && latin != term {
                candidates.push(latin);
            }
        }
        candidates
    }
}

/// OData string literals escape single quotes by doubling them.
fn escape(term: &str) -> String {
    term.replace('\'', "''")
}

#[async_trait]
impl DirectoryGateway for GraphDirectory {
    async fn search_by_name(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Identity>, GatewayError> {
        let mut clauses = Vec::new();
        for candidate in Self::term_candidates(term) {
            let safe = escape(&candidate);
            clauses.push(format!("startswith(displayName,'{safe}')"));
            clauses.push(format!("startswith(mail,'{safe}')"));
            clauses.push(format!("startswith(userPrincipalName,'{safe}')"));
        }
        let filter = clauses.join(" or ");

        let response: Collection<Identity> = self
            .client
            .get(
                "users",
                &[
                    ("$filter", filter),
                    ("$top", limit.to_string()),
                    ("$select", USER_FIELDS.to_string()),
                    ("$orderby", "displayName".to_string()),
                ],
                true,
            )
            .await?;
        Ok(response.value)
    }

    async fn search_by_prefix(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Identity>, GatewayError> {
        let safe = escape(term);
        let filter = format!(
            "startswith(displayName,'{safe}') or startswith(givenName,'{safe}') or \
             startswith(surname,'{safe}') or startswith(mail,'{safe}')"
        );

        let response: Collection<Identity> = self
            .client
            .get(
                "users",
                &[
                    ("$filter", filter),
                    ("$top", limit.to_string()),
                    ("$select", USER_FIELDS.to_string()),
                    ("$orderby", "displayName".to_string()),
                ],
                true,
            )
            .await?;
        Ok(response.value)
    }

    async fn search_by_surname_initial(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Identity>, GatewayError> {
        // "Ivan Petrenko" searches surnames starting with "P".
        let initial: String = term
            .split_whitespace()
            .last()
            .and_then(|token| token.chars().next())
            .map(|c| c.to_string())
            .unwrap_or_default();
        if initial.is_empty() {
            return Ok(Vec::new());
        }

        let safe = escape(&initial);
        let response: Collection<Identity> = self
            .client
            .get(
                "users",
                &[
                    ("$filter", format!("startswith(surname,'{safe}')")),
                    ("$top", limit.to_string()),
                    ("$select", USER_FIELDS.to_string()),
                    ("$orderby", "displayName".to_string()),
                ],
                false,
            )
            .await?;
        Ok(response.value)
    }

    async fn get_by_id(&self, id: &str) -> Result<Identity, GatewayError> {
        self.client
            .get(
                &format!("users/{id}"),
                &[("$select", USER_FIELDS.to_string())],
                false,
            )
            .await
    }
}
